//! Research Parameters
//!
//! Plain numeric knobs for every stage of the pipeline. Defaults mirror the
//! values the research notebooks were tuned with.

use serde::{Deserialize, Serialize};

use crate::validation::fdr::FdrMethod;

/// Dollar capital for the standalone allocation functions and the sweep
pub const DEFAULT_CAPITAL: f64 = 100_000.0;

/// Pipeline capital: positions and PnL in units of equity
pub const PIPELINE_CAPITAL: f64 = 1.0;

/// Cointegration screening settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Engle-Granger p-value below which a pair is a candidate
    pub significance: f64,
    /// Window for the rolling return correlation report
    pub correlation_window: usize,
    /// Only trade candidates that also survive FDR control
    pub require_fdr: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            significance: 0.05,
            correlation_window: 60,
            require_fdr: false,
        }
    }
}

impl SelectionConfig {
    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance;
        self
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        if self.significance <= 0.0 || self.significance >= 1.0 {
            return Err(ParamError::InvalidSignificance(self.significance));
        }
        if self.correlation_window < 2 {
            return Err(ParamError::InvalidWindow(self.correlation_window));
        }
        Ok(())
    }
}

/// Z-score state machine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Absolute z-score required to open a position
    pub entry_threshold: f64,
    /// Absolute z-score at or below which a position is closed
    pub exit_threshold: f64,
    /// Close after this many held steps (unbounded when `None`)
    pub max_hold: Option<usize>,
    /// Minimum steps between accepted signal changes
    pub min_gap: usize,
    /// Close a held position once |z| reaches this level
    pub stop_threshold: Option<f64>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            entry_threshold: 2.0,
            exit_threshold: 0.5,
            max_hold: None,
            min_gap: 1,
            stop_threshold: None,
        }
    }
}

impl SignalConfig {
    pub fn with_entry(mut self, threshold: f64) -> Self {
        self.entry_threshold = threshold;
        self
    }

    pub fn with_exit(mut self, threshold: f64) -> Self {
        self.exit_threshold = threshold;
        self
    }

    pub fn with_max_hold(mut self, max_hold: Option<usize>) -> Self {
        self.max_hold = max_hold;
        self
    }

    pub fn with_min_gap(mut self, min_gap: usize) -> Self {
        self.min_gap = min_gap;
        self
    }

    pub fn with_stop(mut self, stop: Option<f64>) -> Self {
        self.stop_threshold = stop;
        self
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        if !(self.entry_threshold > 0.0) {
            return Err(ParamError::InvalidEntryThreshold(self.entry_threshold));
        }
        if self.exit_threshold < 0.0 || self.exit_threshold >= self.entry_threshold {
            return Err(ParamError::InvalidExitThreshold(
                self.exit_threshold,
                self.entry_threshold,
            ));
        }
        if self.max_hold == Some(0) {
            return Err(ParamError::InvalidMaxHold);
        }
        if let Some(stop) = self.stop_threshold {
            if stop <= self.entry_threshold {
                return Err(ParamError::InvalidStopThreshold(stop, self.entry_threshold));
            }
        }
        Ok(())
    }
}

/// Tradability gate applied to a candidate spread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityGate {
    /// ADF p-value must be below this
    pub max_adf_p_value: f64,
    /// Half-life bounds, in periods
    pub min_half_life: f64,
    pub max_half_life: f64,
    /// Hurst exponent must be below this. The estimate doubles the
    /// dispersion slope, so a random walk scores ~1.0 and 0.5 demands a
    /// dispersion growth of at most lag^0.25.
    pub max_hurst: f64,
    /// Lag cap for the Hurst estimate
    pub hurst_max_lag: usize,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self {
            max_adf_p_value: 0.05,
            min_half_life: 1.0,
            max_half_life: 252.0,
            max_hurst: 0.5,
            hurst_max_lag: 100,
        }
    }
}

impl QualityGate {
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.max_adf_p_value <= 0.0 || self.max_adf_p_value > 1.0 {
            return Err(ParamError::InvalidSignificance(self.max_adf_p_value));
        }
        if self.min_half_life < 0.0 || self.max_half_life <= self.min_half_life {
            return Err(ParamError::InvalidHalfLifeBounds(
                self.min_half_life,
                self.max_half_life,
            ));
        }
        if self.hurst_max_lag < 3 {
            return Err(ParamError::InvalidWindow(self.hurst_max_lag));
        }
        Ok(())
    }
}

/// Capital allocation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Capital split across positions; 1.0 keeps the pipeline in leverage units
    pub capital: f64,
    /// Desired daily volatility for volatility targeting
    pub target_vol: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            capital: PIPELINE_CAPITAL,
            target_vol: 0.02,
        }
    }
}

impl AllocationConfig {
    pub fn validate(&self) -> Result<(), ParamError> {
        if !(self.capital > 0.0) {
            return Err(ParamError::InvalidCapital(self.capital));
        }
        if !(self.target_vol > 0.0) {
            return Err(ParamError::InvalidTargetVol(self.target_vol));
        }
        Ok(())
    }
}

/// Execution friction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Cost per unit traded
    pub transaction_cost: f64,
    /// Half bid-ask spread, as a fraction of price
    pub half_spread: f64,
    /// Fraction of recent return volatility charged as slippage
    pub slippage_vol_factor: f64,
    /// Rebalance every N periods
    pub rebalance_freq: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            transaction_cost: 0.0005,
            half_spread: 0.0002,
            slippage_vol_factor: 0.1,
            rebalance_freq: 5,
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), ParamError> {
        for (name, value) in [
            ("transaction_cost", self.transaction_cost),
            ("half_spread", self.half_spread),
            ("slippage_vol_factor", self.slippage_vol_factor),
        ] {
            if !(value >= 0.0) {
                return Err(ParamError::NegativeRate(name, value));
            }
        }
        if self.rebalance_freq == 0 {
            return Err(ParamError::InvalidRebalanceFreq);
        }
        Ok(())
    }
}

/// Multi-pair aggregation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Cap on the sum of absolute pair positions at each timestep
    pub max_leverage: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self { max_leverage: 3.0 }
    }
}

impl PortfolioConfig {
    pub fn validate(&self) -> Result<(), ParamError> {
        if !(self.max_leverage > 0.0) {
            return Err(ParamError::InvalidLeverage(self.max_leverage));
        }
        Ok(())
    }
}

/// How the risk overlay treats history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskMode {
    /// Whole-series ex-post controls: a drawdown breach zeroes the entire
    /// PnL history and leverage is clamped by one global scalar.
    #[default]
    Retroactive,
    /// Causal controls: PnL is frozen from the first breach onward and
    /// leverage is scaled per timestep over a trailing window.
    ForwardOnly,
}

/// Portfolio risk overlay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Drawdown fraction that halts the strategy
    pub max_drawdown: f64,
    pub max_leverage: f64,
    pub mode: RiskMode,
    /// Trailing window for forward-only leverage scaling
    pub leverage_window: usize,
    /// Per-pair z-score stop fed to the signal engine
    pub pair_stop_zscore: Option<f64>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_drawdown: 0.2,
            max_leverage: 3.0,
            mode: RiskMode::Retroactive,
            leverage_window: 20,
            pair_stop_zscore: None,
        }
    }
}

impl RiskConfig {
    pub fn with_mode(mut self, mode: RiskMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        if !(self.max_drawdown > 0.0) || self.max_drawdown > 1.0 {
            return Err(ParamError::InvalidDrawdown(self.max_drawdown));
        }
        if !(self.max_leverage > 0.0) {
            return Err(ParamError::InvalidLeverage(self.max_leverage));
        }
        if self.leverage_window == 0 {
            return Err(ParamError::InvalidWindow(self.leverage_window));
        }
        Ok(())
    }
}

/// Robustness suite settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub fdr_alpha: f64,
    pub fdr_method: FdrMethod,
    /// Number of contiguous subperiods for stability checks
    pub n_splits: usize,
    pub entry_range: Vec<f64>,
    pub exit_range: Vec<f64>,
    /// Max-hold values to sweep; 0 means no holding limit (see [`max_hold_option`])
    pub max_hold_range: Vec<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fdr_alpha: 0.05,
            fdr_method: FdrMethod::IndependentThreshold,
            n_splits: 4,
            entry_range: vec![1.5, 2.0, 2.5],
            exit_range: vec![0.0, 0.5],
            max_hold_range: vec![0, 10, 20],
        }
    }
}

/// Map a swept max-hold value to a signal limit, with 0 meaning no limit
///
/// This departs from the research scripts, where a max hold of 0 closes a
/// position after its first held step. That behavior is `Some(1)` here.
pub fn max_hold_option(max_hold: usize) -> Option<usize> {
    if max_hold == 0 {
        None
    } else {
        Some(max_hold)
    }
}

impl ValidationConfig {
    /// Max-hold range with the 0 sentinel mapped to "unbounded"
    /// (see [`max_hold_option`])
    pub fn max_hold_options(&self) -> Vec<Option<usize>> {
        self.max_hold_range.iter().map(|&h| max_hold_option(h)).collect()
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        if self.fdr_alpha <= 0.0 || self.fdr_alpha >= 1.0 {
            return Err(ParamError::InvalidSignificance(self.fdr_alpha));
        }
        if self.n_splits == 0 {
            return Err(ParamError::InvalidSplits);
        }
        if self.entry_range.is_empty() || self.exit_range.is_empty() || self.max_hold_range.is_empty()
        {
            return Err(ParamError::EmptySweepRange);
        }
        Ok(())
    }
}

/// Parameter validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("Invalid significance level: {0} (must be 0 < alpha < 1)")]
    InvalidSignificance(f64),
    #[error("Invalid window: {0}")]
    InvalidWindow(usize),
    #[error("Invalid entry threshold: {0} (must be > 0)")]
    InvalidEntryThreshold(f64),
    #[error("Invalid exit threshold: {0} (must be 0 <= exit < entry {1})")]
    InvalidExitThreshold(f64, f64),
    #[error("Invalid max hold: 0 (use None for no limit)")]
    InvalidMaxHold,
    #[error("Invalid stop threshold: {0} (must exceed entry {1})")]
    InvalidStopThreshold(f64, f64),
    #[error("Invalid half-life bounds: [{0}, {1}]")]
    InvalidHalfLifeBounds(f64, f64),
    #[error("Invalid capital: {0} (must be > 0)")]
    InvalidCapital(f64),
    #[error("Invalid target volatility: {0} (must be > 0)")]
    InvalidTargetVol(f64),
    #[error("Invalid {0}: {1} (must be >= 0)")]
    NegativeRate(&'static str, f64),
    #[error("Invalid rebalance frequency: 0")]
    InvalidRebalanceFreq,
    #[error("Invalid max leverage: {0} (must be > 0)")]
    InvalidLeverage(f64),
    #[error("Invalid max drawdown: {0} (must be 0 < dd <= 1)")]
    InvalidDrawdown(f64),
    #[error("Invalid number of subperiods: 0")]
    InvalidSplits,
    #[error("Sweep ranges must not be empty")]
    EmptySweepRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SelectionConfig::default().validate().is_ok());
        assert!(SignalConfig::default().validate().is_ok());
        assert!(QualityGate::default().validate().is_ok());
        assert!(AllocationConfig::default().validate().is_ok());
        assert!(ExecutionConfig::default().validate().is_ok());
        assert!(PortfolioConfig::default().validate().is_ok());
        assert!(RiskConfig::default().validate().is_ok());
        assert!(ValidationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_pipeline_allocation_in_equity_units() {
        // Portfolio PnL is added to an equity curve starting at 1.0
        assert_eq!(AllocationConfig::default().capital, PIPELINE_CAPITAL);
        assert_eq!(PIPELINE_CAPITAL, 1.0);
    }

    #[test]
    fn test_signal_config_builder() {
        let config = SignalConfig::default()
            .with_entry(2.5)
            .with_exit(0.25)
            .with_max_hold(Some(10))
            .with_min_gap(3);
        assert_eq!(config.entry_threshold, 2.5);
        assert_eq!(config.exit_threshold, 0.25);
        assert_eq!(config.max_hold, Some(10));
        assert_eq!(config.min_gap, 3);
    }

    #[test]
    fn test_invalid_thresholds() {
        let config = SignalConfig::default().with_entry(0.0);
        assert!(matches!(
            config.validate(),
            Err(ParamError::InvalidEntryThreshold(_))
        ));

        let config = SignalConfig::default().with_exit(2.0);
        assert!(matches!(
            config.validate(),
            Err(ParamError::InvalidExitThreshold(_, _))
        ));

        let config = SignalConfig::default().with_stop(Some(1.5));
        assert!(matches!(
            config.validate(),
            Err(ParamError::InvalidStopThreshold(_, _))
        ));

        let config = SignalConfig::default().with_max_hold(Some(0));
        assert_eq!(config.validate(), Err(ParamError::InvalidMaxHold));
    }

    #[test]
    fn test_risk_config_validation() {
        let mut risk = RiskConfig::default();
        risk.max_drawdown = 0.0;
        assert!(risk.validate().is_err());

        let mut risk = RiskConfig::default();
        risk.leverage_window = 0;
        assert!(risk.validate().is_err());
    }

    #[test]
    fn test_max_hold_zero_means_unbounded() {
        use crate::domain::signal::Signal::{Flat, Short};
        use crate::strategy::signal_engine::SignalEngine;

        assert_eq!(max_hold_option(0), None);
        assert_eq!(max_hold_option(7), Some(7));

        // Exit after the first held step is spelled Some(1)
        let z = [3.0, 3.0, 3.0];
        let one = SignalConfig::default().with_max_hold(max_hold_option(1));
        assert_eq!(SignalEngine::new(one).generate(&z), vec![Short, Flat, Short]);

        let unbounded = SignalConfig::default().with_max_hold(max_hold_option(0));
        assert_eq!(SignalEngine::new(unbounded).generate(&z), vec![Short; 3]);
    }

    #[test]
    fn test_max_hold_options() {
        let validation = ValidationConfig::default();
        assert_eq!(
            validation.max_hold_options(),
            vec![None, Some(10), Some(20)]
        );
    }

    #[test]
    fn test_execution_validation() {
        let mut exec = ExecutionConfig::default();
        exec.rebalance_freq = 0;
        assert_eq!(exec.validate(), Err(ParamError::InvalidRebalanceFreq));

        let mut exec = ExecutionConfig::default();
        exec.half_spread = -0.1;
        assert!(matches!(
            exec.validate(),
            Err(ParamError::NegativeRate("half_spread", _))
        ));
    }
}
