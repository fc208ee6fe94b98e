//! Portfolio Risk Overlay
//!
//! Drawdown kill-switch and leverage clamp on whole series.
//!
//! `RiskMode::Retroactive` keeps the ex-post behavior: a breach at the last
//! timestep zeroes the entire PnL history, and leverage is clamped by one
//! scalar computed over the full series. Neither can be reproduced inside a
//! forward simulation, so `RiskMode::ForwardOnly` offers causal versions:
//! PnL freezes at the first breach and leverage is scaled per timestep over
//! a trailing window.

use serde::{Deserialize, Serialize};

use super::error::{ensure_finite, DataError};
use crate::strategy::params::{RiskConfig, RiskMode};
use crate::strategy::stats::cummax;

/// Drawdown fraction relative to the running peak
pub fn drawdown_series(equity: &[f64]) -> Vec<f64> {
    cummax(equity)
        .iter()
        .zip(equity)
        .map(|(peak, value)| (peak - value) / peak)
        .collect()
}

/// Mutable risk status, owned by the manager
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    /// Drawdown at the last evaluated timestep
    pub drawdown: f64,
    pub halted: bool,
    /// First timestep affected by the halt
    pub halted_from: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct RiskManager {
    config: RiskConfig,
    state: RiskState,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            state: RiskState::default(),
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn state(&self) -> &RiskState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = RiskState::default();
    }

    /// Apply the drawdown stop to a cumulative PnL (equity) series
    ///
    /// Each call starts from a clear state; the result describes this
    /// series only.
    pub fn enforce_drawdown(&mut self, pnl: &[f64]) -> Result<Vec<f64>, DataError> {
        self.reset();
        ensure_finite("pnl", pnl)?;
        let drawdown = drawdown_series(pnl);
        let limit = self.config.max_drawdown;
        self.state.drawdown = drawdown.last().copied().unwrap_or(0.0);

        match self.config.mode {
            RiskMode::Retroactive => {
                if self.state.drawdown > limit {
                    tracing::warn!(
                        "Drawdown {:.2}% exceeds {:.2}%: halting, PnL history zeroed",
                        self.state.drawdown * 100.0,
                        limit * 100.0
                    );
                    self.state.halted = true;
                    self.state.halted_from = Some(0);
                    return Ok(vec![0.0; pnl.len()]);
                }
                Ok(pnl.to_vec())
            }
            RiskMode::ForwardOnly => {
                let Some(breach) = drawdown.iter().position(|dd| *dd > limit) else {
                    return Ok(pnl.to_vec());
                };
                tracing::warn!(
                    "Drawdown {:.2}% exceeds {:.2}% at step {}: halting from breach",
                    drawdown[breach] * 100.0,
                    limit * 100.0,
                    breach
                );
                self.state.halted = true;
                self.state.halted_from = Some(breach);
                let frozen = pnl[breach];
                let mut out = pnl.to_vec();
                out[breach..].iter_mut().for_each(|v| *v = frozen);
                self.state.drawdown = drawdown[breach];
                Ok(out)
            }
        }
    }

    /// Scaling factors the leverage clamp applies at each timestep
    pub fn leverage_scaling(&self, positions: &[f64], max_leverage: Option<f64>) -> Vec<f64> {
        let cap = max_leverage.unwrap_or(self.config.max_leverage);
        match self.config.mode {
            RiskMode::Retroactive => {
                let total: f64 = positions.iter().map(|p| p.abs()).sum();
                let scale = if total > cap { cap / total } else { 1.0 };
                vec![scale; positions.len()]
            }
            RiskMode::ForwardOnly => {
                let window = self.config.leverage_window.max(1);
                let mut running = 0.0;
                (0..positions.len())
                    .map(|t| {
                        running += positions[t].abs();
                        if t >= window {
                            running -= positions[t - window].abs();
                        }
                        if running > cap {
                            cap / running
                        } else {
                            1.0
                        }
                    })
                    .collect()
            }
        }
    }

    /// Clamp leverage, optionally overriding the configured cap
    pub fn enforce_leverage(&self, positions: &[f64], max_leverage: Option<f64>) -> Vec<f64> {
        let scaling = self.leverage_scaling(positions, max_leverage);
        if let Some(min) = scaling.iter().copied().reduce(f64::min) {
            if min < 1.0 {
                tracing::warn!(
                    "Leverage clamp applied (smallest scale {:.4}, cap {:.2})",
                    min,
                    max_leverage.unwrap_or(self.config.max_leverage)
                );
            }
        }
        positions.iter().zip(&scaling).map(|(p, s)| p * s).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn manager(mode: RiskMode) -> RiskManager {
        RiskManager::new(RiskConfig::default().with_mode(mode))
    }

    #[test]
    fn test_retroactive_halt_zeroes_history() {
        let mut risk = manager(RiskMode::Retroactive);
        let pnl = [1.0, 1.2, 1.1, 0.9];
        let out = risk.enforce_drawdown(&pnl).unwrap();
        assert_eq!(out, vec![0.0; 4]);
        assert!(risk.state().halted);
        assert_relative_eq!(risk.state().drawdown, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_recovered_drawdown_passes_through() {
        // A 40% dip that recovers by the last step does not trip the stop
        let mut risk = manager(RiskMode::Retroactive);
        let pnl = [1.0, 0.6, 1.0];
        assert_eq!(risk.enforce_drawdown(&pnl).unwrap(), pnl.to_vec());
        assert!(!risk.state().halted);
    }

    #[test]
    fn test_reused_manager_clears_previous_halt() {
        for mode in [RiskMode::Retroactive, RiskMode::ForwardOnly] {
            let mut risk = manager(mode);
            risk.enforce_drawdown(&[1.0, 1.2, 1.1, 0.9]).unwrap();
            assert!(risk.state().halted);

            let healthy = [1.0, 1.05, 1.1];
            assert_eq!(risk.enforce_drawdown(&healthy).unwrap(), healthy.to_vec());
            assert!(!risk.state().halted);
            assert_eq!(risk.state().halted_from, None);
            assert_eq!(risk.state().drawdown, 0.0);
        }
    }

    #[test]
    fn test_forward_only_freezes_from_breach() {
        let mut risk = manager(RiskMode::ForwardOnly);
        let pnl = [1.0, 0.6, 1.0, 1.3];
        let out = risk.enforce_drawdown(&pnl).unwrap();
        assert_eq!(out, vec![1.0, 0.6, 0.6, 0.6]);
        assert_eq!(risk.state().halted_from, Some(1));
    }

    #[test]
    fn test_enforce_leverage_over_cap() {
        let risk = manager(RiskMode::Retroactive);
        let positions = [1.0, -2.0, 1.5, 0.5];
        let scaled = risk.enforce_leverage(&positions, None);
        let total: f64 = scaled.iter().map(|p| p.abs()).sum();
        assert_relative_eq!(total, 3.0, epsilon = 1e-12);
        assert_relative_eq!(scaled[1] / scaled[0], -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_enforce_leverage_under_cap_unchanged() {
        let risk = manager(RiskMode::Retroactive);
        let positions = [0.5, -1.0, 0.5];
        assert_eq!(risk.enforce_leverage(&positions, None), positions.to_vec());
        // Override tightens the cap
        let scaled = risk.enforce_leverage(&positions, Some(1.0));
        let total: f64 = scaled.iter().map(|p| p.abs()).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_forward_only_leverage_window() {
        let config = RiskConfig {
            max_leverage: 2.0,
            leverage_window: 4,
            ..RiskConfig::default().with_mode(RiskMode::ForwardOnly)
        };
        let risk = RiskManager::new(config);
        let scaling = risk.leverage_scaling(&[1.0; 6], None);
        let expected = [1.0, 1.0, 2.0 / 3.0, 0.5, 0.5, 0.5];
        for (s, e) in scaling.iter().zip(expected) {
            assert_relative_eq!(*s, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rejects_non_finite_pnl() {
        let mut risk = RiskManager::default();
        assert!(risk.enforce_drawdown(&[1.0, f64::NAN]).is_err());
    }
}
