//! Performance Metrics
//!
//! Scalar statistics of a periodic return series, annualized with 252
//! trading days. NaN periods are skipped. A zero denominator is not
//! special-cased except for Calmar, which is NaN without a drawdown.

use serde::{Deserialize, Serialize};

use crate::strategy::stats::{cummax, nan_max, nan_mean, nan_std, pct_change};

pub const TRADING_DAYS: f64 = 252.0;

/// Compounded equity curve starting from 1
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    let mut level = 1.0;
    returns
        .iter()
        .map(|r| {
            if !r.is_nan() {
                level *= 1.0 + r;
            }
            level
        })
        .collect()
}

/// Annualized Sharpe ratio
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    (nan_mean(returns) - risk_free_rate) / nan_std(returns) * TRADING_DAYS.sqrt()
}

/// Annualized Sortino ratio (std of negative periods only)
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    (nan_mean(returns) - risk_free_rate) / nan_std(&downside) * TRADING_DAYS.sqrt()
}

/// Largest peak-to-trough fraction of the compounded equity curve
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let cumulative = cumulative_returns(returns);
    let drawdown: Vec<f64> = cummax(&cumulative)
        .iter()
        .zip(&cumulative)
        .map(|(peak, value)| (peak - value) / peak)
        .collect();
    nan_max(&drawdown)
}

/// Annualized mean equity growth over max drawdown (NaN if no drawdown)
pub fn calmar_ratio(returns: &[f64]) -> f64 {
    let max_dd = max_drawdown(returns);
    if !(max_dd > 0.0) {
        return f64::NAN;
    }
    let growth = pct_change(&cumulative_returns(returns));
    nan_mean(&growth) * TRADING_DAYS / max_dd
}

/// Fraction of periods with a positive return
pub fn hit_rate(returns: &[f64]) -> f64 {
    let wins = returns.iter().filter(|r| **r > 0.0).count();
    wins as f64 / returns.len() as f64
}

/// Sum of absolute position changes
pub fn turnover(positions: &[f64]) -> f64 {
    positions
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .filter(|v| !v.is_nan())
        .sum()
}

/// All metrics for one return series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    pub max_drawdown: f64,
    pub hit_rate: f64,
    /// Present when the position path was supplied
    pub turnover: Option<f64>,
    pub total_return: f64,
    pub periods: usize,
}

impl PerformanceRecord {
    pub fn from_returns(returns: &[f64], positions: Option<&[f64]>) -> Self {
        let total_return = cumulative_returns(returns)
            .last()
            .map_or(0.0, |level| level - 1.0);

        Self {
            sharpe: sharpe_ratio(returns, 0.0),
            sortino: sortino_ratio(returns, 0.0),
            calmar: calmar_ratio(returns),
            max_drawdown: max_drawdown(returns),
            hit_rate: hit_rate(returns),
            turnover: positions.map(turnover),
            total_return,
            periods: returns.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::stats::{mean, sample_std};
    use approx::assert_relative_eq;

    const RETURNS: [f64; 6] = [0.01, -0.02, 0.015, 0.0, -0.005, 0.02];

    #[test]
    fn test_sharpe_matches_definition() {
        let expected = mean(&RETURNS) / sample_std(&RETURNS) * 252.0_f64.sqrt();
        assert_relative_eq!(sharpe_ratio(&RETURNS, 0.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_sortino_uses_downside_only() {
        let downside = sample_std(&[-0.02, -0.005]);
        let expected = mean(&RETURNS) / downside * 252.0_f64.sqrt();
        assert_relative_eq!(sortino_ratio(&RETURNS, 0.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_max_drawdown() {
        // 1.0 -> 1.1 -> 0.88 -> 0.968
        let dd = max_drawdown(&[0.1, -0.2, 0.1]);
        assert_relative_eq!(dd, 0.2, epsilon = 1e-12);
        assert_eq!(max_drawdown(&[0.01, 0.02]), 0.0);
    }

    #[test]
    fn test_calmar_nan_without_drawdown() {
        assert!(calmar_ratio(&[0.01, 0.02, 0.0]).is_nan());
        let returns = [0.1, -0.2, 0.1];
        // Growth of the equity curve drops the first period
        let expected = mean(&returns[1..]) * 252.0 / 0.2;
        assert_relative_eq!(calmar_ratio(&returns), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_hit_rate_and_turnover() {
        assert_relative_eq!(hit_rate(&RETURNS), 0.5);
        assert_relative_eq!(turnover(&[0.0, 1.0, -1.0, -1.0, 0.5]), 4.5);
    }

    #[test]
    fn test_record() {
        let positions = [0.0, 1.0, 1.0, 0.0, 0.0, -1.0];
        let record = PerformanceRecord::from_returns(&RETURNS, Some(&positions[..]));
        assert_eq!(record.periods, 6);
        assert_eq!(record.turnover, Some(3.0));
        assert_relative_eq!(record.sharpe, sharpe_ratio(&RETURNS, 0.0));

        let without = PerformanceRecord::from_returns(&RETURNS, None);
        assert!(without.turnover.is_none());
        let json = serde_json::to_string(&without).unwrap();
        assert!(json.contains("\"turnover\":null"));
    }
}
