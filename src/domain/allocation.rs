//! Capital Allocation
//!
//! Turns {-1, 0, 1} signals into dollar positions.
//!
//! The long half of the capital is split equally across every long entry
//! of the input slice and the short half across every short entry. When the
//! slice is a time series this is a whole-sample split, like the volatility
//! scale below: neither adapts over time.

use serde::{Deserialize, Serialize};

use super::error::{ensure_finite, ensure_min_len, DataError};
use super::signal::Signal;
use crate::strategy::params::AllocationConfig;
use crate::strategy::stats::{nan_std, pct_change};

/// Dollar-neutral split of `capital`
///
/// An empty side keeps a denominator of 1, so the other side still gets
/// `capital / 2 / count` rather than NaN.
pub fn dollar_neutral_allocation(signals: &[Signal], capital: f64) -> Vec<f64> {
    let n_longs = signals.iter().filter(|s| **s == Signal::Long).count().max(1);
    let n_shorts = signals.iter().filter(|s| **s == Signal::Short).count().max(1);

    let long_size = capital / 2.0 / n_longs as f64;
    let short_size = -(capital / 2.0 / n_shorts as f64);

    signals
        .iter()
        .map(|s| match s {
            Signal::Long => long_size,
            Signal::Short => short_size,
            Signal::Flat => 0.0,
        })
        .collect()
}

/// Scalar that brings the full-sample daily return volatility of `prices`
/// to `target_vol` (1 when the prices do not move)
pub fn volatility_scale(prices: &[f64], target_vol: f64) -> Result<f64, DataError> {
    ensure_finite("prices", prices)?;
    ensure_min_len("prices", prices, 2)?;

    let vol = nan_std(&pct_change(prices));
    Ok(if vol > 0.0 { target_vol / vol } else { 1.0 })
}

/// Dollar-neutral allocation scaled to a volatility target
pub fn volatility_targeting(
    signals: &[Signal],
    prices: &[f64],
    target_vol: f64,
    capital: f64,
) -> Result<Vec<f64>, DataError> {
    scaled_allocation(signals, prices, target_vol, capital).map(|a| a.positions)
}

fn scaled_allocation(
    signals: &[Signal],
    prices: &[f64],
    target_vol: f64,
    capital: f64,
) -> Result<Allocation, DataError> {
    if signals.len() != prices.len() {
        return Err(DataError::LengthMismatch {
            left: signals.len(),
            right: prices.len(),
        });
    }
    let scale = volatility_scale(prices, target_vol)?;
    let positions = dollar_neutral_allocation(signals, capital)
        .into_iter()
        .map(|p| p * scale)
        .collect();
    Ok(Allocation { positions, scale })
}

/// Allocation summary for one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub positions: Vec<f64>,
    /// Volatility scale applied on top of the dollar-neutral split
    pub scale: f64,
}

/// Sizes positions from a fixed allocation config
#[derive(Debug, Clone, Default)]
pub struct AllocationEngine {
    config: AllocationConfig,
}

impl AllocationEngine {
    pub fn new(config: AllocationConfig) -> Self {
        Self { config }
    }

    pub fn dollar_neutral(&self, signals: &[Signal]) -> Vec<f64> {
        dollar_neutral_allocation(signals, self.config.capital)
    }

    pub fn volatility_targeted(&self, signals: &[Signal], prices: &[f64]) -> Result<Allocation, DataError> {
        scaled_allocation(signals, prices, self.config.target_vol, self.config.capital)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Signal::{Flat, Long, Short};
    use approx::assert_relative_eq;

    #[test]
    fn test_sides_sum_to_half_capital() {
        let signals = [Long, Short, Flat, Long, Short, Short];
        let positions = dollar_neutral_allocation(&signals, 100_000.0);

        let long: f64 = positions.iter().filter(|p| **p > 0.0).sum();
        let short: f64 = positions.iter().filter(|p| **p < 0.0).sum();
        assert_relative_eq!(long, 50_000.0, epsilon = 1e-9);
        assert_relative_eq!(short, -50_000.0, epsilon = 1e-9);
        assert_eq!(positions[2], 0.0);
    }

    #[test]
    fn test_empty_side_is_floored() {
        let positions = dollar_neutral_allocation(&[Long, Long, Flat], 1_000.0);
        assert_eq!(positions, vec![250.0, 250.0, 0.0]);

        let positions = dollar_neutral_allocation(&[Flat, Flat], 1_000.0);
        assert_eq!(positions, vec![0.0, 0.0]);
    }

    #[test]
    fn test_position_sign_follows_signal() {
        let signals = [Short, Flat, Long];
        let prices = [100.0, 101.0, 99.0];
        let positions = volatility_targeting(&signals, &prices, 0.02, 1.0).unwrap();
        assert!(positions[0] < 0.0);
        assert_eq!(positions[1], 0.0);
        assert!(positions[2] > 0.0);
    }

    #[test]
    fn test_volatility_scale() {
        // Returns alternate +1% / -1%
        let mut prices = vec![100.0];
        for i in 0..100 {
            let last = prices[prices.len() - 1];
            prices.push(if i % 2 == 0 { last * 1.01 } else { last * 0.99 });
        }
        let returns: Vec<f64> = pct_change(&prices).into_iter().skip(1).collect();
        let vol = crate::strategy::stats::sample_std(&returns);
        assert_relative_eq!(volatility_scale(&prices, 0.02).unwrap(), 0.02 / vol, epsilon = 1e-12);

        // Flat prices fall back to no scaling
        assert_eq!(volatility_scale(&[5.0, 5.0, 5.0], 0.02).unwrap(), 1.0);
    }

    #[test]
    fn test_length_mismatch() {
        let err = volatility_targeting(&[Long], &[1.0, 2.0], 0.02, 1.0).unwrap_err();
        assert!(matches!(err, DataError::LengthMismatch { .. }));
    }

    #[test]
    fn test_engine_uses_config() {
        let engine = AllocationEngine::new(AllocationConfig {
            capital: 2.0,
            target_vol: 0.02,
        });
        assert_eq!(engine.dollar_neutral(&[Long, Short]), vec![1.0, -1.0]);
        let allocation = engine.volatility_targeted(&[Long, Short], &[10.0, 10.0]).unwrap();
        assert_eq!(allocation.scale, 1.0);
        assert_eq!(allocation.positions, vec![1.0, -1.0]);
    }

    #[test]
    fn test_engine_positions_carry_reported_scale() {
        let engine = AllocationEngine::new(AllocationConfig {
            capital: 2.0,
            target_vol: 0.02,
        });
        let signals = [Long, Flat, Short, Flat];
        let prices = [100.0, 101.0, 99.5, 100.5];

        let allocation = engine.volatility_targeted(&signals, &prices).unwrap();
        let unscaled = engine.dollar_neutral(&signals);

        assert_relative_eq!(allocation.scale, volatility_scale(&prices, 0.02).unwrap());
        for (scaled, raw) in allocation.positions.iter().zip(&unscaled) {
            assert_relative_eq!(*scaled, raw * allocation.scale);
        }
        assert_eq!(
            allocation.positions,
            volatility_targeting(&signals, &prices, 0.02, 2.0).unwrap()
        );
    }
}
