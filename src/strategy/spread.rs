//! Spread Model
//!
//! Hedge ratio and normalized spread for a pair of price series.
//!
//! Spread: s = S1 - beta * S2, with beta the OLS slope of S1 on S2
//! Z-Score: z = (s - mean(s)) / std(s)
//!
//! The z-score is normalized over the whole sample, not a rolling window.
//! Used inside a walk-forward loop it carries look-ahead: every z_t already
//! knows the mean and std of the full horizon.

use serde::{Deserialize, Serialize};

use crate::domain::error::{ensure_finite, ensure_min_len, ensure_same_len, AnalysisError, StatisticalTestError};
use crate::strategy::stats::{linear_fit, mean, sample_std};

/// Spread of one pair with its normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadSeries {
    /// OLS hedge ratio used to build the spread
    pub hedge_ratio: f64,
    /// Raw spread S1 - beta * S2
    pub spread: Vec<f64>,
    /// Whole-sample z-score (all NaN when the spread has no variance)
    pub zscore: Vec<f64>,
    /// Mean used for normalization
    pub mean: f64,
    /// Sample standard deviation used for normalization
    pub std_dev: f64,
}

impl SpreadSeries {
    pub fn len(&self) -> usize {
        self.spread.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spread.is_empty()
    }

    /// Z-score at `t` is at or beyond the negative threshold
    pub fn is_oversold(&self, t: usize, threshold: f64) -> bool {
        self.zscore.get(t).is_some_and(|z| *z <= -threshold)
    }

    /// Z-score at `t` is at or beyond the positive threshold
    pub fn is_overbought(&self, t: usize, threshold: f64) -> bool {
        self.zscore.get(t).is_some_and(|z| *z >= threshold)
    }

    /// Spread change over the step, relative to the first leg's prior price
    pub fn unit_returns(&self, s1: &[f64]) -> Vec<f64> {
        let mut returns = vec![0.0; self.spread.len()];
        for t in 1..self.spread.len() {
            let base = s1[t - 1];
            returns[t] = if base != 0.0 {
                (self.spread[t] - self.spread[t - 1]) / base
            } else {
                0.0
            };
        }
        returns
    }
}

/// OLS slope of `s1` regressed on `s2`
pub fn compute_beta(s1: &[f64], s2: &[f64]) -> Result<f64, AnalysisError> {
    ensure_same_len(s1, s2)?;
    ensure_finite("S1", s1)?;
    ensure_finite("S2", s2)?;
    ensure_min_len("hedge ratio", s1, 2)?;

    let (slope, _) = linear_fit(s2, s1).ok_or_else(|| StatisticalTestError::SingularRegression {
        series: "hedge ratio (S2 is constant)".to_string(),
    })?;
    Ok(slope)
}

/// Whole-sample z-score of a series
///
/// Returns all-NaN when the standard deviation is zero or undefined.
pub fn zscore(values: &[f64]) -> (Vec<f64>, f64, f64) {
    let m = mean(values);
    let sd = sample_std(values);
    let z = if sd.is_finite() && sd > 0.0 {
        values.iter().map(|v| (v - m) / sd).collect()
    } else {
        vec![f64::NAN; values.len()]
    };
    (z, m, sd)
}

/// Build the hedged spread and its z-score
pub fn construct_spread(s1: &[f64], s2: &[f64]) -> Result<SpreadSeries, AnalysisError> {
    let hedge_ratio = compute_beta(s1, s2)?;
    let spread: Vec<f64> = s1
        .iter()
        .zip(s2)
        .map(|(a, b)| a - hedge_ratio * b)
        .collect();
    let (zscore, mean, std_dev) = zscore(&spread);

    Ok(SpreadSeries {
        hedge_ratio,
        spread,
        zscore,
        mean,
        std_dev,
    })
}
