//! Augmented Dickey-Fuller Test
//!
//! Regression: dy_t = [c] + gamma * y_{t-1} + sum_i phi_i * dy_{t-i} + e_t
//! H0: gamma = 0 (unit root). The statistic is the t-value of gamma.
//!
//! Lag order is chosen by AIC over 0..=maxlag on a common sample, then the
//! regression is refit with the chosen lag on all available rows. P-values
//! come from MacKinnon's (1994) response surfaces.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::domain::error::{ensure_finite, AnalysisError, DataError, StatisticalTestError};
use crate::strategy::stats::{diff, ols};

/// Deterministic terms in the test regression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deterministic {
    /// No constant (Engle-Granger residuals are already demeaned)
    None,
    Constant,
}

impl Deterministic {
    fn n_terms(self) -> usize {
        match self {
            Deterministic::None => 0,
            Deterministic::Constant => 1,
        }
    }
}

/// ADF outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    pub statistic: f64,
    pub p_value: f64,
    /// Augmentation lags selected by AIC
    pub used_lag: usize,
    /// Rows in the final regression
    pub nobs: usize,
}

impl AdfResult {
    pub fn is_stationary(&self, significance: f64) -> bool {
        self.p_value < significance
    }
}

/// Response-surface coefficients for one (regression, N) cell
struct MacKinnonSurface {
    max_stat: f64,
    min_stat: f64,
    star_stat: f64,
    small_p: [f64; 3],
    large_p: [f64; 4],
}

/// Constant-only regression, N = 1 (plain ADF) and N = 2 (two-variable
/// Engle-Granger). Large-p coefficients are already scaled.
const TAU_C: [MacKinnonSurface; 2] = [
    MacKinnonSurface {
        max_stat: 2.74,
        min_stat: -18.83,
        star_stat: -1.61,
        small_p: [2.1659, 1.4412, 0.038269],
        large_p: [1.7339, 0.93202, -0.12745, -0.010368],
    },
    MacKinnonSurface {
        max_stat: 0.92,
        min_stat: -18.86,
        star_stat: -2.62,
        small_p: [2.92, 1.5012, 0.039796],
        large_p: [2.1945, 0.64695, -0.29198, -0.042377],
    },
];

fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn standard_normal_cdf(x: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(x),
        Err(_) => f64::NAN,
    }
}

/// Approximate asymptotic p-value for a constant-regression tau statistic
///
/// `n_vars` is 1 for a unit-root test and 2 for a bivariate cointegration
/// test; other values yield NaN.
pub fn mackinnon_p_value(statistic: f64, n_vars: usize) -> f64 {
    let Some(surface) = n_vars.checked_sub(1).and_then(|i| TAU_C.get(i)) else {
        return f64::NAN;
    };
    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic > surface.max_stat {
        return 1.0;
    }
    if statistic < surface.min_stat {
        return 0.0;
    }
    let z = if statistic <= surface.star_stat {
        polyval(&surface.small_p, statistic)
    } else {
        polyval(&surface.large_p, statistic)
    };
    standard_normal_cdf(z)
}

/// Default lag cap: ceil(12 * (n/100)^(1/4)), bounded by the sample size
fn default_max_lag(n: usize, deterministic: Deterministic) -> Option<usize> {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    let bound = (n / 2).checked_sub(deterministic.n_terms() + 1)?;
    Some(schwert.min(bound))
}

/// Design for a given lag: rows t in lag..diffs.len()
///
/// Columns: [y_{t}, dy_{t-1}, ..., dy_{t-lag}] (+ constant last), target dy_t.
/// Only the first `cols` lag columns are kept (used for the AIC search).
fn adf_design(
    levels: &[f64],
    diffs: &[f64],
    start: usize,
    lags: usize,
    deterministic: Deterministic,
) -> (DMatrix<f64>, DVector<f64>) {
    let rows = diffs.len() - start;
    let cols = 1 + lags + deterministic.n_terms();
    let design = DMatrix::from_fn(rows, cols, |r, c| {
        let t = start + r;
        if c == 0 {
            levels[t]
        } else if c <= lags {
            diffs[t - c]
        } else {
            1.0
        }
    });
    let target = DVector::from_iterator(rows, diffs[start..].iter().copied());
    (design, target)
}

/// ADF with AIC lag selection and explicit deterministic terms
pub fn adf_statistic(
    series: &[f64],
    deterministic: Deterministic,
    name: &str,
) -> Result<AdfResult, AnalysisError> {
    ensure_finite(name, series)?;
    let n = series.len();
    let max_lag = default_max_lag(n, deterministic).ok_or_else(|| DataError::InsufficientSamples {
        series: name.to_string(),
        needed: 2 * (deterministic.n_terms() + 1),
        got: n,
    })?;

    let diffs = diff(series);

    // Search on the common sample that the largest lag allows
    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=max_lag {
        let (design, target) = adf_design(series, &diffs, max_lag, lag, deterministic);
        let fit = ols(&design, &target, name)?;
        let aic = fit.aic();
        if best.map_or(true, |(best_aic, _)| aic < best_aic) {
            best = Some((aic, lag));
        }
    }
    let used_lag = best.map(|(_, lag)| lag).unwrap_or(0);

    let (design, target) = adf_design(series, &diffs, used_lag, used_lag, deterministic);
    let fit = ols(&design, &target, name)?;
    let statistic = fit.t_value(0);
    if statistic.is_nan() {
        return Err(StatisticalTestError::NonConvergent {
            series: name.to_string(),
            reason: "undefined unit-root t-statistic".to_string(),
        }
        .into());
    }

    Ok(AdfResult {
        statistic,
        p_value: mackinnon_p_value(statistic, 1),
        used_lag,
        nobs: fit.nobs,
    })
}

/// ADF test with a constant, as used for stationarity diagnostics
pub fn adf_test(series: &[f64]) -> Result<AdfResult, AnalysisError> {
    adf_statistic(series, Deterministic::Constant, "series")
}
