//! Spread Diagnostics
//!
//! Mean-reversion quality measures for a candidate spread:
//! - half-life: periods for a deviation to decay by half, from the AR(1)
//!   fit ds_t = a + b * s_{t-1}, half_life = -ln(2) / b
//! - Hurst exponent: twice the log-log slope of lagged-difference dispersion
//!   against lag. On this scale a random walk sits near 1.0 and a
//!   stationary spread near 0; the usual "0.5 = random walk" reading of
//!   the classical exponent does not apply.
//! - ADF stationarity test
//!
//! Zero reversion speed is a valid outcome, reported as a NaN half-life.

use serde::{Deserialize, Serialize};

use crate::domain::error::{ensure_finite, ensure_min_len, AnalysisError, DataError, StatisticalTestError};
use crate::strategy::params::QualityGate;
use crate::strategy::stationarity::{adf_test, AdfResult};
use crate::strategy::stats::{diff, linear_fit, population_std};

/// Smallest series the Hurst estimate accepts
pub const MIN_HURST_SAMPLES: usize = 6;

/// Default lag cap for the Hurst estimate
pub const DEFAULT_HURST_MAX_LAG: usize = 100;

/// Half-life of mean reversion (NaN when the fitted speed is exactly zero)
pub fn half_life(spread: &[f64]) -> Result<f64, AnalysisError> {
    ensure_finite("spread", spread)?;
    ensure_min_len("spread", spread, 3)?;

    let lagged = &spread[..spread.len() - 1];
    let delta = diff(spread);
    let (speed, _) = linear_fit(lagged, &delta).ok_or_else(|| StatisticalTestError::SingularRegression {
        series: "half-life (constant spread)".to_string(),
    })?;

    if speed == 0.0 {
        return Ok(f64::NAN);
    }
    Ok(-std::f64::consts::LN_2 / speed)
}

/// Hurst exponent from the dispersion of lagged differences
///
/// Lags run over [2, min(max_lag, n/2)). When fewer than two lags are
/// available, or a lag shows zero dispersion, the scaling fit is undefined
/// and NaN is returned.
pub fn hurst_exponent(ts: &[f64], max_lag: usize) -> Result<f64, DataError> {
    ensure_min_len("hurst series", ts, MIN_HURST_SAMPLES)?;
    ensure_finite("hurst series", ts)?;

    let cap = max_lag.min(ts.len() / 2);
    if cap < 4 {
        return Ok(f64::NAN);
    }

    let mut log_lags = Vec::with_capacity(cap - 2);
    let mut log_tau = Vec::with_capacity(cap - 2);
    for lag in 2..cap {
        let diffs: Vec<f64> = ts[lag..].iter().zip(ts).map(|(a, b)| a - b).collect();
        let tau = population_std(&diffs);
        if !(tau > 0.0) {
            return Ok(f64::NAN);
        }
        log_lags.push((lag as f64).ln());
        log_tau.push(tau.ln());
    }

    Ok(linear_fit(&log_lags, &log_tau)
        .map(|(slope, _)| slope * 2.0)
        .unwrap_or(f64::NAN))
}

/// All diagnostics for one spread
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadQuality {
    pub half_life: f64,
    pub hurst: f64,
    pub adf: AdfResult,
}

impl SpreadQuality {
    /// First failed criterion, if any
    pub fn rejection_reason(&self, gate: &QualityGate) -> Option<String> {
        if !(self.adf.p_value < gate.max_adf_p_value) {
            return Some(format!(
                "ADF p-value {:.4} >= {:.4}",
                self.adf.p_value, gate.max_adf_p_value
            ));
        }
        if !(self.half_life >= gate.min_half_life && self.half_life <= gate.max_half_life) {
            return Some(format!(
                "half-life {:.2} outside [{:.1}, {:.1}]",
                self.half_life, gate.min_half_life, gate.max_half_life
            ));
        }
        if !(self.hurst < gate.max_hurst) {
            return Some(format!("Hurst {:.3} >= {:.3}", self.hurst, gate.max_hurst));
        }
        None
    }

    /// Spread is tradable under the gate
    pub fn passes(&self, gate: &QualityGate) -> bool {
        self.rejection_reason(gate).is_none()
    }
}

/// Run every diagnostic on a spread
pub fn evaluate(spread: &[f64], hurst_max_lag: usize) -> Result<SpreadQuality, AnalysisError> {
    let half_life = half_life(spread)?;
    let hurst = hurst_exponent(spread, hurst_max_lag)?;
    let adf = adf_test(spread)?;

    Ok(SpreadQuality {
        half_life,
        hurst,
        adf,
    })
}
