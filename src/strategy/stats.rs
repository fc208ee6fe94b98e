//! Numerical helpers shared by the research modules
//!
//! Conventions follow the dataframe tooling the research was done in:
//! standard deviations are sample (n - 1) unless named `population_*`,
//! and return series keep a leading NaN so they stay aligned with prices.

use nalgebra::{DMatrix, DVector};
use statrs::statistics::Statistics;

use crate::domain::error::{AnalysisError, DataError, StatisticalTestError};

/// Arithmetic mean (NaN for empty input)
pub fn mean(values: &[f64]) -> f64 {
    values.iter().mean()
}

/// Sample standard deviation (NaN for fewer than 2 values)
pub fn sample_std(values: &[f64]) -> f64 {
    values.iter().std_dev()
}

pub fn population_std(values: &[f64]) -> f64 {
    values.iter().population_std_dev()
}

/// Mean over the finite entries only
pub fn nan_mean(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    mean(&finite)
}

/// Sample std over the finite entries only
pub fn nan_std(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sample_std(&finite)
}

/// Maximum ignoring NaN (NaN if nothing is comparable)
pub fn nan_max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NAN, f64::max)
}

/// First differences, length n - 1
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Period-over-period percentage change, length n with a leading NaN
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(f64::NAN);
    out.extend(values.windows(2).map(|w| w[1] / w[0] - 1.0));
    out
}

/// Running maximum
pub fn cummax(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&v| {
            if v > peak {
                peak = v;
            }
            peak
        })
        .collect()
}

/// Trailing sample std; NaN until the window is full of finite values
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|t| {
            if window == 0 || t + 1 < window {
                return f64::NAN;
            }
            let slice = &values[t + 1 - window..=t];
            if slice.iter().any(|v| !v.is_finite()) {
                f64::NAN
            } else {
                sample_std(slice)
            }
        })
        .collect()
}

/// Pearson correlation (NaN if either side has no variance)
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    let mx = mean(x);
    let my = mean(y);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    sxy / (sxx * syy).sqrt()
}

/// Degree-1 least squares fit `y = slope * x + intercept`
///
/// Returns `None` when `x` has no variance.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() < 2 || x.len() != y.len() {
        return None;
    }
    let mx = mean(x);
    let my = mean(y);
    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (&a, &b)| {
            (sxy + (a - mx) * (b - my), sxx + (a - mx) * (a - mx))
        });
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

/// Ordinary least squares result
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: DVector<f64>,
    pub std_errors: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Sum of squared residuals
    pub ssr: f64,
    pub nobs: usize,
}

impl OlsFit {
    pub fn t_value(&self, index: usize) -> f64 {
        self.coefficients[index] / self.std_errors[index]
    }

    /// Gaussian log-likelihood at the fitted coefficients
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion with one parameter per regressor
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.coefficients.len() as f64
    }
}

/// OLS via the normal equations
pub fn ols(
    design: &DMatrix<f64>,
    target: &DVector<f64>,
    series: &str,
) -> Result<OlsFit, AnalysisError> {
    let (nobs, k) = design.shape();
    if nobs <= k {
        return Err(DataError::InsufficientSamples {
            series: series.to_string(),
            needed: k + 1,
            got: nobs,
        }
        .into());
    }

    let xt = design.transpose();
    let xtx_inv = (&xt * design).try_inverse().ok_or_else(|| {
        StatisticalTestError::SingularRegression {
            series: series.to_string(),
        }
    })?;
    let coefficients = &xtx_inv * (&xt * target);
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(StatisticalTestError::NonConvergent {
            series: series.to_string(),
            reason: "non-finite coefficients".to_string(),
        }
        .into());
    }

    let residuals = target - design * &coefficients;
    let ssr = residuals.norm_squared();
    let sigma2 = ssr / (nobs - k) as f64;
    let std_errors = DVector::from_iterator(k, (0..k).map(|i| (sigma2 * xtx_inv[(i, i)]).sqrt()));

    Ok(OlsFit {
        coefficients,
        std_errors,
        residuals,
        ssr,
        nobs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_moments() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values), 5.0);
        assert_relative_eq!(population_std(&values), 2.0);
        assert_relative_eq!(sample_std(&values), (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert!(sample_std(&[1.0]).is_nan());
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_pct_change_keeps_alignment() {
        let r = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 3);
        assert!(r[0].is_nan());
        assert_relative_eq!(r[1], 0.1, epsilon = 1e-12);
        assert_relative_eq!(r[2], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_rolling_std_waits_for_full_window() {
        let r = pct_change(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let vol = rolling_std(&r, 5);
        assert!(vol[..5].iter().all(|v| v.is_nan()));
        assert!(vol[5].is_finite());
        assert!(vol[6].is_finite());
    }

    #[test]
    fn test_linear_fit() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];
        let (slope, intercept) = linear_fit(&x, &y).unwrap();
        assert_relative_eq!(slope, 2.0, epsilon = 1e-12);
        assert_relative_eq!(intercept, 1.0, epsilon = 1e-12);
        assert!(linear_fit(&[1.0, 1.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_ols_matches_closed_form() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.1, 3.9, 6.2, 7.8, 10.1];
        let design = DMatrix::from_fn(5, 2, |i, j| if j == 0 { 1.0 } else { x[i] });
        let fit = ols(&design, &DVector::from_column_slice(&y), "test").unwrap();
        let (slope, intercept) = linear_fit(&x, &y).unwrap();
        assert_relative_eq!(fit.coefficients[1], slope, epsilon = 1e-9);
        assert_relative_eq!(fit.coefficients[0], intercept, epsilon = 1e-9);
        assert!(fit.std_errors.iter().all(|s| *s > 0.0));
    }

    #[test]
    fn test_ols_rejects_short_and_singular_designs() {
        let design = DMatrix::from_element(2, 2, 1.0);
        let err = ols(&design, &DVector::from_element(2, 1.0), "short").unwrap_err();
        assert!(err.is_data_error());

        let design = DMatrix::from_fn(4, 2, |_, j| if j == 0 { 1.0 } else { 0.0 });
        let err = ols(&design, &DVector::from_element(4, 1.0), "flat").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::StatisticalTest(StatisticalTestError::SingularRegression { .. })
        ));
    }

    #[test]
    fn test_nan_aware_helpers() {
        let values = [f64::NAN, 1.0, 3.0];
        assert_relative_eq!(nan_mean(&values), 2.0);
        assert_relative_eq!(nan_max(&values), 3.0);
        assert!(nan_max(&[f64::NAN]).is_nan());
        assert_eq!(cummax(&[1.0, 3.0, 2.0]), vec![1.0, 3.0, 3.0]);
    }
}
