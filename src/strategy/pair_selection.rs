//! Pair Selection
//!
//! Engle-Granger cointegration screen over every unordered asset pair.
//!
//! First stage: y0 = c + beta * y1 + u (OLS)
//! Second stage: ADF on u with no deterministic term, p-value from the
//! two-variable MacKinnon surface.
//!
//! The pairwise tests share no state and run on the rayon pool. Results are
//! collected in index order, so the candidate list and p-value matrix are
//! identical to a sequential scan.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::error::{ensure_finite, ensure_min_len, ensure_same_len, AnalysisError, DataError, StatisticalTestError};
use crate::domain::pair::Pair;
use crate::domain::panel::PricePanel;
use crate::strategy::params::SelectionConfig;
use crate::strategy::stationarity::{adf_statistic, mackinnon_p_value, Deterministic};
use crate::strategy::stats::{correlation, mean, ols, pct_change};

/// R-squared above this means the two series are collinear
const COLLINEAR_R2: f64 = 1.0 - 100.0 * 1.490_116_119_384_765_6e-8;

/// Outcome of one Engle-Granger test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CointegrationTest {
    /// ADF t-statistic on the first-stage residuals
    pub statistic: f64,
    pub p_value: f64,
    /// First-stage slope of y0 on y1
    pub hedge_ratio: f64,
}

/// Engle-Granger two-step cointegration test of `y0` on `y1`
///
/// `name` identifies the pair in errors. Perfectly collinear inputs give a
/// statistic of -inf and a p-value of 0.
pub fn engle_granger(y0: &[f64], y1: &[f64], name: &str) -> Result<CointegrationTest, AnalysisError> {
    ensure_same_len(y0, y1)?;
    ensure_finite(name, y0)?;
    ensure_finite(name, y1)?;
    ensure_min_len(name, y0, 4)?;

    let n = y0.len();
    let design = DMatrix::from_fn(n, 2, |r, c| if c == 0 { 1.0 } else { y1[r] });
    let target = DVector::from_column_slice(y0);
    let fit = ols(&design, &target, name)?;
    let hedge_ratio = fit.coefficients[1];

    let m = mean(y0);
    let tss: f64 = y0.iter().map(|v| (v - m) * (v - m)).sum();
    if tss == 0.0 {
        return Err(StatisticalTestError::SingularRegression {
            series: name.to_string(),
        }
        .into());
    }
    let r_squared = 1.0 - fit.ssr / tss;
    if r_squared >= COLLINEAR_R2 {
        return Ok(CointegrationTest {
            statistic: f64::NEG_INFINITY,
            p_value: 0.0,
            hedge_ratio,
        });
    }

    let residuals: Vec<f64> = fit.residuals.iter().copied().collect();
    let adf = adf_statistic(&residuals, Deterministic::None, name)?;

    Ok(CointegrationTest {
        statistic: adf.statistic,
        p_value: mackinnon_p_value(adf.statistic, 2),
        hedge_ratio,
    })
}

/// n x n p-value matrix; only cells (i, j) with i < j hold test results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PValueMatrix {
    n: usize,
    values: Vec<f64>,
}

impl PValueMatrix {
    /// Matrix filled with the neutral "not cointegrated" value 1.0
    pub fn neutral(n: usize) -> Self {
        Self {
            n,
            values: vec![1.0; n * n],
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.n + col]
    }

    /// Record an upper-triangle result; other cells are left untouched
    fn set_upper(&mut self, row: usize, col: usize, p_value: f64) {
        if row < col && col < self.n {
            self.values[row * self.n + col] = p_value;
        }
    }

    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.values.chunks(self.n.max(1)).map(|r| r.to_vec()).collect()
    }

    /// Upper-triangle p-values in (i, j) scan order
    pub fn upper_triangle(&self) -> Vec<f64> {
        (0..self.n)
            .flat_map(|i| ((i + 1)..self.n).map(move |j| (i, j)))
            .map(|(i, j)| self.get(i, j))
            .collect()
    }
}

/// Candidates and the full p-value matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub pairs: Vec<Pair>,
    pub p_values: PValueMatrix,
}

/// Rolling return correlation of one asset pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCorrelation {
    pub asset_a: String,
    pub asset_b: String,
    /// NaN until the window is filled with returns
    pub values: Vec<f64>,
}

/// Cointegration screen over an asset universe
#[derive(Debug, Clone, Default)]
pub struct PairSelector {
    config: SelectionConfig,
}

impl PairSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Test every pair (i < j) and keep those with p-value below the
    /// significance level, in column-index order
    pub fn find_cointegrated_pairs(&self, panel: &PricePanel) -> Result<SelectionResult, AnalysisError> {
        let n = panel.n_assets();
        let index_pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();

        tracing::debug!(
            "Screening {} pairs across {} assets ({} rows)",
            index_pairs.len(),
            n,
            panel.len()
        );

        let tests: Vec<(usize, usize, CointegrationTest)> = index_pairs
            .par_iter()
            .map(|&(i, j)| {
                let name = format!("{}/{}", panel.asset(i), panel.asset(j));
                engle_granger(panel.column_at(i), panel.column_at(j), &name).map(|t| (i, j, t))
            })
            .collect::<Result<_, _>>()?;

        let mut p_values = PValueMatrix::neutral(n);
        let mut pairs = Vec::new();
        for (i, j, test) in tests {
            p_values.set_upper(i, j, test.p_value);
            if test.p_value < self.config.significance {
                let pair = Pair {
                    asset_a: panel.asset(i).to_string(),
                    asset_b: panel.asset(j).to_string(),
                    hedge_ratio: test.hedge_ratio,
                    p_value: test.p_value,
                };
                tracing::info!("Cointegrated pair found: {}", pair);
                pairs.push(pair);
            }
        }

        Ok(SelectionResult { pairs, p_values })
    }

    /// Rolling Pearson correlation of percentage returns for every pair
    pub fn rolling_correlation(&self, panel: &PricePanel) -> Result<Vec<PairCorrelation>, DataError> {
        rolling_correlation(panel, self.config.correlation_window)
    }
}

/// Rolling correlation of percentage returns, one series per unordered pair
pub fn rolling_correlation(panel: &PricePanel, window: usize) -> Result<Vec<PairCorrelation>, DataError> {
    if window < 2 {
        return Err(DataError::InvalidParameter(format!(
            "correlation window must be at least 2, got {window}"
        )));
    }

    let returns: Vec<Vec<f64>> = (0..panel.n_assets())
        .map(|i| pct_change(panel.column_at(i)))
        .collect();

    let n = panel.n_assets();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (&returns[i], &returns[j]);
            let values = (0..panel.len())
                .map(|t| {
                    if t + 1 < window {
                        return f64::NAN;
                    }
                    let (wa, wb) = (&a[t + 1 - window..=t], &b[t + 1 - window..=t]);
                    if wa.iter().chain(wb).any(|v| !v.is_finite()) {
                        f64::NAN
                    } else {
                        correlation(wa, wb)
                    }
                })
                .collect();
            out.push(PairCorrelation {
                asset_a: panel.asset(i).to_string(),
                asset_b: panel.asset(j).to_string(),
                values,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn gaussian(rng: &mut StdRng) -> f64 {
        let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    fn random_walk(rng: &mut StdRng, n: usize, start: f64) -> Vec<f64> {
        let mut level = start;
        (0..n)
            .map(|_| {
                level += gaussian(rng);
                level
            })
            .collect()
    }

    fn panel(assets: &[&str], columns: Vec<Vec<f64>>) -> PricePanel {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates = (0..columns[0].len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        PricePanel::new(dates, assets.iter().map(|a| a.to_string()).collect(), columns).unwrap()
    }

    #[test]
    fn test_engle_granger_detects_cointegration() {
        let mut rng = StdRng::seed_from_u64(1);
        let s1 = random_walk(&mut rng, 500, 100.0);
        let s2: Vec<f64> = s1.iter().map(|v| 2.0 * v + 0.5 * gaussian(&mut rng)).collect();

        let test = engle_granger(&s2, &s1, "S2/S1").unwrap();
        assert!(test.p_value < 0.01, "p = {}", test.p_value);
        assert!((test.hedge_ratio - 2.0).abs() < 0.05);
    }

    #[test]
    fn test_engle_granger_independent_walks() {
        let mut rng = StdRng::seed_from_u64(2);
        let a = random_walk(&mut rng, 500, 100.0);
        let b = random_walk(&mut rng, 500, 100.0);
        let test = engle_granger(&a, &b, "A/B").unwrap();
        assert!(test.p_value > 0.05, "p = {}", test.p_value);
    }

    #[test]
    fn test_engle_granger_collinear() {
        let a: Vec<f64> = (0..50).map(|i| (i as f64 * 0.3).sin() + i as f64).collect();
        let b: Vec<f64> = a.iter().map(|v| 3.0 * v + 1.0).collect();
        let test = engle_granger(&b, &a, "B/A").unwrap();
        assert_eq!(test.statistic, f64::NEG_INFINITY);
        assert_eq!(test.p_value, 0.0);
    }

    #[test]
    fn test_engle_granger_errors_name_the_pair() {
        let err = engle_granger(&[1.0, 2.0, f64::NAN, 4.0], &[1.0, 2.0, 3.0, 4.0], "X/Y").unwrap_err();
        assert!(err.to_string().contains("X/Y"));

        let err = engle_granger(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0; 5], "X/Z").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::StatisticalTest(StatisticalTestError::SingularRegression { ref series }) if series == "X/Z"
        ));
    }

    #[test]
    fn test_selector_flags_cointegrated_pair_only() {
        let mut rng = StdRng::seed_from_u64(3);
        let s1 = random_walk(&mut rng, 400, 50.0);
        let s2: Vec<f64> = s1.iter().map(|v| 2.0 * v + 0.3 * gaussian(&mut rng)).collect();
        let s3 = random_walk(&mut rng, 400, 80.0);
        let panel = panel(&["AAA", "BBB", "CCC"], vec![s1, s2, s3]);

        let result = PairSelector::default().find_cointegrated_pairs(&panel).unwrap();
        assert!(result
            .pairs
            .iter()
            .any(|p| p.asset_a == "AAA" && p.asset_b == "BBB"));
        assert!(result.p_values.get(0, 1) < 0.05);

        // Lower triangle and diagonal stay neutral
        for i in 0..3 {
            for j in 0..=i {
                assert_eq!(result.p_values.get(i, j), 1.0);
            }
        }
    }

    #[test]
    fn test_matrix_matches_sequential_scan() {
        let mut rng = StdRng::seed_from_u64(4);
        let columns: Vec<Vec<f64>> = (0..5).map(|_| random_walk(&mut rng, 200, 100.0)).collect();
        let panel = panel(&["A", "B", "C", "D", "E"], columns.clone());

        let result = PairSelector::default().find_cointegrated_pairs(&panel).unwrap();
        let mut expected = Vec::new();
        for i in 0..5 {
            for j in (i + 1)..5 {
                expected.push(engle_granger(&columns[i], &columns[j], "").unwrap().p_value);
            }
        }
        assert_eq!(result.p_values.upper_triangle(), expected);
    }

    #[test]
    fn test_rolling_correlation_warmup() {
        let mut rng = StdRng::seed_from_u64(6);
        let a = random_walk(&mut rng, 30, 100.0);
        let b: Vec<f64> = a.iter().map(|v| v * 1.5).collect();
        let panel = panel(&["A", "B"], vec![a, b]);

        let corr = rolling_correlation(&panel, 10).unwrap();
        assert_eq!(corr.len(), 1);
        // Returns start at row 1, so the first full window ends at row 10
        assert!(corr[0].values[..10].iter().all(|v| v.is_nan()));
        assert!((corr[0].values[10] - 1.0).abs() < 1e-9);
        assert!(rolling_correlation(&panel, 1).is_err());
    }
}
