//! Error taxonomy for the research core
//!
//! `DataError` covers bad input (too short, NaN, mismatched lengths) and
//! `StatisticalTestError` covers regressions or tests that cannot produce a
//! result. Neither is retryable: both point at a data or configuration
//! problem upstream.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("Empty input: {0}")]
    Empty(String),

    #[error("Insufficient samples for {series}: need at least {needed}, got {got}")]
    InsufficientSamples {
        series: String,
        needed: usize,
        got: usize,
    },

    #[error("Length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Non-finite value in {series} at index {index}")]
    NonFinite { series: String, index: usize },

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Duplicate asset: {0}")]
    DuplicateAsset(String),

    #[error("Time index not strictly ascending at row {0}")]
    UnorderedIndex(usize),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatisticalTestError {
    #[error("Singular regression design for {series}")]
    SingularRegression { series: String },

    #[error("Test did not converge for {series}: {reason}")]
    NonConvergent { series: String, reason: String },
}

/// Either failure kind, for operations that can hit both
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    StatisticalTest(#[from] StatisticalTestError),
}

impl AnalysisError {
    pub fn is_data_error(&self) -> bool {
        matches!(self, AnalysisError::Data(_))
    }

    /// Prefix every series name with `pair`, e.g. "AAA/BBB: spread"
    pub fn for_pair(self, pair: &str) -> Self {
        let tag = |series: String| format!("{}: {}", pair, series);
        match self {
            AnalysisError::Data(err) => AnalysisError::Data(match err {
                DataError::Empty(series) => DataError::Empty(tag(series)),
                DataError::InsufficientSamples { series, needed, got } => {
                    DataError::InsufficientSamples {
                        series: tag(series),
                        needed,
                        got,
                    }
                }
                DataError::NonFinite { series, index } => DataError::NonFinite {
                    series: tag(series),
                    index,
                },
                other => other,
            }),
            AnalysisError::StatisticalTest(err) => AnalysisError::StatisticalTest(match err {
                StatisticalTestError::SingularRegression { series } => {
                    StatisticalTestError::SingularRegression {
                        series: tag(series),
                    }
                }
                StatisticalTestError::NonConvergent { series, reason } => {
                    StatisticalTestError::NonConvergent {
                        series: tag(series),
                        reason,
                    }
                }
            }),
        }
    }
}

/// Reject empty input and any NaN/inf entry
pub fn ensure_finite(series: &str, values: &[f64]) -> Result<(), DataError> {
    if values.is_empty() {
        return Err(DataError::Empty(series.to_string()));
    }
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(DataError::NonFinite {
            series: series.to_string(),
            index,
        }),
        None => Ok(()),
    }
}

pub fn ensure_same_len(left: &[f64], right: &[f64]) -> Result<(), DataError> {
    if left.len() != right.len() {
        return Err(DataError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(())
}

pub fn ensure_min_len(series: &str, values: &[f64], needed: usize) -> Result<(), DataError> {
    if values.len() < needed {
        return Err(DataError::InsufficientSamples {
            series: series.to_string(),
            needed,
            got: values.len(),
        });
    }
    Ok(())
}
