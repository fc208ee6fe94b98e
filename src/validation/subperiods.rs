//! Subperiod stability
//!
//! Contiguous, equal-length, non-overlapping chunks of a return series.
//! The tail remainder (len % n_splits) is dropped.

use crate::analytics::performance::PerformanceRecord;
use crate::domain::error::DataError;

pub fn split_subperiods(returns: &[f64], n_splits: usize) -> Result<Vec<&[f64]>, DataError> {
    if n_splits == 0 {
        return Err(DataError::InvalidParameter(
            "number of subperiods must be at least 1".to_string(),
        ));
    }
    let length = returns.len() / n_splits;
    Ok((0..n_splits)
        .map(|i| &returns[i * length..(i + 1) * length])
        .collect())
}

/// Metrics per subperiod, to see whether one regime carries the result
pub fn subperiod_stability(returns: &[f64], n_splits: usize) -> Result<Vec<PerformanceRecord>, DataError> {
    Ok(split_subperiods(returns, n_splits)?
        .into_iter()
        .map(|chunk| PerformanceRecord::from_returns(chunk, None))
        .collect())
}
