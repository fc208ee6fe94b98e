//! Fixed-cadence rebalancing
//!
//! Positions are refreshed only on every `freq`-th index and carried
//! forward in between. The cadence counts rows, not calendar days.

use super::error::DataError;

pub fn rebalance(positions: &[f64], freq: usize) -> Result<Vec<f64>, DataError> {
    if freq == 0 {
        return Err(DataError::InvalidParameter(
            "rebalance frequency must be at least 1".to_string(),
        ));
    }

    let mut out = Vec::with_capacity(positions.len());
    for (i, &position) in positions.iter().enumerate() {
        if i % freq == 0 {
            out.push(position);
        } else {
            let held = out[i - 1];
            out.push(held);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carries_forward_between_rebalances() {
        let positions = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert_eq!(
            rebalance(&positions, 3).unwrap(),
            vec![1.0, 1.0, 1.0, 4.0, 4.0, 4.0, 7.0]
        );
    }

    #[test]
    fn test_freq_one_is_identity() {
        let positions = [0.5, -0.5, 0.0];
        assert_eq!(rebalance(&positions, 1).unwrap(), positions.to_vec());
    }

    #[test]
    fn test_zero_freq_rejected() {
        assert!(rebalance(&[1.0], 0).is_err());
        assert!(rebalance(&[], 5).unwrap().is_empty());
    }
}
