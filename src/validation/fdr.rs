//! Benjamini-Hochberg false discovery control
//!
//! P-values are ranked ascending and rank k is compared with k/n * alpha.
//!
//! `IndependentThreshold` rejects each hypothesis whose own p-value clears
//! its own rank threshold. That is not the textbook procedure: a p-value
//! that misses its threshold is kept even when a higher rank passes.
//! `StepUp` finds the largest passing rank k and rejects every rank <= k.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FdrMethod {
    /// Per-rank comparison, each p-value against its own threshold
    #[default]
    IndependentThreshold,
    /// Standard BH step-up rule
    StepUp,
}

/// Rejection flags in input order, per-rank comparison
pub fn false_discovery_control(p_values: &[f64], alpha: f64) -> Vec<bool> {
    false_discovery_control_with(p_values, alpha, FdrMethod::IndependentThreshold)
}

pub fn false_discovery_control_with(p_values: &[f64], alpha: f64, method: FdrMethod) -> Vec<bool> {
    let n = p_values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let passes: Vec<bool> = order
        .iter()
        .enumerate()
        .map(|(i, &idx)| p_values[idx] <= ((i + 1) as f64 / n as f64) * alpha)
        .collect();

    let mut reject = vec![false; n];
    match method {
        FdrMethod::IndependentThreshold => {
            for (&idx, &pass) in order.iter().zip(&passes) {
                reject[idx] = pass;
            }
        }
        FdrMethod::StepUp => {
            if let Some(k) = passes.iter().rposition(|p| *p) {
                for &idx in &order[..=k] {
                    reject[idx] = true;
                }
            }
        }
    }
    reject
}
