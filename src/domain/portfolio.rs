//! Multi-pair Portfolio Aggregation
//!
//! Holds one time-aligned position series per pair and de-levers them
//! proportionally, per timestep, so that
//!
//!   sum_pairs |position_t| <= max_leverage   for every t
//!
//! This is not the risk manager's whole-series clamp: each row gets its
//! own scaling factor.

use serde::{Deserialize, Serialize};

use super::error::{ensure_finite, DataError};

/// Pair positions after the leverage cap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPortfolio {
    /// Scaled position series per pair, in insertion order
    pub positions: Vec<(String, Vec<f64>)>,
    /// min(1, max_leverage / gross exposure) at each timestep
    pub scaling: Vec<f64>,
    /// Gross exposure before scaling
    pub gross_exposure: Vec<f64>,
    /// Sum of scaled pair positions
    pub net: Vec<f64>,
}

impl AggregatedPortfolio {
    pub fn pair(&self, name: &str) -> Option<&[f64]> {
        self.positions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.as_slice())
    }

    /// Gross exposure after scaling
    pub fn scaled_exposure(&self) -> Vec<f64> {
        (0..self.net.len())
            .map(|t| self.positions.iter().map(|(_, p)| p[t].abs()).sum())
            .collect()
    }
}

/// Owned mapping pair name -> position series
#[derive(Debug, Clone)]
pub struct PortfolioAggregator {
    max_leverage: f64,
    positions: Vec<(String, Vec<f64>)>,
}

impl Default for PortfolioAggregator {
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl PortfolioAggregator {
    pub fn new(max_leverage: f64) -> Self {
        Self {
            max_leverage,
            positions: Vec::new(),
        }
    }

    pub fn max_leverage(&self) -> f64 {
        self.max_leverage
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Add a pair's positions; a pair added twice keeps the latest series
    pub fn add_pair(&mut self, name: impl Into<String>, positions: Vec<f64>) -> Result<(), DataError> {
        let name = name.into();
        ensure_finite(&name, &positions)?;
        if let Some((_, existing)) = self.positions.first() {
            if existing.len() != positions.len() {
                return Err(DataError::LengthMismatch {
                    left: existing.len(),
                    right: positions.len(),
                });
            }
        }

        match self.positions.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = positions,
            None => self.positions.push((name, positions)),
        }
        Ok(())
    }

    /// Scale every row to the leverage cap and net the result
    pub fn aggregate(&self) -> AggregatedPortfolio {
        let n = self.positions.first().map_or(0, |(_, p)| p.len());

        let gross_exposure: Vec<f64> = (0..n)
            .map(|t| self.positions.iter().map(|(_, p)| p[t].abs()).sum())
            .collect();

        let scaling: Vec<f64> = gross_exposure
            .iter()
            .map(|&exposure| {
                if exposure > 0.0 {
                    (self.max_leverage / exposure).min(1.0)
                } else {
                    1.0
                }
            })
            .collect();

        let positions: Vec<(String, Vec<f64>)> = self
            .positions
            .iter()
            .map(|(name, p)| {
                let scaled = p.iter().zip(&scaling).map(|(x, s)| x * s).collect();
                (name.clone(), scaled)
            })
            .collect();

        let net = (0..n)
            .map(|t| positions.iter().map(|(_, p)| p[t]).sum())
            .collect();

        let clamped = scaling.iter().filter(|s| **s < 1.0).count();
        if clamped > 0 {
            tracing::debug!(
                "Leverage cap {:.2} bound on {} of {} timesteps",
                self.max_leverage,
                clamped,
                n
            );
        }

        AggregatedPortfolio {
            positions,
            scaling,
            gross_exposure,
            net,
        }
    }
}
