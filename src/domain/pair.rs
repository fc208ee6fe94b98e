use serde::{Deserialize, Serialize};
use std::fmt;

/// A cointegrated candidate, fixed for the sample window it was tested on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub asset_a: String,
    pub asset_b: String,
    /// OLS slope of A on B over the test window
    pub hedge_ratio: f64,
    /// Engle-Granger p-value
    pub p_value: f64,
}

impl Pair {
    /// Identifier used as the portfolio column name
    pub fn name(&self) -> String {
        format!("{}/{}", self.asset_a, self.asset_b)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: beta={:.4}, p={:.4}",
            self.name(),
            self.hedge_ratio,
            self.p_value
        )
    }
}
