//! Execution Friction Model
//!
//! Effective fill price = price + commission + half-spread + slippage
//!
//! - commission: |trade| * cost rate
//! - half-spread: sign(trade) * half-spread rate * price
//! - slippage: sign(trade) * 5-period return vol * factor * price
//!
//! The first position counts as a trade in full. The model only adjusts
//! prices; it does not compute PnL.

use serde::{Deserialize, Serialize};

use super::error::{ensure_finite, ensure_same_len, DataError};
use crate::strategy::params::ExecutionConfig;
use crate::strategy::stats::{pct_change, rolling_std};

/// Window of the short-term volatility proxy used for slippage
pub const SLIPPAGE_VOL_WINDOW: usize = 5;

/// Sign with sign(0) = 0
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Position changes, with the opening position treated as a trade
pub fn trades(positions: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(positions.len());
    if let Some(&first) = positions.first() {
        out.push(first);
        out.extend(positions.windows(2).map(|w| w[1] - w[0]));
    }
    out
}

/// Per-timestep friction components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionBreakdown {
    pub trades: Vec<f64>,
    pub transaction_cost: Vec<f64>,
    pub spread_impact: Vec<f64>,
    pub slippage: Vec<f64>,
    pub adjusted_prices: Vec<f64>,
}

impl ExecutionBreakdown {
    /// Friction paid per timestep as a fraction of notional traded
    pub fn cost_fraction(&self, prices: &[f64]) -> Vec<f64> {
        self.adjusted_prices
            .iter()
            .zip(prices)
            .zip(&self.trades)
            .map(|((adj, p), trade)| {
                if *p != 0.0 {
                    (adj - p).abs() / p * trade.abs()
                } else {
                    0.0
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionModel {
    config: ExecutionConfig,
}

impl ExecutionModel {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Friction-adjusted prices for a position path
    pub fn apply(&self, positions: &[f64], prices: &[f64]) -> Result<Vec<f64>, DataError> {
        Ok(self.breakdown(positions, prices)?.adjusted_prices)
    }

    pub fn breakdown(&self, positions: &[f64], prices: &[f64]) -> Result<ExecutionBreakdown, DataError> {
        ensure_same_len(positions, prices)?;
        ensure_finite("positions", positions)?;
        ensure_finite("prices", prices)?;

        let trades = trades(positions);
        let vol: Vec<f64> = rolling_std(&pct_change(prices), SLIPPAGE_VOL_WINDOW)
            .into_iter()
            .map(|v| if v.is_nan() { 0.0 } else { v })
            .collect();

        let n = prices.len();
        let mut transaction_cost = Vec::with_capacity(n);
        let mut spread_impact = Vec::with_capacity(n);
        let mut slippage = Vec::with_capacity(n);
        let mut adjusted_prices = Vec::with_capacity(n);

        for t in 0..n {
            let direction = sign(trades[t]);
            let cost = trades[t].abs() * self.config.transaction_cost;
            let spread = direction * self.config.half_spread * prices[t];
            let slip = direction * vol[t] * self.config.slippage_vol_factor * prices[t];

            transaction_cost.push(cost);
            spread_impact.push(spread);
            slippage.push(slip);
            adjusted_prices.push(prices[t] + cost + spread + slip);
        }

        Ok(ExecutionBreakdown {
            trades,
            transaction_cost,
            spread_impact,
            slippage,
            adjusted_prices,
        })
    }
}
