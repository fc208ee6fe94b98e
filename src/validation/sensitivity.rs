//! Parameter Sensitivity Sweep
//!
//! Grid search over entry/exit thresholds and holding limits on a single
//! spread. For each cell: signals -> volatility-targeted positions ->
//! PnL_t = position_{t-1} * price return_t, summed to a final PnL.
//!
//! Cells are independent and evaluated on the rayon pool; rows come back in
//! cartesian order (entry outermost, max hold innermost).

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::allocation::volatility_targeting;
use crate::domain::error::{ensure_same_len, DataError};
use crate::strategy::params::{SignalConfig, DEFAULT_CAPITAL};
use crate::strategy::signal_engine::generate_signals;
use crate::strategy::stats::pct_change;

/// Volatility target used for every cell
pub const SWEEP_TARGET_VOL: f64 = 0.02;

/// One grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub entry: f64,
    pub exit: f64,
    pub max_hold: Option<usize>,
    pub final_pnl: f64,
}

/// Row with the largest final PnL
pub fn best_row(rows: &[SweepRow]) -> Option<&SweepRow> {
    rows.iter()
        .filter(|r| !r.final_pnl.is_nan())
        .max_by(|a, b| a.final_pnl.total_cmp(&b.final_pnl))
}

/// Cumulative PnL of lagged positions against price returns
fn final_pnl(positions: &[f64], prices: &[f64]) -> f64 {
    let returns = pct_change(prices);
    (1..prices.len())
        .map(|t| positions[t - 1] * returns[t])
        .filter(|pnl| pnl.is_finite())
        .sum()
}

/// Evaluate every (entry, exit, max_hold) combination
///
/// Rows where the z-score is NaN are dropped from both inputs first.
pub fn parameter_sweep(
    zscore: &[f64],
    entry_range: &[f64],
    exit_range: &[f64],
    max_hold_range: &[Option<usize>],
    prices: &[f64],
) -> Result<Vec<SweepRow>, DataError> {
    ensure_same_len(zscore, prices)?;

    let (z, p): (Vec<f64>, Vec<f64>) = zscore
        .iter()
        .zip(prices)
        .filter(|(z, _)| !z.is_nan())
        .map(|(z, p)| (*z, *p))
        .unzip();
    if z.len() < 2 {
        return Err(DataError::InsufficientSamples {
            series: "sweep z-score".to_string(),
            needed: 2,
            got: z.len(),
        });
    }

    let mut cells = Vec::with_capacity(entry_range.len() * exit_range.len() * max_hold_range.len());
    for &entry in entry_range {
        for &exit in exit_range {
            for &max_hold in max_hold_range {
                cells.push((entry, exit, max_hold));
            }
        }
    }

    let rows = cells
        .par_iter()
        .map(|&(entry, exit, max_hold)| -> Result<SweepRow, DataError> {
            let config = SignalConfig::default()
                .with_entry(entry)
                .with_exit(exit)
                .with_max_hold(max_hold);
            let signals = generate_signals(&z, &config);
            let positions = volatility_targeting(&signals, &p, SWEEP_TARGET_VOL, DEFAULT_CAPITAL)?;
            Ok(SweepRow {
                entry,
                exit,
                max_hold,
                final_pnl: final_pnl(&positions, &p),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!("Parameter sweep finished: {} combinations", rows.len());
    Ok(rows)
}
