//! Validation Layer - Robustness checks on research results
//!
//! - `sensitivity`: parameter grid sweep on one spread
//! - `fdr`: Benjamini-Hochberg multiple-testing control
//! - `subperiods`: contiguous subperiod splits and per-period metrics

pub mod fdr;
pub mod sensitivity;
pub mod subperiods;

pub use fdr::{false_discovery_control, false_discovery_control_with, FdrMethod};
pub use sensitivity::{best_row, parameter_sweep, SweepRow};
pub use subperiods::{split_subperiods, subperiod_stability};
