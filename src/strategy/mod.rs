//! Strategy Layer - Pair research and signal generation
//!
//! - Hedge ratio, spread and whole-sample z-score (`spread`)
//! - Half-life, Hurst exponent and ADF diagnostics (`diagnostics`, `stationarity`)
//! - Engle-Granger screening across the universe (`pair_selection`)
//! - Z-score state machine with debouncing (`signal_engine`)

pub mod params;
pub mod stats;
pub mod spread;
pub mod stationarity;
pub mod diagnostics;
pub mod pair_selection;
pub mod signal_engine;

pub use params::{
    AllocationConfig, ExecutionConfig, ParamError, PortfolioConfig, QualityGate, RiskConfig,
    RiskMode, SelectionConfig, SignalConfig, ValidationConfig,
};
pub use spread::{compute_beta, construct_spread, SpreadSeries};
pub use stationarity::{adf_test, AdfResult};
pub use diagnostics::{half_life, hurst_exponent, SpreadQuality};
pub use pair_selection::{engle_granger, CointegrationTest, PValueMatrix, PairSelector, SelectionResult};
pub use signal_engine::{debounce, generate_signals, Debouncer, SignalEngine};
