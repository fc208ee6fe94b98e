//! Domain Layer - Core types and whole-series portfolio logic
//!
//! Pure data and deterministic transforms with no I/O. Input arrives through
//! the ports layer as a validated `PricePanel`.
//!
//! - `panel`: time-ascending, gap-free price panel
//! - `pair`: cointegrated candidate with hedge ratio
//! - `signal`: per-timestep position signal
//! - `allocation`: dollar-neutral and volatility-targeted sizing
//! - `execution`: transaction cost, spread and slippage friction
//! - `rebalance`: fixed-cadence position refresh
//! - `portfolio`: multi-pair aggregation under a leverage cap
//! - `risk`: drawdown kill-switch and leverage clamp

pub mod error;
pub mod panel;
pub mod pair;
pub mod signal;
pub mod allocation;
pub mod execution;
pub mod rebalance;
pub mod portfolio;
pub mod risk;

pub use error::{AnalysisError, DataError, StatisticalTestError};
pub use panel::{PricePanel, RawPanel};
pub use pair::Pair;
pub use signal::Signal;
pub use allocation::{dollar_neutral_allocation, volatility_targeting, Allocation, AllocationEngine};
pub use execution::{ExecutionBreakdown, ExecutionModel};
pub use rebalance::rebalance;
pub use portfolio::{AggregatedPortfolio, PortfolioAggregator};
pub use risk::{RiskManager, RiskState};
