//! Analytics Layer - Performance measurement over return series

pub mod performance;

pub use performance::{
    calmar_ratio, hit_rate, max_drawdown, sharpe_ratio, sortino_ratio, turnover,
    PerformanceRecord, TRADING_DAYS,
};
