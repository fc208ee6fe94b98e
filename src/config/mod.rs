//! Configuration Module
//!
//! Loads and validates research configuration from TOML files.

pub mod loader;

pub use loader::{
    load_config, load_or_default, BacktestSection, Config, ConfigError, DataSection,
    PANEL_PATH_ENV,
};
