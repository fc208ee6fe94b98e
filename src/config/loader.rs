//! Configuration Loader
//!
//! Loads and validates research configuration from TOML. Every section is
//! optional; missing sections and fields fall back to the defaults of the
//! corresponding parameter struct.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::strategy::params::{
    AllocationConfig, ExecutionConfig, ParamError, PortfolioConfig, QualityGate, RiskConfig,
    SelectionConfig, SignalConfig, ValidationConfig,
};

/// Environment variable that overrides `[data].panel`
pub const PANEL_PATH_ENV: &str = "STATARB_PANEL";

/// Full research configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub selection: SelectionConfig,
    pub signal: SignalConfig,
    pub diagnostics: QualityGate,
    pub allocation: AllocationConfig,
    pub execution: ExecutionConfig,
    pub portfolio: PortfolioConfig,
    pub risk: RiskConfig,
    pub validation: ValidationConfig,
    pub backtest: BacktestSection,
    pub data: DataSection,
}

/// Backtest metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_capital: f64,
    pub base_currency: String,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            initial_capital: 1_000_000.0,
            base_currency: "USD".to_string(),
        }
    }
}

/// Input data location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// JSON price panel (tilde-expanded)
    pub panel: Option<String>,
}

impl DataSection {
    /// Panel path with environment variable override
    /// Checks STATARB_PANEL first, falls back to the config value
    pub fn panel_path(&self) -> Option<String> {
        std::env::var(PANEL_PATH_ENV).ok().or_else(|| self.panel.clone())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl From<ParamError> for ConfigError {
    fn from(err: ParamError) -> Self {
        ConfigError::ValidationError(err.to_string())
    }
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load from `path` when given, otherwise use defaults
pub fn load_or_default(path: Option<&PathBuf>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(Config::default()),
    }
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selection.validate()?;
        self.signal.validate()?;
        self.diagnostics.validate()?;
        self.allocation.validate()?;
        self.execution.validate()?;
        self.portfolio.validate()?;
        self.risk.validate()?;
        self.validation.validate()?;

        if let Some(stop) = self.risk.pair_stop_zscore {
            if stop <= self.signal.entry_threshold {
                return Err(ConfigError::ValidationError(format!(
                    "pair_stop_zscore {} must exceed entry threshold {}",
                    stop, self.signal.entry_threshold
                )));
            }
        }

        if let (Some(start), Some(end)) = (self.backtest.start_date, self.backtest.end_date) {
            if end <= start {
                return Err(ConfigError::ValidationError(format!(
                    "backtest end_date {} must be after start_date {}",
                    end, start
                )));
            }
        }
        if self.backtest.initial_capital <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "initial_capital must be > 0, got {}",
                self.backtest.initial_capital
            )));
        }

        Ok(())
    }

    /// Signal settings with the risk section's pair stop applied
    pub fn effective_signal(&self) -> SignalConfig {
        match self.risk.pair_stop_zscore {
            Some(stop) => self.signal.clone().with_stop(Some(stop)),
            None => self.signal.clone(),
        }
    }
}
