//! StatArb - Cointegration Pairs Research Library
//!
//! Screens a price panel for cointegrated pairs, trades their z-scored
//! spreads and evaluates the resulting portfolio.
//!
//! # Modules
//!
//! - `domain`: Core types and position math (PricePanel, Signal, allocation, execution, portfolio, risk)
//! - `strategy`: Statistics and signal generation (Engle-Granger, ADF, diagnostics, signal engine)
//! - `analytics`: Performance metrics
//! - `validation`: FDR control, parameter sweeps, subperiod stability
//! - `ports`: Trait abstractions (PanelSource)
//! - `adapters`: External implementations (JSON panel, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Research pipeline

pub mod domain;
pub mod strategy;
pub mod analytics;
pub mod validation;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
