//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - JSON panel: price panels read from disk
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod json_panel;

pub use cli::CliApp;
pub use json_panel::JsonPanelSource;
