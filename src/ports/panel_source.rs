//! Price panel input port
//!
//! Acquisition, caching and alignment of raw prices live outside the
//! research core. Whatever does that hands the core a validated
//! `PricePanel` through this trait.

use thiserror::Error;

use crate::domain::error::DataError;
use crate::domain::panel::PricePanel;

/// Panel loading errors
#[derive(Error, Debug)]
pub enum PanelSourceError {
    #[error("Failed to read panel: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse panel: {0}")]
    Parse(String),

    #[error("Invalid panel: {0}")]
    Invalid(#[from] DataError),
}

/// Source of a time-aligned, gap-free price panel
pub trait PanelSource {
    fn load_panel(&self) -> Result<PricePanel, PanelSourceError>;

    /// Human-readable origin, for logs
    fn describe(&self) -> String;
}
