//! Ports Layer - Trait definitions for external collaborators
//!
//! The research core never fetches or cleans data itself. Following
//! hexagonal architecture, the price panel arrives through `PanelSource`;
//! adapters implement it for concrete storage formats.

pub mod panel_source;
pub mod mocks;

pub use panel_source::{PanelSource, PanelSourceError};
pub use mocks::InMemoryPanelSource;
