//! JSON price panel adapter
//!
//! Reads the column-major wire form
//! `{ "dates": [...], "assets": [...], "prices": [[...], ...] }`
//! and validates it into a `PricePanel`.

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::domain::panel::{PricePanel, RawPanel};
use crate::ports::panel_source::{PanelSource, PanelSourceError};

#[derive(Debug, Clone)]
pub struct JsonPanelSource {
    path: PathBuf,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl JsonPanelSource {
    /// `path` may start with `~`
    pub fn new(path: &str) -> Self {
        Self {
            path: PathBuf::from(shellexpand::tilde(path).to_string()),
            start: None,
            end: None,
        }
    }

    /// Restrict loaded rows to [start, end]
    pub fn with_window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl PanelSource for JsonPanelSource {
    fn load_panel(&self) -> Result<PricePanel, PanelSourceError> {
        let content = std::fs::read_to_string(&self.path)?;
        let raw: RawPanel =
            serde_json::from_str(&content).map_err(|e| PanelSourceError::Parse(e.to_string()))?;
        let panel = PricePanel::try_from(raw)?;

        let panel = if self.start.is_some() || self.end.is_some() {
            panel.between(self.start, self.end)?
        } else {
            panel
        };

        tracing::info!(
            "Loaded panel from {}: {} assets x {} rows",
            self.path.display(),
            panel.n_assets(),
            panel.len()
        );
        Ok(panel)
    }

    fn describe(&self) -> String {
        format!("JSON panel at {}", self.path.display())
    }
}
