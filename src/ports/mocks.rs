//! In-memory port implementations for tests and demos

use std::sync::{Arc, Mutex};

use super::panel_source::{PanelSource, PanelSourceError};
use crate::domain::panel::PricePanel;

/// Panel source that serves a fixed panel and counts loads
#[derive(Debug, Clone)]
pub struct InMemoryPanelSource {
    panel: PricePanel,
    calls: Arc<Mutex<usize>>,
}

impl InMemoryPanelSource {
    pub fn new(panel: PricePanel) -> Self {
        Self {
            panel,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of `load_panel` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or(0)
    }
}

impl PanelSource for InMemoryPanelSource {
    fn load_panel(&self) -> Result<PricePanel, PanelSourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        Ok(self.panel.clone())
    }

    fn describe(&self) -> String {
        format!(
            "in-memory panel ({} assets x {} rows)",
            self.panel.n_assets(),
            self.panel.len()
        )
    }
}
