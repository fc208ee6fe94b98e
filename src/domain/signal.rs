use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-timestep position signal on a spread
///
/// `Long` buys the spread (long leg A, short beta x leg B), `Short` sells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Signal {
    Short,
    #[default]
    Flat,
    Long,
}

impl Signal {
    /// Numeric value in {-1, 0, 1}
    pub fn value(self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.value())
    }

    pub fn is_flat(self) -> bool {
        self == Signal::Flat
    }

    pub fn from_value(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Signal::Short),
            0 => Some(Signal::Flat),
            1 => Some(Signal::Long),
            _ => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Short => write!(f, "Short"),
            Signal::Flat => write!(f, "Flat"),
            Signal::Long => write!(f, "Long"),
        }
    }
}

/// Numeric view of a signal series
pub fn as_values(signals: &[Signal]) -> Vec<f64> {
    signals.iter().map(|s| s.as_f64()).collect()
}
