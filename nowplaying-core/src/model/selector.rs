//! Output selector readings

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SelectorError;

/// Identifier of the source currently routed to air
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SelectorId(u8);

impl SelectorId {
    /// Reserved id of the automated fallback source
    pub const KLANGBECKEN: SelectorId = SelectorId(1);

    /// Highest id the hardware selector reports
    pub const MAX: u8 = 6;

    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Whether the hardware selector can report this id
    pub fn is_valid(&self) -> bool {
        (1..=Self::MAX).contains(&self.0)
    }

    /// Human readable name of the selector output
    pub fn name(&self) -> &'static str {
        match self.0 {
            1 => "Klangbecken",
            2 => "Live + Replay",
            3 => "Frei",
            4 => "Vorproduktion",
            5 => "Hörmal",
            6 => "Studio Live",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for SelectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.name())
    }
}

impl From<u8> for SelectorId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

/// Something that reports which source is on air
pub trait SelectorSource {
    /// Read the currently active output
    ///
    /// Transient failures are reported as errors so the caller can keep its
    /// last known reading.
    fn active_output(&mut self) -> Result<SelectorId, SelectorError>;
}
