//! Warning catalog.
//!
//! Warnings annotate a simulation with physically odd but legal events.
//! They never stop a run. Each constructor is parameterless so that two
//! warnings of the same kind compare equal; rendering them is left to the UI.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a warning kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    /// Requested more volume than the well was recorded to hold.
    AspirateMoreThanWellContents,
    /// Aspirated from a well where nothing was ever recorded.
    AspirateFromPristineWell,
    /// Requested to dispense more than the tip was recorded to hold.
    DispenseMoreThanTipContents,
    /// A dispense left a well holding more than its capacity.
    OverMaxWellVolume,
}

impl WarningKind {
    /// Wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AspirateMoreThanWellContents => "ASPIRATE_MORE_THAN_WELL_CONTENTS",
            Self::AspirateFromPristineWell => "ASPIRATE_FROM_PRISTINE_WELL",
            Self::DispenseMoreThanTipContents => "DISPENSE_MORE_THAN_TIP_CONTENTS",
            Self::OverMaxWellVolume => "OVER_MAX_WELL_VOLUME",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal annotation emitted by a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Warning {
    /// Stable kind identifier.
    #[serde(rename = "type")]
    pub kind: WarningKind,
    /// Short default message.
    pub message: String,
}

impl Warning {
    fn new(kind: WarningKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Not enough liquid in the well(s) to cover an aspirate.
#[must_use]
pub fn aspirate_more_than_well_contents() -> Warning {
    Warning::new(
        WarningKind::AspirateMoreThanWellContents,
        "Not enough liquid in well(s)",
    )
}

/// Aspirating from a well that never received liquid.
#[must_use]
pub fn aspirate_from_pristine_well() -> Warning {
    Warning::new(
        WarningKind::AspirateFromPristineWell,
        "Aspirating from a pristine well. No liquids were ever added to this well",
    )
}

/// Dispensing more than the tip holds.
#[must_use]
pub fn dispense_more_than_tip_contents() -> Warning {
    Warning::new(
        WarningKind::DispenseMoreThanTipContents,
        "Not enough liquid in tip(s) to dispense",
    )
}

/// A dispense overflowed a well.
#[must_use]
pub fn over_max_well_volume() -> Warning {
    Warning::new(
        WarningKind::OverMaxWellVolume,
        "Dispense volume will overflow a destination well",
    )
}
