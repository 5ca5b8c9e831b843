//! Labware definitions.
//!
//! A labware definition is the JSON hardware description of a plate,
//! reservoir, tiprack or trash: its wells, their positions on the labware
//! and their capacities. Definitions are parsed once, validated, and shared
//! read-only by every simulation step.

mod geometry;
pub mod presets;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, ValidationError};
use crate::ident::WellName;

/// Quirk marking a labware as the robot's fixed trash.
pub const FIXED_TRASH_QUIRK: &str = "fixedTrash";

fn well_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z]+)([1-9][0-9]*)$").expect("well name pattern is valid"))
}

/// Splits a well name such as `"B12"` into a zero-based row index and a
/// one-based column number.
#[must_use]
pub fn parse_well_name(name: &str) -> Option<(usize, usize)> {
    let caps = well_name_regex().captures(name)?;
    let row = caps[1]
        .bytes()
        .try_fold(0usize, |acc, b| acc.checked_mul(26)?.checked_add(usize::from(b - b'A') + 1))?
        - 1;
    let column = caps[2].parse().ok()?;
    Some((row, column))
}

/// Builds the well name for a zero-based row and one-based column.
#[must_use]
pub fn well_name(row: usize, column: usize) -> WellName {
    let mut letters = Vec::new();
    let mut n = row + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    let row_part: String = letters.into_iter().rev().collect();
    WellName::new(format!("{row_part}{column}"))
}

/// Cross-section of a well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum WellShape {
    /// Round well.
    Circular {
        /// Diameter in mm.
        diameter: f64,
    },
    /// Square or rectangular well (reservoir channels, trash).
    #[serde(rename_all = "camelCase")]
    Rectangular {
        /// Extent along the x axis in mm.
        x_dimension: f64,
        /// Extent along the y axis in mm.
        y_dimension: f64,
    },
}

/// Geometry and capacity of a single well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellDefinition {
    /// Center x, in mm from the labware origin.
    pub x: f64,
    /// Center y, in mm from the labware origin.
    pub y: f64,
    /// Bottom z, in mm from the labware origin.
    pub z: f64,
    /// Depth in mm.
    pub depth: f64,
    /// Maximum liquid the well holds, in µL.
    pub total_liquid_volume: f64,
    /// Cross-section.
    #[serde(flatten)]
    pub shape: WellShape,
}

/// Human-facing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabwareMetadata {
    /// Display name.
    pub display_name: String,
}

/// Behavioural parameters of a labware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabwareParameters {
    /// Machine name of the definition, e.g. `"corning_96_wellplate_360ul_flat"`.
    pub load_name: String,
    /// True for tipracks.
    #[serde(default)]
    pub is_tiprack: bool,
    /// Tip length in mm (tipracks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip_length: Option<f64>,
    /// Special-case flags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quirks: Vec<String>,
}

/// A parsed labware definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabwareDefinition {
    /// Human-facing metadata.
    pub metadata: LabwareMetadata,
    /// Behavioural parameters.
    pub parameters: LabwareParameters,
    /// Well names grouped by column, front to back.
    pub ordering: Vec<Vec<WellName>>,
    /// Well geometry by name.
    pub wells: BTreeMap<WellName, WellDefinition>,
}

impl LabwareDefinition {
    /// Parse and validate a definition from JSON.
    pub fn from_json(s: &str) -> Result<Self, SimError> {
        let def: Self = serde_json::from_str(s)
            .map_err(|e| SimError::serialization(format!("deserialize labware definition: {e}")))?;
        def.validate()?;
        Ok(def)
    }

    /// Read, parse and validate a definition file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, SimError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SimError::serialization(format!("serialize labware definition: {e}")))
    }

    /// Validates this definition.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidLabwareDefinition {
            load_name: self.parameters.load_name.clone(),
            reason,
        };

        if self.parameters.load_name.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "parameters.loadName".to_string(),
            });
        }
        if self.wells.is_empty() {
            return Err(invalid("no wells".to_string()));
        }
        if self.ordering.is_empty() || self.ordering.iter().any(Vec::is_empty) {
            return Err(invalid("ordering has an empty column".to_string()));
        }

        let mut seen = std::collections::BTreeSet::new();
        for name in self.ordering.iter().flatten() {
            if !self.wells.contains_key(name) {
                return Err(invalid(format!("ordering names unknown well '{name}'")));
            }
            if !seen.insert(name) {
                return Err(invalid(format!("well '{name}' appears twice in ordering")));
            }
        }
        if seen.len() != self.wells.len() {
            return Err(invalid("some wells are missing from ordering".to_string()));
        }

        for (name, well) in &self.wells {
            if parse_well_name(name.as_str()).is_none() {
                return Err(ValidationError::InvalidWellName {
                    well: name.to_string(),
                });
            }
            let coords = [well.x, well.y, well.z, well.depth];
            if coords.iter().any(|v| !v.is_finite()) {
                return Err(invalid(format!("well '{name}' has a non-finite coordinate")));
            }
            if !well.total_liquid_volume.is_finite() || well.total_liquid_volume < 0.0 {
                return Err(ValidationError::InvalidVolume {
                    field: format!("wells.{name}.totalLiquidVolume"),
                    value: well.total_liquid_volume,
                });
            }
            let extents_ok = match well.shape {
                WellShape::Circular { diameter } => diameter.is_finite() && diameter > 0.0,
                WellShape::Rectangular {
                    x_dimension,
                    y_dimension,
                } => {
                    x_dimension.is_finite()
                        && y_dimension.is_finite()
                        && x_dimension > 0.0
                        && y_dimension > 0.0
                }
            };
            if !extents_ok {
                return Err(invalid(format!("well '{name}' has a non-positive extent")));
            }
        }
        Ok(())
    }

    /// Returns the definition of a well.
    #[must_use]
    pub fn well(&self, name: &str) -> Option<&WellDefinition> {
        self.wells.get(name)
    }

    /// True for tipracks.
    #[must_use]
    pub fn is_tiprack(&self) -> bool {
        self.parameters.is_tiprack
    }

    /// True for the fixed trash.
    #[must_use]
    pub fn is_trash(&self) -> bool {
        self.parameters.quirks.iter().any(|q| q == FIXED_TRASH_QUIRK)
    }

    /// Returns the ordering column containing `well`.
    #[must_use]
    pub fn column_of(&self, well: &str) -> Option<&[WellName]> {
        self.ordering
            .iter()
            .find(|column| column.iter().any(|w| w.as_str() == well))
            .map(Vec::as_slice)
    }

    /// Iterates over every well name in ordering order.
    pub fn well_names(&self) -> impl Iterator<Item = &WellName> {
        self.ordering.iter().flatten()
    }
}
