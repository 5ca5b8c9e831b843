//! Tip placement for multi-channel pipettes.
//!
//! A multi-channel pipette's tips sit in a line along the y axis, one
//! `spacing` apart, with the first (back-most) tip at the highest y. Each tip
//! lands in whichever well's footprint contains it. For a 96-well plate that
//! is one well per row of a column; for a 384-well plate every other row;
//! for a reservoir channel every tip shares a single well.

use crate::ident::WellName;

use super::{LabwareDefinition, WellDefinition, WellShape};

/// Slack for floating point footprint tests, in mm.
const FOOTPRINT_EPSILON_MM: f64 = 1e-6;

impl WellShape {
    /// Extent of the well along the y axis.
    #[must_use]
    pub fn y_extent(&self) -> f64 {
        match *self {
            Self::Circular { diameter } => diameter,
            Self::Rectangular { y_dimension, .. } => y_dimension,
        }
    }
}

impl WellDefinition {
    /// True if the point `(x, y)` lies inside this well's footprint.
    #[must_use]
    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        let dx = x - self.x;
        let dy = y - self.y;
        match self.shape {
            WellShape::Circular { diameter } => {
                let r = diameter / 2.0 + FOOTPRINT_EPSILON_MM;
                dx * dx + dy * dy <= r * r
            }
            WellShape::Rectangular {
                x_dimension,
                y_dimension,
            } => {
                dx.abs() <= x_dimension / 2.0 + FOOTPRINT_EPSILON_MM
                    && dy.abs() <= y_dimension / 2.0 + FOOTPRINT_EPSILON_MM
            }
        }
    }
}

impl LabwareDefinition {
    /// Returns the well under each tip when the first tip of a `channels`-tip
    /// pipette is sent to `well`.
    ///
    /// If the target well is tall enough to hold every tip, the tip set is
    /// centered on it. Returns `None` if the well is unknown or any tip would
    /// land outside every well.
    #[must_use]
    pub fn wells_for_tips(&self, channels: usize, well: &str, spacing: f64) -> Option<Vec<WellName>> {
        let (name, target) = self.wells.get_key_value(well)?;
        if channels <= 1 {
            return Some(vec![name.clone()]);
        }

        let set_length = spacing * (channels - 1) as f64;
        let first_y = if target.shape.y_extent() >= set_length {
            target.y + set_length / 2.0
        } else {
            target.y
        };

        (0..channels)
            .map(|tip| self.well_at(target.x, first_y - spacing * tip as f64))
            .collect()
    }

    /// True if every tip of the pipette lands in the same well.
    #[must_use]
    pub fn all_wells_shared(wells_for_tips: &[WellName]) -> bool {
        wells_for_tips.windows(2).all(|pair| pair[0] == pair[1])
    }

    fn well_at(&self, x: f64, y: f64) -> Option<WellName> {
        self.wells
            .iter()
            .find(|(_, w)| w.contains_xy(x, y))
            .map(|(name, _)| name.clone())
    }
}
