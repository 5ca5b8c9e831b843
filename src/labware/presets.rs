//! Built-in definitions for common labware.
//!
//! Dimensions follow the published definitions closely enough for tip
//! placement and capacity checks; they are not calibration data.

use std::collections::BTreeMap;

use super::{
    well_name, LabwareDefinition, LabwareMetadata, LabwareParameters, WellDefinition, WellShape,
    FIXED_TRASH_QUIRK,
};

/// Regular grid layout shared by plates and tipracks.
#[derive(Debug, Clone, Copy)]
struct Grid {
    rows: usize,
    columns: usize,
    origin_x: f64,
    origin_y: f64,
    pitch_x: f64,
    pitch_y: f64,
}

fn grid(load_name: &str, display_name: &str, layout: Grid, template: &WellDefinition) -> LabwareDefinition {
    let mut ordering = Vec::with_capacity(layout.columns);
    let mut wells = BTreeMap::new();

    for col in 0..layout.columns {
        let mut column = Vec::with_capacity(layout.rows);
        for row in 0..layout.rows {
            let name = well_name(row, col + 1);
            let well = WellDefinition {
                x: layout.origin_x + layout.pitch_x * col as f64,
                y: layout.origin_y - layout.pitch_y * row as f64,
                ..template.clone()
            };
            wells.insert(name.clone(), well);
            column.push(name);
        }
        ordering.push(column);
    }

    LabwareDefinition {
        metadata: LabwareMetadata {
            display_name: display_name.to_string(),
        },
        parameters: LabwareParameters {
            load_name: load_name.to_string(),
            is_tiprack: false,
            tip_length: None,
            quirks: Vec::new(),
        },
        ordering,
        wells,
    }
}

/// Flat-bottom 96-well plate, 360 µL wells.
#[must_use]
pub fn well_plate_96() -> LabwareDefinition {
    grid(
        "corning_96_wellplate_360ul_flat",
        "Corning 96 Well Plate 360 µL Flat",
        Grid {
            rows: 8,
            columns: 12,
            origin_x: 14.38,
            origin_y: 74.24,
            pitch_x: 9.0,
            pitch_y: 9.0,
        },
        &WellDefinition {
            x: 0.0,
            y: 0.0,
            z: 3.55,
            depth: 10.67,
            total_liquid_volume: 360.0,
            shape: WellShape::Circular { diameter: 6.86 },
        },
    )
}

/// Flat-bottom 384-well plate, 112 µL square wells.
#[must_use]
pub fn well_plate_384() -> LabwareDefinition {
    grid(
        "corning_384_wellplate_112ul_flat",
        "Corning 384 Well Plate 112 µL Flat",
        Grid {
            rows: 16,
            columns: 24,
            origin_x: 12.12,
            origin_y: 76.48,
            pitch_x: 4.5,
            pitch_y: 4.5,
        },
        &WellDefinition {
            x: 0.0,
            y: 0.0,
            z: 2.79,
            depth: 11.43,
            total_liquid_volume: 112.0,
            shape: WellShape::Rectangular {
                x_dimension: 3.63,
                y_dimension: 3.63,
            },
        },
    )
}

/// 12-channel reservoir; each channel spans all eight rows of a multi-channel pipette.
#[must_use]
pub fn reservoir_12() -> LabwareDefinition {
    grid(
        "usascientific_12_reservoir_22ml",
        "USA Scientific 12 Well Reservoir 22 mL",
        Grid {
            rows: 1,
            columns: 12,
            origin_x: 13.94,
            origin_y: 42.78,
            pitch_x: 9.09,
            pitch_y: 0.0,
        },
        &WellDefinition {
            x: 0.0,
            y: 0.0,
            z: 2.29,
            depth: 42.16,
            total_liquid_volume: 22_000.0,
            shape: WellShape::Rectangular {
                x_dimension: 8.33,
                y_dimension: 71.88,
            },
        },
    )
}

/// 96-slot tiprack holding tips of `tip_volume` µL.
#[must_use]
pub fn tiprack_96(tip_volume: f64) -> LabwareDefinition {
    let mut def = grid(
        &format!("opentrons_96_tiprack_{tip_volume}ul"),
        &format!("Opentrons 96 Tip Rack {tip_volume} µL"),
        Grid {
            rows: 8,
            columns: 12,
            origin_x: 14.38,
            origin_y: 74.38,
            pitch_x: 9.0,
            pitch_y: 9.0,
        },
        &WellDefinition {
            x: 0.0,
            y: 0.0,
            z: 5.39,
            depth: 59.3,
            total_liquid_volume: tip_volume,
            shape: WellShape::Circular { diameter: 5.23 },
        },
    );
    def.parameters.is_tiprack = true;
    def.parameters.tip_length = Some(59.3);
    def
}

/// The robot's fixed trash: a single well large enough for every tip.
#[must_use]
pub fn fixed_trash() -> LabwareDefinition {
    let mut def = grid(
        "opentrons_1_trash_1100ml_fixed",
        "Opentrons Fixed Trash",
        Grid {
            rows: 1,
            columns: 1,
            origin_x: 82.84,
            origin_y: 80.0,
            pitch_x: 0.0,
            pitch_y: 0.0,
        },
        &WellDefinition {
            x: 0.0,
            y: 0.0,
            z: 5.0,
            depth: 77.0,
            total_liquid_volume: 1_100_000.0,
            shape: WellShape::Rectangular {
                x_dimension: 107.11,
                y_dimension: 165.67,
            },
        },
    );
    def.parameters.quirks.push(FIXED_TRASH_QUIRK.to_string());
    def
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for def in [
            well_plate_96(),
            well_plate_384(),
            reservoir_12(),
            tiprack_96(300.0),
            fixed_trash(),
        ] {
            def.validate().unwrap();
        }
    }

    #[test]
    fn preset_shapes() {
        assert_eq!(well_plate_96().wells.len(), 96);
        assert_eq!(well_plate_384().wells.len(), 384);
        assert_eq!(reservoir_12().ordering.len(), 12);
        assert!(tiprack_96(20.0).is_tiprack());
        assert!(fixed_trash().is_trash());
        assert_eq!(fixed_trash().wells.len(), 1);
    }
}
