#![allow(dead_code)]

use liquidsim::labware::presets;
use liquidsim::{
    InvariantContext, ModuleType, Mount, PipetteEntity, PipetteId, RobotState, RobotStateAndWarnings,
    WarningKind, WellName,
};
use liquidsim::liquid::WellLocation;

pub const SINGLE: &str = "p300SingleId";
pub const MULTI: &str = "p300MultiId";
pub const SOURCE_PLATE: &str = "sourcePlateId";
pub const DEST_PLATE: &str = "destPlateId";
pub const PLATE_384: &str = "plate384Id";
pub const TROUGH: &str = "troughId";
pub const TIPRACK: &str = "tiprack1Id";
pub const TRASH: &str = "trashId";
pub const MAGDECK: &str = "magDeckId";
pub const TEMPDECK: &str = "tempDeckId";

pub fn ctx() -> InvariantContext {
    InvariantContext::builder()
        .pipette(PipetteEntity::single(SINGLE, Mount::Left, 300.0).with_name("p300_single_gen2"))
        .pipette(PipetteEntity::multi(MULTI, Mount::Right, 300.0).with_name("p300_multi_gen2"))
        .labware(SOURCE_PLATE, presets::well_plate_96())
        .labware(DEST_PLATE, presets::well_plate_96())
        .labware(PLATE_384, presets::well_plate_384())
        .labware(TROUGH, presets::reservoir_12())
        .labware(TIPRACK, presets::tiprack_96(300.0))
        .labware(TRASH, presets::fixed_trash())
        .module(MAGDECK, ModuleType::Magdeck, "GEN1")
        .module(TEMPDECK, ModuleType::Tempdeck, "GEN1")
        .build()
        .unwrap()
}

/// Deck with everything placed, both pipettes holding tips, nothing in any well.
pub fn empty_state(ctx: &InvariantContext) -> RobotState {
    RobotState::builder(ctx)
        .labware_slot(SOURCE_PLATE, "1")
        .labware_slot(DEST_PLATE, "2")
        .labware_slot(PLATE_384, "3")
        .labware_slot(TROUGH, "4")
        .labware_slot(TIPRACK, "5")
        .labware_slot(TRASH, "12")
        .module_slot(MAGDECK, "7")
        .module_slot(TEMPDECK, "10")
        .tip_attached(SINGLE, true)
        .tip_attached(MULTI, true)
        .build()
        .unwrap()
}

pub fn well(state: &RobotState, labware: &str, well: &str) -> liquidsim::LiquidContents {
    state.liquid_state.well(&WellLocation::new(labware, well))
}

pub fn tip(state: &RobotState, pipette: &str, channel: u8) -> liquidsim::LiquidContents {
    state.liquid_state.tip(&PipetteId::from(pipette), channel)
}

pub fn warning_kinds(result: &RobotStateAndWarnings) -> Vec<WarningKind> {
    result.warnings.iter().map(|w| w.kind).collect()
}

pub fn column(col: usize) -> Vec<WellName> {
    ["A", "B", "C", "D", "E", "F", "G", "H"]
        .iter()
        .map(|row| WellName::from(format!("{row}{col}")))
        .collect()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
