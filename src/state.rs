//! Robot state: the physical situation after some prefix of a protocol.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::{InvariantContext, ModuleType, Mount};
use crate::error::{SimError, SimResult, SimulationError, ValidationError};
use crate::ident::{IngredientId, LabwareId, ModuleId, PipetteId, WellName};
use crate::liquid::{Ingredient, LiquidState, WellLocation};
use crate::warning::Warning;

/// Tip tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipState {
    /// Per tiprack, per well: `true` while an unused tip is still there.
    pub tipracks: BTreeMap<LabwareId, BTreeMap<WellName, bool>>,
    /// Per pipette: `true` while tips are attached.
    pub pipettes: BTreeMap<PipetteId, bool>,
}

/// Temperature module status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemperatureStatus {
    /// Holding the target temperature.
    TemperatureReached,
    /// Not regulating.
    TemperatureDeactivated,
    /// Moving toward the target.
    ApproachingTarget,
}

/// State of one module, tagged by module kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModuleState {
    /// Magnetic module.
    Magdeck {
        /// Magnets raised.
        engaged: bool,
    },
    /// Temperature module.
    #[serde(rename_all = "camelCase")]
    Tempdeck {
        /// Regulation status.
        status: TemperatureStatus,
        /// Target in °C, if set.
        target_temperature: Option<f64>,
    },
    /// Thermocycler.
    #[serde(rename_all = "camelCase")]
    Thermocycler {
        /// Block target in °C, if set.
        block_target_temp: Option<f64>,
        /// Lid target in °C, if set.
        lid_target_temp: Option<f64>,
        /// Lid position, if known.
        lid_open: Option<bool>,
    },
}

impl ModuleState {
    /// Power-on state of a module kind.
    #[must_use]
    pub const fn initial(module_type: ModuleType) -> Self {
        match module_type {
            ModuleType::Magdeck => Self::Magdeck { engaged: false },
            ModuleType::Tempdeck => Self::Tempdeck {
                status: TemperatureStatus::TemperatureDeactivated,
                target_temperature: None,
            },
            ModuleType::Thermocycler => Self::Thermocycler {
                block_target_temp: None,
                lid_target_temp: None,
                lid_open: None,
            },
        }
    }

    /// Module kind of this state.
    #[must_use]
    pub const fn module_type(&self) -> ModuleType {
        match self {
            Self::Magdeck { .. } => ModuleType::Magdeck,
            Self::Tempdeck { .. } => ModuleType::Tempdeck,
            Self::Thermocycler { .. } => ModuleType::Thermocycler,
        }
    }
}

/// Deck placement and state of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleTemporalProperties {
    /// Deck slot.
    pub slot: String,
    /// Current state.
    pub module_state: ModuleState,
}

/// Deck placement of a labware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabwareTemporalProperties {
    /// Deck slot (or module id when sitting on a module).
    pub slot: String,
}

/// Placement of a pipette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipetteTemporalProperties {
    /// Mount.
    pub mount: Mount,
}

/// The simulated physical state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotState {
    /// Pipettes on the robot.
    pub pipettes: BTreeMap<PipetteId, PipetteTemporalProperties>,
    /// Labware on the deck.
    pub labware: BTreeMap<LabwareId, LabwareTemporalProperties>,
    /// Tip tracking.
    pub tip_state: TipState,
    /// Liquid tracking.
    pub liquid_state: LiquidState,
    /// Modules on the deck.
    pub modules: BTreeMap<ModuleId, ModuleTemporalProperties>,
}

/// A state paired with the warnings emitted while producing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotStateAndWarnings {
    /// Resulting state.
    pub robot_state: RobotState,
    /// Warnings, in command order.
    pub warnings: Vec<Warning>,
}

impl RobotStateAndWarnings {
    /// Pairs a state with an empty warning list.
    #[must_use]
    pub fn new(robot_state: RobotState) -> Self {
        Self {
            robot_state,
            warnings: Vec::new(),
        }
    }
}

/// Stable digest of a robot state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateFingerprint([u8; 32]);

impl StateFingerprint {
    /// Raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for StateFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl RobotState {
    /// Starts building an initial state for `ctx`.
    #[must_use]
    pub fn builder(ctx: &InvariantContext) -> RobotStateBuilder<'_> {
        RobotStateBuilder::new(ctx)
    }

    /// True while `pipette` has tips attached.
    #[must_use]
    pub fn has_tip(&self, pipette: &PipetteId) -> bool {
        self.tip_state.pipettes.get(pipette).copied().unwrap_or(false)
    }

    /// True while `well` of tiprack `labware` still holds an unused tip.
    #[must_use]
    pub fn tip_available(&self, labware: &LabwareId, well: &str) -> bool {
        self.tip_state
            .tipracks
            .get(labware)
            .and_then(|wells| wells.get(well))
            .copied()
            .unwrap_or(false)
    }

    /// Current state of a module, if it is on the deck.
    #[must_use]
    pub fn module_state(&self, id: &ModuleId) -> Option<&ModuleState> {
        self.modules.get(id).map(|m| &m.module_state)
    }

    /// Blake3 digest of the canonical JSON form.
    ///
    /// All maps are ordered, so equal states always hash equal.
    pub fn fingerprint(&self) -> SimResult<StateFingerprint> {
        let bytes = serde_json::to_vec(self)
            .map_err(|e| SimError::serialization(format!("serialize robot state: {e}")))?;
        Ok(StateFingerprint(*blake3::hash(&bytes).as_bytes()))
    }

    /// Checks the structural invariants of this state against `ctx`.
    ///
    /// - every pipette has a tip flag;
    /// - tip rows address existing channels, well rows existing wells;
    /// - no volume is negative or non-finite;
    /// - tiprack rows address tipracks.
    pub fn check_invariants(&self, ctx: &InvariantContext) -> SimResult<()> {
        for pipette in ctx.pipette_entities() {
            if !self.tip_state.pipettes.contains_key(&pipette.id) {
                return Err(SimError::internal(format!("pipette {} has no tip state", pipette.id)));
            }
        }

        let tips = self.liquid_state.pipettes();
        for location in tips.locations() {
            let pipette = ctx.pipette(&location.pipette)?;
            if location.channel >= pipette.channels {
                return Err(SimError::internal(format!(
                    "pipette {} has liquid in channel {} of {}",
                    pipette.id, location.channel, pipette.channels
                )));
            }
        }

        let wells = self.liquid_state.labware();
        for location in wells.locations() {
            let labware = ctx.labware(&location.labware)?;
            if labware.def.well(location.well.as_str()).is_none() {
                return Err(SimulationError::UnknownWell {
                    labware: location.labware.clone(),
                    well: location.well.clone(),
                }
                .into());
            }
        }

        if let Some((location, ingredient, volume)) = tips.invalid_rows().next() {
            return Err(SimError::internal(format!(
                "tip {location:?} holds {volume} of {ingredient}"
            )));
        }
        if let Some((location, ingredient, volume)) = wells.invalid_rows().next() {
            return Err(SimError::internal(format!(
                "well {location:?} holds {volume} of {ingredient}"
            )));
        }

        for id in self.tip_state.tipracks.keys() {
            if !ctx.labware(id)?.def.is_tiprack() {
                return Err(SimulationError::NotATiprack { id: id.clone() }.into());
            }
        }
        Ok(())
    }
}

/// Builder for an initial [`RobotState`].
///
/// Defaults: no tips attached, every tiprack full, every well pristine,
/// every slotted module in its power-on state.
#[derive(Debug, Clone)]
pub struct RobotStateBuilder<'a> {
    ctx: &'a InvariantContext,
    labware_slots: Vec<(LabwareId, String)>,
    module_slots: Vec<(ModuleId, String)>,
    tipracks_full: BTreeMap<LabwareId, bool>,
    tips_attached: BTreeMap<PipetteId, bool>,
    liquids: Vec<(WellLocation, Ingredient, f64)>,
}

impl<'a> RobotStateBuilder<'a> {
    fn new(ctx: &'a InvariantContext) -> Self {
        Self {
            ctx,
            labware_slots: Vec::new(),
            module_slots: Vec::new(),
            tipracks_full: BTreeMap::new(),
            tips_attached: BTreeMap::new(),
            liquids: Vec::new(),
        }
    }

    /// Places a labware in a deck slot.
    #[must_use]
    pub fn labware_slot(mut self, id: impl Into<LabwareId>, slot: impl Into<String>) -> Self {
        self.labware_slots.push((id.into(), slot.into()));
        self
    }

    /// Places a module in a deck slot.
    #[must_use]
    pub fn module_slot(mut self, id: impl Into<ModuleId>, slot: impl Into<String>) -> Self {
        self.module_slots.push((id.into(), slot.into()));
        self
    }

    /// Starts a tiprack full (`true`) or empty (`false`).
    #[must_use]
    pub fn tiprack_full(mut self, id: impl Into<LabwareId>, full: bool) -> Self {
        self.tipracks_full.insert(id.into(), full);
        self
    }

    /// Starts a pipette with or without tips.
    #[must_use]
    pub fn tip_attached(mut self, id: impl Into<PipetteId>, attached: bool) -> Self {
        self.tips_attached.insert(id.into(), attached);
        self
    }

    /// Adds `volume` µL of `ingredient` to a well.
    #[must_use]
    pub fn well_liquid(
        mut self,
        labware: impl Into<LabwareId>,
        well: impl Into<WellName>,
        ingredient: impl Into<IngredientId>,
        volume: f64,
    ) -> Self {
        self.liquids.push((
            WellLocation::new(labware, well),
            Ingredient::Liquid(ingredient.into()),
            volume,
        ));
        self
    }

    /// Validates the requested setup and builds the state.
    pub fn build(self) -> SimResult<RobotState> {
        let ctx = self.ctx;

        let pipettes = ctx
            .pipette_entities()
            .map(|p| (p.id.clone(), PipetteTemporalProperties { mount: p.mount }))
            .collect();

        let mut tip_pipettes: BTreeMap<PipetteId, bool> =
            ctx.pipette_entities().map(|p| (p.id.clone(), false)).collect();
        for (id, attached) in self.tips_attached {
            ctx.pipette(&id)?;
            tip_pipettes.insert(id, attached);
        }

        for id in self.tipracks_full.keys() {
            if !ctx.labware(id)?.def.is_tiprack() {
                return Err(SimulationError::NotATiprack { id: id.clone() }.into());
            }
        }
        let tipracks = ctx
            .labware_entities()
            .filter(|l| l.def.is_tiprack())
            .map(|l| {
                let full = self.tipracks_full.get(&l.id).copied().unwrap_or(true);
                let wells = l.def.well_names().map(|w| (w.clone(), full)).collect();
                (l.id.clone(), wells)
            })
            .collect();

        let mut labware = BTreeMap::new();
        for (id, slot) in self.labware_slots {
            ctx.labware(&id)?;
            labware.insert(id, LabwareTemporalProperties { slot });
        }

        let mut modules = BTreeMap::new();
        for (id, slot) in self.module_slots {
            let entity = ctx.module(&id)?;
            modules.insert(
                id,
                ModuleTemporalProperties {
                    slot,
                    module_state: ModuleState::initial(entity.module_type),
                },
            );
        }

        let mut liquid_state = LiquidState::new();
        for (location, ingredient, volume) in self.liquids {
            let entity = ctx.labware(&location.labware)?;
            if entity.def.well(location.well.as_str()).is_none() {
                return Err(SimulationError::UnknownWell {
                    labware: location.labware,
                    well: location.well,
                }
                .into());
            }
            if !volume.is_finite() || volume < 0.0 {
                return Err(ValidationError::InvalidVolume {
                    field: format!("{}/{}", location.labware, location.well),
                    value: volume,
                }
                .into());
            }
            let mut contents = liquid_state.well(&location);
            contents.add(ingredient, volume);
            liquid_state.set_well(location, &contents);
        }

        Ok(RobotState {
            pipettes,
            labware,
            tip_state: TipState {
                tipracks,
                pipettes: tip_pipettes,
            },
            liquid_state,
            modules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PipetteEntity;
    use crate::labware::presets;

    fn ctx() -> InvariantContext {
        InvariantContext::builder()
            .pipette(PipetteEntity::single("p300SingleId", Mount::Left, 300.0))
            .labware("tiprack1Id", presets::tiprack_96(300.0))
            .labware("tiprack2Id", presets::tiprack_96(300.0))
            .labware("plateId", presets::well_plate_96())
            .module("magId", ModuleType::Magdeck, "GEN1")
            .module("tempId", ModuleType::Tempdeck, "GEN2")
            .build()
            .unwrap()
    }

    #[test]
    fn initial_state_defaults() {
        let ctx = ctx();
        let state = RobotState::builder(&ctx)
            .tiprack_full("tiprack2Id", false)
            .module_slot("magId", "1")
            .build()
            .unwrap();

        assert!(!state.has_tip(&PipetteId::from("p300SingleId")));
        assert!(state.tip_available(&LabwareId::from("tiprack1Id"), "H12"));
        assert!(!state.tip_available(&LabwareId::from("tiprack2Id"), "A1"));
        assert_eq!(
            state.module_state(&ModuleId::from("magId")),
            Some(&ModuleState::Magdeck { engaged: false })
        );
        assert!(state.module_state(&ModuleId::from("tempId")).is_none());
        assert!(state.liquid_state.labware().is_empty());
        state.check_invariants(&ctx).unwrap();
    }

    #[test]
    fn builder_rejects_unknown_wells_and_bad_volumes() {
        let ctx = ctx();
        let err = RobotState::builder(&ctx)
            .well_liquid("plateId", "Z9", "water", 10.0)
            .build()
            .unwrap_err();
        assert!(err.is_contract_violation());

        let err = RobotState::builder(&ctx)
            .well_liquid("plateId", "A1", "water", -1.0)
            .build()
            .unwrap_err();
        assert!(err.is_validation());

        let err = RobotState::builder(&ctx).tiprack_full("plateId", true).build().unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn repeated_liquid_accumulates() {
        let ctx = ctx();
        let state = RobotState::builder(&ctx)
            .well_liquid("plateId", "A1", "water", 10.0)
            .well_liquid("plateId", "A1", "water", 5.0)
            .well_liquid("plateId", "A1", "dye", 1.0)
            .build()
            .unwrap();
        let well = state.liquid_state.well(&WellLocation::new("plateId", "A1"));
        assert_eq!(well.liquid_volume("water"), 15.0);
        assert_eq!(well.liquid_volume("dye"), 1.0);
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let ctx = ctx();
        let a = RobotState::builder(&ctx).build().unwrap();
        let b = RobotState::builder(&ctx).build().unwrap();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().to_string().len(), 64);

        let c = RobotState::builder(&ctx).tip_attached("p300SingleId", true).build().unwrap();
        assert_ne!(a.fingerprint().unwrap(), c.fingerprint().unwrap());
    }

    #[test]
    fn invariants_catch_channel_overflow() {
        let ctx = ctx();
        let mut state = RobotState::builder(&ctx).build().unwrap();
        state.liquid_state.set_tip(
            &PipetteId::from("p300SingleId"),
            3,
            &crate::liquid::LiquidContents::single(Ingredient::Air, 1.0),
        );
        assert!(state.check_invariants(&ctx).unwrap_err().is_internal());
    }

    #[test]
    fn module_state_serializes_with_type_tag() {
        let json = serde_json::to_value(ModuleState::Magdeck { engaged: true }).unwrap();
        assert_eq!(json["type"], "magdeck");
        assert_eq!(json["engaged"], true);
    }
}
