//! Robot command definitions.
//!
//! Commands arrive as JSON objects `{ "command": <kind>, "params": {..} }`
//! produced by an upstream protocol compiler. The set of kinds is closed:
//! an unknown kind is rejected when the list is decoded.

mod serialization;
mod validation;

use serde::{Deserialize, Serialize};

use crate::ident::{LabwareId, ModuleId, PipetteId, WellName};

pub use serialization::{commands_from_json, commands_to_json_pretty};

/// Params for aspirate, dispense and air gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidParams {
    /// Pipette performing the move.
    pub pipette: PipetteId,
    /// Volume per channel, in µL.
    pub volume: f64,
    /// Labware addressed by the first channel.
    pub labware: LabwareId,
    /// Well addressed by the first channel.
    pub well: WellName,
    /// Height above the well bottom, in mm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_from_bottom_mm: Option<f64>,
    /// Plunger flow rate, in µL/s.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_rate: Option<f64>,
}

/// Params for blow-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlowoutParams {
    /// Pipette blowing out.
    pub pipette: PipetteId,
    /// Destination labware.
    pub labware: LabwareId,
    /// Destination well.
    pub well: WellName,
    /// Height above the well bottom, in mm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_from_bottom_mm: Option<f64>,
    /// Plunger flow rate, in µL/s.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_rate: Option<f64>,
}

/// Params for touch-tip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchTipParams {
    /// Pipette touching off.
    pub pipette: PipetteId,
    /// Labware touched.
    pub labware: LabwareId,
    /// Well touched.
    pub well: WellName,
    /// Height above the well bottom, in mm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_from_bottom_mm: Option<f64>,
}

/// Params for pick-up-tip and drop-tip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipParams {
    /// Pipette picking up or dropping.
    pub pipette: PipetteId,
    /// Tiprack (pick-up) or destination such as the trash (drop).
    pub labware: LabwareId,
    /// Well addressed by the first channel.
    pub well: WellName,
}

/// How long a delay lasts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DelayWait {
    /// Fixed duration in seconds.
    Seconds(f64),
    /// `true`: pause until the operator resumes.
    UntilResumed(bool),
}

/// Params for delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayParams {
    /// Duration or pause.
    pub wait: DelayWait,
    /// Message shown to the operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Params for commands that only name a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleParams {
    /// Target module.
    pub module: ModuleId,
}

/// Params for engaging a magnetic module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngageMagnetParams {
    /// Target module.
    pub module: ModuleId,
    /// Magnet height in mm.
    pub engage_height: f64,
}

/// Params for temperature targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureParams {
    /// Target module.
    pub module: ModuleId,
    /// Target in °C.
    pub temperature: f64,
}

/// A single robot command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "params")]
pub enum Command {
    /// Draw liquid into the tips.
    #[serde(rename = "aspirate")]
    Aspirate(LiquidParams),
    /// Push liquid out of the tips.
    #[serde(rename = "dispense")]
    Dispense(LiquidParams),
    /// Draw air into the tips (not simulated yet).
    #[serde(rename = "airGap")]
    AirGap(LiquidParams),
    /// Expel everything left in the tips.
    #[serde(rename = "blowout")]
    Blowout(BlowoutParams),
    /// Touch the tip against the well walls.
    #[serde(rename = "touchTip")]
    TouchTip(TouchTipParams),
    /// Attach tips from a tiprack.
    #[serde(rename = "pickUpTip")]
    PickUpTip(TipParams),
    /// Eject the tips.
    #[serde(rename = "dropTip")]
    DropTip(TipParams),
    /// Wait or pause.
    #[serde(rename = "delay")]
    Delay(DelayParams),
    /// Raise the magnets.
    #[serde(rename = "magneticModule/engageMagnet")]
    EngageMagnet(EngageMagnetParams),
    /// Lower the magnets.
    #[serde(rename = "magneticModule/disengageMagnet")]
    DisengageMagnet(ModuleParams),
    /// Set a temperature module target.
    #[serde(rename = "temperatureModule/setTargetTemperature")]
    SetTargetTemperature(TemperatureParams),
    /// Wait for a temperature module to reach a target.
    #[serde(rename = "temperatureModule/awaitTemperature")]
    AwaitTemperature(TemperatureParams),
    /// Stop regulating a temperature module.
    #[serde(rename = "temperatureModule/deactivate")]
    DeactivateTemperature(ModuleParams),
    /// Set the thermocycler block target.
    #[serde(rename = "thermocycler/setTargetBlockTemperature")]
    SetTargetBlockTemperature(TemperatureParams),
    /// Set the thermocycler lid target.
    #[serde(rename = "thermocycler/setTargetLidTemperature")]
    SetTargetLidTemperature(TemperatureParams),
    /// Open the thermocycler lid.
    #[serde(rename = "thermocycler/openLid")]
    OpenLid(ModuleParams),
    /// Close the thermocycler lid.
    #[serde(rename = "thermocycler/closeLid")]
    CloseLid(ModuleParams),
    /// Stop regulating the thermocycler block.
    #[serde(rename = "thermocycler/deactivateBlock")]
    DeactivateBlock(ModuleParams),
    /// Stop regulating the thermocycler lid.
    #[serde(rename = "thermocycler/deactivateLid")]
    DeactivateLid(ModuleParams),
}

impl Command {
    /// Wire name of this command's kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Aspirate(_) => "aspirate",
            Self::Dispense(_) => "dispense",
            Self::AirGap(_) => "airGap",
            Self::Blowout(_) => "blowout",
            Self::TouchTip(_) => "touchTip",
            Self::PickUpTip(_) => "pickUpTip",
            Self::DropTip(_) => "dropTip",
            Self::Delay(_) => "delay",
            Self::EngageMagnet(_) => "magneticModule/engageMagnet",
            Self::DisengageMagnet(_) => "magneticModule/disengageMagnet",
            Self::SetTargetTemperature(_) => "temperatureModule/setTargetTemperature",
            Self::AwaitTemperature(_) => "temperatureModule/awaitTemperature",
            Self::DeactivateTemperature(_) => "temperatureModule/deactivate",
            Self::SetTargetBlockTemperature(_) => "thermocycler/setTargetBlockTemperature",
            Self::SetTargetLidTemperature(_) => "thermocycler/setTargetLidTemperature",
            Self::OpenLid(_) => "thermocycler/openLid",
            Self::CloseLid(_) => "thermocycler/closeLid",
            Self::DeactivateBlock(_) => "thermocycler/deactivateBlock",
            Self::DeactivateLid(_) => "thermocycler/deactivateLid",
        }
    }

    /// Aspirate `volume` µL per channel.
    #[must_use]
    pub fn aspirate(
        pipette: impl Into<PipetteId>,
        labware: impl Into<LabwareId>,
        well: impl Into<WellName>,
        volume: f64,
    ) -> Self {
        Self::Aspirate(LiquidParams::new(pipette, labware, well, volume))
    }

    /// Dispense `volume` µL per channel.
    #[must_use]
    pub fn dispense(
        pipette: impl Into<PipetteId>,
        labware: impl Into<LabwareId>,
        well: impl Into<WellName>,
        volume: f64,
    ) -> Self {
        Self::Dispense(LiquidParams::new(pipette, labware, well, volume))
    }

    /// Blow out into a well.
    #[must_use]
    pub fn blowout(
        pipette: impl Into<PipetteId>,
        labware: impl Into<LabwareId>,
        well: impl Into<WellName>,
    ) -> Self {
        Self::Blowout(BlowoutParams {
            pipette: pipette.into(),
            labware: labware.into(),
            well: well.into(),
            offset_from_bottom_mm: None,
            flow_rate: None,
        })
    }

    /// Pick up tips.
    #[must_use]
    pub fn pick_up_tip(
        pipette: impl Into<PipetteId>,
        labware: impl Into<LabwareId>,
        well: impl Into<WellName>,
    ) -> Self {
        Self::PickUpTip(TipParams::new(pipette, labware, well))
    }

    /// Drop tips.
    #[must_use]
    pub fn drop_tip(
        pipette: impl Into<PipetteId>,
        labware: impl Into<LabwareId>,
        well: impl Into<WellName>,
    ) -> Self {
        Self::DropTip(TipParams::new(pipette, labware, well))
    }

    /// Engage a magnetic module.
    #[must_use]
    pub fn engage_magnet(module: impl Into<ModuleId>, engage_height: f64) -> Self {
        Self::EngageMagnet(EngageMagnetParams {
            module: module.into(),
            engage_height,
        })
    }

    /// Disengage a magnetic module.
    #[must_use]
    pub fn disengage_magnet(module: impl Into<ModuleId>) -> Self {
        Self::DisengageMagnet(ModuleParams {
            module: module.into(),
        })
    }
}

impl LiquidParams {
    /// Params without offset or flow rate.
    #[must_use]
    pub fn new(
        pipette: impl Into<PipetteId>,
        labware: impl Into<LabwareId>,
        well: impl Into<WellName>,
        volume: f64,
    ) -> Self {
        Self {
            pipette: pipette.into(),
            volume,
            labware: labware.into(),
            well: well.into(),
            offset_from_bottom_mm: None,
            flow_rate: None,
        }
    }
}

impl TipParams {
    /// Creates tip params.
    #[must_use]
    pub fn new(
        pipette: impl Into<PipetteId>,
        labware: impl Into<LabwareId>,
        well: impl Into<WellName>,
    ) -> Self {
        Self {
            pipette: pipette.into(),
            labware: labware.into(),
            well: well.into(),
        }
    }
}
