//! Per-command state transformers.
//!
//! Each transformer mutates a draft [`RobotStateAndWarnings`] owned by the
//! sequencer. Physical anomalies become warnings; broken references become
//! [`SimulationError`]s and abort the command.

mod aspirate;
mod blowout;
mod dispense;
mod drop_tip;
mod magnet;
mod pick_up_tip;

use tracing::{debug, trace};

use crate::command::Command;
use crate::context::{InvariantContext, LabwareEntity, PipetteEntity};
use crate::error::{SimResult, SimulationError};
use crate::ident::{LabwareId, PipetteId, WellName};
use crate::state::RobotStateAndWarnings;
use crate::warning::Warning;

pub use aspirate::aspirate;
pub use blowout::blowout;
pub use dispense::dispense;
pub use drop_tip::drop_tip;
pub use magnet::{disengage_magnet, engage_magnet};
pub use pick_up_tip::pick_up_tip;

/// Applies one command to `draft`.
///
/// Commands without a liquid or tip effect leave the draft unchanged.
pub fn apply(command: &Command, ctx: &InvariantContext, draft: &mut RobotStateAndWarnings) -> SimResult<()> {
    match command {
        Command::Aspirate(p) => aspirate(p, ctx, draft),
        Command::Dispense(p) => dispense(p, ctx, draft),
        Command::Blowout(p) => blowout(p, ctx, draft),
        Command::DropTip(p) => drop_tip(p, ctx, draft),
        Command::PickUpTip(p) => pick_up_tip(p, ctx, draft),
        Command::EngageMagnet(p) => engage_magnet(p, ctx, draft),
        Command::DisengageMagnet(p) => disengage_magnet(p, ctx, draft),
        // TODO: track air drawn by airGap once dispense can deposit it.
        Command::AirGap(_)
        | Command::TouchTip(_)
        | Command::Delay(_)
        | Command::SetTargetTemperature(_)
        | Command::AwaitTemperature(_)
        | Command::DeactivateTemperature(_)
        | Command::SetTargetBlockTemperature(_)
        | Command::SetTargetLidTemperature(_)
        | Command::OpenLid(_)
        | Command::CloseLid(_)
        | Command::DeactivateBlock(_)
        | Command::DeactivateLid(_) => {
            trace!(command = command.kind(), "no state change");
            Ok(())
        }
    }
}

/// Pipette, labware and the well under each channel for a move to `well`.
pub(crate) struct TipPlacement<'a> {
    pub pipette: &'a PipetteEntity,
    pub labware: &'a LabwareEntity,
    /// One entry per channel, in channel order.
    pub wells: Vec<WellName>,
}

impl TipPlacement<'_> {
    /// Channels grouped by the well they sit in, in order of first channel.
    pub fn channels_by_well(&self) -> Vec<(&WellName, Vec<u8>)> {
        let mut groups: Vec<(&WellName, Vec<u8>)> = Vec::new();
        for (channel, well) in self.wells.iter().enumerate() {
            let channel = channel as u8;
            match groups.iter_mut().find(|(w, _)| *w == well) {
                Some((_, channels)) => channels.push(channel),
                None => groups.push((well, vec![channel])),
            }
        }
        groups
    }
}

pub(crate) fn place_tips<'a>(
    ctx: &'a InvariantContext,
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
) -> SimResult<TipPlacement<'a>> {
    let pipette = ctx.pipette(pipette)?;
    let labware = ctx.labware(labware)?;
    if labware.def.well(well.as_str()).is_none() {
        return Err(SimulationError::UnknownWell {
            labware: labware.id.clone(),
            well: well.clone(),
        }
        .into());
    }
    let wells = labware
        .def
        .wells_for_tips(
            usize::from(pipette.channels),
            well.as_str(),
            ctx.config().multi_channel_spacing_mm,
        )
        .ok_or_else(|| SimulationError::NoWellsForTips {
            labware: labware.id.clone(),
            well: well.clone(),
            channels: pipette.channels,
        })?;
    Ok(TipPlacement {
        pipette,
        labware,
        wells,
    })
}

pub(crate) fn emit(draft: &mut RobotStateAndWarnings, warning: Warning) {
    debug!(kind = %warning.kind, "{}", warning.message);
    draft.warnings.push(warning);
}
