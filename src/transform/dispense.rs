use tracing::trace;

use crate::command::LiquidParams;
use crate::context::InvariantContext;
use crate::error::SimResult;
use crate::ident::{LabwareId, PipetteId, WellName};
use crate::liquid::{merge_liquid, split_liquid, LiquidContents, SplitLiquid, WellLocation};
use crate::state::RobotStateAndWarnings;
use crate::warning;

use super::{emit, place_tips};

/// How much each channel pushes out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DispenseVolume {
    /// A fixed volume per channel.
    Exact(f64),
    /// Whatever the tip holds.
    Full,
}

/// Pushes `params.volume` out of every channel into the well under it.
pub fn dispense(params: &LiquidParams, ctx: &InvariantContext, draft: &mut RobotStateAndWarnings) -> SimResult<()> {
    dispense_into(
        &params.pipette,
        &params.labware,
        &params.well,
        DispenseVolume::Exact(params.volume),
        ctx,
        draft,
    )
}

fn drain(tip: &LiquidContents) -> SplitLiquid {
    SplitLiquid {
        source: tip.iter().map(|(i, _)| (i.clone(), 0.0)).collect(),
        dest: tip.clone(),
    }
}

pub(crate) fn dispense_into(
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    volume: DispenseVolume,
    ctx: &InvariantContext,
    draft: &mut RobotStateAndWarnings,
) -> SimResult<()> {
    let placement = place_tips(ctx, pipette, labware, well)?;
    let config = ctx.config();
    let pipette = &placement.pipette.id;
    let mut touched: Vec<&WellName> = Vec::new();

    for (channel, well) in placement.wells.iter().enumerate() {
        let channel = channel as u8;
        let tip = draft.robot_state.liquid_state.tip(pipette, channel);

        let split = match volume {
            DispenseVolume::Exact(v) => {
                if config.exceeds(v, tip.total()) {
                    emit(draft, warning::dispense_more_than_tip_contents());
                }
                split_liquid(v, &tip)
            }
            DispenseVolume::Full if tip.total() <= 0.0 => continue,
            DispenseVolume::Full => drain(&tip),
        };
        trace!(channel, well = %well, volume = split.dest.total(), "dispense");

        let location = WellLocation::new(placement.labware.id.clone(), well.clone());
        let liquid = &mut draft.robot_state.liquid_state;
        liquid.set_tip(pipette, channel, &split.source);
        let droplet = split.dest.without_air();
        if !droplet.is_empty() {
            let merged = merge_liquid(&droplet, &liquid.well(&location));
            liquid.set_well(location, &merged);
        }
        if !touched.contains(&well) {
            touched.push(well);
        }
    }

    if config.warn_on_well_overflow && !placement.labware.def.is_trash() {
        for well in touched {
            let Some(def) = placement.labware.def.well(well.as_str()) else {
                continue;
            };
            let location = WellLocation::new(placement.labware.id.clone(), well.clone());
            let total = draft.robot_state.liquid_state.well(&location).total();
            if config.exceeds(total, def.total_liquid_volume) {
                emit(draft, warning::over_max_well_volume());
            }
        }
    }
    Ok(())
}
