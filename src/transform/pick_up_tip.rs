use tracing::trace;

use crate::command::TipParams;
use crate::context::InvariantContext;
use crate::error::{SimResult, SimulationError};
use crate::ident::WellName;
use crate::state::RobotStateAndWarnings;

/// Attaches tips and marks their slots in the tiprack as used.
///
/// A multi-channel pipette takes the whole column of the named well.
pub fn pick_up_tip(params: &TipParams, ctx: &InvariantContext, draft: &mut RobotStateAndWarnings) -> SimResult<()> {
    let pipette = ctx.pipette(&params.pipette)?;
    let labware = ctx.labware(&params.labware)?;
    if !labware.def.is_tiprack() {
        return Err(SimulationError::NotATiprack {
            id: labware.id.clone(),
        }
        .into());
    }

    let unknown_well = || SimulationError::UnknownWell {
        labware: labware.id.clone(),
        well: params.well.clone(),
    };
    let used: Vec<WellName> = if pipette.channels > 1 {
        labware
            .def
            .column_of(params.well.as_str())
            .ok_or_else(unknown_well)?
            .to_vec()
    } else {
        labware.def.well(params.well.as_str()).ok_or_else(unknown_well)?;
        vec![params.well.clone()]
    };
    trace!(pipette = %pipette.id, tiprack = %labware.id, tips = used.len(), "tip picked up");

    let tip_state = &mut draft.robot_state.tip_state;
    tip_state.pipettes.insert(pipette.id.clone(), true);
    let rack = tip_state.tipracks.entry(labware.id.clone()).or_default();
    for well in used {
        rack.insert(well, false);
    }
    Ok(())
}
