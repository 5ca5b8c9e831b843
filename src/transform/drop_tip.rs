use tracing::trace;

use crate::command::TipParams;
use crate::context::InvariantContext;
use crate::error::SimResult;
use crate::state::RobotStateAndWarnings;

use super::dispense::{dispense_into, DispenseVolume};

/// Ejects the tips: whatever they hold goes into the target well first.
pub fn drop_tip(params: &TipParams, ctx: &InvariantContext, draft: &mut RobotStateAndWarnings) -> SimResult<()> {
    dispense_into(
        &params.pipette,
        &params.labware,
        &params.well,
        DispenseVolume::Full,
        ctx,
        draft,
    )?;
    trace!(pipette = %params.pipette, "tip dropped");
    draft
        .robot_state
        .tip_state
        .pipettes
        .insert(params.pipette.clone(), false);
    Ok(())
}
