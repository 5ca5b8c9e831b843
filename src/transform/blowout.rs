use crate::command::BlowoutParams;
use crate::context::InvariantContext;
use crate::error::SimResult;
use crate::state::RobotStateAndWarnings;

use super::dispense::{dispense_into, DispenseVolume};

/// Expels the whole contents of every tip into the given well.
pub fn blowout(params: &BlowoutParams, ctx: &InvariantContext, draft: &mut RobotStateAndWarnings) -> SimResult<()> {
    dispense_into(
        &params.pipette,
        &params.labware,
        &params.well,
        DispenseVolume::Full,
        ctx,
        draft,
    )
}
