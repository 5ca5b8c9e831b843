use tracing::trace;

use crate::command::LiquidParams;
use crate::context::InvariantContext;
use crate::error::SimResult;
use crate::liquid::{merge_liquid, split_liquid, WellLocation};
use crate::state::RobotStateAndWarnings;
use crate::warning;

use super::{emit, place_tips};

/// Draws `params.volume` into every channel of the pipette.
///
/// Channels sharing a well draw from it together: the well is asked for
/// `volume * channels` and the droplet is divided evenly among the tips.
/// Warnings are raised once per touched well, in channel order.
pub fn aspirate(params: &LiquidParams, ctx: &InvariantContext, draft: &mut RobotStateAndWarnings) -> SimResult<()> {
    let placement = place_tips(ctx, &params.pipette, &params.labware, &params.well)?;
    let config = ctx.config();
    let pipette = &placement.pipette.id;

    for (well, channels) in placement.channels_by_well() {
        let location = WellLocation::new(placement.labware.id.clone(), well.clone());
        let source = draft.robot_state.liquid_state.well(&location);
        let requested = params.volume * channels.len() as f64;

        if source.is_pristine() {
            emit(draft, warning::aspirate_from_pristine_well());
        } else if config.exceeds(requested, source.total()) {
            emit(draft, warning::aspirate_more_than_well_contents());
        }

        let split = split_liquid(requested, &source);
        trace!(well = %well, requested, available = source.total(), "aspirate");
        let share = split.dest.divide(channels.len());

        let liquid = &mut draft.robot_state.liquid_state;
        liquid.set_well(location, &split.source);
        for channel in channels {
            let tip = liquid.tip(pipette, channel);
            liquid.set_tip(pipette, channel, &merge_liquid(&share, &tip));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::PipetteId;
    use crate::liquid::Ingredient;
    use crate::state::{RobotState, RobotStateBuilder};
    use crate::transform::fixtures;
    use crate::warning::WarningKind;

    fn params(pipette: &str, labware: &str, well: &str, volume: f64) -> LiquidParams {
        LiquidParams::new(pipette, labware, well, volume)
    }

    fn draft_with<'a>(
        ctx: &'a InvariantContext,
        f: impl FnOnce(RobotStateBuilder<'a>) -> RobotStateBuilder<'a>,
    ) -> RobotStateAndWarnings {
        let builder = RobotState::builder(ctx)
            .tip_attached("p300SingleId", true)
            .tip_attached("p300MultiId", true);
        RobotStateAndWarnings::new(f(builder).build().unwrap())
    }

    #[test]
    fn single_ingredient_moves_into_tip() {
        let ctx = fixtures::ctx();
        let mut draft = draft_with(&ctx, |b| b.well_liquid("sourcePlateId", "A1", "ingred1", 200.0));
        aspirate(&params("p300SingleId", "sourcePlateId", "A1", 50.0), &ctx, &mut draft).unwrap();

        let liquid = &draft.robot_state.liquid_state;
        let tip = liquid.tip(&PipetteId::from("p300SingleId"), 0);
        assert_eq!(tip.liquid_volume("ingred1"), 50.0);
        assert_eq!(tip.air(), 0.0);
        let well = liquid.well(&WellLocation::new("sourcePlateId", "A1"));
        assert_eq!(well.liquid_volume("ingred1"), 150.0);
        assert!(draft.warnings.is_empty());
    }

    #[test]
    fn two_ingredients_draw_proportionally() {
        let ctx = fixtures::ctx();
        let mut draft = draft_with(&ctx, |b| {
            b.well_liquid("sourcePlateId", "A1", "ingred1", 200.0)
                .well_liquid("sourcePlateId", "A1", "ingred2", 100.0)
        });
        aspirate(&params("p300SingleId", "sourcePlateId", "A1", 60.0), &ctx, &mut draft).unwrap();

        let liquid = &draft.robot_state.liquid_state;
        let tip = liquid.tip(&PipetteId::from("p300SingleId"), 0);
        assert_eq!(tip.liquid_volume("ingred1"), 40.0);
        assert_eq!(tip.liquid_volume("ingred2"), 20.0);
        let well = liquid.well(&WellLocation::new("sourcePlateId", "A1"));
        assert_eq!(well.liquid_volume("ingred1"), 160.0);
        assert_eq!(well.liquid_volume("ingred2"), 80.0);
    }

    #[test]
    fn over_aspirate_drains_well_and_fills_with_air() {
        let ctx = fixtures::ctx();
        let mut draft = draft_with(&ctx, |b| b.well_liquid("sourcePlateId", "A1", "ingred1", 50.0));
        aspirate(&params("p300SingleId", "sourcePlateId", "A1", 60.0), &ctx, &mut draft).unwrap();

        let liquid = &draft.robot_state.liquid_state;
        let tip = liquid.tip(&PipetteId::from("p300SingleId"), 0);
        assert_eq!(tip.liquid_volume("ingred1"), 50.0);
        assert_eq!(tip.air(), 10.0);
        let well = liquid.well(&WellLocation::new("sourcePlateId", "A1"));
        assert_eq!(well.volume(&Ingredient::liquid("ingred1")), 0.0);
        assert_eq!(well.len(), 1);

        assert_eq!(draft.warnings.len(), 1);
        assert_eq!(draft.warnings[0].kind, WarningKind::AspirateMoreThanWellContents);
    }

    #[test]
    fn aspirate_adds_to_liquid_already_in_tip() {
        let ctx = fixtures::ctx();
        let mut draft = draft_with(&ctx, |b| {
            b.well_liquid("sourcePlateId", "A1", "ingred1", 200.0)
                .well_liquid("sourcePlateId", "A2", "ingred2", 200.0)
        });
        aspirate(&params("p300SingleId", "sourcePlateId", "A1", 30.0), &ctx, &mut draft).unwrap();
        aspirate(&params("p300SingleId", "sourcePlateId", "A2", 20.0), &ctx, &mut draft).unwrap();

        let tip = draft.robot_state.liquid_state.tip(&PipetteId::from("p300SingleId"), 0);
        assert_eq!(tip.liquid_volume("ingred1"), 30.0);
        assert_eq!(tip.liquid_volume("ingred2"), 20.0);
        assert_eq!(tip.total(), 50.0);
    }

    #[test]
    fn pristine_well_warns_and_stays_pristine() {
        let ctx = fixtures::ctx();
        let mut draft = draft_with(&ctx, |b| b);
        aspirate(&params("p300SingleId", "sourcePlateId", "A1", 25.0), &ctx, &mut draft).unwrap();

        let liquid = &draft.robot_state.liquid_state;
        assert!(liquid.labware().is_pristine(&WellLocation::new("sourcePlateId", "A1")));
        let tip = liquid.tip(&PipetteId::from("p300SingleId"), 0);
        assert_eq!(tip.air(), 25.0);
        assert_eq!(draft.warnings.len(), 1);
        assert_eq!(draft.warnings[0].kind, WarningKind::AspirateFromPristineWell);
    }

    #[test]
    fn eight_channel_warns_per_well_in_channel_order() {
        let ctx = fixtures::ctx();
        let mut draft = draft_with(&ctx, |b| {
            b.well_liquid("sourcePlateId", "A1", "ingred1", 100.0)
                .well_liquid("sourcePlateId", "B1", "ingred1", 10.0)
        });
        aspirate(&params("p300MultiId", "sourcePlateId", "A1", 20.0), &ctx, &mut draft).unwrap();

        let kinds: Vec<WarningKind> = draft.warnings.iter().map(|w| w.kind).collect();
        let mut expected = vec![WarningKind::AspirateMoreThanWellContents];
        expected.extend(std::iter::repeat(WarningKind::AspirateFromPristineWell).take(6));
        assert_eq!(kinds, expected);

        let liquid = &draft.robot_state.liquid_state;
        let multi = PipetteId::from("p300MultiId");
        assert_eq!(liquid.tip(&multi, 0).liquid_volume("ingred1"), 20.0);
        assert_eq!(liquid.tip(&multi, 1).liquid_volume("ingred1"), 10.0);
        assert_eq!(liquid.tip(&multi, 1).air(), 10.0);
        assert_eq!(liquid.tip(&multi, 7).air(), 20.0);
    }

    #[test]
    fn trough_is_shared_by_all_channels() {
        let ctx = fixtures::ctx();
        let mut draft = draft_with(&ctx, |b| b.well_liquid("troughId", "A1", "water", 1000.0));
        aspirate(&params("p300MultiId", "troughId", "A1", 50.0), &ctx, &mut draft).unwrap();

        let liquid = &draft.robot_state.liquid_state;
        let well = liquid.well(&WellLocation::new("troughId", "A1"));
        assert_eq!(well.liquid_volume("water"), 600.0);
        for channel in 0..8 {
            let tip = liquid.tip(&PipetteId::from("p300MultiId"), channel);
            assert_eq!(tip.liquid_volume("water"), 50.0);
        }
        assert!(draft.warnings.is_empty());
    }

    #[test]
    fn trough_over_aspirate_warns_once() {
        let ctx = fixtures::ctx();
        let mut draft = draft_with(&ctx, |b| b.well_liquid("troughId", "A1", "water", 80.0));
        aspirate(&params("p300MultiId", "troughId", "A1", 20.0), &ctx, &mut draft).unwrap();

        assert_eq!(draft.warnings.len(), 1);
        assert_eq!(draft.warnings[0].kind, WarningKind::AspirateMoreThanWellContents);
        let tip = draft.robot_state.liquid_state.tip(&PipetteId::from("p300MultiId"), 3);
        assert_eq!(tip.liquid_volume("water"), 10.0);
        assert_eq!(tip.air(), 10.0);
    }

    #[test]
    fn pristine_trough_warns_once() {
        let ctx = fixtures::ctx();
        let mut draft = draft_with(&ctx, |b| b);
        aspirate(&params("p300MultiId", "troughId", "A1", 20.0), &ctx, &mut draft).unwrap();
        assert_eq!(draft.warnings.len(), 1);
        assert_eq!(draft.warnings[0].kind, WarningKind::AspirateFromPristineWell);
    }

    #[test]
    fn unknown_pipette_is_a_contract_violation() {
        let ctx = fixtures::ctx();
        let mut draft = draft_with(&ctx, |b| b);
        let err = aspirate(&params("ghost", "sourcePlateId", "A1", 5.0), &ctx, &mut draft).unwrap_err();
        assert!(err.is_contract_violation());
    }
}
