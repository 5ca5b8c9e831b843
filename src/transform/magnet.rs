use tracing::trace;

use crate::command::{EngageMagnetParams, ModuleParams};
use crate::context::{InvariantContext, ModuleType};
use crate::error::{SimResult, SimulationError};
use crate::ident::ModuleId;
use crate::state::{ModuleState, RobotStateAndWarnings};

fn set_engaged(
    module: &ModuleId,
    engaged: bool,
    ctx: &InvariantContext,
    draft: &mut RobotStateAndWarnings,
) -> SimResult<()> {
    let entity = ctx.module(module)?;
    if entity.module_type != ModuleType::Magdeck {
        return Err(SimulationError::ModuleTypeMismatch {
            id: module.clone(),
            expected: ModuleType::Magdeck.to_string(),
            actual: entity.module_type.to_string(),
        }
        .into());
    }

    let props = draft
        .robot_state
        .modules
        .get_mut(module)
        .ok_or_else(|| SimulationError::ModuleNotOnDeck { id: module.clone() })?;
    match &mut props.module_state {
        ModuleState::Magdeck { engaged: current } => {
            trace!(module = %module, engaged, "magnet");
            *current = engaged;
            Ok(())
        }
        other => Err(SimulationError::ModuleTypeMismatch {
            id: module.clone(),
            expected: ModuleType::Magdeck.to_string(),
            actual: other.module_type().to_string(),
        }
        .into()),
    }
}

/// Raises the magnets of a magnetic module.
pub fn engage_magnet(
    params: &EngageMagnetParams,
    ctx: &InvariantContext,
    draft: &mut RobotStateAndWarnings,
) -> SimResult<()> {
    set_engaged(&params.module, true, ctx, draft)
}

/// Lowers the magnets of a magnetic module.
pub fn disengage_magnet(params: &ModuleParams, ctx: &InvariantContext, draft: &mut RobotStateAndWarnings) -> SimResult<()> {
    set_engaged(&params.module, false, ctx, draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::state::RobotState;
    use crate::transform::fixtures;

    fn engage(module: &str) -> EngageMagnetParams {
        EngageMagnetParams {
            module: ModuleId::from(module),
            engage_height: 12.0,
        }
    }

    fn engaged(draft: &RobotStateAndWarnings) -> bool {
        matches!(
            draft.robot_state.module_state(&ModuleId::from("magDeckId")),
            Some(ModuleState::Magdeck { engaged: true })
        )
    }

    #[test]
    fn engage_then_disengage() {
        let ctx = fixtures::ctx();
        let mut draft = fixtures::draft(&ctx);
        assert!(!engaged(&draft));

        engage_magnet(&engage("magDeckId"), &ctx, &mut draft).unwrap();
        assert!(engaged(&draft));

        let params = ModuleParams {
            module: ModuleId::from("magDeckId"),
        };
        disengage_magnet(&params, &ctx, &mut draft).unwrap();
        assert!(!engaged(&draft));
    }

    #[test]
    fn engage_is_idempotent() {
        let ctx = fixtures::ctx();
        let mut draft = fixtures::draft(&ctx);
        engage_magnet(&engage("magDeckId"), &ctx, &mut draft).unwrap();
        let once = draft.clone();
        engage_magnet(&engage("magDeckId"), &ctx, &mut draft).unwrap();
        assert_eq!(draft, once);
    }

    #[test]
    fn disengage_is_idempotent() {
        let ctx = fixtures::ctx();
        let mut draft = fixtures::draft(&ctx);
        let before = draft.clone();
        let params = ModuleParams {
            module: ModuleId::from("magDeckId"),
        };
        disengage_magnet(&params, &ctx, &mut draft).unwrap();
        assert!(!engaged(&draft));
        assert_eq!(draft, before);
        assert!(draft.warnings.is_empty());
    }

    #[test]
    fn wrong_module_type_is_rejected() {
        let ctx = fixtures::ctx();
        let mut draft = fixtures::draft(&ctx);
        let err = engage_magnet(&engage("tempDeckId"), &ctx, &mut draft).unwrap_err();
        assert!(matches!(
            err,
            SimError::Simulation(SimulationError::ModuleTypeMismatch { .. })
        ));
    }

    #[test]
    fn module_missing_from_deck_is_rejected() {
        let ctx = fixtures::ctx();
        let mut draft = RobotStateAndWarnings::new(RobotState::builder(&ctx).build().unwrap());
        let err = engage_magnet(&engage("magDeckId"), &ctx, &mut draft).unwrap_err();
        assert!(matches!(
            err,
            SimError::Simulation(SimulationError::ModuleNotOnDeck { .. })
        ));
    }

    #[test]
    fn unknown_module_is_rejected() {
        let ctx = fixtures::ctx();
        let mut draft = fixtures::draft(&ctx);
        let err = engage_magnet(&engage("ghost"), &ctx, &mut draft).unwrap_err();
        assert!(err.is_contract_violation());
    }
}
