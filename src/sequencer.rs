//! Command sequencer.
//!
//! Folds commands over a robot state. The caller's state is never altered:
//! each run works on a clone whose liquid tables share storage with the
//! input until a command first writes to them.

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, trace, warn};

use crate::command::Command;
use crate::context::InvariantContext;
use crate::error::{SimError, SimResult, SimulationError};
use crate::ident::RunId;
use crate::state::{RobotState, RobotStateAndWarnings};
use crate::transform;
use crate::warning::Warning;

/// One state per command, each paired with that command's warnings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Frame `i` is the state after command `i`.
    pub frames: Vec<RobotStateAndWarnings>,
}

impl Timeline {
    /// State after the last command, if any command ran.
    #[must_use]
    pub fn final_state(&self) -> Option<&RobotState> {
        self.frames.last().map(|f| &f.robot_state)
    }

    /// Every warning of the run, in command order.
    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.frames.iter().flat_map(|f| f.warnings.iter())
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if no command ran.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn step(index: usize, command: &Command, ctx: &InvariantContext, draft: &mut RobotStateAndWarnings) -> SimResult<()> {
    trace!(index, command = command.kind(), "apply");
    command
        .validate()
        .map_err(SimError::from)
        .and_then(|()| transform::apply(command, ctx, draft))
        .map_err(|e| {
            warn!(index, command = command.kind(), error = %e, "command rejected");
            e.at_command(index, command.kind())
        })
}

fn check_length(commands: &[Command], ctx: &InvariantContext) -> SimResult<()> {
    let max = ctx.config().max_commands;
    if commands.len() > max {
        return Err(SimulationError::CommandLimitExceeded {
            max,
            actual: commands.len(),
        }
        .into());
    }
    Ok(())
}

/// Applies one command to `prev`.
///
/// The returned warnings are those of this command only.
pub fn next_robot_state_and_warnings_single(
    command: &Command,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> SimResult<RobotStateAndWarnings> {
    let mut draft = RobotStateAndWarnings::new(prev.clone());
    step(0, command, ctx, &mut draft)?;
    Ok(draft)
}

/// Applies `commands` in order, starting from `initial`.
///
/// Warnings of every command are concatenated in command order. An empty
/// list returns `initial` with no warnings.
pub fn next_robot_state_and_warnings(
    commands: &[Command],
    ctx: &InvariantContext,
    initial: &RobotState,
) -> SimResult<RobotStateAndWarnings> {
    check_length(commands, ctx)?;
    let run_id = RunId::new();
    let span = debug_span!("simulate", run_id = %run_id, commands = commands.len());
    let _enter = span.enter();

    let mut draft = RobotStateAndWarnings::new(initial.clone());
    for (index, command) in commands.iter().enumerate() {
        step(index, command, ctx, &mut draft)?;
    }
    debug!(warnings = draft.warnings.len(), "run complete");
    Ok(draft)
}

/// Applies `commands` in order and keeps every intermediate state.
///
/// Frames share unchanged liquid tables with their predecessor.
pub fn simulate_timeline(commands: &[Command], ctx: &InvariantContext, initial: &RobotState) -> SimResult<Timeline> {
    check_length(commands, ctx)?;
    let run_id = RunId::new();
    let span = debug_span!("simulate", run_id = %run_id, commands = commands.len());
    let _enter = span.enter();

    let mut frames: Vec<RobotStateAndWarnings> = Vec::with_capacity(commands.len());
    for (index, command) in commands.iter().enumerate() {
        let prev = frames.last().map_or(initial, |f| &f.robot_state);
        let mut draft = RobotStateAndWarnings::new(prev.clone());
        step(index, command, ctx, &mut draft)?;
        frames.push(draft);
    }
    debug!(frames = frames.len(), "timeline complete");
    Ok(Timeline { frames })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::context::{Mount, PipetteEntity};
    use crate::labware::presets;
    use crate::transform::fixtures;
    use crate::warning::WarningKind;

    fn protocol() -> Vec<Command> {
        vec![
            Command::aspirate("p300SingleId", "sourcePlateId", "A1", 50.0),
            Command::dispense("p300SingleId", "destPlateId", "A1", 50.0),
            Command::engage_magnet("magDeckId", 10.0),
            Command::aspirate("p300SingleId", "sourcePlateId", "A2", 30.0),
            Command::blowout("p300SingleId", "destPlateId", "A2"),
        ]
    }

    fn initial(ctx: &InvariantContext) -> RobotState {
        RobotState::builder(ctx)
            .module_slot("magDeckId", "1")
            .tip_attached("p300SingleId", true)
            .well_liquid("sourcePlateId", "A1", "ingred1", 100.0)
            .build()
            .unwrap()
    }

    #[test]
    fn empty_sequence_returns_initial_state() {
        let ctx = fixtures::ctx();
        let start = initial(&ctx);
        let out = next_robot_state_and_warnings(&[], &ctx, &start).unwrap();
        assert_eq!(out.robot_state, start);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn input_state_is_not_mutated() {
        let ctx = fixtures::ctx();
        let start = initial(&ctx);
        let snapshot = start.clone();
        next_robot_state_and_warnings(&protocol(), &ctx, &start).unwrap();
        assert_eq!(start, snapshot);
    }

    #[test]
    fn sequence_equals_fold_of_single_steps() {
        let ctx = fixtures::ctx();
        let start = initial(&ctx);
        let commands = protocol();

        let whole = next_robot_state_and_warnings(&commands, &ctx, &start).unwrap();

        let mut state = start;
        let mut warnings = Vec::new();
        for command in &commands {
            let step = next_robot_state_and_warnings_single(command, &ctx, &state).unwrap();
            warnings.extend(step.warnings);
            state = step.robot_state;
        }
        assert_eq!(whole.robot_state, state);
        assert_eq!(whole.warnings, warnings);
        // A2 was never filled.
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::AspirateFromPristineWell);
    }

    #[test]
    fn timeline_frames_match_prefixes() {
        let ctx = fixtures::ctx();
        let start = initial(&ctx);
        let commands = protocol();
        let timeline = simulate_timeline(&commands, &ctx, &start).unwrap();
        assert_eq!(timeline.len(), commands.len());

        for i in 0..commands.len() {
            let prefix = next_robot_state_and_warnings(&commands[..=i], &ctx, &start).unwrap();
            assert_eq!(timeline.frames[i].robot_state, prefix.robot_state);
        }
        let whole = next_robot_state_and_warnings(&commands, &ctx, &start).unwrap();
        assert_eq!(timeline.final_state(), Some(&whole.robot_state));
        assert_eq!(timeline.warnings().cloned().collect::<Vec<_>>(), whole.warnings);
    }

    #[test]
    fn unchanged_tables_share_storage_between_frames() {
        let ctx = fixtures::ctx();
        let start = initial(&ctx);
        let timeline = simulate_timeline(&[Command::engage_magnet("magDeckId", 10.0)], &ctx, &start).unwrap();
        let frame = &timeline.frames[0].robot_state;
        assert!(frame.liquid_state.shares_storage_with(&start.liquid_state));
    }

    #[test]
    fn failure_reports_index_and_kind() {
        let ctx = fixtures::ctx();
        let start = initial(&ctx);
        let commands = vec![
            Command::aspirate("p300SingleId", "sourcePlateId", "A1", 10.0),
            Command::pick_up_tip("p300SingleId", "sourcePlateId", "A1"),
        ];
        let err = next_robot_state_and_warnings(&commands, &ctx, &start).unwrap_err();
        match &err {
            SimError::CommandFailed { index, command, .. } => {
                assert_eq!(*index, 1);
                assert_eq!(*command, "pickUpTip");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_contract_violation());
    }

    #[test]
    fn invalid_params_are_rejected_before_applying() {
        let ctx = fixtures::ctx();
        let start = initial(&ctx);
        let err = next_robot_state_and_warnings_single(
            &Command::aspirate("p300SingleId", "sourcePlateId", "A1", f64::INFINITY),
            &ctx,
            &start,
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn command_limit_is_enforced() {
        let ctx = InvariantContext::builder()
            .pipette(PipetteEntity::single("p", Mount::Left, 300.0))
            .labware("plate", presets::well_plate_96())
            .config(SimulationConfig {
                max_commands: 2,
                ..Default::default()
            })
            .build()
            .unwrap();
        let start = RobotState::builder(&ctx).build().unwrap();
        let commands = vec![Command::disengage_magnet("m"); 3];
        let err = next_robot_state_and_warnings(&commands, &ctx, &start).unwrap_err();
        assert!(matches!(
            err,
            SimError::Simulation(SimulationError::CommandLimitExceeded { max: 2, actual: 3 })
        ));
    }
}
