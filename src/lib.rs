//! # liquidsim - Robot-state simulation for liquid-handling protocols
//!
//! liquidsim replays an ordered list of robot commands against an initial
//! robot state and reports the resulting state plus physical warnings. It is
//! deterministic and side-effect free: the same inputs always give the same
//! outputs, and input states are never modified.
//!
//! ## Core Concepts
//!
//! - **InvariantContext**: pipettes, labware definitions and modules; fixed for a run
//! - **RobotState**: tips, liquid per tip channel and per well, module states
//! - **Command**: one robot action (`aspirate`, `dispense`, `pickUpTip`, ...)
//! - **Warning**: a physically odd but legal event, such as aspirating from an empty well
//!
//! ## Usage
//!
//! ```rust,ignore
//! use liquidsim::labware::presets;
//! use liquidsim::{next_robot_state_and_warnings, Command, InvariantContext, Mount, PipetteEntity, RobotState};
//!
//! let ctx = InvariantContext::builder()
//!     .pipette(PipetteEntity::single("p300", Mount::Left, 300.0))
//!     .labware("plate", presets::well_plate_96())
//!     .build()?;
//! let start = RobotState::builder(&ctx)
//!     .tip_attached("p300", true)
//!     .well_liquid("plate", "A1", "water", 200.0)
//!     .build()?;
//!
//! let result = next_robot_state_and_warnings(
//!     &[
//!         Command::aspirate("p300", "plate", "A1", 50.0),
//!         Command::dispense("p300", "plate", "B1", 50.0),
//!     ],
//!     &ctx,
//!     &start,
//! )?;
//! assert!(result.warnings.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

// Core types
pub mod config;
pub mod context;
pub mod error;
pub mod ident;
pub mod labware;
pub mod liquid;
pub mod state;
pub mod warning;

// Commands and their replay
pub mod command;
pub mod sequencer;
pub mod transform;

// Re-export primary types at crate root for convenience
pub use command::{commands_from_json, commands_to_json_pretty, Command};
pub use config::SimulationConfig;
pub use context::{InvariantContext, LabwareEntity, ModuleEntity, ModuleType, Mount, PipetteEntity};
pub use error::{SimError, SimResult, SimulationError, ValidationError};
pub use ident::{IngredientId, LabwareId, ModuleId, PipetteId, RunId, WellName};
pub use labware::LabwareDefinition;
pub use liquid::{merge_liquid, split_liquid, Ingredient, LiquidContents, LiquidState, SplitLiquid};
pub use sequencer::{next_robot_state_and_warnings, next_robot_state_and_warnings_single, simulate_timeline, Timeline};
pub use state::{ModuleState, RobotState, RobotStateAndWarnings, StateFingerprint, TipState};
pub use warning::{Warning, WarningKind};
