//! Command list serialization helpers.
//!
//! Serde provides the encoding; these helpers centralize error mapping so
//! that an unknown command kind surfaces as a contract violation.

use crate::error::{SimError, SimResult};

use super::Command;

/// Decode an ordered command list from a JSON array.
///
/// Fails on the first unknown command kind or malformed params.
pub fn commands_from_json(s: &str) -> SimResult<Vec<Command>> {
    serde_json::from_str::<Vec<Command>>(s)
        .map_err(|e| SimError::serialization(format!("deserialize commands: {e}")))
}

/// Encode a command list as pretty JSON.
pub fn commands_to_json_pretty(commands: &[Command]) -> SimResult<String> {
    serde_json::to_string_pretty(commands)
        .map_err(|e| SimError::serialization(format!("serialize commands: {e}")))
}
