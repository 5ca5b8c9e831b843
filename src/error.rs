//! Error types for liquidsim.
//!
//! All errors are strongly typed using thiserror. Physical anomalies
//! (over-aspiration, pristine wells, ...) are *not* errors: they are
//! reported as [`Warning`](crate::warning::Warning)s alongside the state.
//! The errors here signal malformed input or a broken upstream contract.

use thiserror::Error;

use crate::ident::{LabwareId, ModuleId, PipetteId, WellName};

/// Validation errors raised while checking definitions, configs and command params.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Field '{field}' has invalid volume {value} (must be finite and >= 0)")]
    InvalidVolume {
        field: String,
        value: f64,
    },

    #[error("Field '{field}' has invalid value {value}: {reason}")]
    InvalidNumber {
        field: String,
        value: f64,
        reason: String,
    },

    #[error("Pipette channel count {channels} is not supported (expected 1 or 8)")]
    InvalidChannelCount {
        channels: u8,
    },

    #[error("Invalid well name '{well}'")]
    InvalidWellName {
        well: String,
    },

    #[error("Invalid labware definition '{load_name}': {reason}")]
    InvalidLabwareDefinition {
        load_name: String,
        reason: String,
    },

    #[error("Duplicate {kind} id '{id}'")]
    DuplicateEntity {
        kind: &'static str,
        id: String,
    },

    #[error("Invalid simulation config: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Contract violations discovered while replaying a command.
///
/// The command list is expected to be validated upstream; hitting one of
/// these means the simulation cannot produce a trustworthy state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("Pipette not found: {id}")]
    UnknownPipette {
        id: PipetteId,
    },

    #[error("Labware not found: {id}")]
    UnknownLabware {
        id: LabwareId,
    },

    #[error("Module not found: {id}")]
    UnknownModule {
        id: ModuleId,
    },

    #[error("Well '{well}' not found in labware {labware}")]
    UnknownWell {
        labware: LabwareId,
        well: WellName,
    },

    #[error("Module {id} has no deck placement in the robot state")]
    ModuleNotOnDeck {
        id: ModuleId,
    },

    #[error("Module {id} is a {actual}, expected {expected}")]
    ModuleTypeMismatch {
        id: ModuleId,
        expected: String,
        actual: String,
    },

    #[error("Labware {id} is not a tiprack")]
    NotATiprack {
        id: LabwareId,
    },

    #[error("No well under every tip of a {channels}-channel pipette at {labware}/{well}")]
    NoWellsForTips {
        labware: LabwareId,
        well: WellName,
        channels: u8,
    },

    #[error("Command limit exceeded (max: {max}, actual: {actual})")]
    CommandLimitExceeded {
        max: usize,
        actual: usize,
    },
}

/// Top-level error type for liquidsim.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Command {index} ({command}) failed: {source}")]
    CommandFailed {
        index: usize,
        command: &'static str,
        #[source]
        source: Box<SimError>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl SimError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Wraps this error with the index and kind of the command that raised it.
    #[must_use]
    pub fn at_command(self, index: usize, command: &'static str) -> Self {
        Self::CommandFailed {
            index,
            command,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, unwrapping any `CommandFailed` layers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::CommandFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true if this (or the wrapped) error is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self.root(), Self::Validation(_))
    }

    /// Returns true if this (or the wrapped) error is a contract violation.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self.root(), Self::Simulation(_) | Self::Serialization { .. })
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self.root(), Self::Internal { .. })
    }
}

/// Result type alias for liquidsim operations.
pub type SimResult<T> = Result<T, SimError>;
