//! Simulation configuration.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, ValidationError};

/// Settings that shape a simulation run.
///
/// Carried inside the [`InvariantContext`](crate::context::InvariantContext)
/// so every transformer sees the same values for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    /// Distance between neighbouring tips of a multi-channel pipette, in mm.
    pub multi_channel_spacing_mm: f64,
    /// Slack applied when comparing volumes, in µL.
    pub volume_tolerance_ul: f64,
    /// Emit `OVER_MAX_WELL_VOLUME` when a dispense overfills a well.
    pub warn_on_well_overflow: bool,
    /// Maximum number of commands accepted in one sequence.
    pub max_commands: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            multi_channel_spacing_mm: 9.0,
            volume_tolerance_ul: 1e-6,
            warn_on_well_overflow: true,
            max_commands: 100_000,
        }
    }
}

impl SimulationConfig {
    /// Validate the config.
    ///
    /// Called by the context builder before a context can be constructed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.multi_channel_spacing_mm.is_finite() || self.multi_channel_spacing_mm <= 0.0 {
            return Err(ValidationError::InvalidConfig {
                reason: "multi_channel_spacing_mm must be finite and > 0".to_string(),
            });
        }
        if !self.volume_tolerance_ul.is_finite() || self.volume_tolerance_ul < 0.0 {
            return Err(ValidationError::InvalidConfig {
                reason: "volume_tolerance_ul must be finite and >= 0".to_string(),
            });
        }
        if self.max_commands == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "max_commands must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate a config from JSON. Missing keys take their defaults.
    pub fn from_json(s: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| SimError::serialization(format!("deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// True when `requested` is larger than `available` beyond the tolerance.
    #[must_use]
    pub fn exceeds(&self, requested: f64, available: f64) -> bool {
        requested > available + self.volume_tolerance_ul
    }
}
