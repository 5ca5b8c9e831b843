//! Command validation.
//!
//! Commands are expected to arrive well-formed, but the sequencer checks
//! the cheap structural properties (ids present, numbers finite) before
//! replaying them so that a bad value cannot leak into the liquid tables.

use crate::error::ValidationError;

use super::{
    BlowoutParams, Command, DelayParams, DelayWait, EngageMagnetParams, LiquidParams, ModuleParams,
    TemperatureParams, TipParams, TouchTipParams,
};

fn validate_id(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn validate_volume(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidVolume {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidNumber {
            field: field.to_string(),
            value,
            reason: "must be finite".to_string(),
        });
    }
    Ok(())
}

fn validate_flow_rate(value: Option<f64>) -> Result<(), ValidationError> {
    let Some(v) = value else { return Ok(()); };
    if !v.is_finite() || v <= 0.0 {
        return Err(ValidationError::InvalidNumber {
            field: "flowRate".to_string(),
            value: v,
            reason: "must be finite and > 0".to_string(),
        });
    }
    Ok(())
}

fn validate_offset(value: Option<f64>) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| validate_finite("offsetFromBottomMm", v))
}

impl LiquidParams {
    /// Validates these params.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("pipette", self.pipette.as_str())?;
        validate_id("labware", self.labware.as_str())?;
        validate_id("well", self.well.as_str())?;
        validate_volume("volume", self.volume)?;
        validate_flow_rate(self.flow_rate)?;
        validate_offset(self.offset_from_bottom_mm)
    }
}

impl BlowoutParams {
    /// Validates these params.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("pipette", self.pipette.as_str())?;
        validate_id("labware", self.labware.as_str())?;
        validate_id("well", self.well.as_str())?;
        validate_flow_rate(self.flow_rate)?;
        validate_offset(self.offset_from_bottom_mm)
    }
}

impl TouchTipParams {
    /// Validates these params.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("pipette", self.pipette.as_str())?;
        validate_id("labware", self.labware.as_str())?;
        validate_id("well", self.well.as_str())?;
        validate_offset(self.offset_from_bottom_mm)
    }
}

impl TipParams {
    /// Validates these params.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("pipette", self.pipette.as_str())?;
        validate_id("labware", self.labware.as_str())?;
        validate_id("well", self.well.as_str())
    }
}

impl DelayParams {
    /// Validates these params.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.wait {
            DelayWait::Seconds(s) if !s.is_finite() || s < 0.0 => Err(ValidationError::InvalidNumber {
                field: "wait".to_string(),
                value: s,
                reason: "must be finite and >= 0".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl ModuleParams {
    /// Validates these params.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("module", self.module.as_str())
    }
}

impl EngageMagnetParams {
    /// Validates these params.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("module", self.module.as_str())?;
        validate_finite("engageHeight", self.engage_height)
    }
}

impl TemperatureParams {
    /// Validates these params.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("module", self.module.as_str())?;
        validate_finite("temperature", self.temperature)
    }
}

impl Command {
    /// Validates the params of this command.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Aspirate(p) | Self::Dispense(p) | Self::AirGap(p) => p.validate(),
            Self::Blowout(p) => p.validate(),
            Self::TouchTip(p) => p.validate(),
            Self::PickUpTip(p) | Self::DropTip(p) => p.validate(),
            Self::Delay(p) => p.validate(),
            Self::EngageMagnet(p) => p.validate(),
            Self::DisengageMagnet(p)
            | Self::DeactivateTemperature(p)
            | Self::OpenLid(p)
            | Self::CloseLid(p)
            | Self::DeactivateBlock(p)
            | Self::DeactivateLid(p) => p.validate(),
            Self::SetTargetTemperature(p)
            | Self::AwaitTemperature(p)
            | Self::SetTargetBlockTemperature(p)
            | Self::SetTargetLidTemperature(p) => p.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_volume() {
        let err = Command::aspirate("p", "l", "A1", -5.0).validate().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidVolume { .. }));
    }

    #[test]
    fn rejects_nan_volume() {
        assert!(Command::dispense("p", "l", "A1", f64::NAN).validate().is_err());
    }

    #[test]
    fn rejects_blank_ids() {
        let err = Command::pick_up_tip("p", " ", "A1").validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "labware".to_string()
            }
        );
    }

    #[test]
    fn rejects_zero_flow_rate() {
        let mut params = LiquidParams::new("p", "l", "A1", 10.0);
        params.flow_rate = Some(0.0);
        assert!(Command::Aspirate(params).validate().is_err());
    }

    #[test]
    fn rejects_negative_delay() {
        let cmd = Command::Delay(DelayParams {
            wait: DelayWait::Seconds(-1.0),
            message: None,
        });
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn accepts_well_formed_commands() {
        Command::aspirate("p", "l", "A1", 0.0).validate().unwrap();
        Command::engage_magnet("m", 12.0).validate().unwrap();
        Command::blowout("p", "trash", "A1").validate().unwrap();
    }
}
