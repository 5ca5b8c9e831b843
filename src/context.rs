//! Invariant context: the hardware and labware topology of a protocol.
//!
//! The context is built once, validated, and then only ever read. Every
//! transformer receives it by shared reference; it is `Send + Sync`, so
//! independent runs on other threads may share one context.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::error::{SimError, SimulationError, ValidationError};
use crate::ident::{LabwareId, ModuleId, PipetteId};
use crate::labware::LabwareDefinition;

/// Channel counts the simulator understands.
pub const SUPPORTED_CHANNELS: [u8; 2] = [1, 8];

/// Pipette mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mount {
    /// Left mount.
    Left,
    /// Right mount.
    Right,
}

/// A pipette attached to the robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipetteEntity {
    /// Pipette id.
    pub id: PipetteId,
    /// Model name, e.g. `"p300_single_gen2"`.
    pub name: String,
    /// Number of channels (1 or 8).
    pub channels: u8,
    /// Mount the pipette sits on.
    pub mount: Mount,
    /// Maximum volume in µL.
    pub max_volume: f64,
}

impl PipetteEntity {
    /// A single-channel pipette.
    #[must_use]
    pub fn single(id: impl Into<PipetteId>, mount: Mount, max_volume: f64) -> Self {
        Self {
            id: id.into(),
            name: format!("p{max_volume}_single"),
            channels: 1,
            mount,
            max_volume,
        }
    }

    /// An eight-channel pipette.
    #[must_use]
    pub fn multi(id: impl Into<PipetteId>, mount: Mount, max_volume: f64) -> Self {
        Self {
            id: id.into(),
            name: format!("p{max_volume}_multi"),
            channels: 8,
            mount,
            max_volume,
        }
    }

    /// Overrides the model name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_blank() {
            return Err(ValidationError::MissingField {
                field: "pipette.id".to_string(),
            });
        }
        if !SUPPORTED_CHANNELS.contains(&self.channels) {
            return Err(ValidationError::InvalidChannelCount {
                channels: self.channels,
            });
        }
        if !self.max_volume.is_finite() || self.max_volume <= 0.0 {
            return Err(ValidationError::InvalidVolume {
                field: format!("pipettes.{}.maxVolume", self.id),
                value: self.max_volume,
            });
        }
        Ok(())
    }
}

/// A labware placed on the deck.
#[derive(Debug, Clone, PartialEq)]
pub struct LabwareEntity {
    /// Labware id.
    pub id: LabwareId,
    /// Shared definition.
    pub def: Arc<LabwareDefinition>,
}

/// Kind of hardware module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    /// Magnetic module.
    Magdeck,
    /// Temperature module.
    Tempdeck,
    /// Thermocycler.
    Thermocycler,
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Magdeck => write!(f, "magdeck"),
            Self::Tempdeck => write!(f, "tempdeck"),
            Self::Thermocycler => write!(f, "thermocycler"),
        }
    }
}

/// A hardware module attached to the robot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntity {
    /// Module id.
    pub id: ModuleId,
    /// Module kind.
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    /// Hardware model, e.g. `"GEN1"`.
    pub model: String,
}

/// Immutable hardware/labware topology for one simulation run.
#[derive(Debug, Clone)]
pub struct InvariantContext {
    pipettes: BTreeMap<PipetteId, PipetteEntity>,
    labware: BTreeMap<LabwareId, LabwareEntity>,
    modules: BTreeMap<ModuleId, ModuleEntity>,
    config: SimulationConfig,
}

impl InvariantContext {
    /// Starts building a context.
    #[must_use]
    pub fn builder() -> InvariantContextBuilder {
        InvariantContextBuilder::default()
    }

    /// Parse and validate a context from JSON.
    ///
    /// Expected shape (camelCase, entity maps keyed by id):
    /// `{ "pipetteEntities": {..}, "labwareEntities": {id: {"def": ..}}, "moduleEntities": {..}, "config": {..} }`
    pub fn from_json(s: &str) -> Result<Self, SimError> {
        let raw: RawContext = serde_json::from_str(s)
            .map_err(|e| SimError::serialization(format!("deserialize invariant context: {e}")))?;

        let mut builder = Self::builder().config(raw.config);
        for (id, p) in raw.pipette_entities {
            builder = builder.pipette(PipetteEntity {
                id,
                name: p.name,
                channels: p.channels,
                mount: p.mount,
                max_volume: p.max_volume,
            });
        }
        for (id, l) in raw.labware_entities {
            builder = builder.labware(id, l.def);
        }
        for (id, m) in raw.module_entities {
            builder = builder.module(id, m.module_type, m.model);
        }
        Ok(builder.build()?)
    }

    /// Simulation settings for this run.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Looks up a pipette.
    pub fn pipette(&self, id: &PipetteId) -> Result<&PipetteEntity, SimulationError> {
        self.pipettes
            .get(id)
            .ok_or_else(|| SimulationError::UnknownPipette { id: id.clone() })
    }

    /// Looks up a labware.
    pub fn labware(&self, id: &LabwareId) -> Result<&LabwareEntity, SimulationError> {
        self.labware
            .get(id)
            .ok_or_else(|| SimulationError::UnknownLabware { id: id.clone() })
    }

    /// Looks up a module.
    pub fn module(&self, id: &ModuleId) -> Result<&ModuleEntity, SimulationError> {
        self.modules
            .get(id)
            .ok_or_else(|| SimulationError::UnknownModule { id: id.clone() })
    }

    /// Every pipette entity, ordered by id.
    pub fn pipette_entities(&self) -> impl Iterator<Item = &PipetteEntity> {
        self.pipettes.values()
    }

    /// Every labware entity, ordered by id.
    pub fn labware_entities(&self) -> impl Iterator<Item = &LabwareEntity> {
        self.labware.values()
    }

    /// Every module entity, ordered by id.
    pub fn module_entities(&self) -> impl Iterator<Item = &ModuleEntity> {
        self.modules.values()
    }

    /// The fixed trash, if the protocol has one.
    #[must_use]
    pub fn trash(&self) -> Option<&LabwareEntity> {
        self.labware.values().find(|l| l.def.is_trash())
    }
}

/// Builder for [`InvariantContext`].
#[derive(Debug, Clone, Default)]
pub struct InvariantContextBuilder {
    pipettes: Vec<PipetteEntity>,
    labware: Vec<LabwareEntity>,
    modules: Vec<ModuleEntity>,
    config: SimulationConfig,
}

impl InvariantContextBuilder {
    /// Adds a pipette.
    #[must_use]
    pub fn pipette(mut self, pipette: PipetteEntity) -> Self {
        self.pipettes.push(pipette);
        self
    }

    /// Adds a labware with its definition.
    #[must_use]
    pub fn labware(mut self, id: impl Into<LabwareId>, def: impl Into<Arc<LabwareDefinition>>) -> Self {
        self.labware.push(LabwareEntity {
            id: id.into(),
            def: def.into(),
        });
        self
    }

    /// Adds a module.
    #[must_use]
    pub fn module(mut self, id: impl Into<ModuleId>, module_type: ModuleType, model: impl Into<String>) -> Self {
        self.modules.push(ModuleEntity {
            id: id.into(),
            module_type,
            model: model.into(),
        });
        self
    }

    /// Sets the simulation config.
    #[must_use]
    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates everything and builds the context.
    pub fn build(self) -> Result<InvariantContext, ValidationError> {
        self.config.validate()?;

        let mut pipettes = BTreeMap::new();
        for pipette in self.pipettes {
            pipette.validate()?;
            let id = pipette.id.clone();
            if pipettes.insert(id.clone(), pipette).is_some() {
                return Err(duplicate("pipette", id.as_str()));
            }
        }

        let mut labware = BTreeMap::new();
        for entity in self.labware {
            if entity.id.is_blank() {
                return Err(ValidationError::MissingField {
                    field: "labware.id".to_string(),
                });
            }
            entity.def.validate()?;
            let id = entity.id.clone();
            if labware.insert(id.clone(), entity).is_some() {
                return Err(duplicate("labware", id.as_str()));
            }
        }

        let mut modules = BTreeMap::new();
        for module in self.modules {
            if module.id.is_blank() {
                return Err(ValidationError::MissingField {
                    field: "module.id".to_string(),
                });
            }
            let id = module.id.clone();
            if modules.insert(id.clone(), module).is_some() {
                return Err(duplicate("module", id.as_str()));
            }
        }

        Ok(InvariantContext {
            pipettes,
            labware,
            modules,
            config: self.config,
        })
    }
}

fn duplicate(kind: &'static str, id: &str) -> ValidationError {
    ValidationError::DuplicateEntity {
        kind,
        id: id.to_string(),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPipette {
    name: String,
    channels: u8,
    mount: Mount,
    max_volume: f64,
}

#[derive(Deserialize)]
struct RawLabware {
    def: LabwareDefinition,
}

#[derive(Deserialize)]
struct RawModule {
    #[serde(rename = "type")]
    module_type: ModuleType,
    model: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContext {
    #[serde(default)]
    pipette_entities: BTreeMap<PipetteId, RawPipette>,
    #[serde(default)]
    labware_entities: BTreeMap<LabwareId, RawLabware>,
    #[serde(default)]
    module_entities: BTreeMap<ModuleId, RawModule>,
    #[serde(default)]
    config: SimulationConfig,
}
