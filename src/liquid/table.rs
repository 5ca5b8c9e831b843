//! Relational liquid storage.
//!
//! Liquid is stored as rows keyed by `(location, ingredient)` instead of
//! nested maps. Per-location reads are a range scan; `Ingredient::Air`
//! sorts first, so a location's rows start at `(location, Air)`.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::ops::Bound;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ident::{LabwareId, PipetteId, WellName};

use super::{Ingredient, LiquidContents};

/// One channel of one pipette.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TipLocation {
    /// Pipette holding the tip.
    pub pipette: PipetteId,
    /// Zero-based channel index.
    pub channel: u8,
}

impl TipLocation {
    /// Creates a tip location.
    #[must_use]
    pub fn new(pipette: impl Into<PipetteId>, channel: u8) -> Self {
        Self {
            pipette: pipette.into(),
            channel,
        }
    }
}

/// One well of one labware.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WellLocation {
    /// Labware holding the well.
    pub labware: LabwareId,
    /// Well name.
    pub well: WellName,
}

impl WellLocation {
    /// Creates a well location.
    #[must_use]
    pub fn new(labware: impl Into<LabwareId>, well: impl Into<WellName>) -> Self {
        Self {
            labware: labware.into(),
            well: well.into(),
        }
    }
}

/// Rows of `(location, ingredient) -> volume`.
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidTable<L> {
    rows: BTreeMap<(L, Ingredient), f64>,
}

impl<L> Default for LiquidTable<L> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<L: Clone + Ord> LiquidTable<L> {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn location_rows<'a>(&'a self, location: &'a L) -> impl Iterator<Item = (&'a Ingredient, f64)> + 'a {
        self.rows
            .range((
                Bound::Included((location.clone(), Ingredient::Air)),
                Bound::Unbounded,
            ))
            .take_while(move |((l, _), _)| l == location)
            .map(|((_, ingredient), volume)| (ingredient, *volume))
    }

    /// Contents recorded at `location`; empty if pristine.
    #[must_use]
    pub fn contents(&self, location: &L) -> LiquidContents {
        self.location_rows(location)
            .map(|(i, v)| (i.clone(), v))
            .collect()
    }

    /// True if no row mentions `location`.
    #[must_use]
    pub fn is_pristine(&self, location: &L) -> bool {
        self.location_rows(location).next().is_none()
    }

    /// Total volume at `location`, air included.
    #[must_use]
    pub fn total(&self, location: &L) -> f64 {
        self.location_rows(location).map(|(_, v)| v).sum()
    }

    /// Replaces every row of `location` with `contents`.
    pub fn replace(&mut self, location: L, contents: &LiquidContents) {
        let stale: Vec<(L, Ingredient)> = self
            .location_rows(&location)
            .map(|(i, _)| (location.clone(), i.clone()))
            .collect();
        for key in stale {
            self.rows.remove(&key);
        }
        for (ingredient, volume) in contents.iter() {
            self.rows.insert((location.clone(), ingredient.clone()), volume);
        }
    }

    /// Iterates over every `(location, ingredient, volume)` row.
    pub fn rows(&self) -> impl Iterator<Item = (&L, &Ingredient, f64)> {
        self.rows.iter().map(|((l, i), v)| (l, i, *v))
    }

    /// Iterates over every distinct location that has rows.
    pub fn locations(&self) -> impl Iterator<Item = &L> {
        let mut last: Option<&L> = None;
        self.rows.keys().filter_map(move |(l, _)| {
            if last == Some(l) {
                None
            } else {
                last = Some(l);
                Some(l)
            }
        })
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Serialize)]
struct RowRef<'a, L> {
    #[serde(flatten)]
    location: &'a L,
    ingredient: &'a Ingredient,
    volume: f64,
}

#[derive(Deserialize)]
struct Row<L> {
    #[serde(flatten)]
    location: L,
    ingredient: Ingredient,
    volume: f64,
}

impl<L: Serialize> Serialize for LiquidTable<L> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows.iter().map(|((location, ingredient), volume)| RowRef {
            location,
            ingredient,
            volume: *volume,
        }))
    }
}

impl<'de, L: DeserializeOwned + Ord> Deserialize<'de> for LiquidTable<L> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<Row<L>>::deserialize(deserializer)?;
        Ok(Self {
            rows: rows
                .into_iter()
                .map(|row| ((row.location, row.ingredient), row.volume))
                .collect(),
        })
    }
}

/// Liquid held in every tip and every well.
///
/// Both tables sit behind `Arc` and are copied on first write, so cloning a
/// state is cheap and a clone never observes writes made through another.
///
/// Only channels that have held liquid have rows, in memory and in the
/// serialized `pipettes` table. Use [`LiquidState::pipette_contents`] for a
/// view with one entry per channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidState {
    pipettes: Arc<LiquidTable<TipLocation>>,
    labware: Arc<LiquidTable<WellLocation>>,
}

impl LiquidState {
    /// Empty liquid state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tip rows.
    #[must_use]
    pub fn pipettes(&self) -> &LiquidTable<TipLocation> {
        &self.pipettes
    }

    /// Well rows.
    #[must_use]
    pub fn labware(&self) -> &LiquidTable<WellLocation> {
        &self.labware
    }

    /// Contents of one tip channel.
    #[must_use]
    pub fn tip(&self, pipette: &PipetteId, channel: u8) -> LiquidContents {
        self.pipettes.contents(&TipLocation::new(pipette.clone(), channel))
    }

    /// Contents of every channel of a pipette: always exactly `channels` entries.
    #[must_use]
    pub fn pipette_contents(&self, pipette: &PipetteId, channels: u8) -> Vec<LiquidContents> {
        (0..channels).map(|ch| self.tip(pipette, ch)).collect()
    }

    /// Replaces the contents of one tip channel.
    pub fn set_tip(&mut self, pipette: &PipetteId, channel: u8, contents: &LiquidContents) {
        Arc::make_mut(&mut self.pipettes).replace(TipLocation::new(pipette.clone(), channel), contents);
    }

    /// Contents of one well.
    #[must_use]
    pub fn well(&self, location: &WellLocation) -> LiquidContents {
        self.labware.contents(location)
    }

    /// Replaces the contents of one well.
    pub fn set_well(&mut self, location: WellLocation, contents: &LiquidContents) {
        Arc::make_mut(&mut self.labware).replace(location, contents);
    }

    /// True if both states share the same tip and well storage.
    #[must_use]
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pipettes, &other.pipettes) && Arc::ptr_eq(&self.labware, &other.labware)
    }
}

impl<L: Debug> LiquidTable<L> {
    /// Rows whose volume is negative or not finite.
    pub fn invalid_rows(&self) -> impl Iterator<Item = (&L, &Ingredient, f64)> {
        self.rows
            .iter()
            .filter(|(_, v)| !v.is_finite() || **v < 0.0)
            .map(|((l, i), v)| (l, i, *v))
    }
}
