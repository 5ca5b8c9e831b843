//! Per-location contents and the split/merge arithmetic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Ingredient;

/// Ingredient volumes (µL) recorded at one location.
///
/// An empty value means the location is *pristine*: nothing was ever
/// recorded there. A location that held liquid and was emptied keeps its
/// ingredient entries at zero volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LiquidContents(BTreeMap<Ingredient, f64>);

impl LiquidContents {
    /// Empty (pristine) contents.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents holding a single ingredient.
    #[must_use]
    pub fn single(ingredient: impl Into<Ingredient>, volume: f64) -> Self {
        let mut contents = Self::new();
        contents.set(ingredient.into(), volume);
        contents
    }

    /// Volume of `ingredient`, zero if absent.
    #[must_use]
    pub fn volume(&self, ingredient: &Ingredient) -> f64 {
        self.0.get(ingredient).copied().unwrap_or(0.0)
    }

    /// Volume of a named liquid, zero if absent.
    #[must_use]
    pub fn liquid_volume(&self, id: &str) -> f64 {
        self.volume(&Ingredient::from(id))
    }

    /// Air volume, zero if absent.
    #[must_use]
    pub fn air(&self) -> f64 {
        self.volume(&Ingredient::Air)
    }

    /// Records `volume` for `ingredient`, replacing any previous value.
    pub fn set(&mut self, ingredient: Ingredient, volume: f64) {
        self.0.insert(ingredient, volume);
    }

    /// Adds `volume` to `ingredient`, creating the entry if absent.
    pub fn add(&mut self, ingredient: Ingredient, volume: f64) {
        *self.0.entry(ingredient).or_insert(0.0) += volume;
    }

    /// Sum of every ingredient, air included.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// True if nothing was ever recorded here.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of ingredient entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(ingredient, volume)` entries in ingredient order.
    pub fn iter(&self) -> impl Iterator<Item = (&Ingredient, f64)> {
        self.0.iter().map(|(i, v)| (i, *v))
    }

    /// Same contents without the air entry.
    #[must_use]
    pub fn without_air(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(i, _)| !i.is_air())
                .map(|(i, v)| (i.clone(), *v))
                .collect(),
        )
    }

    /// One `n`th of every ingredient: the share each of `n` tips gets from a
    /// droplet drawn out of a well they all sit in.
    #[must_use]
    pub fn divide(&self, n: usize) -> Self {
        if n <= 1 {
            return self.clone();
        }
        let n = n as f64;
        Self(self.0.iter().map(|(i, v)| (i.clone(), v / n)).collect())
    }
}

impl FromIterator<(Ingredient, f64)> for LiquidContents {
    fn from_iter<T: IntoIterator<Item = (Ingredient, f64)>>(iter: T) -> Self {
        let mut contents = Self::new();
        for (ingredient, volume) in iter {
            contents.add(ingredient, volume);
        }
        contents
    }
}

/// Result of [`split_liquid`]: what stays behind and what moves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitLiquid {
    /// Contents left at the source.
    pub source: LiquidContents,
    /// Droplet removed from the source, air included.
    pub dest: LiquidContents,
}

fn non_negative(volume: f64) -> f64 {
    volume.max(0.0)
}

/// Removes `volume` from `source`.
///
/// Ingredients are drawn in proportion to their share of the source. When
/// the source holds less than `volume`, all of it moves and the shortfall
/// is made up with air; an empty source yields pure air.
#[must_use]
pub fn split_liquid(volume: f64, source: &LiquidContents) -> SplitLiquid {
    let volume = non_negative(volume);
    let total = source.total();

    if total <= 0.0 {
        return SplitLiquid {
            source: source.clone(),
            dest: LiquidContents::single(Ingredient::Air, volume),
        };
    }

    if volume > total {
        let drained = source.iter().map(|(i, _)| (i.clone(), 0.0)).collect();
        let mut dest = source.clone();
        dest.add(Ingredient::Air, volume - total);
        return SplitLiquid { source: drained, dest };
    }

    let mut remaining = LiquidContents::new();
    let mut dest = LiquidContents::new();
    for (ingredient, present) in source.iter() {
        let moved = volume * present / total;
        remaining.set(ingredient.clone(), non_negative(present - moved));
        dest.set(ingredient.clone(), moved);
    }
    SplitLiquid {
        source: remaining,
        dest,
    }
}

/// Adds `added` to `dest`, ingredient by ingredient.
#[must_use]
pub fn merge_liquid(added: &LiquidContents, dest: &LiquidContents) -> LiquidContents {
    let mut merged = dest.clone();
    for (ingredient, volume) in added.iter() {
        merged.add(ingredient.clone(), volume);
    }
    merged
}
