//! Liquid tracking.
//!
//! Liquid is tracked per *location* (a tip channel or a well) and per
//! *ingredient*. Air is a synthetic ingredient so that over-aspiration and
//! empty-well draws keep tip volumes conserved.

mod contents;
mod table;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ident::IngredientId;

pub use contents::{merge_liquid, split_liquid, LiquidContents, SplitLiquid};
pub use table::{LiquidState, LiquidTable, TipLocation, WellLocation};

/// Wire name of the synthetic air ingredient.
pub const AIR: &str = "__air__";

/// An ingredient tracked in a location.
///
/// `Air` orders before every liquid, so it is always the first row of a
/// location in a [`LiquidTable`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ingredient {
    /// Air drawn into a tip.
    Air,
    /// A named liquid.
    Liquid(IngredientId),
}

impl Ingredient {
    /// Shorthand for a named liquid.
    #[must_use]
    pub fn liquid(id: impl Into<IngredientId>) -> Self {
        Self::Liquid(id.into())
    }

    /// Wire name of this ingredient.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Air => AIR,
            Self::Liquid(id) => id.as_str(),
        }
    }

    /// True for the synthetic air ingredient.
    #[must_use]
    pub fn is_air(&self) -> bool {
        matches!(self, Self::Air)
    }
}

impl From<&str> for Ingredient {
    fn from(s: &str) -> Self {
        if s == AIR {
            Self::Air
        } else {
            Self::Liquid(IngredientId::from(s))
        }
    }
}

impl From<IngredientId> for Ingredient {
    fn from(id: IngredientId) -> Self {
        Self::from(id.as_str())
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Ingredient {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Ingredient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}
