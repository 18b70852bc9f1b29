//! Element catalogue and the fixed recipe table.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Category carried by a vessel or a library station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Element {
    /// Empty or uncharged.
    Void,
    Water,
    Fire,
    Air,
    Earth,
    Alcohol,
    Pressure,
    Sea,
    Mud,
    Energy,
    Lava,
    Rain,
    Dust,
}

impl Element {
    /// Every element, `Void` included.
    pub const ALL: [Self; 13] = [
        Self::Void,
        Self::Water,
        Self::Fire,
        Self::Air,
        Self::Earth,
        Self::Alcohol,
        Self::Pressure,
        Self::Sea,
        Self::Mud,
        Self::Energy,
        Self::Lava,
        Self::Rain,
        Self::Dust,
    ];

    /// Elements seeded into the library at startup, in station order.
    pub const BASE: [Self; 4] = [Self::Fire, Self::Air, Self::Water, Self::Earth];

    /// Stable upper-case name, also used as the asset key.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Void => "VOID",
            Self::Water => "WATER",
            Self::Fire => "FIRE",
            Self::Air => "AIR",
            Self::Earth => "EARTH",
            Self::Alcohol => "ALCOHOL",
            Self::Pressure => "PRESSURE",
            Self::Sea => "SEA",
            Self::Mud => "MUD",
            Self::Energy => "ENERGY",
            Self::Lava => "LAVA",
            Self::Rain => "RAIN",
            Self::Dust => "DUST",
        }
    }

    #[must_use]
    pub const fn is_void(self) -> bool {
        matches!(self, Self::Void)
    }
}

// Ordered by name so canonical pairs do not depend on declaration order.
impl Ord for Element {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name().cmp(other.name())
    }
}

impl PartialOrd for Element {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unordered pair of elements stored in name order.
#[must_use]
pub fn canonical_pair(a: Element, b: Element) -> (Element, Element) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Immutable mapping from canonical reagent pairs to their product.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeBook {
    recipes: HashMap<(Element, Element), Element>,
}

impl RecipeBook {
    /// Build a recipe book; reagent pairs are canonicalised on the way in.
    pub fn new(entries: impl IntoIterator<Item = ((Element, Element), Element)>) -> Self {
        let recipes = entries
            .into_iter()
            .map(|((a, b), product)| (canonical_pair(a, b), product))
            .collect();
        Self { recipes }
    }

    /// The table's fixed recipe set.
    #[must_use]
    pub fn standard() -> Self {
        use Element::*;
        Self::new([
            ((Fire, Water), Alcohol),
            ((Air, Fire), Energy),
            ((Earth, Fire), Lava),
            ((Air, Air), Pressure),
            ((Air, Earth), Dust),
            ((Air, Water), Rain),
            ((Water, Water), Sea),
            ((Earth, Water), Mud),
            ((Earth, Earth), Pressure),
        ])
    }

    /// Product of combining `a` with `b`, in either order.
    #[must_use]
    pub fn product(&self, a: Element, b: Element) -> Option<Element> {
        self.recipes.get(&canonical_pair(a, b)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Iterate over `(canonical pair, product)` entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = ((Element, Element), Element)> + '_ {
        self.recipes.iter().map(|(&pair, &product)| (pair, product))
    }
}

impl Default for RecipeBook {
    fn default() -> Self {
        Self::standard()
    }
}
