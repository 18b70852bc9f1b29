//! Core simulation types for the tangible alchemy table.
//!
//! Physical tokens tracked on the table surface become [`Vessel`]s. Each frame the
//! [`AlchemyEngine`] charges vessels at library stations, fuses ready pairs inside the
//! reaction zone according to the [`RecipeBook`], and empties vessels dropped in the void.

use alchemy_index::Point;
use serde::{Deserialize, Serialize};

mod config;
mod element;
mod engine;
mod library;
mod signal;
mod vessel;

pub use config::{AlchemyConfig, EngineError, MAX_FLASH_DURATION_SECS};
pub use element::{Element, RecipeBook, canonical_pair};
pub use engine::{AlchemyEngine, Combination, Discovery, FrameEvents};
pub use library::{LibraryRegistry, LibraryStation, StationHit};
pub use signal::FlickerSignal;
pub use vessel::{MarkerId, Vessel, VesselTable};

/// Position on the table surface.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    /// Construct a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Position> for Point {
    fn from(position: Position) -> Self {
        (position.x, position.y)
    }
}

/// Number of frames processed since the engine was created.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Frame(pub u64);

impl Frame {
    /// Returns the next sequential frame.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// One tracked marker reported by the tracking layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub marker_id: MarkerId,
    pub center: Position,
}

impl Observation {
    #[must_use]
    pub const fn new(marker_id: MarkerId, x: f32, y: f32) -> Self {
        Self {
            marker_id,
            center: Position::new(x, y),
        }
    }
}

/// Observations for one frame, grouped the way the tracker reported them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FrameSnapshot {
    pub groups: Vec<Vec<Observation>>,
}

impl FrameSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single-marker group; convenient for scripted input.
    #[must_use]
    pub fn with(mut self, marker_id: MarkerId, x: f32, y: f32) -> Self {
        self.groups.push(vec![Observation::new(marker_id, x, y)]);
        self
    }

    /// Append a group of detections from one source.
    pub fn push_group(&mut self, group: Vec<Observation>) {
        self.groups.push(group);
    }

    /// All observations in report order.
    pub fn observations(&self) -> impl Iterator<Item = &Observation> + '_ {
        self.groups.iter().flatten()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(Vec::is_empty)
    }
}
