//! Engine configuration and the shared table geometry consumed by rendering.

use alchemy_index::IndexError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::Position;

/// Errors that can occur when constructing or growing engine state.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A spatial index could not be rebuilt.
    #[error("spatial index rebuild failed: {0}")]
    Index(#[from] IndexError),
}

/// Longest flash a configuration may request, in seconds.
pub const MAX_FLASH_DURATION_SECS: f32 = 3600.0;

/// Static configuration for an alchemy table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlchemyConfig {
    /// Width of the projected surface in surface units.
    pub surface_width: f32,
    /// Height of the projected surface in surface units.
    pub surface_height: f32,
    /// Gap between library icons and from the top-left corner.
    pub padding: f32,
    /// Edge length of a library icon.
    pub library_icon_size: f32,
    /// Radius of the reaction zone around the surface midpoint.
    pub alchemy_radius: f32,
    /// Radius of the void zone.
    pub void_size: f32,
    /// Horizontal offset of the void zone from the surface midpoint.
    pub void_offset: f32,
    /// Maximum distance for station charging and for pairing neighbouring vessels.
    pub dist_threshold: f32,
    /// Charge gained or lost per frame.
    pub charge_step: f32,
    /// Charge above which a vessel is ready to combine and immune to decay.
    pub ready_threshold: f32,
    /// Charge below which a vessel is forced back to VOID.
    pub empty_threshold: f32,
    /// How long the combination and void flashes stay active, in seconds.
    pub flash_duration_secs: f32,
}

impl Default for AlchemyConfig {
    fn default() -> Self {
        Self {
            surface_width: 1366.0,
            surface_height: 768.0,
            padding: 40.0,
            library_icon_size: 50.0,
            alchemy_radius: 350.0,
            void_size: 150.0,
            void_offset: 500.0,
            dist_threshold: 200.0,
            charge_step: 0.1,
            ready_threshold: 0.999,
            empty_threshold: 0.1,
            flash_duration_secs: 1.5,
        }
    }
}

impl AlchemyConfig {
    /// Validates the configuration before an engine is built from it.
    pub fn validate(&self) -> Result<(), EngineError> {
        let values = [
            self.surface_width,
            self.surface_height,
            self.padding,
            self.library_icon_size,
            self.alchemy_radius,
            self.void_size,
            self.void_offset,
            self.dist_threshold,
            self.charge_step,
            self.ready_threshold,
            self.empty_threshold,
            self.flash_duration_secs,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::InvalidConfig("all values must be finite"));
        }
        if self.surface_width <= 0.0 || self.surface_height <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "surface dimensions must be positive",
            ));
        }
        if self.padding < 0.0 || self.library_icon_size <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "library icon size must be positive and padding non-negative",
            ));
        }
        if self.alchemy_radius <= 0.0 || self.void_size <= 0.0 || self.dist_threshold <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "zone radii and dist_threshold must be positive",
            ));
        }
        if self.charge_step <= 0.0 || self.charge_step > 1.0 {
            return Err(EngineError::InvalidConfig("charge_step must be in (0, 1]"));
        }
        if self.ready_threshold <= 0.0 || self.ready_threshold >= 1.0 {
            return Err(EngineError::InvalidConfig(
                "ready_threshold must be in (0, 1)",
            ));
        }
        if self.empty_threshold <= 0.0 || self.empty_threshold >= self.ready_threshold {
            return Err(EngineError::InvalidConfig(
                "empty_threshold must be positive and below ready_threshold",
            ));
        }
        // A single charging step must already clear the empty threshold.
        if self.charge_step < self.empty_threshold {
            return Err(EngineError::InvalidConfig(
                "charge_step must be at least empty_threshold",
            ));
        }
        if !(0.0..=MAX_FLASH_DURATION_SECS).contains(&self.flash_duration_secs) {
            return Err(EngineError::InvalidConfig(
                "flash_duration_secs must be in [0, 3600]",
            ));
        }
        Ok(())
    }

    /// Centre of the surface and of the reaction zone.
    #[must_use]
    pub fn midpoint(&self) -> Position {
        Position::new(self.surface_width / 2.0, self.surface_height / 2.0)
    }

    /// Centre of the void zone.
    #[must_use]
    pub fn void_center(&self) -> Position {
        let mid = self.midpoint();
        Position::new(mid.x + self.void_offset, mid.y)
    }

    /// Where the first library station sits.
    #[must_use]
    pub fn library_origin(&self) -> Position {
        Position::new(
            self.padding + (self.library_icon_size / 2.0).trunc(),
            self.padding,
        )
    }

    /// Horizontal advance between consecutive library stations.
    #[must_use]
    pub fn library_stride(&self) -> f32 {
        self.library_icon_size + self.padding
    }

    /// Whether `position` lies strictly inside the reaction zone.
    #[must_use]
    pub fn in_reaction_zone(&self, position: Position) -> bool {
        position.distance(self.midpoint()) < self.alchemy_radius
    }

    /// Whether `position` lies strictly inside the void zone.
    #[must_use]
    pub fn in_void_zone(&self, position: Position) -> bool {
        position.distance(self.void_center()) < self.void_size
    }

    /// Flash duration as a [`Duration`]; zero when the value is not representable.
    #[must_use]
    pub fn flash_duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.flash_duration_secs).unwrap_or_default()
    }
}
