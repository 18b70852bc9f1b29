//! Library registry: fixed charging stations, one per discovered element.

use alchemy_index::{NearestIndex, Point, RTreeIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AlchemyConfig, Element, EngineError, Position};

/// A library station drawn as a fixed icon on the surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LibraryStation {
    pub element: Element,
    pub position: Position,
}

/// Nearest station to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationHit {
    pub element: Element,
    pub distance: f32,
}

/// Append-only mapping from element to station coordinate.
///
/// Stations are laid out left to right along a single row starting at the configured
/// origin. Rows never wrap; a long enough discovery chain walks off the surface edge.
#[derive(Debug, Clone)]
pub struct LibraryRegistry {
    stations: Vec<LibraryStation>,
    cursor: Position,
    stride: f32,
    index: RTreeIndex,
}

impl LibraryRegistry {
    /// Create an empty registry whose first station lands on `origin`.
    #[must_use]
    pub fn empty(origin: Position, stride: f32) -> Self {
        Self {
            stations: Vec::new(),
            cursor: origin,
            stride,
            index: RTreeIndex::new(),
        }
    }

    /// Registry holding the four base elements, laid out from the configured origin.
    pub fn with_base(config: &AlchemyConfig) -> Result<Self, EngineError> {
        let mut registry = Self::empty(config.library_origin(), config.library_stride());
        for element in Element::BASE {
            registry.place(element);
        }
        registry.reindex()?;
        Ok(registry)
    }

    /// Nearest station to `position` with its distance, or `None` when the library is empty.
    #[must_use]
    pub fn classify(&self, position: Position) -> Option<StationHit> {
        let hit = self.index.nearest_one(position.into(), f32::INFINITY);
        let slot = hit.found()?;
        self.stations.get(slot).map(|station| StationHit {
            element: station.element,
            distance: hit.distance,
        })
    }

    /// Add a station for `element` at the next cursor position.
    ///
    /// Returns the new station coordinate, or `None` when `element` already had one.
    pub fn grow(&mut self, element: Element) -> Result<Option<Position>, EngineError> {
        if self.contains(element) {
            return Ok(None);
        }
        let position = self.place(element);
        if let Err(err) = self.reindex() {
            self.stations.pop();
            self.cursor = position;
            return Err(err);
        }
        debug!(%element, x = position.x, y = position.y, "library station added");
        Ok(Some(position))
    }

    #[must_use]
    pub fn contains(&self, element: Element) -> bool {
        self.position_of(element).is_some()
    }

    /// Station coordinate assigned to `element`.
    #[must_use]
    pub fn position_of(&self, element: Element) -> Option<Position> {
        self.stations
            .iter()
            .find(|station| station.element == element)
            .map(|station| station.position)
    }

    /// Stations in the order they were added.
    #[must_use]
    pub fn stations(&self) -> &[LibraryStation] {
        &self.stations
    }

    /// Coordinate the next new element will receive.
    #[must_use]
    pub fn next_station(&self) -> Position {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    fn place(&mut self, element: Element) -> Position {
        let position = self.cursor;
        self.stations.push(LibraryStation { element, position });
        self.cursor = Position::new(position.x + self.stride, position.y);
        position
    }

    fn reindex(&mut self) -> Result<(), EngineError> {
        let points: Vec<Point> = self.stations.iter().map(|s| s.position.into()).collect();
        self.index.rebuild(&points)?;
        Ok(())
    }
}
