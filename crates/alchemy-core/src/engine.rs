//! Per-frame vessel pipeline: observe, classify, combine, void.

use alchemy_index::{NearestIndex, RTreeIndex};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::{
    AlchemyConfig, Element, EngineError, FlickerSignal, Frame, FrameSnapshot, LibraryRegistry,
    MarkerId, Position, RecipeBook, StationHit, Vessel, VesselTable, canonical_pair,
};

/// A recipe that fired this frame.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Combination {
    /// Vessel that now carries the product.
    pub product_vessel: MarkerId,
    /// Vessel that was emptied by the reaction.
    pub consumed_vessel: MarkerId,
    pub reagents: (Element, Element),
    pub product: Element,
}

/// An element that received its library station this frame.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Discovery {
    pub element: Element,
    pub station: Position,
}

/// Everything notable that happened while processing one frame.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FrameEvents {
    pub frame: Frame,
    /// Observations accepted into the vessel table.
    pub observed: usize,
    /// Vessels created by first sightings.
    pub created: usize,
    /// Observations dropped for non-finite coordinates.
    pub rejected: usize,
    pub combinations: Vec<Combination>,
    pub discoveries: Vec<Discovery>,
    /// Vessels emptied in the void zone.
    pub voided: Vec<MarkerId>,
}

/// Simulation state for one table, advanced once per tracker frame.
pub struct AlchemyEngine {
    config: AlchemyConfig,
    frame: Frame,
    vessels: VesselTable,
    library: LibraryRegistry,
    recipes: RecipeBook,
    workbench: RTreeIndex,
    combination_signal: FlickerSignal,
    void_signal: FlickerSignal,
    order_scratch: Vec<usize>,
}

impl fmt::Debug for AlchemyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlchemyEngine")
            .field("frame", &self.frame)
            .field("vessel_count", &self.vessels.len())
            .field("library_size", &self.library.len())
            .finish()
    }
}

impl AlchemyEngine {
    /// Create an engine with the standard recipe table.
    pub fn new(config: AlchemyConfig) -> Result<Self, EngineError> {
        Self::with_recipes(config, RecipeBook::standard())
    }

    /// Create an engine with a custom recipe table.
    pub fn with_recipes(config: AlchemyConfig, recipes: RecipeBook) -> Result<Self, EngineError> {
        config.validate()?;
        let library = LibraryRegistry::with_base(&config)?;
        Ok(Self {
            config,
            frame: Frame::default(),
            vessels: VesselTable::new(),
            library,
            recipes,
            workbench: RTreeIndex::new(),
            combination_signal: FlickerSignal::new(),
            void_signal: FlickerSignal::new(),
            order_scratch: Vec::new(),
        })
    }

    /// Process one frame of observations taken at `now`.
    ///
    /// Positions of every observed marker are recorded first, so all neighbour queries in
    /// the frame see the same layout. Each observation then runs classification,
    /// combination and void handling in report order; earlier vessels win pairing ties.
    pub fn step(&mut self, snapshot: &FrameSnapshot, now: Instant) -> FrameEvents {
        let frame = self.frame.next();
        let mut events = FrameEvents {
            frame,
            ..FrameEvents::default()
        };

        let mut order = std::mem::take(&mut self.order_scratch);
        order.clear();
        self.stage_observe(snapshot, &mut order, &mut events);
        let indexed = self.stage_index_workbench();
        for &slot in &order {
            self.stage_classify(slot);
            if indexed {
                self.stage_combine(slot, now, &mut events);
            }
            self.stage_void(slot, now, &mut events);
        }
        self.order_scratch = order;
        self.frame = frame;

        debug!(
            frame = frame.0,
            observed = events.observed,
            vessels = self.vessels.len(),
            combinations = events.combinations.len(),
            voided = events.voided.len(),
            "frame processed"
        );
        events
    }

    fn stage_observe(
        &mut self,
        snapshot: &FrameSnapshot,
        order: &mut Vec<usize>,
        events: &mut FrameEvents,
    ) {
        for observation in snapshot.observations() {
            if !observation.center.is_finite() {
                warn!(
                    marker = observation.marker_id,
                    x = observation.center.x,
                    y = observation.center.y,
                    "dropping observation with non-finite center"
                );
                events.rejected += 1;
                continue;
            }
            let (slot, created) = self.vessels.upsert(observation.marker_id, observation.center);
            if created {
                debug!(marker = observation.marker_id, "vessel created");
                events.created += 1;
            }
            order.push(slot);
        }
        events.observed = order.len();
    }

    fn stage_index_workbench(&mut self) -> bool {
        match self.workbench.rebuild(&self.vessels.positions()) {
            Ok(()) => true,
            Err(err) => {
                error!(%err, "workbench index rebuild failed; skipping combinations");
                false
            }
        }
    }

    fn stage_classify(&mut self, slot: usize) {
        let Some(vessel) = self.vessels.by_slot_mut(slot) else {
            return;
        };
        let hit = self.library.classify(vessel.position);
        apply_classification(vessel, hit, &self.config);
    }

    fn stage_combine(&mut self, slot: usize, now: Instant, events: &mut FrameEvents) {
        let Some(query) = self.vessels.by_slot(slot).map(|v| v.position) else {
            return;
        };
        // Ask for one extra neighbour: the query vessel usually finds itself first.
        let neighbor_slot = self
            .workbench
            .nearest(query.into(), 2, self.config.dist_threshold)
            .into_iter()
            .filter_map(|n| n.found())
            .find(|&other| other != slot);
        let Some(neighbor_slot) = neighbor_slot else {
            return;
        };
        let Some((vessel, neighbor)) = self.vessels.pair_mut(slot, neighbor_slot) else {
            return;
        };
        let Some(product) = self.recipes.product(vessel.element, neighbor.element) else {
            return;
        };
        let ready = self.config.ready_threshold;
        if !vessel.is_ready(ready) || !neighbor.is_ready(ready) {
            return;
        }
        if !self.config.in_reaction_zone(vessel.position)
            || !self.config.in_reaction_zone(neighbor.position)
        {
            return;
        }

        let combination = Combination {
            product_vessel: vessel.id,
            consumed_vessel: neighbor.id,
            reagents: canonical_pair(vessel.element, neighbor.element),
            product,
        };
        vessel.element = product;
        neighbor.empty();
        self.combination_signal
            .arm(now, self.config.flash_duration());
        info!(
            product = %product,
            reagents = ?combination.reagents,
            into = combination.product_vessel,
            consumed = combination.consumed_vessel,
            "elements combined"
        );
        events.combinations.push(combination);

        match self.library.grow(product) {
            Ok(Some(station)) => {
                info!(element = %product, x = station.x, y = station.y, "new element discovered");
                events.discoveries.push(Discovery {
                    element: product,
                    station,
                });
            }
            Ok(None) => {}
            Err(err) => error!(%err, element = %product, "failed to add library station"),
        }
    }

    fn stage_void(&mut self, slot: usize, now: Instant, events: &mut FrameEvents) {
        let Some(vessel) = self.vessels.by_slot_mut(slot) else {
            return;
        };
        if vessel.element.is_void() || !self.config.in_void_zone(vessel.position) {
            return;
        }
        let discarded = vessel.element;
        vessel.empty();
        self.void_signal.arm(now, self.config.flash_duration());
        info!(marker = vessel.id, element = %discarded, "vessel emptied in the void");
        events.voided.push(vessel.id);
    }

    #[must_use]
    pub fn config(&self) -> &AlchemyConfig {
        &self.config
    }

    /// Frames processed so far.
    #[must_use]
    pub fn frame_count(&self) -> Frame {
        self.frame
    }

    #[must_use]
    pub fn vessels(&self) -> &VesselTable {
        &self.vessels
    }

    #[must_use]
    pub fn library(&self) -> &LibraryRegistry {
        &self.library
    }

    #[must_use]
    pub fn recipes(&self) -> &RecipeBook {
        &self.recipes
    }

    #[must_use]
    pub fn combination_signal(&self) -> &FlickerSignal {
        &self.combination_signal
    }

    #[must_use]
    pub fn void_signal(&self) -> &FlickerSignal {
        &self.void_signal
    }

    /// Read the combination flash, advancing its flicker.
    pub fn sample_combination_flash(&mut self, now: Instant) -> bool {
        self.combination_signal.sample(now)
    }

    /// Read the void flash, advancing its flicker.
    pub fn sample_void_flash(&mut self, now: Instant) -> bool {
        self.void_signal.sample(now)
    }
}

/// Charge a vessel at a qualifying station, or let it decay.
///
/// A station qualifies when it is closer than `dist_threshold` and the vessel is empty or
/// already carries that station's element. Ready vessels do not decay away from a station.
fn apply_classification(vessel: &mut Vessel, hit: Option<StationHit>, config: &AlchemyConfig) {
    let station = hit.filter(|hit| {
        hit.distance < config.dist_threshold
            && (vessel.element.is_void() || vessel.element == hit.element)
    });
    match station {
        Some(hit) => {
            vessel.element = hit.element;
            vessel.charge = (vessel.charge + config.charge_step).min(1.0);
        }
        None => {
            if vessel.charge < config.ready_threshold {
                vessel.charge = (vessel.charge - config.charge_step).max(0.0);
            }
            if vessel.charge < config.empty_threshold {
                vessel.element = Element::Void;
            }
        }
    }
}
