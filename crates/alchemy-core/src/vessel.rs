//! Vessels and the table that owns them.

use alchemy_index::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{Element, Position};

/// Identifier of a physical marker as reported by the tracker.
pub type MarkerId = u32;

/// Engine state of one physically tracked token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Vessel {
    pub id: MarkerId,
    pub position: Position,
    /// Readiness in `[0, 1]`; zero is empty, one is ready to combine.
    pub charge: f32,
    pub element: Element,
}

impl Vessel {
    /// A freshly observed, empty vessel.
    #[must_use]
    pub const fn new(id: MarkerId, position: Position) -> Self {
        Self {
            id,
            position,
            charge: 0.0,
            element: Element::Void,
        }
    }

    /// Whether the charge is strictly above `threshold`.
    #[must_use]
    pub fn is_ready(&self, threshold: f32) -> bool {
        self.charge > threshold
    }

    /// Drop back to the empty state.
    pub fn empty(&mut self) {
        self.element = Element::Void;
        self.charge = 0.0;
    }
}

/// Dense vessel storage addressed by marker id.
///
/// Vessels are created on first observation and never removed; iteration follows
/// creation order, which also fixes their slot in the per-frame workbench index.
#[derive(Debug, Clone, Default)]
pub struct VesselTable {
    vessels: Vec<Vessel>,
    slots: HashMap<MarkerId, usize>,
}

impl VesselTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest position for `id`, creating the vessel if needed.
    ///
    /// Returns the vessel's slot and whether it was created by this call.
    pub fn upsert(&mut self, id: MarkerId, position: Position) -> (usize, bool) {
        if let Some(&slot) = self.slots.get(&id) {
            self.vessels[slot].position = position;
            return (slot, false);
        }
        let slot = self.vessels.len();
        self.vessels.push(Vessel::new(id, position));
        self.slots.insert(id, slot);
        (slot, true)
    }

    #[must_use]
    pub fn get(&self, id: MarkerId) -> Option<&Vessel> {
        self.slot_of(id).map(|slot| &self.vessels[slot])
    }

    pub fn get_mut(&mut self, id: MarkerId) -> Option<&mut Vessel> {
        self.slot_of(id).map(|slot| &mut self.vessels[slot])
    }

    #[must_use]
    pub fn slot_of(&self, id: MarkerId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    #[must_use]
    pub fn by_slot(&self, slot: usize) -> Option<&Vessel> {
        self.vessels.get(slot)
    }

    pub fn by_slot_mut(&mut self, slot: usize) -> Option<&mut Vessel> {
        self.vessels.get_mut(slot)
    }

    /// Mutable access to two distinct vessels at once.
    pub fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut Vessel, &mut Vessel)> {
        if a == b || a >= self.vessels.len() || b >= self.vessels.len() {
            return None;
        }
        if a < b {
            let (head, tail) = self.vessels.split_at_mut(b);
            Some((&mut head[a], &mut tail[0]))
        } else {
            let (head, tail) = self.vessels.split_at_mut(a);
            Some((&mut tail[0], &mut head[b]))
        }
    }

    /// Vessels in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Vessel> + '_ {
        self.vessels.iter()
    }

    /// Current positions in slot order.
    #[must_use]
    pub fn positions(&self) -> Vec<Point> {
        self.vessels.iter().map(|v| v.position.into()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_creates_once_then_moves() {
        let mut table = VesselTable::new();
        let (slot, created) = table.upsert(7, Position::new(1.0, 2.0));
        assert_eq!((slot, created), (0, true));
        let (slot, created) = table.upsert(7, Position::new(3.0, 4.0));
        assert_eq!((slot, created), (0, false));
        assert_eq!(table.len(), 1);

        let vessel = table.get(7).expect("vessel");
        assert_eq!(vessel.position, Position::new(3.0, 4.0));
        assert_eq!(vessel.charge, 0.0);
        assert_eq!(vessel.element, Element::Void);
    }

    #[test]
    fn moving_keeps_charge_and_element() {
        let mut table = VesselTable::new();
        table.upsert(1, Position::new(0.0, 0.0));
        {
            let vessel = table.get_mut(1).expect("vessel");
            vessel.charge = 0.5;
            vessel.element = Element::Fire;
        }
        table.upsert(1, Position::new(10.0, 0.0));
        let vessel = table.get(1).expect("vessel");
        assert_eq!(vessel.charge, 0.5);
        assert_eq!(vessel.element, Element::Fire);
    }

    #[test]
    fn iteration_follows_creation_order() {
        let mut table = VesselTable::new();
        for id in [42, 3, 17] {
            table.upsert(id, Position::default());
        }
        let ids: Vec<_> = table.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![42, 3, 17]);
        assert_eq!(table.slot_of(17), Some(2));
        assert_eq!(table.positions().len(), 3);
    }

    #[test]
    fn pair_mut_hands_out_both_orders() {
        let mut table = VesselTable::new();
        table.upsert(1, Position::new(0.0, 0.0));
        table.upsert(2, Position::new(1.0, 0.0));
        {
            let (a, b) = table.pair_mut(1, 0).expect("pair");
            assert_eq!((a.id, b.id), (2, 1));
            a.charge = 1.0;
        }
        let (a, b) = table.pair_mut(0, 1).expect("pair");
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(b.charge, 1.0);
        assert!(table.pair_mut(0, 0).is_none());
        assert!(table.pair_mut(0, 5).is_none());
    }

    #[test]
    fn empty_resets_state() {
        let mut vessel = Vessel::new(9, Position::default());
        vessel.charge = 1.0;
        vessel.element = Element::Lava;
        assert!(vessel.is_ready(0.999));
        vessel.empty();
        assert_eq!(vessel.element, Element::Void);
        assert_eq!(vessel.charge, 0.0);
        assert!(!vessel.is_ready(0.999));
    }
}
