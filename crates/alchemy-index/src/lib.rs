//! Nearest-neighbour indexing over 2D points for token and station queries.

use ordered_float::OrderedFloat;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Planar coordinate accepted by the indices.
pub type Point = (f32, f32);

/// Errors emitted by spatial index implementations.
#[derive(Debug, Error, PartialEq)]
pub enum IndexError {
    /// A coordinate handed to `rebuild` was NaN or infinite.
    #[error("point {index} has non-finite coordinates ({x}, {y})")]
    NonFinitePoint { index: usize, x: f32, y: f32 },
}

/// One slot of a k-nearest answer.
///
/// Slots that found nothing within the distance bound carry an infinite distance and an
/// index equal to the number of indexed points, which is never a valid position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub distance: f32,
    pub index: usize,
}

impl Neighbor {
    /// Construct a found neighbour.
    #[must_use]
    pub const fn new(distance: f32, index: usize) -> Self {
        Self { distance, index }
    }

    /// Placeholder for an empty slot in an index holding `len` points.
    #[must_use]
    pub const fn missing(len: usize) -> Self {
        Self {
            distance: f32::INFINITY,
            index: len,
        }
    }

    /// Index of the neighbour, or `None` for an empty slot.
    #[must_use]
    pub fn found(&self) -> Option<usize> {
        self.distance.is_finite().then_some(self.index)
    }
}

/// Common behaviour exposed by nearest-neighbour indices.
pub trait NearestIndex {
    /// Rebuild internal structures from scratch over `positions`.
    fn rebuild(&mut self, positions: &[Point]) -> Result<(), IndexError>;

    /// Number of points currently indexed.
    fn len(&self) -> usize;

    /// Whether the index holds no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return exactly `k` slots ordered by ascending distance, then ascending index.
    ///
    /// Only points strictly closer than `max_distance` are reported; remaining slots are
    /// filled with [`Neighbor::missing`].
    fn nearest(&self, query: Point, k: usize, max_distance: f32) -> Vec<Neighbor>;

    /// Closest point strictly within `max_distance`, if any.
    fn nearest_one(&self, query: Point, max_distance: f32) -> Neighbor {
        self.nearest(query, 1, max_distance)
            .first()
            .copied()
            .unwrap_or_else(|| Neighbor::missing(self.len()))
    }
}

fn euclidean(a: Point, b: Point) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

fn validate(positions: &[Point]) -> Result<(), IndexError> {
    match positions
        .iter()
        .enumerate()
        .find(|(_, (x, y))| !x.is_finite() || !y.is_finite())
    {
        Some((index, &(x, y))) => Err(IndexError::NonFinitePoint { index, x, y }),
        None => Ok(()),
    }
}

/// Order candidate hits, keep the best `k`, and pad the answer to length `k`.
fn select_k(mut hits: Vec<Neighbor>, k: usize, len: usize) -> Vec<Neighbor> {
    hits.sort_by_key(|n| (OrderedFloat(n.distance), n.index));
    hits.truncate(k);
    hits.resize(k, Neighbor::missing(len));
    hits
}

type IndexedPoint = GeomWithData<[f32; 2], usize>;

/// R*-tree backed index, bulk loaded on every rebuild.
#[derive(Clone, Default)]
pub struct RTreeIndex {
    tree: RTree<IndexedPoint>,
    len: usize,
}

impl fmt::Debug for RTreeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RTreeIndex").field("len", &self.len).finish()
    }
}

impl RTreeIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over `positions` in one step.
    pub fn build(positions: &[Point]) -> Result<Self, IndexError> {
        let mut index = Self::new();
        index.rebuild(positions)?;
        Ok(index)
    }
}

impl NearestIndex for RTreeIndex {
    fn rebuild(&mut self, positions: &[Point]) -> Result<(), IndexError> {
        validate(positions)?;
        let items = positions
            .iter()
            .enumerate()
            .map(|(idx, &(x, y))| IndexedPoint::new([x, y], idx))
            .collect();
        self.tree = RTree::bulk_load(items);
        self.len = positions.len();
        Ok(())
    }

    fn len(&self) -> usize {
        self.len
    }

    fn nearest(&self, query: Point, k: usize, max_distance: f32) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }
        if query.0.is_nan() || query.1.is_nan() || max_distance.is_nan() {
            return vec![Neighbor::missing(self.len); k];
        }
        // Widened envelope; the strict bound on the true distance is applied afterwards.
        let radius = max_distance * (1.0 + 1e-4);
        let radius_sq = radius * radius;
        let hits = self
            .tree
            .locate_within_distance([query.0, query.1], radius_sq)
            .map(|item| {
                let [x, y] = *item.geom();
                Neighbor::new(euclidean(query, (x, y)), item.data)
            })
            .filter(|n| n.distance < max_distance)
            .collect();
        select_k(hits, k, self.len)
    }
}

/// Exhaustive scan over every point; the reference answer for small inputs.
#[derive(Debug, Clone, Default)]
pub struct LinearIndex {
    points: Vec<Point>,
}

impl LinearIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NearestIndex for LinearIndex {
    fn rebuild(&mut self, positions: &[Point]) -> Result<(), IndexError> {
        validate(positions)?;
        self.points.clear();
        self.points.extend_from_slice(positions);
        Ok(())
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn nearest(&self, query: Point, k: usize, max_distance: f32) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }
        let hits = self
            .points
            .iter()
            .enumerate()
            .map(|(idx, &point)| Neighbor::new(euclidean(query, point), idx))
            .filter(|n| n.distance < max_distance)
            .collect();
        select_k(hits, k, self.points.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::SmallRng};

    #[test]
    fn empty_index_reports_missing_slots() {
        let index = RTreeIndex::build(&[]).expect("empty build");
        let answer = index.nearest((10.0, 10.0), 2, f32::INFINITY);
        assert_eq!(answer, vec![Neighbor::missing(0); 2]);
        assert!(answer.iter().all(|n| n.found().is_none()));
        assert!(index.is_empty());
    }

    #[test]
    fn nearest_respects_strict_distance_bound() {
        let index = RTreeIndex::build(&[(0.0, 0.0), (200.0, 0.0), (50.0, 0.0)]).expect("build");
        let answer = index.nearest((0.0, 0.0), 3, 200.0);
        assert_eq!(answer[0], Neighbor::new(0.0, 0));
        assert_eq!(answer[1], Neighbor::new(50.0, 2));
        assert_eq!(answer[2], Neighbor::missing(3));
    }

    #[test]
    fn zero_distance_ties_favour_lower_index() {
        let index = RTreeIndex::build(&[(5.0, 5.0), (1.0, 1.0), (5.0, 5.0)]).expect("build");
        let answer = index.nearest((5.0, 5.0), 2, 10.0);
        assert_eq!(answer[0].index, 0);
        assert_eq!(answer[1].index, 2);
    }

    #[test]
    fn nearest_one_picks_closest_station() {
        let index = RTreeIndex::build(&[(65.0, 40.0), (155.0, 40.0)]).expect("build");
        let hit = index.nearest_one((150.0, 60.0), 200.0);
        assert_eq!(hit.found(), Some(1));
        assert!((hit.distance - 5.0f32.hypot(20.0)).abs() < 1e-4);
        assert_eq!(index.nearest_one((900.0, 900.0), 200.0).found(), None);
    }

    #[test]
    fn zero_k_yields_no_slots() {
        let index = RTreeIndex::build(&[(0.0, 0.0)]).expect("build");
        assert!(index.nearest((0.0, 0.0), 0, 1.0).is_empty());
    }

    #[test]
    fn rebuild_rejects_non_finite_points() {
        let mut index = RTreeIndex::new();
        let err = index
            .rebuild(&[(0.0, 0.0), (f32::NAN, 1.0)])
            .expect_err("nan must be rejected");
        assert!(matches!(err, IndexError::NonFinitePoint { index: 1, .. }));
    }

    #[test]
    fn rebuild_replaces_previous_points() {
        let mut index = RTreeIndex::build(&[(0.0, 0.0), (1.0, 1.0)]).expect("build");
        index.rebuild(&[(100.0, 100.0)]).expect("rebuild");
        assert_eq!(index.len(), 1);
        assert_eq!(index.nearest_one((0.0, 0.0), 10.0), Neighbor::missing(1));
    }

    #[test]
    fn rtree_matches_linear_scan() {
        let mut rng = SmallRng::seed_from_u64(0xA1C4E);
        let points: Vec<Point> = (0..64)
            .map(|_| (rng.random_range(0.0..1366.0), rng.random_range(0.0..768.0)))
            .collect();
        let tree = RTreeIndex::build(&points).expect("tree");
        let mut linear = LinearIndex::new();
        linear.rebuild(&points).expect("linear");

        for _ in 0..200 {
            let query = (rng.random_range(0.0..1366.0), rng.random_range(0.0..768.0));
            let bound = rng.random_range(10.0..400.0);
            assert_eq!(
                tree.nearest(query, 3, bound),
                linear.nearest(query, 3, bound),
                "query {query:?} bound {bound}"
            );
        }
    }
}
