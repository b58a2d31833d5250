//! Uniform spatial hash grid.
//!
//! Maps fixed-size world cells to the ids whose bounding boxes overlap them,
//! so region queries only look at the handful of buckets around the region
//! instead of every object. Cells are a coarse pre-filter; every query result
//! is confirmed against the stored box.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::hash::Hash;

use crate::bounds::BoundingBox;
use crate::vector::Vec2;

/// Default cell edge length in world units.
pub const DEFAULT_CELL_SIZE: f64 = 100.0;

/// Boxes spanning more cells than this on either axis are kept out of the
/// buckets and checked linearly instead.
pub const MAX_CELLS_PER_AXIS: i64 = 64;

type Cell = (i64, i64);

#[derive(Debug, Clone)]
struct Entry {
    bounds: BoundingBox,
    cells: SmallVec<[Cell; 4]>,
}

#[derive(Debug, Clone)]
pub struct SpatialHashGrid<K> {
    cell_size: f64,
    cells: FxHashMap<Cell, Vec<K>>,
    entries: FxHashMap<K, Entry>,
    oversized: Vec<K>,
}

impl<K: Clone + Eq + Hash> SpatialHashGrid<K> {
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            DEFAULT_CELL_SIZE
        };
        Self {
            cell_size,
            cells: FxHashMap::default(),
            entries: FxHashMap::default(),
            oversized: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    fn cell_of(&self, x: f64, y: f64) -> Cell {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    /// Cells covered by `bounds`, or `None` when the box is too large to
    /// bucket.
    fn cells_for(&self, bounds: &BoundingBox) -> Option<SmallVec<[Cell; 4]>> {
        let (min_gx, min_gy) = self.cell_of(bounds.min.x, bounds.min.y);
        let (max_gx, max_gy) = self.cell_of(bounds.max.x, bounds.max.y);
        if max_gx.saturating_sub(min_gx) >= MAX_CELLS_PER_AXIS
            || max_gy.saturating_sub(min_gy) >= MAX_CELLS_PER_AXIS
        {
            return None;
        }

        let mut cells = SmallVec::new();
        for gx in min_gx..=max_gx {
            for gy in min_gy..=max_gy {
                cells.push((gx, gy));
            }
        }
        Some(cells)
    }

    /// Insert or replace `id`.
    ///
    /// # Panics
    /// On non-finite bounds. Callers validate input before indexing it.
    pub fn insert(&mut self, id: K, bounds: BoundingBox) {
        assert!(
            bounds.is_finite(),
            "spatial index received non-finite bounds {bounds:?}"
        );
        self.remove(&id);

        let cells = match self.cells_for(&bounds) {
            Some(cells) => cells,
            None => {
                self.oversized.push(id.clone());
                SmallVec::new()
            }
        };
        for cell in &cells {
            self.cells.entry(*cell).or_default().push(id.clone());
        }
        self.entries.insert(id, Entry { bounds, cells });
    }

    pub fn remove(&mut self, id: &K) -> bool {
        let Some(entry) = self.entries.remove(id) else {
            return false;
        };
        if entry.cells.is_empty() {
            let before = self.oversized.len();
            self.oversized.retain(|k| k != id);
            debug_assert!(self.oversized.len() < before, "stale oversized entry");
        }
        for cell in &entry.cells {
            if let Some(bucket) = self.cells.get_mut(cell) {
                let before = bucket.len();
                bucket.retain(|k| k != id);
                debug_assert!(bucket.len() < before, "stale cell list for entry");
                if bucket.is_empty() {
                    self.cells.remove(cell);
                }
            }
        }
        true
    }

    pub fn update(&mut self, id: K, bounds: BoundingBox) {
        self.insert(id, bounds);
    }

    fn overlapping(&self, id: &K, region: &BoundingBox) -> bool {
        self.entries
            .get(id)
            .is_some_and(|e| e.bounds.overlaps_inclusive(region))
    }

    /// Ids whose boxes overlap `region` (touching counts).
    pub fn query(&self, region: &BoundingBox) -> Vec<K> {
        let Some(region_cells) = self.cells_for(region) else {
            return self
                .entries
                .iter()
                .filter(|(_, e)| e.bounds.overlaps_inclusive(region))
                .map(|(id, _)| id.clone())
                .collect();
        };

        let mut result = Vec::new();
        let mut seen = FxHashSet::default();
        for cell in region_cells {
            let Some(bucket) = self.cells.get(&cell) else {
                continue;
            };
            for id in bucket {
                if seen.insert(id) && self.overlapping(id, region) {
                    result.push(id.clone());
                }
            }
        }
        for id in &self.oversized {
            if self.overlapping(id, region) {
                result.push(id.clone());
            }
        }
        result
    }

    pub fn query_point(&self, point: Vec2) -> Vec<K> {
        let bucket = self
            .cells
            .get(&self.cell_of(point.x, point.y))
            .map(Vec::as_slice)
            .unwrap_or_default();
        bucket
            .iter()
            .chain(&self.oversized)
            .filter(|id| {
                self.entries
                    .get(*id)
                    .is_some_and(|e| e.bounds.contains_point(point))
            })
            .cloned()
            .collect()
    }

    /// Ids whose boxes come within `radius` of `center`.
    pub fn query_radius(&self, center: Vec2, radius: f64) -> Vec<K> {
        let region = BoundingBox::new(
            Vec2::new(center.x - radius, center.y - radius),
            Vec2::new(center.x + radius, center.y + radius),
        );
        self.query(&region)
            .into_iter()
            .filter(|id| {
                self.entries
                    .get(id)
                    .is_some_and(|e| e.bounds.distance_to_point(center) <= radius)
            })
            .collect()
    }

    /// Id whose box center is nearest to `point`, within `max_distance`.
    pub fn nearest(&self, point: Vec2, max_distance: f64) -> Option<K> {
        self.query_radius(point, max_distance)
            .into_iter()
            .filter_map(|id| {
                let d = self.entries.get(&id)?.bounds.center().distance_to(point);
                Some((id, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
        self.oversized.clear();
    }
}

impl<K: Clone + Eq + Hash> Default for SpatialHashGrid<K> {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut ids: Vec<u32>) -> Vec<u32> {
        ids.sort_unstable();
        ids
    }

    fn sorted_str(mut ids: Vec<&'static str>) -> Vec<&'static str> {
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_spatial_index() {
        let mut index = SpatialHashGrid::new(10.0);
        index.insert(1, BoundingBox::from_rect(0.0, 0.0, 5.0, 5.0));
        index.insert(2, BoundingBox::from_rect(10.0, 10.0, 5.0, 5.0));
        index.insert(3, BoundingBox::from_rect(100.0, 100.0, 5.0, 5.0));

        let result = index.query(&BoundingBox::from_rect(0.0, 0.0, 20.0, 20.0));
        assert_eq!(sorted(result), vec![1, 2]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_cells_are_only_a_prefilter() {
        let mut index = SpatialHashGrid::new(100.0);
        index.insert(1, BoundingBox::from_rect(0.0, 0.0, 10.0, 10.0));
        // same cell, no overlap
        let result = index.query(&BoundingBox::from_rect(50.0, 50.0, 10.0, 10.0));
        assert!(result.is_empty());
    }

    #[test]
    fn test_remove_and_update() {
        let mut index = SpatialHashGrid::new(10.0);
        index.insert("a", BoundingBox::from_rect(0.0, 0.0, 25.0, 25.0));
        assert_eq!(index.occupied_cells(), 9);

        index.update("a", BoundingBox::from_rect(200.0, 200.0, 5.0, 5.0));
        assert!(index.query_point(Vec2::new(1.0, 1.0)).is_empty());
        assert_eq!(index.query_point(Vec2::new(201.0, 201.0)), vec!["a"]);
        assert_eq!(index.occupied_cells(), 1);

        assert!(index.remove(&"a"));
        assert!(!index.remove(&"a"));
        assert!(index.is_empty());
        assert_eq!(index.occupied_cells(), 0);
    }

    #[test]
    fn test_radius_and_nearest() {
        let mut index = SpatialHashGrid::new(50.0);
        index.insert(1, BoundingBox::from_rect(0.0, 0.0, 10.0, 10.0));
        index.insert(2, BoundingBox::from_rect(40.0, 0.0, 10.0, 10.0));
        index.insert(3, BoundingBox::from_rect(300.0, 300.0, 10.0, 10.0));

        let near = index.query_radius(Vec2::new(25.0, 5.0), 16.0);
        assert_eq!(sorted(near), vec![1, 2]);
        assert_eq!(index.nearest(Vec2::new(30.0, 5.0), 100.0), Some(2));
        assert_eq!(index.nearest(Vec2::new(1000.0, 1000.0), 10.0), None);
    }

    #[test]
    fn test_huge_items_bypass_the_buckets() {
        let mut index = SpatialHashGrid::default();
        let started = std::time::Instant::now();
        index.insert("canvas", BoundingBox::from_rect(-5e5, -5e5, 1e6, 1e6));
        index.insert("node", BoundingBox::from_rect(10.0, 10.0, 20.0, 20.0));
        assert_eq!(index.occupied_cells(), 1);

        assert_eq!(
            sorted_str(index.query(&BoundingBox::from_rect(0.0, 0.0, 50.0, 50.0))),
            vec!["canvas", "node"]
        );
        assert_eq!(index.query_point(Vec2::new(4e5, 4e5)), vec!["canvas"]);
        // a huge query region scans entries instead of cells
        assert_eq!(
            index
                .query(&BoundingBox::from_rect(-1e7, -1e7, 2e7, 2e7))
                .len(),
            2
        );
        assert!(started.elapsed() < std::time::Duration::from_secs(1));

        index.update("canvas", BoundingBox::from_rect(1e6, 1e6, 10.0, 10.0));
        assert_eq!(index.query_point(Vec2::new(4e5, 4e5)), Vec::<&str>::new());
        assert!(index.remove(&"canvas"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_negative_coordinates() {
        let mut index = SpatialHashGrid::new(10.0);
        index.insert(7, BoundingBox::from_rect(-15.0, -15.0, 10.0, 10.0));
        assert_eq!(index.query_point(Vec2::new(-10.0, -10.0)), vec![7]);
    }

    #[test]
    #[should_panic(expected = "non-finite")]
    fn test_non_finite_insert_panics() {
        let mut index = SpatialHashGrid::new(10.0);
        index.insert(1, BoundingBox::from_rect(f64::NAN, 0.0, 1.0, 1.0));
    }
}
