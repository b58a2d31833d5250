use canvas_geometry::{BoundingBox, SpatialHashGrid, Vec2};
use indexmap::IndexMap;
use itertools::Itertools;
use rustc_hash::{FxBuildHasher, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::SnapConfig;
use crate::error::{Result, SnapError};
use crate::guides::{AlignmentGuide, guides_for};
use crate::item::{SelectionItem, validate_items};
use crate::target::{SnapDirection, SnapTarget, SnapTargetKind};

/// Decimal places kept in snapped positions.
pub const SNAP_DECIMALS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapResult {
    pub snapped_position: Vec2,
    /// `snapped_position` minus the requested position.
    pub displacement: Vec2,
    pub active_targets: Vec<SnapTarget>,
    pub guides: Vec<AlignmentGuide>,
    pub snapped: bool,
}

impl SnapResult {
    fn unchanged(position: Vec2) -> Self {
        Self {
            snapped_position: position,
            displacement: Vec2::ZERO,
            active_targets: Vec::new(),
            guides: Vec::new(),
            snapped: false,
        }
    }
}

struct Ranked<'a> {
    target: &'a SnapTarget,
    offset: Vec2,
    distance: f64,
    score: f64,
    order: usize,
}

/// Offset onto `target` from the closest of the moving box's reference
/// points.
fn best_offset(target: &SnapTarget, xs: &[f64], ys: &[f64]) -> Vec2 {
    xs.iter()
        .cartesian_product(ys)
        .map(|(&x, &y)| target.displacement(Vec2::new(x, y)))
        .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
        .unwrap_or_default()
}

/// Snaps moving items to grid points, other items' edges, centers and
/// margins, and user guides.
///
/// Generated targets are rebuilt on every [`register_items`]; targets added
/// with [`add_target`] or [`add_guide`] persist until cleared.
///
/// [`register_items`]: Self::register_items
/// [`add_target`]: Self::add_target
/// [`add_guide`]: Self::add_guide
#[derive(Debug)]
pub struct SnapEngine {
    config: SnapConfig,
    items: IndexMap<String, SelectionItem, FxBuildHasher>,
    index: SpatialHashGrid<String>,
    generated: Vec<SnapTarget>,
    custom: Vec<SnapTarget>,
    grid_truncated: bool,
}

impl Default for SnapEngine {
    fn default() -> Self {
        let config = SnapConfig::default();
        Self {
            index: SpatialHashGrid::new(config.spatial_cell_size),
            config,
            items: IndexMap::default(),
            generated: Vec::new(),
            custom: Vec::new(),
            grid_truncated: false,
        }
    }
}

impl SnapEngine {
    pub fn new(config: SnapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            index: SpatialHashGrid::new(config.spatial_cell_size),
            config,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SnapConfig) -> Result<()> {
        config.validate()?;
        let reindex = config.spatial_cell_size != self.config.spatial_cell_size;
        self.config = config;
        if reindex {
            self.index = SpatialHashGrid::new(self.config.spatial_cell_size);
            for item in self.items.values() {
                self.index.insert(item.id.clone(), item.bounds);
            }
        }
        self.rebuild_targets();
        Ok(())
    }

    /// Replace the registered items and rebuild the generated targets. On
    /// error the previous registration is kept.
    pub fn register_items(&mut self, items: &[SelectionItem]) -> Result<()> {
        validate_items(items)?;
        self.items.clear();
        self.index.clear();
        for item in items {
            self.index.insert(item.id.clone(), item.bounds);
            self.items.insert(item.id.clone(), item.clone());
        }
        self.rebuild_targets();
        Ok(())
    }

    pub fn item(&self, id: &str) -> Option<&SelectionItem> {
        self.items.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &SelectionItem> {
        self.items.values()
    }

    /// Move a registered item and refresh the targets it generates.
    pub fn move_item(&mut self, id: &str, position: Vec2) -> Result<()> {
        if !position.is_finite() {
            return Err(SnapError::NonFiniteCoordinate { id: id.to_string() });
        }
        let item = self.items.get_mut(id).ok_or_else(|| SnapError::UnknownItem {
            id: id.to_string(),
        })?;
        item.bounds = item.bounds.translate(position - item.bounds.min);
        self.index.update(item.id.clone(), item.bounds);
        self.rebuild_targets();
        Ok(())
    }

    /// Add a persistent target.
    pub fn add_target(&mut self, target: SnapTarget) {
        self.custom.push(target);
    }

    /// Add a persistent guide line: vertical at `x = coordinate` or
    /// horizontal at `y = coordinate`.
    pub fn add_guide(&mut self, direction: SnapDirection, coordinate: f64) -> Result<()> {
        if !coordinate.is_finite() {
            return Err(SnapError::NonFiniteCoordinate {
                id: "guide".to_string(),
            });
        }
        let strength = self.config.strengths.guide;
        let target = match direction {
            SnapDirection::Horizontal => {
                SnapTarget::horizontal(SnapTargetKind::Guide, coordinate, strength)
            }
            SnapDirection::Vertical => {
                SnapTarget::vertical(SnapTargetKind::Guide, coordinate, strength)
            }
            SnapDirection::Both => SnapTarget::point(
                SnapTargetKind::Guide,
                Vec2::new(coordinate, coordinate),
                strength,
            ),
        };
        self.custom.push(target);
        Ok(())
    }

    pub fn clear_guides(&mut self) {
        self.custom.retain(|t| t.kind != SnapTargetKind::Guide);
    }

    /// Generated targets first, then persistent ones, in registration order.
    pub fn targets(&self) -> impl Iterator<Item = &SnapTarget> {
        self.generated.iter().chain(&self.custom)
    }

    pub fn target_count(&self) -> usize {
        self.generated.len() + self.custom.len()
    }

    /// Whether the last rebuild hit `max_grid_targets`.
    pub fn grid_truncated(&self) -> bool {
        self.grid_truncated
    }

    /// Snap a candidate top-left `position`.
    ///
    /// With `item_id` the item's size is used, so its left, center and right
    /// (top, middle, bottom) lines are all tried against the targets, and the
    /// item's own targets are skipped. Targets sourced from `exclude_ids` are
    /// skipped too.
    pub fn calculate_snap_position(
        &self,
        position: Vec2,
        item_id: Option<&str>,
        exclude_ids: &[&str],
    ) -> Result<SnapResult> {
        if !position.is_finite() {
            return Err(SnapError::NonFiniteCoordinate {
                id: item_id.unwrap_or("position").to_string(),
            });
        }
        let size = match item_id {
            Some(id) => Some(
                self.items
                    .get(id)
                    .ok_or_else(|| SnapError::UnknownItem { id: id.to_string() })?
                    .size(),
            ),
            None => None,
        };
        let moving = BoundingBox::from_origin_size(position, size.unwrap_or_default());
        let mut skip: FxHashSet<&str> = exclude_ids.iter().copied().collect();
        skip.extend(item_id);
        Ok(self.snap_box(moving, size.is_some(), &skip))
    }

    pub(crate) fn snap_box(
        &self,
        moving: BoundingBox,
        sized: bool,
        skip: &FxHashSet<&str>,
    ) -> SnapResult {
        let threshold = self.config.snap_threshold;
        let (xs, ys) = if sized {
            let c = moving.center();
            (
                vec![moving.min.x, c.x, moving.max.x],
                vec![moving.min.y, c.y, moving.max.y],
            )
        } else {
            (vec![moving.min.x], vec![moving.min.y])
        };
        let nearby: Option<FxHashSet<String>> = self
            .config
            .object_search_radius
            .map(|r| self.index.query(&moving.expand(r)).into_iter().collect());

        let mut ranked = Vec::new();
        for (order, target) in self.targets().enumerate() {
            if let Some(source) = target.source_id.as_deref() {
                if skip.contains(source) {
                    continue;
                }
                if nearby.as_ref().is_some_and(|near| !near.contains(source)) {
                    continue;
                }
            }
            if target.strength() <= 0.0 {
                continue;
            }
            let offset = best_offset(target, &xs, &ys);
            let distance = offset.length();
            if distance > threshold {
                continue;
            }
            ranked.push(Ranked {
                target,
                offset,
                distance,
                score: target.strength() * (1.0 - distance / threshold),
                order,
            });
        }
        if ranked.is_empty() {
            return SnapResult::unchanged(moving.min);
        }
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.distance.total_cmp(&b.distance))
                .then(a.order.cmp(&b.order))
        });

        let mut applied: Vec<&Ranked> = Vec::new();
        let mut total = Vec2::ZERO;
        for candidate in &ranked {
            if applied.len() == self.config.max_simultaneous {
                break;
            }
            if applied
                .iter()
                .all(|a| a.target.direction.is_compatible(candidate.target.direction))
            {
                total += candidate.offset;
                applied.push(candidate);
            }
        }

        let snapped_position =
            (moving.min + total * self.config.magnetic_strength).rounded(SNAP_DECIMALS);
        let snapped_box = moving.translate(snapped_position - moving.min);
        let guides = applied
            .iter()
            .flat_map(|r| {
                let span = r
                    .target
                    .source_id
                    .as_deref()
                    .and_then(|id| self.items.get(id))
                    .map_or(snapped_box, |source| source.bounds.union(&snapped_box));
                guides_for(r.target, &span, self.config.guide_extension)
            })
            .collect();
        trace!(
            candidates = ranked.len(),
            applied = applied.len(),
            "snap resolved"
        );

        SnapResult {
            snapped_position,
            displacement: snapped_position - moving.min,
            active_targets: applied.iter().map(|r| r.target.clone()).collect(),
            guides,
            snapped: true,
        }
    }

    fn rebuild_targets(&mut self) {
        let config = &self.config;
        let strengths = &config.strengths;
        let mut targets = Vec::new();

        self.grid_truncated = false;
        let union = BoundingBox::union_all(self.items.values().map(|i| i.bounds));
        if let Some(union) = union.filter(|_| config.grid_enabled) {
            self.grid_truncated = push_grid_targets(
                &mut targets,
                &union.expand(config.grid_size),
                config.grid_size,
                strengths.grid,
                config.max_grid_targets,
            );
        }

        for item in self.items.values() {
            let b = item.bounds;
            if config.object_snapping {
                let c = b.center();
                let edge = strengths.edge;
                let center = strengths.center;
                targets.extend([
                    SnapTarget::vertical(SnapTargetKind::Edge, b.min.x, edge),
                    SnapTarget::vertical(SnapTargetKind::Edge, b.max.x, edge),
                    SnapTarget::horizontal(SnapTargetKind::Edge, b.min.y, edge),
                    SnapTarget::horizontal(SnapTargetKind::Edge, b.max.y, edge),
                    SnapTarget::vertical(SnapTargetKind::Center, c.x, center),
                    SnapTarget::horizontal(SnapTargetKind::Center, c.y, center),
                ]
                .map(|t| t.with_source(&item.id)));
            }
            if config.margin_snapping {
                let margin = strengths.margin;
                for m in &config.margins {
                    targets.extend([
                        SnapTarget::vertical(SnapTargetKind::Margin, b.min.x - m, margin),
                        SnapTarget::vertical(SnapTargetKind::Margin, b.max.x + m, margin),
                        SnapTarget::horizontal(SnapTargetKind::Margin, b.min.y - m, margin),
                        SnapTarget::horizontal(SnapTargetKind::Margin, b.max.y + m, margin),
                    ]
                    .map(|t| t.with_source(&item.id)));
                }
            }
        }

        debug!(
            items = self.items.len(),
            generated = targets.len(),
            custom = self.custom.len(),
            "snap targets rebuilt"
        );
        self.generated = targets;
    }
}

/// Grid points covering `area`, row-major. Returns true when `limit` cut the
/// list short.
fn push_grid_targets(
    out: &mut Vec<SnapTarget>,
    area: &BoundingBox,
    step: f64,
    strength: f64,
    limit: usize,
) -> bool {
    let x0 = (area.min.x / step).floor() * step;
    let y0 = (area.min.y / step).floor() * step;
    let columns = ((area.max.x - x0) / step).floor() as usize + 1;
    let rows = ((area.max.y - y0) / step).floor() as usize + 1;
    let requested = columns.saturating_mul(rows);

    let points = (0..rows)
        .cartesian_product(0..columns)
        .take(limit)
        .map(|(r, c)| Vec2::new(x0 + c as f64 * step, y0 + r as f64 * step));
    out.extend(points.map(|p| SnapTarget::point(SnapTargetKind::Grid, p, strength)));

    if requested > limit {
        warn!(requested, limit, "grid snap targets truncated");
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_generated() -> SnapConfig {
        SnapConfig {
            grid_enabled: false,
            margins: Vec::new(),
            ..Default::default()
        }
    }

    #[test]
    fn test_point_snaps_to_grid_target() {
        let mut engine = SnapEngine::default();
        engine.add_target(SnapTarget::point(
            SnapTargetKind::Grid,
            Vec2::new(100.0, 100.0),
            1.0,
        ));

        let result = engine
            .calculate_snap_position(Vec2::new(104.0, 97.0), None, &[])
            .unwrap();
        assert!(result.snapped);
        assert_eq!(result.snapped_position, Vec2::new(100.0, 100.0));
        assert_eq!(result.guides.len(), 2);

        let far = engine
            .calculate_snap_position(Vec2::new(120.0, 120.0), None, &[])
            .unwrap();
        assert!(!far.snapped);
        assert_eq!(far.snapped_position, Vec2::new(120.0, 120.0));
        assert!(far.active_targets.is_empty());
    }

    #[test]
    fn test_sized_item_snaps_to_neighbour_edges() {
        let mut engine = SnapEngine::new(no_generated()).unwrap();
        engine
            .register_items(&[
                SelectionItem::from_rect("a", 0.0, 0.0, 100.0, 50.0),
                SelectionItem::from_rect("m", 300.0, 300.0, 40.0, 40.0),
            ])
            .unwrap();

        let result = engine
            .calculate_snap_position(Vec2::new(103.0, 53.0), Some("m"), &[])
            .unwrap();
        // right edge of `a` on x, bottom edge of `a` on y
        assert_eq!(result.snapped_position, Vec2::new(100.0, 50.0));
        assert_eq!(result.active_targets.len(), 2);
        assert!(result.active_targets.iter().all(|t| t.source_id.as_deref() == Some("a")));
        assert!(
            result
                .guides
                .iter()
                .any(|g| g.orientation == SnapDirection::Vertical && g.position == 100.0)
        );
    }

    #[test]
    fn test_same_direction_targets_are_exclusive() {
        let mut engine = SnapEngine::new(no_generated()).unwrap();
        engine.add_target(SnapTarget::vertical(SnapTargetKind::Guide, 10.0, 1.0));
        engine.add_target(SnapTarget::vertical(SnapTargetKind::Guide, 12.0, 1.0));
        let result = engine
            .calculate_snap_position(Vec2::new(11.5, 0.0), None, &[])
            .unwrap();
        assert_eq!(result.active_targets.len(), 1);
        assert_eq!(result.snapped_position, Vec2::new(12.0, 0.0));
    }

    #[test]
    fn test_magnetic_strength_softens_snap() {
        let config = SnapConfig {
            magnetic_strength: 0.5,
            ..no_generated()
        };
        let mut engine = SnapEngine::new(config).unwrap();
        engine.add_target(SnapTarget::point(
            SnapTargetKind::Grid,
            Vec2::new(100.0, 100.0),
            1.0,
        ));
        let result = engine
            .calculate_snap_position(Vec2::new(104.0, 97.0), None, &[])
            .unwrap();
        assert_eq!(result.snapped_position, Vec2::new(102.0, 98.5));
    }

    #[test]
    fn test_excluded_sources_are_ignored() {
        let mut engine = SnapEngine::new(no_generated()).unwrap();
        engine
            .register_items(&[SelectionItem::from_rect("a", 0.0, 0.0, 100.0, 50.0)])
            .unwrap();
        let hit = engine
            .calculate_snap_position(Vec2::new(102.0, 300.0), None, &[])
            .unwrap();
        assert!(hit.snapped);
        let miss = engine
            .calculate_snap_position(Vec2::new(102.0, 300.0), None, &["a"])
            .unwrap();
        assert!(!miss.snapped);
    }

    #[test]
    fn test_object_search_radius_limits_sources() {
        let mut engine = SnapEngine::new(no_generated()).unwrap();
        engine
            .register_items(&[SelectionItem::from_rect("a", 0.0, 0.0, 100.0, 50.0)])
            .unwrap();
        let far = Vec2::new(103.0, 5000.0);
        assert!(!engine.calculate_snap_position(far, None, &[]).unwrap().snapped);

        engine
            .set_config(SnapConfig {
                object_search_radius: None,
                ..no_generated()
            })
            .unwrap();
        let result = engine.calculate_snap_position(far, None, &[]).unwrap();
        assert_eq!(result.snapped_position, Vec2::new(100.0, 5000.0));
    }

    #[test]
    fn test_guides_survive_registration() {
        let mut engine = SnapEngine::default();
        engine.add_guide(SnapDirection::Horizontal, 40.0).unwrap();
        engine
            .register_items(&[SelectionItem::from_rect("a", 0.0, 0.0, 10.0, 10.0)])
            .unwrap();
        engine.register_items(&[]).unwrap();
        assert_eq!(engine.target_count(), 1);
        engine.clear_guides();
        assert_eq!(engine.target_count(), 0);
    }

    #[test]
    fn test_generated_targets() {
        let mut engine = SnapEngine::new(SnapConfig {
            grid_enabled: false,
            margins: vec![8.0],
            ..Default::default()
        })
        .unwrap();
        engine
            .register_items(&[SelectionItem::from_rect("a", 0.0, 0.0, 10.0, 10.0)])
            .unwrap();
        // 4 edges, 2 centers, 4 margin lines
        assert_eq!(engine.target_count(), 10);
        assert!(
            engine
                .targets()
                .any(|t| t.kind == SnapTargetKind::Margin && t.position.x == 18.0)
        );
    }

    #[test]
    fn test_unknown_item_and_nan() {
        let engine = SnapEngine::default();
        assert_eq!(
            engine.calculate_snap_position(Vec2::ZERO, Some("ghost"), &[]),
            Err(SnapError::UnknownItem { id: "ghost".into() })
        );
        assert!(
            engine
                .calculate_snap_position(Vec2::new(f64::NAN, 0.0), None, &[])
                .is_err()
        );
    }

    #[test]
    fn test_move_item_refreshes_targets() {
        let mut engine = SnapEngine::new(no_generated()).unwrap();
        engine
            .register_items(&[SelectionItem::from_rect("a", 0.0, 0.0, 10.0, 10.0)])
            .unwrap();
        engine.move_item("a", Vec2::new(200.0, 0.0)).unwrap();
        assert!(engine.targets().any(|t| t.position.x == 210.0));
        assert_eq!(engine.item("a").unwrap().position(), Vec2::new(200.0, 0.0));
    }
}
