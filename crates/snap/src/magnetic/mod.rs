//! Magnetic attraction on top of the snap target model.
//!
//! Where [`SnapEngine`](crate::SnapEngine) jumps to the best target, the
//! magnetic layer computes a continuous pull: every nearby target
//! contributes a force that falls off with distance, and the host feeds the
//! summed force into the dragged item's [`PhysicsBody`].

pub mod adaptive;
pub mod physics;

use canvas_geometry::{BoundingBox, EPSILON, QuadTree, Vec2, clamp_unit};
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

pub use physics::{PhysicsBody, PhysicsConfig};

use crate::error::{Result, SnapError};
use crate::target::{SnapDirection, SnapTarget, SnapTargetKind};

/// Capture radius given to targets that do not set their own.
pub const DEFAULT_TARGET_RADIUS: f64 = 60.0;

/// Id prefix of targets created by [`MagneticLayer::import_snap_targets`].
const IMPORTED_PREFIX: &str = "snap:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagneticConfig {
    pub base_snap_distance: f64,
    pub min_snap_distance: f64,
    pub max_snap_distance: f64,
    /// Growth of the capture radius per unit of pointer speed.
    pub velocity_scale: f64,
    /// Loss of pull per unit of pointer speed.
    pub velocity_damping: f64,
    /// Neighbourhood used to measure target density.
    pub density_radius: f64,
    /// Shrink of the capture radius per nearby target.
    pub density_scale: f64,
    pub global_strength: f64,
    pub max_simultaneous_snaps: usize,
    /// Strength bonus for a target whose attract partner is also active.
    pub attract_boost: f64,
    pub physics: PhysicsConfig,
}

impl Default for MagneticConfig {
    fn default() -> Self {
        Self {
            base_snap_distance: 20.0,
            min_snap_distance: 8.0,
            max_snap_distance: 60.0,
            velocity_scale: 0.01,
            velocity_damping: 0.002,
            density_radius: 100.0,
            density_scale: 0.05,
            global_strength: 1.0,
            max_simultaneous_snaps: 3,
            attract_boost: 0.25,
            physics: PhysicsConfig::default(),
        }
    }
}

impl MagneticConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            self.base_snap_distance,
            self.min_snap_distance,
            self.max_snap_distance,
            self.density_radius,
        ];
        if positive.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(SnapError::invalid_config(
                "snap distances and density_radius must be positive",
            ));
        }
        if self.min_snap_distance > self.max_snap_distance {
            return Err(SnapError::invalid_config(
                "min_snap_distance exceeds max_snap_distance",
            ));
        }
        let non_negative = [
            self.velocity_scale,
            self.velocity_damping,
            self.density_scale,
            self.global_strength,
            self.attract_boost,
        ];
        if non_negative.iter().any(|v| !(v.is_finite() && *v >= 0.0)) {
            return Err(SnapError::invalid_config(
                "magnetic scales must be non-negative",
            ));
        }
        if self.max_simultaneous_snaps == 0 {
            return Err(SnapError::invalid_config(
                "max_simultaneous_snaps must be at least 1",
            ));
        }
        self.physics.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConstraints {
    /// Contributions allowed until [`MagneticLayer::reset_snap_counts`].
    pub max_snap_count: Option<u32>,
    /// Item kinds that may be attracted; empty admits every kind.
    pub allowed_kinds: Vec<String>,
    /// Item ids never attracted.
    pub exclusions: Vec<String>,
}

impl TargetConstraints {
    fn admits(&self, probe: &MagneticProbe, snap_count: u32) -> bool {
        if self.max_snap_count.is_some_and(|max| snap_count >= max) {
            return false;
        }
        if probe
            .item_id
            .as_ref()
            .is_some_and(|id| self.exclusions.contains(id))
        {
            return false;
        }
        self.allowed_kinds.is_empty()
            || probe
                .item_kind
                .as_ref()
                .is_some_and(|kind| self.allowed_kinds.contains(kind))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagneticTarget {
    pub id: String,
    pub target: SnapTarget,
    pub radius: f64,
    pub mass: f64,
    /// Positive attracts, negative repels.
    pub charge: f64,
    /// Higher priorities win when more targets compete than may snap.
    pub priority: i32,
    #[serde(default)]
    pub constraints: TargetConstraints,
    #[serde(default)]
    pub body: PhysicsBody,
}

fn default_priority(kind: SnapTargetKind) -> i32 {
    match kind {
        SnapTargetKind::Guide => 5,
        SnapTargetKind::Object => 4,
        SnapTargetKind::Edge | SnapTargetKind::Center => 3,
        SnapTargetKind::Margin => 2,
        SnapTargetKind::Grid => 1,
    }
}

impl MagneticTarget {
    pub fn new(id: impl Into<String>, target: SnapTarget) -> Self {
        Self {
            id: id.into(),
            priority: default_priority(target.kind),
            body: PhysicsBody::at(target.position),
            target,
            radius: DEFAULT_TARGET_RADIUS,
            mass: 1.0,
            charge: 1.0,
            constraints: TargetConstraints::default(),
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    pub fn with_constraints(mut self, constraints: TargetConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    fn is_finite(&self) -> bool {
        self.target.position.is_finite()
            && self.radius.is_finite()
            && self.mass.is_finite()
            && self.charge.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// While both are in range each strengthens the other.
    Attract,
    /// Only the stronger of the two may contribute.
    Repel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRelation {
    pub first: String,
    pub second: String,
    pub kind: RelationKind,
}

/// The dragged item as seen by the magnetic layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MagneticProbe {
    pub position: Vec2,
    pub velocity: Vec2,
    pub item_id: Option<String>,
    pub item_kind: Option<String>,
}

impl MagneticProbe {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn for_item(mut self, id: impl Into<String>, kind: impl Into<String>) -> Self {
        self.item_id = Some(id.into());
        self.item_kind = Some(kind.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagneticContribution {
    pub target_id: String,
    pub distance: f64,
    pub strength: f64,
    pub force: Vec2,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MagneticResult {
    pub force: Vec2,
    pub snap_distance: f64,
    pub contributions: Vec<MagneticContribution>,
    /// Where the strongest attracting target would put the probe.
    pub snap_point: Option<Vec2>,
    /// Set when more targets qualified than `max_simultaneous_snaps`.
    pub truncated: bool,
}

struct Candidate {
    index: usize,
    distance: f64,
    strength: f64,
}

/// Persistent magnetic targets with their relations and snap counters.
///
/// Point targets live in a quadtree that is rebuilt lazily after any
/// change to the target set; line targets are always checked.
#[derive(Debug)]
pub struct MagneticLayer {
    config: MagneticConfig,
    targets: IndexMap<String, MagneticTarget, FxBuildHasher>,
    relations: Vec<TargetRelation>,
    snap_counts: FxHashMap<String, u32>,
    index: Option<QuadTree<usize>>,
}

impl Default for MagneticLayer {
    fn default() -> Self {
        Self {
            config: MagneticConfig::default(),
            targets: IndexMap::default(),
            relations: Vec::new(),
            snap_counts: FxHashMap::default(),
            index: None,
        }
    }
}

fn build_index(targets: &IndexMap<String, MagneticTarget, FxBuildHasher>) -> QuadTree<usize> {
    let points = targets
        .values()
        .enumerate()
        .filter(|(_, t)| t.target.direction == SnapDirection::Both)
        .map(|(i, t)| (i, BoundingBox::new(t.target.position, t.target.position)));
    let tree = QuadTree::build(points, BoundingBox::from_rect(0.0, 0.0, 1.0, 1.0));
    trace!(points = tree.len(), "magnetic index rebuilt");
    tree
}

impl MagneticLayer {
    pub fn new(config: MagneticConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &MagneticConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: MagneticConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn add_target(&mut self, target: MagneticTarget) -> Result<()> {
        if !target.is_finite() {
            return Err(SnapError::NonFiniteCoordinate { id: target.id });
        }
        if self.targets.contains_key(&target.id) {
            return Err(SnapError::DuplicateTargetId { id: target.id });
        }
        self.targets.insert(target.id.clone(), target);
        self.index = None;
        Ok(())
    }

    pub fn remove_target(&mut self, id: &str) -> bool {
        let removed = self.targets.shift_remove(id).is_some();
        if removed {
            self.relations.retain(|r| r.first != id && r.second != id);
            self.snap_counts.remove(id);
            self.index = None;
        }
        removed
    }

    pub fn target(&self, id: &str) -> Option<&MagneticTarget> {
        self.targets.get(id)
    }

    pub fn targets(&self) -> impl Iterator<Item = &MagneticTarget> {
        self.targets.values()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Mirror snap targets as magnetic targets with default physics. Targets
    /// from an earlier import are replaced; others are kept. Returns the
    /// number imported.
    pub fn import_snap_targets<'a>(
        &mut self,
        targets: impl IntoIterator<Item = &'a SnapTarget>,
    ) -> usize {
        self.targets.retain(|id, _| !id.starts_with(IMPORTED_PREFIX));
        // imported ids are positional, so old counts would land on other targets
        self.snap_counts.retain(|id, _| !id.starts_with(IMPORTED_PREFIX));
        self.relations.retain(|r| {
            !r.first.starts_with(IMPORTED_PREFIX) && !r.second.starts_with(IMPORTED_PREFIX)
        });
        let mut count = 0;
        for (i, target) in targets.into_iter().enumerate() {
            let magnetic = MagneticTarget::new(format!("{IMPORTED_PREFIX}{i}"), target.clone())
                .with_radius(self.config.max_snap_distance);
            self.targets.insert(magnetic.id.clone(), magnetic);
            count += 1;
        }
        self.index = None;
        debug!(count, total = self.targets.len(), "snap targets imported");
        count
    }

    pub fn add_relation(
        &mut self,
        first: impl Into<String>,
        second: impl Into<String>,
        kind: RelationKind,
    ) -> Result<()> {
        let (first, second) = (first.into(), second.into());
        for id in [&first, &second] {
            if !self.targets.contains_key(id) {
                return Err(SnapError::UnknownTarget { id: id.clone() });
            }
        }
        self.relations.push(TargetRelation {
            first,
            second,
            kind,
        });
        Ok(())
    }

    pub fn relations(&self) -> &[TargetRelation] {
        &self.relations
    }

    /// Move a target and record its motion on the target's body.
    pub fn move_target(&mut self, id: &str, position: Vec2, velocity: Vec2) -> Result<()> {
        if !(position.is_finite() && velocity.is_finite()) {
            return Err(SnapError::NonFiniteCoordinate { id: id.to_string() });
        }
        let target = self
            .targets
            .get_mut(id)
            .ok_or_else(|| SnapError::UnknownTarget { id: id.to_string() })?;
        let dt = self.config.physics.time_step;
        target.body.acceleration = (velocity - target.body.velocity) / dt;
        target.body.velocity = velocity;
        target.body.position = position;
        target.target.position = position;
        self.index = None;
        Ok(())
    }

    pub fn snap_count(&self, id: &str) -> u32 {
        self.snap_counts.get(id).copied().unwrap_or(0)
    }

    /// Start counting `max_snap_count` afresh, typically per drag.
    pub fn reset_snap_counts(&mut self) {
        self.snap_counts.clear();
    }

    /// Targets within `radius` of `position` with their distances, in
    /// registration order.
    fn within(
        index: &QuadTree<usize>,
        targets: &IndexMap<String, MagneticTarget, FxBuildHasher>,
        position: Vec2,
        radius: f64,
    ) -> Vec<(usize, f64)> {
        let mut found: Vec<usize> = index.query_radius(position, radius);
        found.extend(
            targets
                .values()
                .enumerate()
                .filter(|(_, t)| t.target.direction != SnapDirection::Both)
                .map(|(i, _)| i),
        );
        found.sort_unstable();
        found.dedup();
        found
            .into_iter()
            .filter_map(|i| {
                let (_, t) = targets.get_index(i)?;
                let d = t.target.distance_from(position);
                (d <= radius).then_some((i, d))
            })
            .collect()
    }

    pub fn calculate(&mut self, probe: &MagneticProbe) -> Result<MagneticResult> {
        if !(probe.position.is_finite() && probe.velocity.is_finite()) {
            return Err(SnapError::NonFiniteCoordinate {
                id: probe.item_id.clone().unwrap_or_else(|| "probe".to_string()),
            });
        }
        let targets = &self.targets;
        let index = self.index.get_or_insert_with(|| build_index(targets));
        let config = &self.config;
        let speed = probe.velocity.length();

        let nearby = Self::within(index, targets, probe.position, config.density_radius);
        let average_strength = if nearby.is_empty() {
            0.5
        } else {
            nearby
                .iter()
                .filter_map(|(i, _)| targets.get_index(*i))
                .map(|(_, t)| t.target.strength())
                .sum::<f64>()
                / nearby.len() as f64
        };
        let snap_distance =
            adaptive::snap_distance(config, speed, nearby.len(), average_strength);
        let velocity_factor = adaptive::velocity_factor(config, speed);

        let mut candidates: Vec<Candidate> = Vec::new();
        for (i, distance) in Self::within(index, targets, probe.position, snap_distance) {
            let Some((id, t)) = targets.get_index(i) else {
                continue;
            };
            if probe.item_id.is_some() && t.target.source_id == probe.item_id {
                continue;
            }
            let count = self.snap_counts.get(id).copied().unwrap_or(0);
            if !t.constraints.admits(probe, count) {
                continue;
            }
            let strength = adaptive::attenuated_strength(
                t.target.strength(),
                distance,
                snap_distance.min(t.radius),
                velocity_factor,
                t.mass,
                t.charge,
                config.global_strength,
            );
            if strength > 0.0 {
                candidates.push(Candidate {
                    index: i,
                    distance,
                    strength,
                });
            }
        }

        self.apply_relations(&mut candidates);

        candidates.sort_by(|a, b| {
            let (ta, tb) = (&self.targets[a.index], &self.targets[b.index]);
            tb.priority
                .cmp(&ta.priority)
                .then(a.distance.total_cmp(&b.distance))
                .then(ta.id.cmp(&tb.id))
        });
        let limit = self.config.max_simultaneous_snaps;
        let truncated = candidates.len() > limit;
        if truncated {
            warn!(
                candidates = candidates.len(),
                limit, "magnetic targets truncated"
            );
            candidates.truncate(limit);
        }

        let mut result = MagneticResult {
            snap_distance,
            truncated,
            ..Default::default()
        };
        let mut strongest: Option<(f64, Vec2)> = None;
        for c in &candidates {
            let t = &self.targets[c.index];
            let offset = t.target.displacement(probe.position);
            let magnitude = c.strength * t.mass * t.charge / (c.distance * c.distance + 1.0);
            let force = offset.normalize() * magnitude;
            result.force += force;
            if t.charge > 0.0 && strongest.is_none_or(|(s, _)| c.strength > s) {
                strongest = Some((c.strength, probe.position + offset));
            }
            result.contributions.push(MagneticContribution {
                target_id: t.id.clone(),
                distance: c.distance,
                strength: c.strength,
                force,
            });
        }
        result.snap_point = strongest.map(|(_, p)| p);
        for c in &result.contributions {
            *self.snap_counts.entry(c.target_id.clone()).or_default() += 1;
        }
        trace!(
            snap_distance,
            contributions = result.contributions.len(),
            "magnetic field evaluated"
        );
        Ok(result)
    }

    /// Repel pairs keep only the stronger side; attract pairs boost each
    /// other when both are active.
    fn apply_relations(&self, candidates: &mut Vec<Candidate>) {
        let position_of = |candidates: &[Candidate], id: &str| {
            let index = self.targets.get_index_of(id)?;
            candidates.iter().position(|c| c.index == index)
        };
        for relation in &self.relations {
            let (Some(a), Some(b)) = (
                position_of(candidates, &relation.first),
                position_of(candidates, &relation.second),
            ) else {
                continue;
            };
            match relation.kind {
                RelationKind::Repel => {
                    let weaker = if candidates[b].strength > candidates[a].strength + EPSILON {
                        a
                    } else {
                        b
                    };
                    candidates.remove(weaker);
                }
                RelationKind::Attract => {
                    let boost = 1.0 + self.config.attract_boost;
                    candidates[a].strength = clamp_unit(candidates[a].strength * boost);
                    candidates[b].strength = clamp_unit(candidates[b].strength * boost);
                }
            }
        }
    }

    /// Optional post-pass: integrate `result.force` into the dragged body.
    pub fn apply_physics(&self, body: &mut PhysicsBody, result: &MagneticResult, mass: f64) {
        if self.config.physics.enabled {
            body.integrate(result.force, mass, &self.config.physics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn point(id: &str, x: f64, y: f64, strength: f64) -> MagneticTarget {
        MagneticTarget::new(
            id,
            SnapTarget::point(SnapTargetKind::Object, Vec2::new(x, y), strength),
        )
    }

    #[test]
    fn test_pulls_toward_target() {
        let mut layer = MagneticLayer::default();
        layer.add_target(point("t", 100.0, 100.0, 1.0)).unwrap();
        let result = layer.calculate(&MagneticProbe::at(Vec2::new(90.0, 100.0))).unwrap();
        assert_eq!(result.contributions.len(), 1);
        assert!(result.force.x > 0.0);
        assert_eq!(result.force.y, 0.0);
        assert_eq!(result.snap_point, Some(Vec2::new(100.0, 100.0)));
        assert!(result.snap_distance >= layer.config().min_snap_distance);
    }

    #[test]
    fn test_negative_charge_pushes_away() {
        let mut layer = MagneticLayer::default();
        layer
            .add_target(point("t", 100.0, 100.0, 1.0).with_charge(-1.0))
            .unwrap();
        let result = layer.calculate(&MagneticProbe::at(Vec2::new(95.0, 100.0))).unwrap();
        assert!(result.force.x < 0.0);
        assert_eq!(result.snap_point, None);
    }

    #[test]
    fn test_repel_keeps_stronger() {
        let mut layer = MagneticLayer::default();
        layer.add_target(point("strong", 100.0, 100.0, 1.0)).unwrap();
        layer.add_target(point("weak", 96.0, 100.0, 0.3)).unwrap();
        layer
            .add_relation("strong", "weak", RelationKind::Repel)
            .unwrap();
        let result = layer.calculate(&MagneticProbe::at(Vec2::new(98.0, 100.0))).unwrap();
        let ids: Vec<_> = result.contributions.iter().map(|c| c.target_id.as_str()).collect();
        assert_eq!(ids, vec!["strong"]);
    }

    #[test]
    fn test_attract_boosts_partner() {
        let probe = MagneticProbe::at(Vec2::new(90.0, 100.0));
        let mut plain = MagneticLayer::default();
        plain.add_target(point("a", 100.0, 100.0, 0.4)).unwrap();
        plain.add_target(point("b", 80.0, 100.0, 0.4)).unwrap();
        let before = plain.calculate(&probe).unwrap();

        let mut linked = MagneticLayer::default();
        linked.add_target(point("a", 100.0, 100.0, 0.4)).unwrap();
        linked.add_target(point("b", 80.0, 100.0, 0.4)).unwrap();
        linked.add_relation("a", "b", RelationKind::Attract).unwrap();
        let after = linked.calculate(&probe).unwrap();

        assert!(after.contributions[0].strength > before.contributions[0].strength);
    }

    #[test]
    fn test_constraints() {
        let mut layer = MagneticLayer::default();
        layer
            .add_target(point("only-shapes", 100.0, 100.0, 1.0).with_constraints(
                TargetConstraints {
                    allowed_kinds: vec!["shape".into()],
                    exclusions: vec!["banned".into()],
                    max_snap_count: Some(1),
                },
            ))
            .unwrap();
        let at = Vec2::new(95.0, 100.0);

        let text = MagneticProbe::at(at).for_item("t1", "text");
        assert!(layer.calculate(&text).unwrap().contributions.is_empty());
        let banned = MagneticProbe::at(at).for_item("banned", "shape");
        assert!(layer.calculate(&banned).unwrap().contributions.is_empty());

        let shape = MagneticProbe::at(at).for_item("s1", "shape");
        assert_eq!(layer.calculate(&shape).unwrap().contributions.len(), 1);
        // max_snap_count reached
        assert!(layer.calculate(&shape).unwrap().contributions.is_empty());
        layer.reset_snap_counts();
        assert_eq!(layer.calculate(&shape).unwrap().contributions.len(), 1);
    }

    #[traced_test]
    #[test]
    fn test_truncation_is_logged() {
        let mut layer = MagneticLayer::default();
        for i in 0..5 {
            layer
                .add_target(point(&format!("t{i}"), 100.0 + i as f64, 100.0, 1.0))
                .unwrap();
        }
        let result = layer.calculate(&MagneticProbe::at(Vec2::new(102.0, 101.0))).unwrap();
        assert!(result.truncated);
        assert_eq!(result.contributions.len(), 3);
        assert!(logs_contain("magnetic targets truncated"));
    }

    #[test]
    fn test_move_target_refreshes_index() {
        let mut layer = MagneticLayer::default();
        layer.add_target(point("t", 1000.0, 1000.0, 1.0)).unwrap();
        let probe = MagneticProbe::at(Vec2::new(90.0, 100.0));
        assert!(layer.calculate(&probe).unwrap().contributions.is_empty());

        layer
            .move_target("t", Vec2::new(100.0, 100.0), Vec2::new(60.0, 0.0))
            .unwrap();
        assert_eq!(layer.calculate(&probe).unwrap().contributions.len(), 1);
        let body = layer.target("t").unwrap().body;
        assert_eq!(body.velocity, Vec2::new(60.0, 0.0));
        assert!(body.acceleration.x > 0.0);
    }

    #[test]
    fn test_import_replaces_previous_import() {
        let mut layer = MagneticLayer::default();
        layer.add_target(point("own", 0.0, 0.0, 1.0)).unwrap();
        let snaps = vec![
            SnapTarget::vertical(SnapTargetKind::Edge, 10.0, 0.8),
            SnapTarget::horizontal(SnapTargetKind::Edge, 10.0, 0.8),
        ];
        assert_eq!(layer.import_snap_targets(&snaps), 2);
        assert_eq!(layer.import_snap_targets(&snaps[..1]), 1);
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.target("snap:0").unwrap().priority, 3);
    }

    #[test]
    fn test_reimport_starts_counts_afresh() {
        let mut layer = MagneticLayer::default();
        layer.add_target(point("own", 45.0, 10.0, 1.0)).unwrap();
        layer.import_snap_targets(&[SnapTarget::vertical(SnapTargetKind::Guide, 50.0, 1.0)]);
        layer.calculate(&MagneticProbe::at(Vec2::new(45.0, 0.0))).unwrap();
        assert_eq!(layer.snap_count("snap:0"), 1);
        assert_eq!(layer.snap_count("own"), 1);

        // snap:0 now names a different line
        layer.import_snap_targets(&[SnapTarget::horizontal(SnapTargetKind::Edge, 500.0, 1.0)]);
        assert_eq!(layer.snap_count("snap:0"), 0);
        assert_eq!(layer.snap_count("own"), 1);
    }

    #[test]
    fn test_line_targets_pull_perpendicular() {
        let mut layer = MagneticLayer::default();
        layer.import_snap_targets(&[SnapTarget::vertical(SnapTargetKind::Guide, 50.0, 1.0)]);
        let result = layer.calculate(&MagneticProbe::at(Vec2::new(45.0, 9000.0))).unwrap();
        assert_eq!(result.snap_point, Some(Vec2::new(50.0, 9000.0)));
        assert!(result.force.x > 0.0 && result.force.y == 0.0);
    }

    #[test]
    fn test_physics_post_pass() {
        let mut layer = MagneticLayer::default();
        layer.add_target(point("t", 100.0, 100.0, 1.0)).unwrap();
        let result = layer.calculate(&MagneticProbe::at(Vec2::new(90.0, 100.0))).unwrap();
        let mut body = PhysicsBody::at(Vec2::new(90.0, 100.0));
        layer.apply_physics(&mut body, &result, 1e-4);
        assert!(body.position.x > 90.0);
    }

    #[test]
    fn test_rejects_duplicates_and_unknown_relations() {
        let mut layer = MagneticLayer::default();
        layer.add_target(point("t", 0.0, 0.0, 1.0)).unwrap();
        assert!(matches!(
            layer.add_target(point("t", 1.0, 1.0, 1.0)),
            Err(SnapError::DuplicateTargetId { .. })
        ));
        assert!(matches!(
            layer.add_relation("t", "ghost", RelationKind::Repel),
            Err(SnapError::UnknownTarget { .. })
        ));
        assert!(layer.remove_target("t"));
        assert!(layer.is_empty());
    }
}
