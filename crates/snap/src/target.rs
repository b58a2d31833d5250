use canvas_geometry::{Vec2, clamp_unit};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapTargetKind {
    Grid,
    /// A point on another object supplied by the host, such as a port.
    Object,
    Edge,
    Center,
    Margin,
    Guide,
}

impl SnapTargetKind {
    pub const ALL: [SnapTargetKind; 6] = [
        SnapTargetKind::Grid,
        SnapTargetKind::Object,
        SnapTargetKind::Edge,
        SnapTargetKind::Center,
        SnapTargetKind::Margin,
        SnapTargetKind::Guide,
    ];
}

/// Shape of a target.
///
/// A `Horizontal` target is the line `y = position.y`, a `Vertical` target
/// the line `x = position.x`, and `Both` the point `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapDirection {
    Horizontal,
    Vertical,
    Both,
}

impl SnapDirection {
    /// Which axes (x, y) a target of this shape moves.
    pub fn axes(self) -> (bool, bool) {
        match self {
            SnapDirection::Horizontal => (false, true),
            SnapDirection::Vertical => (true, false),
            SnapDirection::Both => (true, true),
        }
    }

    /// Targets are compatible when they move disjoint axes.
    pub fn is_compatible(self, other: SnapDirection) -> bool {
        let (ax, ay) = self.axes();
        let (bx, by) = other.axes();
        !(ax && bx) && !(ay && by)
    }
}

fn clamped_strength<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    f64::deserialize(deserializer).map(clamp_unit)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapTarget {
    pub kind: SnapTargetKind,
    pub position: Vec2,
    pub direction: SnapDirection,
    #[serde(deserialize_with = "clamped_strength")]
    strength: f64,
    #[serde(default)]
    pub source_id: Option<String>,
}

impl SnapTarget {
    pub fn new(
        kind: SnapTargetKind,
        position: Vec2,
        direction: SnapDirection,
        strength: f64,
    ) -> Self {
        Self {
            kind,
            position,
            direction,
            strength: clamp_unit(strength),
            source_id: None,
        }
    }

    pub fn point(kind: SnapTargetKind, position: Vec2, strength: f64) -> Self {
        Self::new(kind, position, SnapDirection::Both, strength)
    }

    /// Horizontal line at `y`.
    pub fn horizontal(kind: SnapTargetKind, y: f64, strength: f64) -> Self {
        Self::new(kind, Vec2::new(0.0, y), SnapDirection::Horizontal, strength)
    }

    /// Vertical line at `x`.
    pub fn vertical(kind: SnapTargetKind, x: f64, strength: f64) -> Self {
        Self::new(kind, Vec2::new(x, 0.0), SnapDirection::Vertical, strength)
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn set_strength(&mut self, strength: f64) {
        self.strength = clamp_unit(strength);
    }

    /// Offset that moves `point` onto the target.
    pub fn displacement(&self, point: Vec2) -> Vec2 {
        match self.direction {
            SnapDirection::Horizontal => Vec2::new(0.0, self.position.y - point.y),
            SnapDirection::Vertical => Vec2::new(self.position.x - point.x, 0.0),
            SnapDirection::Both => self.position - point,
        }
    }

    /// Perpendicular distance for lines, Euclidean for points.
    pub fn distance_from(&self, point: Vec2) -> f64 {
        self.displacement(point).length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_is_clamped() {
        let t = SnapTarget::point(SnapTargetKind::Grid, Vec2::ZERO, 3.0);
        assert_eq!(t.strength(), 1.0);
        let mut t = SnapTarget::vertical(SnapTargetKind::Edge, 5.0, -1.0);
        assert_eq!(t.strength(), 0.0);
        t.set_strength(f64::NAN);
        assert_eq!(t.strength(), 0.0);
    }

    #[test]
    fn test_deserialize_clamps() {
        let t: SnapTarget = serde_json::from_str(
            r#"{"kind":"guide","position":{"x":1.0,"y":2.0},"direction":"both","strength":7.5}"#,
        )
        .unwrap();
        assert_eq!(t.strength(), 1.0);
        assert_eq!(t.source_id, None);
    }

    #[test]
    fn test_distances() {
        let h = SnapTarget::horizontal(SnapTargetKind::Edge, 10.0, 1.0);
        assert_eq!(h.distance_from(Vec2::new(500.0, 13.0)), 3.0);
        let p = SnapTarget::point(SnapTargetKind::Grid, Vec2::new(3.0, 4.0), 1.0);
        assert_eq!(p.distance_from(Vec2::ZERO), 5.0);
        assert_eq!(p.displacement(Vec2::ZERO), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_compatibility() {
        use SnapDirection::*;
        assert!(Horizontal.is_compatible(Vertical));
        assert!(!Horizontal.is_compatible(Horizontal));
        assert!(!Both.is_compatible(Vertical));
    }
}
