use serde::{Deserialize, Serialize};

use crate::matrix::Matrix2D;
use crate::precision::EPSILON;
use crate::vector::{Size, Vec2};

/// Axis-aligned bounding box.
///
/// The constructors order the corners, so `min <= max` on both axes always
/// holds. A zero-area box (a single point) is legal. Deserialized boxes go
/// through the same normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBounds")]
pub struct BoundingBox {
    pub min: Vec2,
    pub max: Vec2,
}

/// Corners as written in a document, in either order.
#[derive(Deserialize)]
struct RawBounds {
    min: Vec2,
    max: Vec2,
}

impl From<RawBounds> for BoundingBox {
    fn from(raw: RawBounds) -> Self {
        Self::new(raw.min, raw.max)
    }
}

impl BoundingBox {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: Vec2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vec2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Box from a top-left corner and a size. Negative sizes are flipped.
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Vec2::new(x, y), Vec2::new(x + width, y + height))
    }

    pub fn from_origin_size(origin: Vec2, size: Size) -> Self {
        Self::from_rect(origin.x, origin.y, size.width, size.height)
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| acc.include(p)))
    }

    /// Union of all boxes, or `None` for an empty iterator.
    pub fn union_all(boxes: impl IntoIterator<Item = BoundingBox>) -> Option<Self> {
        boxes.into_iter().reduce(|acc, b| acc.union(&b))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn left(&self) -> f64 {
        self.min.x
    }

    pub fn right(&self) -> f64 {
        self.max.x
    }

    pub fn top(&self) -> f64 {
        self.min.y
    }

    pub fn bottom(&self) -> f64 {
        self.max.y
    }

    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }

    /// True when the boxes share an area larger than `EPSILON` on both axes.
    /// Boxes that merely touch do not intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x < other.max.x - EPSILON
            && other.min.x < self.max.x - EPSILON
            && self.min.y < other.max.y - EPSILON
            && other.min.y < self.max.y - EPSILON
    }

    /// Like [`intersects`](Self::intersects) but touching edges count.
    pub fn overlaps_inclusive(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x + EPSILON
            && other.min.x <= self.max.x + EPSILON
            && self.min.y <= other.max.y + EPSILON
            && other.min.y <= self.max.y + EPSILON
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x - EPSILON
            && p.x <= self.max.x + EPSILON
            && p.y >= self.min.y - EPSILON
            && p.y <= self.max.y + EPSILON
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Overlapping region, `None` unless the boxes strictly intersect.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }
        Some(BoundingBox::new(
            Vec2::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            Vec2::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        ))
    }

    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        self.intersection(other).map_or(0.0, |b| b.area())
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn include(&self, p: Vec2) -> BoundingBox {
        BoundingBox {
            min: Vec2::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: Vec2::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }

    /// Grow by `margin` on every side. A negative margin shrinks the box but
    /// never past its center.
    pub fn expand(&self, margin: f64) -> BoundingBox {
        let c = self.center();
        BoundingBox {
            min: Vec2::new((self.min.x - margin).min(c.x), (self.min.y - margin).min(c.y)),
            max: Vec2::new((self.max.x + margin).max(c.x), (self.max.y + margin).max(c.y)),
        }
    }

    pub fn translate(&self, offset: Vec2) -> BoundingBox {
        BoundingBox {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Box that contains the transformed corners.
    pub fn transform(&self, m: &Matrix2D) -> BoundingBox {
        let corners = self.corners().map(|p| m.transform_point(p));
        BoundingBox::from_points(corners).unwrap_or(*self)
    }

    /// Shortest distance between the two boxes' edges; zero when they touch
    /// or overlap.
    pub fn gap_distance(&self, other: &BoundingBox) -> f64 {
        let dx = (other.min.x - self.max.x).max(self.min.x - other.max.x).max(0.0);
        let dy = (other.min.y - self.max.y).max(self.min.y - other.max.y).max(0.0);
        dx.hypot(dy)
    }

    /// Distance from `p` to the nearest point of the box.
    pub fn distance_to_point(&self, p: Vec2) -> f64 {
        let dx = (self.min.x - p.x).max(p.x - self.max.x).max(0.0);
        let dy = (self.min.y - p.y).max(p.y - self.max.y).max(0.0);
        dx.hypot(dy)
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}
