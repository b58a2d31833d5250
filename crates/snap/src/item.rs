use canvas_geometry::{BoundingBox, Size, Vec2};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SnapError};

/// A selectable item on the canvas as seen by the snapping engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionItem {
    pub id: String,
    pub bounds: BoundingBox,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Locked items are never moved by drags, alignment or distribution.
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub group: Option<String>,
}

impl SelectionItem {
    pub fn new(id: impl Into<String>, bounds: BoundingBox) -> Self {
        Self {
            id: id.into(),
            bounds,
            kind: String::new(),
            locked: false,
            group: None,
        }
    }

    pub fn from_rect(id: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(id, BoundingBox::from_rect(x, y, width, height))
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Top-left corner.
    pub fn position(&self) -> Vec2 {
        self.bounds.min
    }

    pub fn size(&self) -> Size {
        self.bounds.size()
    }
}

/// Axis along which items are distributed or a drag is constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Along x.
    Horizontal,
    /// Along y.
    Vertical,
}

impl Axis {
    pub fn start(self, b: &BoundingBox) -> f64 {
        match self {
            Axis::Horizontal => b.min.x,
            Axis::Vertical => b.min.y,
        }
    }

    pub fn end(self, b: &BoundingBox) -> f64 {
        match self {
            Axis::Horizontal => b.max.x,
            Axis::Vertical => b.max.y,
        }
    }

    pub fn extent(self, b: &BoundingBox) -> f64 {
        self.end(b) - self.start(b)
    }

    pub fn mid(self, b: &BoundingBox) -> f64 {
        (self.start(b) + self.end(b)) * 0.5
    }

    /// `position` with its coordinate on this axis replaced by `value`.
    pub fn with(self, position: Vec2, value: f64) -> Vec2 {
        match self {
            Axis::Horizontal => Vec2::new(value, position.y),
            Axis::Vertical => Vec2::new(position.x, value),
        }
    }
}

/// New top-left corner for an item, for the caller to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: String,
    pub position: Vec2,
}

impl PositionUpdate {
    pub fn new(id: impl Into<String>, position: Vec2) -> Self {
        Self {
            id: id.into(),
            position,
        }
    }
}

pub(crate) fn validate_items(items: &[SelectionItem]) -> Result<()> {
    let mut seen = FxHashSet::default();
    for item in items {
        if !item.bounds.is_finite() {
            return Err(SnapError::NonFiniteCoordinate {
                id: item.id.clone(),
            });
        }
        if !seen.insert(item.id.as_str()) {
            return Err(SnapError::DuplicateItemId {
                id: item.id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_duplicates_and_nan() {
        let ok = [
            SelectionItem::from_rect("a", 0.0, 0.0, 10.0, 10.0),
            SelectionItem::from_rect("b", 20.0, 0.0, 10.0, 10.0),
        ];
        assert!(validate_items(&ok).is_ok());

        let dup = [ok[0].clone(), ok[0].clone()];
        assert_eq!(
            validate_items(&dup),
            Err(SnapError::DuplicateItemId { id: "a".into() })
        );

        let nan = [SelectionItem::from_rect("n", f64::NAN, 0.0, 1.0, 1.0)];
        assert!(matches!(
            validate_items(&nan),
            Err(SnapError::NonFiniteCoordinate { .. })
        ));
    }

    #[test]
    fn test_axis_accessors() {
        let b = BoundingBox::from_rect(10.0, 20.0, 30.0, 40.0);
        assert_eq!(Axis::Horizontal.start(&b), 10.0);
        assert_eq!(Axis::Vertical.end(&b), 60.0);
        assert_eq!(Axis::Vertical.mid(&b), 40.0);
        assert_eq!(
            Axis::Vertical.with(Vec2::new(1.0, 2.0), 9.0),
            Vec2::new(1.0, 9.0)
        );
    }
}
