use canvas_geometry::{BoundingBox, precise_round};
use serde::{Deserialize, Serialize};

use crate::target::{SnapDirection, SnapTarget, SnapTargetKind};

/// Line for the overlay renderer while a snap is active.
///
/// A `Vertical` guide is drawn at `x = position` from `y = start` to
/// `y = end`; a `Horizontal` guide at `y = position` from `x = start` to
/// `x = end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentGuide {
    pub kind: SnapTargetKind,
    pub orientation: SnapDirection,
    pub position: f64,
    pub start: f64,
    pub end: f64,
}

/// Guides for an applied target: one line for line targets, a crosshair
/// for point targets. `span` covers the moving box and the target's source.
pub(crate) fn guides_for(
    target: &SnapTarget,
    span: &BoundingBox,
    extension: f64,
) -> Vec<AlignmentGuide> {
    let span = match target.direction {
        SnapDirection::Both => span.include(target.position),
        _ => *span,
    };
    let vertical = |x: f64| AlignmentGuide {
        kind: target.kind,
        orientation: SnapDirection::Vertical,
        position: precise_round(x, 3),
        start: precise_round(span.min.y - extension, 3),
        end: precise_round(span.max.y + extension, 3),
    };
    let horizontal = |y: f64| AlignmentGuide {
        kind: target.kind,
        orientation: SnapDirection::Horizontal,
        position: precise_round(y, 3),
        start: precise_round(span.min.x - extension, 3),
        end: precise_round(span.max.x + extension, 3),
    };
    match target.direction {
        SnapDirection::Vertical => vec![vertical(target.position.x)],
        SnapDirection::Horizontal => vec![horizontal(target.position.y)],
        SnapDirection::Both => vec![vertical(target.position.x), horizontal(target.position.y)],
    }
}
