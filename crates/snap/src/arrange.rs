use canvas_geometry::{Vec2, precise_round};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::analysis::{AlignmentKind, AlignmentSuggestion};
use crate::error::{Result, SnapError};
use crate::item::{Axis, PositionUpdate, SelectionItem, validate_items};

const DECIMALS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "gap")]
pub enum Spacing {
    /// First and last item stay, the gaps between neighbours become equal.
    Equal,
    /// First item stays, every gap becomes the given value.
    Fixed(f64),
    /// First and last item stay, centers become equally spaced.
    Centers,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    pub spacing: Spacing,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            spacing: Spacing::Equal,
        }
    }
}

fn rounded(p: Vec2) -> Vec2 {
    p.rounded(DECIMALS)
}

/// Positions that line up the suggestion's items on its reference.
/// Locked items and ids not present in `items` are skipped.
pub fn apply_alignment(
    items: &[SelectionItem],
    suggestion: &AlignmentSuggestion,
) -> Vec<PositionUpdate> {
    let axis = suggestion.kind.axis();
    items
        .iter()
        .filter(|item| !item.locked && suggestion.item_ids.contains(&item.id))
        .map(|item| {
            let b = &item.bounds;
            let start = match suggestion.kind {
                AlignmentKind::Left | AlignmentKind::Top => suggestion.reference,
                AlignmentKind::Center | AlignmentKind::Middle => {
                    suggestion.reference - axis.extent(b) * 0.5
                }
                AlignmentKind::Right | AlignmentKind::Bottom => {
                    suggestion.reference - axis.extent(b)
                }
            };
            PositionUpdate::new(&item.id, rounded(axis.with(b.min, start)))
        })
        .collect()
}

/// Spread `items` along `axis`. Items are ordered by their leading edge;
/// every item gets an update, locked ones included, so the caller decides
/// whether a locked item may move.
pub fn apply_distribution(
    items: &[SelectionItem],
    config: &DistributionConfig,
    axis: Axis,
) -> Result<Vec<PositionUpdate>> {
    if items.len() < 2 {
        return Err(SnapError::NotEnoughItems {
            required: 2,
            actual: items.len(),
        });
    }
    validate_items(items)?;
    if matches!(config.spacing, Spacing::Fixed(gap) if !gap.is_finite()) {
        return Err(SnapError::invalid_config("fixed spacing must be finite"));
    }

    let sorted: Vec<&SelectionItem> = items
        .iter()
        .sorted_by(|a, b| {
            axis.start(&a.bounds)
                .total_cmp(&axis.start(&b.bounds))
                .then_with(|| a.id.cmp(&b.id))
        })
        .collect();
    let first = &sorted[0].bounds;
    let last = &sorted[sorted.len() - 1].bounds;
    let steps = (sorted.len() - 1) as f64;

    let starts: Vec<f64> = match config.spacing {
        Spacing::Equal => {
            let occupied: f64 = sorted.iter().map(|i| axis.extent(&i.bounds)).sum();
            let gap = (axis.end(last) - axis.start(first) - occupied) / steps;
            let mut cursor = axis.start(first);
            sorted
                .iter()
                .map(|item| {
                    let start = cursor;
                    cursor += axis.extent(&item.bounds) + gap;
                    start
                })
                .collect()
        }
        Spacing::Fixed(gap) => {
            let mut cursor = axis.start(first);
            sorted
                .iter()
                .map(|item| {
                    let start = cursor;
                    cursor += axis.extent(&item.bounds) + gap;
                    start
                })
                .collect()
        }
        Spacing::Centers => {
            let from = axis.mid(first);
            let pitch = (axis.mid(last) - from) / steps;
            sorted
                .iter()
                .enumerate()
                .map(|(i, item)| from + pitch * i as f64 - axis.extent(&item.bounds) * 0.5)
                .collect()
        }
    };

    Ok(sorted
        .iter()
        .zip(starts)
        .map(|(item, start)| {
            PositionUpdate::new(&item.id, rounded(axis.with(item.bounds.min, start)))
        })
        .collect())
}

/// Measured gaps between neighbours after applying `updates`, in order
/// along `axis`.
pub fn gaps_after(items: &[SelectionItem], updates: &[PositionUpdate], axis: Axis) -> Vec<f64> {
    let moved: Vec<_> = items
        .iter()
        .map(|item| {
            let position = updates
                .iter()
                .find(|u| u.id == item.id)
                .map_or(item.bounds.min, |u| u.position);
            item.bounds.translate(position - item.bounds.min)
        })
        .sorted_by(|a, b| axis.start(a).total_cmp(&axis.start(b)))
        .collect();
    moved
        .iter()
        .tuple_windows()
        .map(|(a, b)| precise_round(axis.start(b) - axis.end(a), 6))
        .collect()
}
