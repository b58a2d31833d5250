use canvas_geometry::{BoundingBox, Vec2};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{SNAP_DECIMALS, SnapEngine, SnapResult};
use crate::error::{Result, SnapError};
use crate::item::PositionUpdate;

/// State of one multi-item drag, owned by the caller between pointer
/// events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragSession {
    origin: Vec2,
    /// Dragged items with their bounds at the start of the drag.
    items: Vec<(String, BoundingBox)>,
    offset: Vec2,
    /// Whether the group snaps to the remaining targets while moving.
    pub snapping: bool,
}

impl DragSession {
    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(id, _)| id.as_str())
    }

    /// Current offset from the drag start, snapping included.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    fn group_bounds(&self) -> Option<BoundingBox> {
        BoundingBox::union_all(self.items.iter().map(|(_, b)| *b))
    }

    fn positions(&self) -> Vec<PositionUpdate> {
        self.items
            .iter()
            .map(|(id, b)| PositionUpdate::new(id, (b.min + self.offset).rounded(SNAP_DECIMALS)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDragUpdate {
    pub offset: Vec2,
    pub positions: Vec<PositionUpdate>,
    pub snap: Option<SnapResult>,
}

impl SnapEngine {
    /// Start dragging `ids` from `pointer`. Locked items stay behind.
    pub fn begin_batch_drag(&self, ids: &[&str], pointer: Vec2) -> Result<DragSession> {
        if !pointer.is_finite() {
            return Err(SnapError::NonFiniteCoordinate {
                id: "pointer".to_string(),
            });
        }
        let mut seen = FxHashSet::default();
        let mut items = Vec::with_capacity(ids.len());
        for &id in ids {
            let item = self
                .item(id)
                .ok_or_else(|| SnapError::UnknownItem { id: id.to_string() })?;
            if !item.locked && seen.insert(id) {
                items.push((item.id.clone(), item.bounds));
            }
        }
        if items.is_empty() {
            return Err(SnapError::NotEnoughItems {
                required: 1,
                actual: 0,
            });
        }
        debug!(items = items.len(), "batch drag started");
        Ok(DragSession {
            origin: pointer,
            items,
            offset: Vec2::ZERO,
            snapping: true,
        })
    }

    /// Move the group with the pointer. The group's union box snaps as one
    /// item; targets generated by the dragged items themselves are ignored.
    pub fn update_batch_drag(
        &self,
        session: &mut DragSession,
        pointer: Vec2,
    ) -> Result<BatchDragUpdate> {
        if !pointer.is_finite() {
            return Err(SnapError::NonFiniteCoordinate {
                id: "pointer".to_string(),
            });
        }
        let raw = pointer - session.origin;
        let mut snap = None;
        session.offset = raw;
        if let Some(group) = session.group_bounds().filter(|_| session.snapping) {
            let skip: FxHashSet<&str> = session.item_ids().collect();
            let result = self.snap_box(group.translate(raw), true, &skip);
            session.offset = result.snapped_position - group.min;
            snap = Some(result);
        }
        Ok(BatchDragUpdate {
            offset: session.offset,
            positions: session.positions(),
            snap,
        })
    }

    /// Finish the drag: the registered items move to their final place and
    /// the new positions are returned for the caller to apply.
    pub fn end_batch_drag(&mut self, session: DragSession) -> Result<Vec<PositionUpdate>> {
        let updates = session.positions();
        for update in &updates {
            self.move_item(&update.id, update.position)?;
        }
        debug!(items = updates.len(), offset = ?session.offset, "batch drag finished");
        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SnapConfig;
    use crate::item::SelectionItem;

    fn engine() -> SnapEngine {
        let mut engine = SnapEngine::new(SnapConfig {
            margins: Vec::new(),
            ..Default::default()
        })
        .unwrap();
        engine
            .register_items(&[
                SelectionItem::from_rect("a", 0.0, 0.0, 20.0, 20.0),
                SelectionItem::from_rect("b", 30.0, 0.0, 20.0, 20.0),
                SelectionItem::from_rect("wall", 200.0, 0.0, 10.0, 100.0),
                SelectionItem::from_rect("pin", 0.0, 60.0, 10.0, 10.0).locked(true),
            ])
            .unwrap();
        engine
    }

    #[test]
    fn test_group_snaps_as_one() {
        let mut engine = engine();
        let mut session = engine
            .begin_batch_drag(&["a", "b", "pin"], Vec2::new(10.0, 10.0))
            .unwrap();
        assert_eq!(session.item_ids().collect::<Vec<_>>(), vec!["a", "b"]);

        // group right edge lands 3 units short of the wall
        let update = engine
            .update_batch_drag(&mut session, Vec2::new(157.0, 10.0))
            .unwrap();
        assert_eq!(update.offset, Vec2::new(150.0, 0.0));
        assert_eq!(update.positions[1].position, Vec2::new(180.0, 0.0));
        assert!(update.snap.unwrap().snapped);

        let final_positions = engine.end_batch_drag(session).unwrap();
        assert_eq!(final_positions[0].position, Vec2::new(150.0, 0.0));
        assert_eq!(engine.item("a").unwrap().position(), Vec2::new(150.0, 0.0));
        assert_eq!(engine.item("pin").unwrap().position(), Vec2::new(0.0, 60.0));
    }

    #[test]
    fn test_free_drag_without_snapping() {
        let engine = engine();
        let mut session = engine.begin_batch_drag(&["a"], Vec2::ZERO).unwrap();
        session.snapping = false;
        let update = engine
            .update_batch_drag(&mut session, Vec2::new(3.3, 4.4))
            .unwrap();
        assert_eq!(update.positions[0].position, Vec2::new(3.3, 4.4));
        assert!(update.snap.is_none());
    }

    #[test]
    fn test_begin_errors() {
        let engine = engine();
        assert!(matches!(
            engine.begin_batch_drag(&["ghost"], Vec2::ZERO),
            Err(SnapError::UnknownItem { .. })
        ));
        assert!(matches!(
            engine.begin_batch_drag(&["pin"], Vec2::ZERO),
            Err(SnapError::NotEnoughItems { .. })
        ));
    }
}
