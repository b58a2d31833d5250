use canvas_geometry::{Size, Vec2};

use crate::config::LayoutConfig;
use crate::engine::LayoutEngine;
use crate::error::{LayoutError, Result};
use crate::types::{Connection, LayoutResult, LayoutStatus, LayoutType, NodeSpec};

/// Anything the host can position: diagram shapes, view models, test
/// fixtures.
pub trait Layoutable {
    fn id(&self) -> String;
    /// Top-left corner.
    fn position(&self) -> Vec2;
    fn size(&self) -> Size;
    fn set_position(&mut self, position: Vec2);
    fn fixed(&self) -> bool {
        false
    }
}

/// In-place layout that writes the new positions straight back into the
/// caller's nodes.
pub fn layout_in_place<N: Layoutable>(
    nodes: &mut [N],
    connections: &[Connection],
    kind: LayoutType,
    config: &LayoutConfig,
) -> Result<LayoutResult> {
    // Convert to internal format
    let specs: Vec<NodeSpec> = nodes
        .iter()
        .map(|n| NodeSpec::new(n.id(), n.position(), n.size()).fixed(n.fixed()))
        .collect();

    let mut engine = LayoutEngine::new(config.clone());
    engine.set_layout_nodes(&specs, connections)?;
    let result = engine.execute_layout(kind);
    if let LayoutStatus::Failed { reason } = &result.status {
        return Err(LayoutError::StrategyFailed {
            kind,
            reason: reason.clone(),
        });
    }

    // Update original data; result order matches input order
    for (node, placed) in nodes.iter_mut().zip(&result.nodes) {
        node.set_position(placed.position);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Shape {
        name: &'static str,
        x: f64,
        y: f64,
    }

    impl Layoutable for Shape {
        fn id(&self) -> String {
            self.name.to_string()
        }
        fn position(&self) -> Vec2 {
            Vec2::new(self.x, self.y)
        }
        fn size(&self) -> Size {
            Size::new(50.0, 20.0)
        }
        fn set_position(&mut self, position: Vec2) {
            self.x = position.x;
            self.y = position.y;
        }
    }

    #[test]
    fn test_writes_positions_back() {
        let mut shapes = vec![
            Shape { name: "a", x: 0.0, y: 0.0 },
            Shape { name: "b", x: 0.0, y: 0.0 },
        ];
        let connections = [Connection::new("a", "b")];
        let result = layout_in_place(
            &mut shapes,
            &connections,
            LayoutType::Hierarchical,
            &LayoutConfig::default(),
        )
        .unwrap();

        assert_eq!(result.nodes.len(), 2);
        assert_eq!((shapes[0].x, shapes[0].y), (0.0, 0.0));
        assert_eq!(shapes[1].y, 120.0);
    }

    #[test]
    fn test_failure_is_reported() {
        let mut shapes = vec![Shape { name: "a", x: 0.0, y: 0.0 }];
        let mut config = LayoutConfig::default();
        config.flow.max_width = -1.0;
        let err = layout_in_place(&mut shapes, &[], LayoutType::Flow, &config).unwrap_err();
        assert!(matches!(err, LayoutError::StrategyFailed { kind: LayoutType::Flow, .. }));
    }
}
