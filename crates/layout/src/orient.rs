//! Orientation of layered layouts.
//!
//! Hierarchical and tree layouts are computed top-to-bottom in a canonical
//! frame where horizontal directions see every node with width and height
//! exchanged. [`apply`] then maps each canonical box through the direction's
//! transform and moves the layout back to the origin.

use canvas_geometry::{BoundingBox, Matrix2D, Size, Vec2};

use crate::config::Direction;
use crate::graph::LayoutGraph;

pub fn matrix(direction: Direction) -> Matrix2D {
    match direction {
        Direction::TopBottom => Matrix2D::IDENTITY,
        Direction::BottomTop => Matrix2D::scaling(1.0, -1.0),
        Direction::LeftRight => Matrix2D::swap_axes(),
        Direction::RightLeft => Matrix2D::swap_axes().then(&Matrix2D::scaling(-1.0, 1.0)),
    }
}

/// Node size as seen in the canonical frame.
pub fn canonical_size(size: Size, direction: Direction) -> Size {
    if direction.is_horizontal() {
        Size::new(size.height, size.width)
    } else {
        size
    }
}

/// Map canonical positions into `direction` and translate the result so its
/// bounds start at the origin.
pub fn apply(graph: &mut LayoutGraph, direction: Direction) {
    let m = matrix(direction);
    for node in &mut graph.nodes {
        let canonical =
            BoundingBox::from_origin_size(node.position, canonical_size(node.size, direction));
        node.position = canonical.transform(&m).min;
    }
    normalize(graph);
}

pub fn normalize(graph: &mut LayoutGraph) {
    let Some(bounds) = BoundingBox::union_all(graph.nodes.iter().map(|n| n.bounds())) else {
        return;
    };
    let offset = Vec2::ZERO - bounds.min;
    for node in &mut graph.nodes {
        node.position += offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LayoutNode, NodeSpec};

    fn graph_with(position: Vec2, size: Size) -> LayoutGraph {
        let spec = NodeSpec::new("a", position, size);
        LayoutGraph {
            nodes: vec![LayoutNode::from_spec(0, &spec)],
            ..Default::default()
        }
    }

    #[test]
    fn test_left_right_swaps_axes() {
        // canonical frame: node sits one level down at y = 100
        let mut graph = graph_with(Vec2::new(0.0, 100.0), Size::new(40.0, 20.0));
        let mut second = graph.nodes[0].clone();
        second.position = Vec2::ZERO;
        graph.nodes.push(second);

        apply(&mut graph, Direction::LeftRight);
        assert_eq!(graph.nodes[0].position, Vec2::new(100.0, 0.0));
        assert_eq!(graph.nodes[1].position, Vec2::ZERO);
    }

    #[test]
    fn test_bottom_top_flips() {
        let mut graph = graph_with(Vec2::new(0.0, 100.0), Size::new(10.0, 10.0));
        let mut root = graph.nodes[0].clone();
        root.position = Vec2::ZERO;
        graph.nodes.push(root);

        apply(&mut graph, Direction::BottomTop);
        // the deeper node ends up above the root
        assert!(graph.nodes[0].position.y < graph.nodes[1].position.y);
        assert_eq!(graph.nodes[0].position.y, 0.0);
    }

    #[test]
    fn test_right_left_mirrors() {
        let m = matrix(Direction::RightLeft);
        assert_eq!(m.transform_point(Vec2::new(0.0, 100.0)), Vec2::new(-100.0, 0.0));
    }
}
