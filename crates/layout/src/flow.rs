use canvas_geometry::Vec2;

use crate::config::FlowConfig;
use crate::error::Result;
use crate::graph::LayoutGraph;

/// Left-to-right packing that wraps once a node would cross `max_width`.
/// A node wider than `max_width` still gets a row of its own.
pub fn layout(graph: &mut LayoutGraph, config: &FlowConfig) -> Result<()> {
    config.validate()?;

    let mut cursor = Vec2::ZERO;
    let mut row_height: f64 = 0.0;
    for node in &mut graph.nodes {
        if cursor.x > 0.0 && cursor.x + node.size.width > config.max_width {
            cursor = Vec2::new(0.0, cursor.y + row_height + config.vertical_spacing);
            row_height = 0.0;
        }
        node.position = cursor;
        cursor.x += node.size.width + config.horizontal_spacing;
        row_height = row_height.max(node.size.height);
    }
    Ok(())
}
