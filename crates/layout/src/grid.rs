use canvas_geometry::Vec2;

use crate::config::{CellAlignment, GridConfig};
use crate::error::Result;
use crate::graph::LayoutGraph;

/// Row-major grid. Every cell is as large as the largest node plus the
/// spacing, so cells never overlap whatever the alignment.
pub fn layout(graph: &mut LayoutGraph, config: &GridConfig) -> Result<()> {
    config.validate()?;
    let n = graph.nodes.len();
    if n == 0 {
        return Ok(());
    }

    let (columns, _) = dimensions(n, config.columns);
    let max_width = graph.nodes.iter().map(|n| n.size.width).fold(0.0, f64::max);
    let max_height = graph.nodes.iter().map(|n| n.size.height).fold(0.0, f64::max);
    let cell = Vec2::new(max_width + config.spacing, max_height + config.spacing);

    for (i, node) in graph.nodes.iter_mut().enumerate() {
        let (col, row) = (i % columns, i / columns);
        let origin = Vec2::new(col as f64 * cell.x, row as f64 * cell.y);
        let slack = Vec2::new(max_width - node.size.width, max_height - node.size.height);
        let offset = match config.alignment {
            CellAlignment::Start => Vec2::ZERO,
            CellAlignment::Center => slack * 0.5,
            CellAlignment::End => slack,
        };
        node.position = origin + offset;
    }
    Ok(())
}

/// `(columns, rows)` for `n` nodes.
pub fn dimensions(n: usize, columns: Option<usize>) -> (usize, usize) {
    if n == 0 {
        return (0, 0);
    }
    let columns = columns
        .unwrap_or_else(|| (n as f64).sqrt().ceil() as usize)
        .max(1);
    (columns, n.div_ceil(columns))
}
