//! Tidy tree over the BFS spanning forest.
//!
//! Subtree widths are computed post-order; each parent is centred over the
//! span of its children and forest roots are placed side by side. Every
//! subtree owns a disjoint horizontal interval, so nodes of one level never
//! overlap.

use canvas_geometry::Vec2;

use crate::config::TreeConfig;
use crate::error::Result;
use crate::graph::LayoutGraph;
use crate::orient;

pub fn layout(graph: &mut LayoutGraph, config: &TreeConfig) -> Result<()> {
    config.validate()?;
    if graph.is_empty() {
        return Ok(());
    }

    let direction = config.direction;
    let sizes: Vec<_> = graph
        .nodes
        .iter()
        .map(|n| orient::canonical_size(n.size, direction))
        .collect();
    let sep = config.sibling_separation;

    // pre-order without recursion; deep chains must not overflow the stack
    let mut order = Vec::with_capacity(graph.nodes.len());
    let mut stack: Vec<usize> = graph.roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(graph.nodes[i].tree_children.iter().rev().copied());
    }

    let mut widths = vec![0.0; graph.nodes.len()];
    for &i in order.iter().rev() {
        let children = &graph.nodes[i].tree_children;
        let span = children.iter().map(|&c| widths[c]).sum::<f64>()
            + sep * children.len().saturating_sub(1) as f64;
        widths[i] = sizes[i].width.max(span);
    }

    let mut level_y = vec![0.0; graph.max_level() + 2];
    for level in 0..=graph.max_level() {
        let height = graph
            .nodes
            .iter()
            .filter(|n| n.level == level)
            .map(|n| sizes[n.index].height)
            .fold(0.0, f64::max);
        level_y[level + 1] = level_y[level] + height + config.level_separation;
    }

    // left edge of each node's interval, assigned parent before children
    let mut left = vec![0.0; graph.nodes.len()];
    let mut cursor = 0.0;
    for &root in &graph.roots {
        left[root] = cursor;
        cursor += widths[root] + sep;
    }
    for &i in &order {
        let node = &graph.nodes[i];
        let children = node.tree_children.clone();
        let span = children.iter().map(|&c| widths[c]).sum::<f64>()
            + sep * children.len().saturating_sub(1) as f64;
        let mut x = left[i] + (widths[i] - span) / 2.0;
        for c in children {
            left[c] = x;
            x += widths[c] + sep;
        }
        let center_x = left[i] + widths[i] / 2.0;
        let y = level_y[graph.nodes[i].level];
        graph.nodes[i].position = Vec2::new(center_x - sizes[i].width / 2.0, y);
    }

    orient::apply(graph, direction);
    Ok(())
}
