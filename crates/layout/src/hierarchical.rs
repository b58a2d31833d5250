//! Layered layout by BFS level with barycenter crossing reduction.

use itertools::Itertools;

use crate::config::HierarchicalConfig;
use crate::error::Result;
use crate::graph::LayoutGraph;
use crate::orient;
use canvas_geometry::Vec2;

pub fn layout(graph: &mut LayoutGraph, config: &HierarchicalConfig) -> Result<()> {
    config.validate()?;
    if graph.is_empty() {
        return Ok(());
    }

    let mut rows = graph.levels();
    if config.minimize_crossings && rows.len() > 1 {
        rows = reduce_crossings(graph, rows, config.crossing_sweeps);
    }

    let direction = config.direction;
    let sizes: Vec<_> = graph
        .nodes
        .iter()
        .map(|n| orient::canonical_size(n.size, direction))
        .collect();
    let row_width = |row: &[usize]| {
        row.iter().map(|&i| sizes[i].width).sum::<f64>()
            + config.node_separation * row.len().saturating_sub(1) as f64
    };
    let widest = rows.iter().map(|r| row_width(r.as_slice())).fold(0.0, f64::max);

    let mut y = 0.0;
    for row in &rows {
        let row_height = row.iter().map(|&i| sizes[i].height).fold(0.0, f64::max);
        let mut x = (widest - row_width(row.as_slice())) / 2.0;
        for &i in row {
            let offset = (row_height - sizes[i].height) / 2.0;
            graph.nodes[i].position = Vec2::new(x, y + offset);
            x += sizes[i].width + config.node_separation;
        }
        y += row_height + config.level_separation;
    }

    orient::apply(graph, direction);
    Ok(())
}

fn positions_in_rows(n: usize, rows: &[Vec<usize>]) -> Vec<usize> {
    let mut position = vec![0; n];
    for row in rows {
        for (k, &i) in row.iter().enumerate() {
            position[i] = k;
        }
    }
    position
}

/// Straight-line crossings between consecutive levels for the given row
/// orders. Edges spanning more than one level are ignored.
pub fn count_crossings(graph: &LayoutGraph, rows: &[Vec<usize>]) -> usize {
    let position = positions_in_rows(graph.nodes.len(), rows);
    let mut crossings = 0;
    for level in 0..rows.len().saturating_sub(1) {
        let segments: Vec<(usize, usize)> = graph
            .edges
            .iter()
            .filter_map(|e| {
                let (a, b) = (&graph.nodes[e.source], &graph.nodes[e.target]);
                if a.level == level && b.level == level + 1 {
                    Some((position[a.index], position[b.index]))
                } else if b.level == level && a.level == level + 1 {
                    Some((position[b.index], position[a.index]))
                } else {
                    None
                }
            })
            .collect();
        crossings += segments
            .iter()
            .tuple_combinations()
            .filter(|((p1, q1), (p2, q2))| (p1 < p2 && q1 > q2) || (p1 > p2 && q1 < q2))
            .count();
    }
    crossings
}

/// Reorder `rows[row]` by the mean position of each node's neighbours on
/// level `reference`.
fn barycenter_sort(graph: &LayoutGraph, rows: &mut [Vec<usize>], row: usize, reference: usize) {
    let position = positions_in_rows(graph.nodes.len(), rows);
    let mut keyed: Vec<(f64, usize)> = rows[row]
        .iter()
        .map(|&i| {
            let neighbours: Vec<f64> = graph.nodes[i]
                .connections
                .iter()
                .filter(|&&j| graph.nodes[j].level == reference)
                .map(|&j| position[j] as f64)
                .collect();
            let key = if neighbours.is_empty() {
                position[i] as f64
            } else {
                neighbours.iter().sum::<f64>() / neighbours.len() as f64
            };
            (key, i)
        })
        .collect();
    // stable: equal barycenters keep their current order
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    rows[row] = keyed.into_iter().map(|(_, i)| i).collect();
}

/// Alternating down and up barycenter sweeps; the best ordering seen wins.
fn reduce_crossings(graph: &LayoutGraph, rows: Vec<Vec<usize>>, sweeps: usize) -> Vec<Vec<usize>> {
    let mut best_crossings = count_crossings(graph, &rows);
    let mut best = rows.clone();
    let mut current = rows;

    for _ in 0..sweeps {
        if best_crossings == 0 {
            break;
        }
        for r in 1..current.len() {
            barycenter_sort(graph, &mut current, r, r - 1);
        }
        for r in (0..current.len() - 1).rev() {
            barycenter_sort(graph, &mut current, r, r + 1);
        }
        let crossings = count_crossings(graph, &current);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = current.clone();
        }
    }
    tracing::trace!(crossings = best_crossings, "hierarchical crossing reduction");
    best
}
