//! Read-only quality summaries of a finished layout.

use canvas_geometry::{BoundingBox, EPSILON, SpatialHashGrid, Vec2, clamp_unit};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::graph::LayoutGraph;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutMetrics {
    /// 1 when the node centroid sits on the bounds center.
    pub balance_score: f64,
    /// Node area over bounds area.
    pub compactness: f64,
    pub crossing_count: usize,
    pub overlap_count: usize,
    pub aesthetic_score: f64,
}

impl LayoutMetrics {
    pub fn compute(graph: &LayoutGraph) -> Self {
        let Some(bounds) = BoundingBox::union_all(graph.nodes.iter().map(|n| n.bounds())) else {
            return Self::default();
        };

        let balance_score = balance(graph, &bounds);
        let compactness = if bounds.area() < EPSILON {
            1.0
        } else {
            clamp_unit(graph.nodes.iter().map(|n| n.size.area()).sum::<f64>() / bounds.area())
        };
        let crossing_count = crossings(graph);
        let overlap_count = overlaps(graph);
        let aesthetic_score = 0.3 * balance_score
            + 0.3 * compactness
            + 0.2 / (1.0 + crossing_count as f64)
            + 0.2 / (1.0 + overlap_count as f64);

        Self {
            balance_score,
            compactness,
            crossing_count,
            overlap_count,
            aesthetic_score,
        }
    }
}

fn balance(graph: &LayoutGraph, bounds: &BoundingBox) -> f64 {
    let half_diagonal = bounds.width().hypot(bounds.height()) / 2.0;
    if half_diagonal < EPSILON {
        return 1.0;
    }
    let centroid = graph
        .nodes
        .iter()
        .fold(Vec2::ZERO, |acc, n| acc + n.center())
        / graph.nodes.len() as f64;
    clamp_unit(1.0 - centroid.distance_to(bounds.center()) / half_diagonal)
}

/// Proper intersection of two segments; shared end points do not count.
fn segments_cross(a: (Vec2, Vec2), b: (Vec2, Vec2)) -> bool {
    let d1 = (a.1 - a.0).cross(b.0 - a.0);
    let d2 = (a.1 - a.0).cross(b.1 - a.0);
    let d3 = (b.1 - b.0).cross(a.0 - b.0);
    let d4 = (b.1 - b.0).cross(a.1 - b.0);
    d1 * d2 < -EPSILON && d3 * d4 < -EPSILON
}

/// Center-to-center edge crossings, skipping edges that share a node.
pub fn crossings(graph: &LayoutGraph) -> usize {
    graph
        .edges
        .iter()
        .tuple_combinations()
        .filter(|(e, f)| {
            let shared = e.source == f.source
                || e.source == f.target
                || e.target == f.source
                || e.target == f.target;
            !shared
                && segments_cross(
                    (graph.nodes[e.source].center(), graph.nodes[e.target].center()),
                    (graph.nodes[f.source].center(), graph.nodes[f.target].center()),
                )
        })
        .count()
}

/// Pairs of nodes whose boxes strictly intersect.
pub fn overlaps(graph: &LayoutGraph) -> usize {
    let mut index = SpatialHashGrid::default();
    for node in &graph.nodes {
        index.insert(node.index, node.bounds());
    }
    graph
        .nodes
        .iter()
        .map(|node| {
            let bounds = node.bounds();
            index
                .query(&bounds)
                .into_iter()
                .filter(|&other| other > node.index && graph.nodes[other].bounds().intersects(&bounds))
                .count()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Connection, NodeSpec};
    use canvas_geometry::Size;

    fn graph(nodes: &[(f64, f64)], links: &[(usize, usize)]) -> LayoutGraph {
        let specs: Vec<_> = nodes
            .iter()
            .enumerate()
            .map(|(i, (x, y))| NodeSpec::new(format!("n{i}"), Vec2::new(*x, *y), Size::new(10.0, 10.0)))
            .collect();
        let connections: Vec<_> = links
            .iter()
            .map(|(a, b)| Connection::new(format!("n{a}"), format!("n{b}")))
            .collect();
        LayoutGraph::build(&specs, &connections).unwrap()
    }

    #[test]
    fn test_crossing_square_diagonals() {
        let g = graph(
            &[(0.0, 0.0), (100.0, 100.0), (100.0, 0.0), (0.0, 100.0)],
            &[(0, 1), (2, 3)],
        );
        assert_eq!(crossings(&g), 1);

        let g = graph(
            &[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0), (100.0, 100.0)],
            &[(0, 1), (2, 3)],
        );
        assert_eq!(crossings(&g), 0);
    }

    #[test]
    fn test_overlaps() {
        let g = graph(&[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0), (300.0, 0.0)], &[]);
        // the touching pair (0 and 2) does not count
        assert_eq!(overlaps(&g), 2);
    }

    #[test]
    fn test_scores_in_range() {
        let g = graph(&[(0.0, 0.0), (20.0, 0.0), (0.0, 20.0), (20.0, 20.0)], &[(0, 3)]);
        let m = LayoutMetrics::compute(&g);
        assert!((m.balance_score - 1.0).abs() < 1e-9);
        assert!(m.compactness > 0.0 && m.compactness <= 1.0);
        assert_eq!(m.overlap_count, 0);
        assert!(m.aesthetic_score > 0.0 && m.aesthetic_score <= 1.0);
    }

    #[test]
    fn test_empty_graph() {
        let g = graph(&[], &[]);
        assert_eq!(LayoutMetrics::compute(&g), LayoutMetrics::default());
    }
}
