use canvas_geometry::{EPSILON, Vec2};
use std::f64::consts::TAU;

use crate::config::{CircularConfig, RadialConfig};
use crate::error::Result;
use crate::graph::LayoutGraph;

fn is_full_turn(sweep: f64) -> bool {
    (sweep.abs() - TAU).abs() < EPSILON || sweep.abs() > TAU
}

/// Angle of slot `i` out of `n` spread over `sweep` radians. A full turn
/// leaves a gap between the last and first slot; a partial arc uses both
/// end points.
fn slot_angle(start: f64, sweep: f64, i: usize, n: usize) -> f64 {
    let divisor = if is_full_turn(sweep) || n < 2 {
        n.max(1)
    } else {
        n - 1
    };
    start + sweep * i as f64 / divisor as f64
}

fn max_half_extent(graph: &LayoutGraph) -> f64 {
    graph
        .nodes
        .iter()
        .map(|n| n.size.max_side() / 2.0)
        .fold(0.0, f64::max)
}

/// Radius that keeps neighbouring nodes `spacing` apart along the arc.
fn auto_radius(graph: &LayoutGraph, config: &CircularConfig) -> f64 {
    let n = graph.nodes.len();
    if n < 2 {
        return 0.0;
    }
    let slot = 2.0 * max_half_extent(graph) + config.spacing;
    let arc = if is_full_turn(config.sweep_angle) {
        TAU
    } else {
        config.sweep_angle.abs().max(EPSILON)
    };
    let slots = if is_full_turn(config.sweep_angle) { n } else { n - 1 };
    slot * slots as f64 / arc
}

pub fn circular(graph: &mut LayoutGraph, config: &CircularConfig) -> Result<()> {
    config.validate()?;
    let n = graph.nodes.len();
    if n == 0 {
        return Ok(());
    }

    let radius = config.radius.unwrap_or_else(|| auto_radius(graph, config));
    let margin = radius + max_half_extent(graph);
    let center = config.center.unwrap_or(Vec2::new(margin, margin));

    if n == 1 {
        graph.nodes[0].set_center(center);
        return Ok(());
    }
    for (i, node) in graph.nodes.iter_mut().enumerate() {
        let angle = slot_angle(config.start_angle, config.sweep_angle, i, n);
        node.set_center(center + Vec2::from_angle(angle) * radius);
    }
    Ok(())
}

/// One ring per hierarchy level. Within a ring nodes are ordered by their
/// tree parent's slot so subtrees stay together.
pub fn radial(graph: &mut LayoutGraph, config: &RadialConfig) -> Result<()> {
    config.validate()?;
    if graph.is_empty() {
        return Ok(());
    }

    let mut rings = graph.levels();
    let mut slot = vec![0usize; graph.nodes.len()];
    for ring in rings.iter_mut() {
        ring.sort_by_key(|&i| graph.nodes[i].tree_parent.map_or(0, |p| slot[p]));
        for (k, &i) in ring.iter().enumerate() {
            slot[i] = k;
        }
    }

    let ring_radius = |level: usize, count: usize| {
        let r = config.start_radius + level as f64 * config.radius_increment;
        if r < EPSILON && count > 1 {
            config.radius_increment / 2.0
        } else {
            r
        }
    };
    let outer = rings
        .iter()
        .enumerate()
        .map(|(level, ring)| ring_radius(level, ring.len()))
        .fold(0.0, f64::max);
    let margin = outer + max_half_extent(graph);
    let center = config.center.unwrap_or(Vec2::new(margin, margin));

    for (level, ring) in rings.iter().enumerate() {
        let radius = ring_radius(level, ring.len());
        for (k, &i) in ring.iter().enumerate() {
            let position = if radius < EPSILON {
                center
            } else {
                center + Vec2::from_angle(slot_angle(0.0, TAU, k, ring.len())) * radius
            };
            graph.nodes[i].set_center(position);
        }
    }
    Ok(())
}
