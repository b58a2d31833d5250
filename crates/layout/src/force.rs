//! Spring embedder shared by the force-directed and organic layouts.
//!
//! [`ForceSimulation`] owns its state and can be advanced one iteration at a
//! time, so a host scheduler can spread a large layout across frames and
//! stop early. [`layout`] runs it to completion.

use canvas_geometry::{EPSILON, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::time::Instant;

use crate::config::ForceConfig;
use crate::error::{LayoutError, Result};
use crate::graph::LayoutGraph;
use crate::types::{ConvergenceInfo, LayoutType};

/// Pairs closer than this are treated as this far apart.
const MIN_DISTANCE: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct ForceSimulation {
    config: ForceConfig,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    forces: Vec<Vec2>,
    masses: Vec<f64>,
    fixed: Vec<bool>,
    edges: Vec<(usize, usize, f64)>,
    center: Vec2,
    temperature: f64,
    iteration: usize,
    energy_history: Vec<f64>,
    converged: bool,
    rng: StdRng,
}

impl ForceSimulation {
    pub fn new(graph: &LayoutGraph, config: &ForceConfig) -> Result<Self> {
        config.validate()?;
        let mut positions: Vec<Vec2> = graph.nodes.iter().map(|n| n.center()).collect();
        spread_if_collapsed(&mut positions, config.spring_length);

        let center = if positions.is_empty() {
            Vec2::ZERO
        } else {
            positions.iter().fold(Vec2::ZERO, |acc, p| acc + *p) / positions.len() as f64
        };

        Ok(Self {
            config: config.clone(),
            velocities: vec![Vec2::ZERO; positions.len()],
            forces: vec![Vec2::ZERO; positions.len()],
            masses: graph.nodes.iter().map(|n| n.mass).collect(),
            fixed: graph.nodes.iter().map(|n| n.fixed).collect(),
            edges: graph
                .edges
                .iter()
                .map(|e| (e.source, e.target, e.weight))
                .collect(),
            center,
            temperature: config.max_displacement,
            iteration: 0,
            energy_history: Vec::new(),
            converged: false,
            rng: StdRng::seed_from_u64(config.seed),
            positions,
        })
    }

    fn accumulate_forces(&mut self) {
        let n = self.positions.len();
        self.forces.iter_mut().for_each(|f| *f = Vec2::ZERO);

        for i in 0..n {
            for j in (i + 1)..n {
                let delta = self.positions[i] - self.positions[j];
                let distance = delta.length();
                let direction = if distance < EPSILON {
                    Vec2::from_angle(self.rng.random_range(0.0..TAU))
                } else {
                    delta / distance
                };
                let d = distance.max(MIN_DISTANCE);
                let push = direction * (self.config.repulsion / (d * d));
                self.forces[i] += push;
                self.forces[j] -= push;
            }
        }

        for &(s, t, weight) in &self.edges {
            let delta = self.positions[t] - self.positions[s];
            let distance = delta.length();
            if distance < EPSILON {
                continue;
            }
            let pull = delta / distance
                * (self.config.attraction * (distance - self.config.spring_length) * weight);
            self.forces[s] += pull;
            self.forces[t] -= pull;
        }

        for i in 0..n {
            self.forces[i] += (self.center - self.positions[i]) * self.config.gravity;
        }
    }

    /// Advance one iteration and return the average kinetic energy.
    pub fn step(&mut self) -> f64 {
        if self.positions.is_empty() {
            self.converged = true;
            return 0.0;
        }
        self.accumulate_forces();

        let friction = 1.0 - self.config.friction;
        let mut energy = 0.0;
        for i in 0..self.positions.len() {
            if self.fixed[i] {
                self.velocities[i] = Vec2::ZERO;
                continue;
            }
            let mass = self.masses[i];
            let velocity = ((self.velocities[i] + self.forces[i] / mass) * friction)
                .clamp_length(self.temperature);
            self.velocities[i] = velocity;
            self.positions[i] += velocity;
            energy += 0.5 * mass * velocity.length_squared();
        }
        let energy = energy / self.positions.len() as f64;

        self.temperature = (self.temperature * self.config.cooling).max(EPSILON);
        self.iteration += 1;
        self.energy_history.push(energy);
        if energy < self.config.threshold {
            self.converged = true;
        }
        energy
    }

    pub fn is_finished(&self) -> bool {
        self.converged || self.iteration >= self.config.iterations
    }

    /// Step until converged, out of iterations, or out of time.
    pub fn run(&mut self) -> ConvergenceInfo {
        let started = Instant::now();
        let budget = self.config.time_budget();
        let mut stopped_by_budget = false;
        while !self.is_finished() {
            if budget.is_some_and(|b| started.elapsed() >= b) {
                stopped_by_budget = true;
                break;
            }
            self.step();
        }
        if !self.converged {
            tracing::debug!(
                iterations = self.iteration,
                energy = self.energy_history.last().copied().unwrap_or(0.0),
                stopped_by_budget,
                "force simulation stopped before converging"
            );
        }
        ConvergenceInfo {
            stopped_by_budget,
            ..self.convergence()
        }
    }

    pub fn convergence(&self) -> ConvergenceInfo {
        ConvergenceInfo {
            converged: self.converged,
            iterations: self.iteration,
            final_energy: self.energy_history.last().copied().unwrap_or(0.0),
            energy_history: self.energy_history.clone(),
            stopped_by_budget: false,
        }
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn energy_history(&self) -> &[f64] {
        &self.energy_history
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    /// Write the current centers, velocities and forces back into `graph`.
    pub fn apply(&self, graph: &mut LayoutGraph, kind: LayoutType) -> Result<()> {
        if self.positions.iter().any(|p| !p.is_finite()) {
            return Err(LayoutError::NumericalInstability { kind });
        }
        for (i, node) in graph.nodes.iter_mut().enumerate() {
            if node.fixed {
                continue;
            }
            node.set_center(self.positions[i]);
            node.velocity = self.velocities[i];
            node.force = self.forces[i];
        }
        Ok(())
    }
}

/// When every node starts on the same spot, seed a circle so the springs
/// have something to work with.
fn spread_if_collapsed(positions: &mut [Vec2], spacing: f64) {
    let n = positions.len();
    if n < 2 {
        return;
    }
    let first = positions[0];
    if positions.iter().any(|p| p.distance_to(first) > EPSILON) {
        return;
    }
    let radius = spacing.max(MIN_DISTANCE) * n as f64 / TAU;
    for (i, p) in positions.iter_mut().enumerate() {
        *p = first + Vec2::from_angle(TAU * i as f64 / n as f64) * radius;
    }
}

pub fn layout(
    graph: &mut LayoutGraph,
    config: &ForceConfig,
    kind: LayoutType,
) -> Result<ConvergenceInfo> {
    let mut simulation = ForceSimulation::new(graph, config)?;
    let info = simulation.run();
    simulation.apply(graph, kind)?;
    Ok(info)
}
