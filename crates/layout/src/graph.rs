//! Registered layout input: validated nodes, resolved edges and the
//! hierarchy derived from them.

use petgraph::algo::{connected_components, is_cyclic_directed};
use petgraph::graph::DiGraph;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

use crate::error::{LayoutError, Result};
use crate::types::{Connection, LayoutNode, NodeSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutGraph {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<Edge>,
    /// Roots of the BFS spanning forest, in discovery order.
    pub roots: Vec<usize>,
}

impl LayoutGraph {
    /// Validate `specs` and resolve both the explicit connection list and
    /// each node's own `connections`. Self loops and repeated edges are
    /// dropped.
    pub fn build(specs: &[NodeSpec], connections: &[Connection]) -> Result<Self> {
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();
        for (i, spec) in specs.iter().enumerate() {
            if !spec.position.is_finite() || !spec.size.is_finite() || !spec.weight.is_finite() {
                return Err(LayoutError::NonFiniteCoordinate {
                    id: spec.id.clone(),
                });
            }
            if spec.size.width < 0.0 || spec.size.height < 0.0 {
                return Err(LayoutError::NegativeSize {
                    id: spec.id.clone(),
                });
            }
            if index.insert(spec.id.as_str(), i).is_some() {
                return Err(LayoutError::DuplicateNodeId {
                    id: spec.id.clone(),
                });
            }
        }

        let declared = connections
            .iter()
            .map(|c| (c.source.as_str(), c.target.as_str(), c.weight))
            .chain(specs.iter().flat_map(|s| {
                s.connections
                    .iter()
                    .map(move |t| (s.id.as_str(), t.as_str(), 1.0))
            }));

        let mut seen = FxHashSet::default();
        let mut edges = Vec::new();
        for (source, target, weight) in declared {
            let lookup = |id: &str| {
                index
                    .get(id)
                    .copied()
                    .ok_or_else(|| LayoutError::UnknownEndpoint { id: id.to_string() })
            };
            let (s, t) = (lookup(source)?, lookup(target)?);
            if s == t || !seen.insert((s, t)) {
                continue;
            }
            let weight = if weight.is_finite() && weight > 0.0 {
                weight
            } else {
                1.0
            };
            edges.push(Edge {
                source: s,
                target: t,
                weight,
            });
        }

        let mut nodes: Vec<LayoutNode> = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| LayoutNode::from_spec(i, spec))
            .collect();
        for edge in &edges {
            let (s, t) = (edge.source, edge.target);
            nodes[s].children.push(t);
            nodes[t].parents.push(s);
            if !nodes[s].connections.contains(&t) {
                nodes[s].connections.push(t);
                nodes[t].connections.push(s);
            }
        }

        let mut graph = Self {
            nodes,
            edges,
            roots: Vec::new(),
        };
        graph.assign_levels();
        tracing::debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            roots = graph.roots.len(),
            "registered layout graph"
        );
        Ok(graph)
    }

    /// BFS from every parentless node. When every node sits on a cycle the
    /// first node seeds the search; nodes still unreached afterwards start
    /// trees of their own.
    fn assign_levels(&mut self) {
        let n = self.nodes.len();
        let mut visited = vec![false; n];
        let mut seeds: Vec<usize> = (0..n).filter(|&i| self.nodes[i].parents.is_empty()).collect();
        if seeds.is_empty() && n > 0 {
            seeds.push(0);
        }

        self.roots.clear();
        for node in &mut self.nodes {
            node.level = 0;
            node.tree_parent = None;
            node.tree_children.clear();
        }

        let mut queue = VecDeque::new();
        let mut next_unvisited = 0;
        loop {
            for &seed in &seeds {
                if !visited[seed] {
                    visited[seed] = true;
                    self.roots.push(seed);
                    queue.push_back(seed);
                }
            }
            while let Some(current) = queue.pop_front() {
                let level = self.nodes[current].level + 1;
                for k in 0..self.nodes[current].children.len() {
                    let child = self.nodes[current].children[k];
                    if visited[child] {
                        continue;
                    }
                    visited[child] = true;
                    self.nodes[child].level = level;
                    self.nodes[child].tree_parent = Some(current);
                    self.nodes[current].tree_children.push(child);
                    queue.push_back(child);
                }
            }

            while next_unvisited < n && visited[next_unvisited] {
                next_unvisited += 1;
            }
            if next_unvisited == n {
                break;
            }
            seeds = vec![next_unvisited];
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_level(&self) -> usize {
        self.nodes.iter().map(|n| n.level).max().unwrap_or(0)
    }

    /// Node indices grouped by level, each row in index order.
    pub fn levels(&self) -> Vec<Vec<usize>> {
        let mut rows = vec![Vec::new(); self.max_level() + 1];
        for node in &self.nodes {
            rows[node.level].push(node.index);
        }
        rows
    }

    pub fn to_digraph(&self) -> DiGraph<usize, f64> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let indices: Vec<_> = self.nodes.iter().map(|n| graph.add_node(n.index)).collect();
        for edge in &self.edges {
            graph.add_edge(indices[edge.source], indices[edge.target], edge.weight);
        }
        graph
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.to_digraph())
    }

    /// Weakly connected components.
    pub fn component_count(&self) -> usize {
        connected_components(&self.to_digraph())
    }

    /// Acyclic with every node having at most one parent.
    pub fn is_forest(&self) -> bool {
        self.nodes.iter().all(|n| n.parents.len() <= 1) && self.is_acyclic()
    }
}
