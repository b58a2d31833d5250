use canvas_geometry::{BoundingBox, CacheStats, EventBus, ResultCache, SnapshotKey};
use std::time::{Duration, Instant};

use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::force::{self, ForceSimulation};
use crate::graph::LayoutGraph;
use crate::metrics::LayoutMetrics;
use crate::suggestions::{self, LayoutSuggestion, SuggestionScorer, UserPreferences, WeightedBlend};
use crate::types::{
    Connection, ConvergenceInfo, LayoutResult, LayoutStatus, LayoutType, NodeSpec, PlacedNode,
};
use crate::{circular, flow, grid, hierarchical, tree};

/// Decimal places kept in result positions.
pub const RESULT_DECIMALS: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutEvent {
    NodesRegistered {
        nodes: usize,
        edges: usize,
    },
    LayoutCompleted {
        kind: LayoutType,
        nodes: usize,
        cached: bool,
        converged: Option<bool>,
    },
    LayoutFailed {
        kind: LayoutType,
        reason: String,
    },
}

/// Computes layouts for the registered node set.
///
/// Each call to [`execute_layout`](Self::execute_layout) works on a copy of
/// the registered nodes; the registered set itself is only replaced by
/// [`set_layout_nodes`](Self::set_layout_nodes).
pub struct LayoutEngine {
    config: LayoutConfig,
    graph: LayoutGraph,
    cache: ResultCache<LayoutResult>,
    events: EventBus<LayoutEvent>,
    scorer: Box<dyn SuggestionScorer + Send>,
    preferences: UserPreferences,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            cache: ResultCache::new(config.cache.capacity),
            config,
            graph: LayoutGraph::default(),
            events: EventBus::new(),
            scorer: Box::new(WeightedBlend::default()),
            preferences: UserPreferences::default(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Replace the configuration. Cached results stay valid since the
    /// configuration is part of every cache key.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
    }

    pub fn set_scorer(&mut self, scorer: impl SuggestionScorer + Send + 'static) {
        self.scorer = Box::new(scorer);
    }

    pub fn events(&mut self) -> &mut EventBus<LayoutEvent> {
        &mut self.events
    }

    /// Validate and register the node set. On error the previously
    /// registered set is kept.
    pub fn set_layout_nodes(&mut self, items: &[NodeSpec], connections: &[Connection]) -> Result<()> {
        self.graph = LayoutGraph::build(items, connections)?;
        self.events.publish(LayoutEvent::NodesRegistered {
            nodes: self.graph.nodes.len(),
            edges: self.graph.edges.len(),
        });
        Ok(())
    }

    pub fn graph(&self) -> &LayoutGraph {
        &self.graph
    }

    fn snapshot_key(&self, kind: LayoutType) -> SnapshotKey {
        let fixed: Vec<bool> = self.graph.nodes.iter().map(|n| n.fixed).collect();
        let mut builder = SnapshotKey::builder(kind.as_str())
            .context(&self.config)
            .context(&fixed);
        for node in &self.graph.nodes {
            builder = builder.item(node.id.as_str(), &node.bounds());
        }
        for edge in &self.graph.edges {
            builder = builder.link(
                self.graph.nodes[edge.source].id.as_str(),
                self.graph.nodes[edge.target].id.as_str(),
            );
        }
        builder.build()
    }

    fn run_strategy(
        &self,
        kind: LayoutType,
        graph: &mut LayoutGraph,
    ) -> Result<Option<ConvergenceInfo>> {
        let config = &self.config;
        match kind {
            LayoutType::Grid => grid::layout(graph, &config.grid)?,
            LayoutType::Hierarchical => hierarchical::layout(graph, &config.hierarchical)?,
            LayoutType::ForceDirected => {
                return force::layout(graph, &config.force, kind).map(Some);
            }
            LayoutType::Organic => {
                let organic = config.organic.apply(&config.force);
                return force::layout(graph, &organic, kind).map(Some);
            }
            LayoutType::Circular => circular::circular(graph, &config.circular)?,
            LayoutType::Radial => circular::radial(graph, &config.radial)?,
            LayoutType::Tree => tree::layout(graph, &config.tree)?,
            LayoutType::Flow => flow::layout(graph, &config.flow)?,
        }
        Ok(None)
    }

    /// Run `kind` over the registered nodes.
    ///
    /// Never fails: strategy errors produce a result with
    /// [`LayoutStatus::Failed`] and the registered positions.
    pub fn execute_layout(&mut self, kind: LayoutType) -> LayoutResult {
        let started = Instant::now();
        let key = self.snapshot_key(kind);
        if let Some(result) = self.cache.get(&key) {
            tracing::trace!(%kind, "layout served from cache");
            self.events.publish(LayoutEvent::LayoutCompleted {
                kind,
                nodes: result.nodes.len(),
                cached: true,
                converged: result.convergence.as_ref().map(|c| c.converged),
            });
            return result;
        }

        let mut working = self.graph.clone();
        let outcome = self.run_strategy(kind, &mut working).and_then(|convergence| {
            if working.nodes.iter().any(|n| !n.position.is_finite()) {
                return Err(LayoutError::NumericalInstability { kind });
            }
            Ok(convergence)
        });

        match outcome {
            Ok(convergence) => {
                // fixed nodes are restored whatever the strategy did
                for (node, registered) in working.nodes.iter_mut().zip(&self.graph.nodes) {
                    if registered.fixed {
                        node.position = registered.position;
                    }
                }
                let result = self.finish(kind, &working, convergence, started.elapsed());
                self.cache.insert(key, result.clone());
                self.events.publish(LayoutEvent::LayoutCompleted {
                    kind,
                    nodes: result.nodes.len(),
                    cached: false,
                    converged: result.convergence.as_ref().map(|c| c.converged),
                });
                result
            }
            Err(err) => {
                let reason = err.to_string();
                tracing::warn!(%kind, %reason, "layout strategy failed");
                self.events.publish(LayoutEvent::LayoutFailed {
                    kind,
                    reason: reason.clone(),
                });
                LayoutResult::failure(kind, reason, placed(&self.graph), started.elapsed())
            }
        }
    }

    /// Parse `name` and run it. Unknown names are an input error, never a
    /// fallback to some other layout.
    pub fn execute_layout_named(&mut self, name: &str) -> Result<LayoutResult> {
        Ok(self.execute_layout(name.parse()?))
    }

    fn finish(
        &self,
        kind: LayoutType,
        graph: &LayoutGraph,
        convergence: Option<ConvergenceInfo>,
        elapsed: Duration,
    ) -> LayoutResult {
        let nodes = placed(graph);
        LayoutResult {
            kind,
            status: LayoutStatus::Ok,
            bounds: BoundingBox::union_all(nodes.iter().map(PlacedNode::bounds)),
            metrics: LayoutMetrics::compute(graph),
            nodes,
            computation_time: elapsed,
            convergence,
        }
    }

    /// A simulation over the registered nodes that the caller steps itself.
    pub fn force_simulation(&self, organic: bool) -> Result<ForceSimulation> {
        let config = if organic {
            self.config.organic.apply(&self.config.force)
        } else {
            self.config.force.clone()
        };
        ForceSimulation::new(&self.graph, &config)
    }

    /// Rank layouts for `items` without touching the registered set.
    pub fn generate_layout_suggestions(
        &self,
        items: &[NodeSpec],
        connections: &[Connection],
    ) -> Result<Vec<LayoutSuggestion>> {
        if items.is_empty() {
            return Err(LayoutError::EmptyNodeSet);
        }
        let graph = LayoutGraph::build(items, connections)?;
        suggestions::suggest(&graph, self.scorer.as_ref(), &self.preferences)
    }

    /// Remember that the user picked `kind`; later suggestions lean on it.
    pub fn record_choice(&mut self, kind: LayoutType) {
        self.preferences.record(kind);
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

fn placed(graph: &LayoutGraph) -> Vec<PlacedNode> {
    graph
        .nodes
        .iter()
        .map(|n| PlacedNode {
            id: n.id.clone(),
            position: n.position.rounded(RESULT_DECIMALS),
            size: n.size,
            fixed: n.fixed,
        })
        .collect()
}
