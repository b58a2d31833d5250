//! Layout recommendations from the shape of the input graph.
//!
//! Each candidate carries a heuristic confidence and an expected quality;
//! a [`SuggestionScorer`] blends them with how often the user picked that
//! layout before. The default weights are tunable starting points.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::graph::LayoutGraph;
use crate::types::{Connection, LayoutType, NodeSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphProfile {
    pub node_count: usize,
    pub edge_count: usize,
    /// Edges over the directed maximum `n * (n - 1)`.
    pub density: f64,
    pub acyclic: bool,
    pub forest: bool,
    pub root_count: usize,
    pub depth: usize,
    pub group_count: usize,
    pub component_count: usize,
}

impl GraphProfile {
    pub fn from_graph(graph: &LayoutGraph) -> Self {
        let n = graph.nodes.len();
        let groups: FxHashSet<&str> = graph
            .nodes
            .iter()
            .filter_map(|node| node.group.as_deref())
            .collect();
        Self {
            node_count: n,
            edge_count: graph.edges.len(),
            density: if n < 2 {
                0.0
            } else {
                graph.edges.len() as f64 / (n * (n - 1)) as f64
            },
            acyclic: graph.is_acyclic(),
            forest: graph.is_forest(),
            root_count: graph.roots.len(),
            depth: graph.max_level(),
            group_count: groups.len(),
            component_count: graph.component_count(),
        }
    }
}

/// Inputs to a [`SuggestionScorer`], each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub confidence: f64,
    pub quality: f64,
    pub user_fit: f64,
}

pub trait SuggestionScorer {
    fn score(&self, candidate: &Candidate) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightedBlend {
    pub confidence: f64,
    pub quality: f64,
    pub user_fit: f64,
}

impl Default for WeightedBlend {
    fn default() -> Self {
        Self {
            confidence: 0.4,
            quality: 0.4,
            user_fit: 0.2,
        }
    }
}

impl SuggestionScorer for WeightedBlend {
    fn score(&self, c: &Candidate) -> f64 {
        self.confidence * c.confidence + self.quality * c.quality + self.user_fit * c.user_fit
    }
}

/// How often each layout was chosen; unseen layouts get a neutral fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    chosen: FxHashMap<LayoutType, u32>,
    total: u32,
}

impl UserPreferences {
    pub fn record(&mut self, kind: LayoutType) {
        *self.chosen.entry(kind).or_default() += 1;
        self.total += 1;
    }

    pub fn fit(&self, kind: LayoutType) -> f64 {
        if self.total == 0 {
            return 0.5;
        }
        let count = self.chosen.get(&kind).copied().unwrap_or(0);
        0.5 + 0.5 * count as f64 / self.total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSuggestion {
    pub kind: LayoutType,
    pub confidence: f64,
    pub reasoning: String,
    pub score: f64,
}

struct Rule {
    kind: LayoutType,
    confidence: f64,
    quality: f64,
    reasoning: String,
}

fn rules(p: &GraphProfile) -> Vec<Rule> {
    let mut out = Vec::new();
    let mut push = |kind, confidence, quality, reasoning: String| {
        out.push(Rule {
            kind,
            confidence,
            quality,
            reasoning,
        })
    };

    if p.edge_count == 0 {
        push(
            LayoutType::Grid,
            0.9,
            0.85,
            format!("{} unconnected nodes pack cleanly into a grid", p.node_count),
        );
        push(
            LayoutType::Flow,
            0.7,
            0.75,
            "no connections: wrapped rows preserve input order".to_string(),
        );
        if p.group_count > 1 {
            push(
                LayoutType::Organic,
                0.5,
                0.6,
                format!("{} groups can settle into natural clusters", p.group_count),
            );
        }
        return out;
    }

    if p.forest {
        push(
            LayoutType::Tree,
            0.9,
            0.85,
            format!(
                "every node has at most one parent: a tree of depth {} shows the structure",
                p.depth
            ),
        );
        if p.root_count == 1 && p.node_count > 3 {
            push(
                LayoutType::Radial,
                0.65,
                0.7,
                "single root: rings per level keep the tree compact".to_string(),
            );
        }
    }
    if p.acyclic {
        push(
            LayoutType::Hierarchical,
            if p.forest { 0.8 } else { 0.85 },
            0.8,
            format!("acyclic graph with {} levels reads well top-down", p.depth + 1),
        );
    } else {
        push(
            LayoutType::ForceDirected,
            0.8,
            0.7,
            "cycles present: a spring embedder avoids forcing a direction".to_string(),
        );
        push(
            LayoutType::Organic,
            0.7,
            0.7,
            "cycles present: gentler forces keep related nodes close".to_string(),
        );
    }
    if p.density > 0.3 || (p.node_count <= 8 && !p.acyclic) {
        push(
            LayoutType::Circular,
            0.6,
            0.6,
            format!("dense graph (density {:.2}): a circle exposes every edge", p.density),
        );
    }
    if p.group_count > 1 && p.acyclic {
        push(
            LayoutType::Organic,
            0.55,
            0.6,
            format!("{} groups can settle into natural clusters", p.group_count),
        );
    }
    if p.component_count > 1 {
        push(
            LayoutType::Grid,
            0.4,
            0.5,
            format!("{} disconnected components", p.component_count),
        );
    }
    out
}

pub fn suggest(
    graph: &LayoutGraph,
    scorer: &dyn SuggestionScorer,
    preferences: &UserPreferences,
) -> Result<Vec<LayoutSuggestion>> {
    if graph.is_empty() {
        return Err(LayoutError::EmptyNodeSet);
    }
    let profile = GraphProfile::from_graph(graph);

    let mut best: FxHashMap<LayoutType, LayoutSuggestion> = FxHashMap::default();
    for rule in rules(&profile) {
        let candidate = Candidate {
            confidence: rule.confidence,
            quality: rule.quality,
            user_fit: preferences.fit(rule.kind),
        };
        let suggestion = LayoutSuggestion {
            kind: rule.kind,
            confidence: rule.confidence,
            reasoning: rule.reasoning,
            score: scorer.score(&candidate),
        };
        match best.get(&rule.kind) {
            Some(existing) if existing.score >= suggestion.score => {}
            _ => {
                best.insert(rule.kind, suggestion);
            }
        }
    }

    let mut suggestions: Vec<_> = best.into_values().collect();
    suggestions.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.kind.cmp(&b.kind)));
    Ok(suggestions)
}

/// Rank layouts for `items` with the default scorer.
pub fn generate_layout_suggestions(
    items: &[NodeSpec],
    connections: &[Connection],
) -> Result<Vec<LayoutSuggestion>> {
    if items.is_empty() {
        return Err(LayoutError::EmptyNodeSet);
    }
    let graph = LayoutGraph::build(items, connections)?;
    suggest(&graph, &WeightedBlend::default(), &UserPreferences::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_geometry::{Size, Vec2};

    fn specs(n: usize) -> Vec<NodeSpec> {
        (0..n)
            .map(|i| NodeSpec::new(format!("n{i}"), Vec2::ZERO, Size::new(10.0, 10.0)))
            .collect()
    }

    fn link(a: usize, b: usize) -> Connection {
        Connection::new(format!("n{a}"), format!("n{b}"))
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert_eq!(generate_layout_suggestions(&[], &[]), Err(LayoutError::EmptyNodeSet));
    }

    #[test]
    fn test_unconnected_prefers_grid() {
        let suggestions = generate_layout_suggestions(&specs(9), &[]).unwrap();
        assert_eq!(suggestions[0].kind, LayoutType::Grid);
        assert!(suggestions.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_tree_prefers_tree() {
        let links = [link(0, 1), link(0, 2), link(1, 3), link(1, 4)];
        let suggestions = generate_layout_suggestions(&specs(5), &links).unwrap();
        assert_eq!(suggestions[0].kind, LayoutType::Tree);
        assert!(!suggestions[0].reasoning.is_empty());
    }

    #[test]
    fn test_cycle_prefers_force() {
        let links: Vec<_> = (0..12).map(|i| link(i, (i + 1) % 12)).collect();
        let suggestions = generate_layout_suggestions(&specs(12), &links).unwrap();
        assert_eq!(suggestions[0].kind, LayoutType::ForceDirected);
        assert!(suggestions.iter().all(|s| s.kind != LayoutType::Tree));
    }

    #[test]
    fn test_preferences_shift_ranking() {
        let graph = LayoutGraph::build(&specs(9), &[]).unwrap();
        let mut prefs = UserPreferences::default();
        for _ in 0..10 {
            prefs.record(LayoutType::Flow);
        }
        let scorer = WeightedBlend {
            confidence: 0.2,
            quality: 0.2,
            user_fit: 0.6,
        };
        let suggestions = suggest(&graph, &scorer, &prefs).unwrap();
        assert_eq!(suggestions[0].kind, LayoutType::Flow);
    }
}
