use canvas_geometry::{BoundingBox, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::LayoutError;
use crate::metrics::LayoutMetrics;

/// Smallest mass a node can have; keeps `F / m` finite for zero weights.
pub const MIN_MASS: f64 = 0.1;

fn default_weight() -> f64 {
    1.0
}

/// A node as supplied by the host's diagram model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    /// Top-left corner.
    #[serde(default)]
    pub position: Vec2,
    #[serde(default)]
    pub size: Size,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Ids of nodes this node points to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>, position: Vec2, size: Size) -> Self {
        Self {
            id: id.into(),
            position,
            size,
            kind: None,
            fixed: false,
            weight: 1.0,
            group: None,
            connections: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    pub fn connect_to(mut self, target: impl Into<String>) -> Self {
        self.connections.push(target.into());
        self
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_origin_size(self.position, self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub source: String,
    pub target: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight: 1.0,
        }
    }
}

/// Per-call working state for one node.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: String,
    pub index: usize,
    pub source: NodeSpec,
    pub position: Vec2,
    pub size: Size,
    pub fixed: bool,
    pub mass: f64,
    pub group: Option<String>,
    pub level: usize,
    /// Undirected neighbours.
    pub connections: Vec<usize>,
    pub parents: Vec<usize>,
    pub children: Vec<usize>,
    /// Parent in the BFS spanning forest.
    pub tree_parent: Option<usize>,
    pub tree_children: Vec<usize>,
    pub velocity: Vec2,
    pub force: Vec2,
}

impl LayoutNode {
    pub fn from_spec(index: usize, spec: &NodeSpec) -> Self {
        Self {
            id: spec.id.clone(),
            index,
            source: spec.clone(),
            position: spec.position,
            size: spec.size,
            fixed: spec.fixed,
            mass: spec.weight.max(MIN_MASS),
            group: spec.group.clone(),
            level: 0,
            connections: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
            tree_parent: None,
            tree_children: Vec::new(),
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_origin_size(self.position, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.size.half()
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.position = center - self.size.half();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutType {
    Grid,
    Hierarchical,
    ForceDirected,
    Circular,
    Radial,
    Tree,
    Flow,
    Organic,
}

impl LayoutType {
    pub const ALL: [LayoutType; 8] = [
        LayoutType::Grid,
        LayoutType::Hierarchical,
        LayoutType::ForceDirected,
        LayoutType::Circular,
        LayoutType::Radial,
        LayoutType::Tree,
        LayoutType::Flow,
        LayoutType::Organic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutType::Grid => "grid",
            LayoutType::Hierarchical => "hierarchical",
            LayoutType::ForceDirected => "force-directed",
            LayoutType::Circular => "circular",
            LayoutType::Radial => "radial",
            LayoutType::Tree => "tree",
            LayoutType::Flow => "flow",
            LayoutType::Organic => "organic",
        }
    }
}

impl fmt::Display for LayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutType {
    type Err = LayoutError;

    /// Case-insensitive; `_`, spaces and `-` are interchangeable and
    /// `"force"` is accepted for force-directed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '_' | ' ' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match normalized.as_str() {
            "force" | "forcedirected" => return Ok(LayoutType::ForceDirected),
            _ => {}
        }
        LayoutType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| LayoutError::UnknownLayoutType {
                name: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStatus {
    Ok,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedNode {
    pub id: String,
    pub position: Vec2,
    pub size: Size,
    pub fixed: bool,
}

impl PlacedNode {
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_origin_size(self.position, self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceInfo {
    pub converged: bool,
    pub iterations: usize,
    pub final_energy: f64,
    pub energy_history: Vec<f64>,
    /// The time budget ran out before the iteration cap or threshold.
    pub stopped_by_budget: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub kind: LayoutType,
    pub status: LayoutStatus,
    pub nodes: Vec<PlacedNode>,
    pub bounds: Option<BoundingBox>,
    pub metrics: LayoutMetrics,
    pub computation_time: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convergence: Option<ConvergenceInfo>,
}

impl LayoutResult {
    /// Result for a strategy that failed: positions are left as registered.
    pub fn failure(
        kind: LayoutType,
        reason: impl Into<String>,
        nodes: Vec<PlacedNode>,
        computation_time: Duration,
    ) -> Self {
        Self {
            kind,
            status: LayoutStatus::Failed {
                reason: reason.into(),
            },
            bounds: BoundingBox::union_all(nodes.iter().map(PlacedNode::bounds)),
            nodes,
            metrics: LayoutMetrics::default(),
            computation_time,
            convergence: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == LayoutStatus::Ok
    }

    pub fn position_of(&self, id: &str) -> Option<Vec2> {
        self.nodes.iter().find(|n| n.id == id).map(|n| n.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_type_parsing() {
        assert_eq!("grid".parse::<LayoutType>(), Ok(LayoutType::Grid));
        assert_eq!("Force_Directed".parse::<LayoutType>(), Ok(LayoutType::ForceDirected));
        assert_eq!("force".parse::<LayoutType>(), Ok(LayoutType::ForceDirected));
        assert_eq!(" organic ".parse::<LayoutType>(), Ok(LayoutType::Organic));
        assert_eq!(
            "spiral".parse::<LayoutType>(),
            Err(LayoutError::UnknownLayoutType {
                name: "spiral".to_string()
            })
        );
        for kind in LayoutType::ALL {
            assert_eq!(kind.to_string().parse::<LayoutType>(), Ok(kind));
        }
    }

    #[test]
    fn test_node_spec_defaults() {
        let spec: NodeSpec = serde_json::from_str(r#"{"id": "a"}"#).unwrap();
        assert_eq!(spec.weight, 1.0);
        assert!(!spec.fixed);
        assert_eq!(spec.position, Vec2::ZERO);
    }

    #[test]
    fn test_layout_node_center() {
        let spec = NodeSpec::new("a", Vec2::new(10.0, 20.0), Size::new(40.0, 20.0));
        let mut node = LayoutNode::from_spec(0, &spec);
        assert_eq!(node.center(), Vec2::new(30.0, 30.0));
        node.set_center(Vec2::ZERO);
        assert_eq!(node.position, Vec2::new(-20.0, -10.0));
    }
}
