use anyhow::{Context, Result};
use canvas_layout::{Connection, NodeSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Input document: the nodes to lay out and the links between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Scene {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("scene is not a valid {\"nodes\": [...]} document")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene `{}`", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("in `{}`", path.display()))
    }

    /// Explicit connections followed by the ones listed on the nodes.
    pub fn links(&self) -> Vec<(&str, &str)> {
        let explicit = self
            .connections
            .iter()
            .map(|c| (c.source.as_str(), c.target.as_str()));
        let inline = self.nodes.iter().flat_map(|n| {
            n.connections
                .iter()
                .map(move |target| (n.id.as_str(), target.as_str()))
        });
        explicit.chain(inline).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIPELINE: &str = include_str!("../tests/fixtures/pipeline.json");

    #[test]
    fn test_fixture_parses() {
        let scene = Scene::from_json_str(PIPELINE).unwrap();
        assert_eq!(scene.nodes.len(), 5);
        assert!(scene.nodes[4].fixed);
        assert_eq!(scene.links().len(), 4);
        assert!(scene.links().contains(&("parse", "validate")));
    }

    #[test]
    fn test_missing_nodes_is_an_error() {
        let err = Scene::from_json_str(r#"{"connections": []}"#).unwrap_err();
        assert!(err.to_string().contains("nodes"));
    }
}
