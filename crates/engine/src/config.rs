use canvas_layout::LayoutConfig;
use canvas_snap::{AnalysisConfig, MagneticConfig, SnapConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EngineError, Result};

/// Everything a [`CanvasEngine`](crate::CanvasEngine) can be tuned with.
///
/// Any subset of the sections may appear in a JSON document; the rest take
/// their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    pub snap: SnapConfig,
    pub analysis: AnalysisConfig,
    pub magnetic: MagneticConfig,
    /// Overrides the layout and analysis cache capacities when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_capacity: Option<usize>,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.resolved_layout().validate()?;
        self.snap.validate()?;
        self.resolved_analysis().validate()?;
        self.magnetic.validate()?;
        Ok(())
    }

    pub(crate) fn resolved_layout(&self) -> LayoutConfig {
        let mut layout = self.layout.clone();
        if let Some(capacity) = self.cache_capacity {
            layout.cache.capacity = capacity;
        }
        layout
    }

    pub(crate) fn resolved_analysis(&self) -> AnalysisConfig {
        let mut analysis = self.analysis.clone();
        if let Some(capacity) = self.cache_capacity {
            analysis.cache_capacity = capacity;
        }
        analysis
    }
}
