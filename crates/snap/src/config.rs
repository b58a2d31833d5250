use canvas_geometry::DEFAULT_CACHE_CAPACITY;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SnapError};

/// Default strength given to generated targets of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapStrengths {
    pub grid: f64,
    pub object: f64,
    pub edge: f64,
    pub center: f64,
    pub margin: f64,
    pub guide: f64,
}

impl Default for SnapStrengths {
    fn default() -> Self {
        Self {
            grid: 0.5,
            object: 0.9,
            edge: 0.8,
            center: 0.85,
            margin: 0.6,
            guide: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Capture distance in canvas units.
    pub snap_threshold: f64,
    pub grid_size: f64,
    pub grid_enabled: bool,
    pub object_snapping: bool,
    pub margin_snapping: bool,
    /// Offsets at which margin lines are generated around every item.
    pub margins: Vec<f64>,
    /// Fraction of the snap displacement actually applied; 1 is a hard snap.
    pub magnetic_strength: f64,
    /// Targets applied per snap: the best one plus compatible extras.
    pub max_simultaneous: usize,
    pub strengths: SnapStrengths,
    pub max_grid_targets: usize,
    /// How far guides extend past the boxes they connect.
    pub guide_extension: f64,
    /// Object targets further than this from the moving box are ignored.
    pub object_search_radius: Option<f64>,
    pub spatial_cell_size: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            snap_threshold: 10.0,
            grid_size: 20.0,
            grid_enabled: true,
            object_snapping: true,
            margin_snapping: true,
            margins: vec![8.0, 16.0, 24.0],
            magnetic_strength: 1.0,
            max_simultaneous: 3,
            strengths: SnapStrengths::default(),
            max_grid_targets: 10_000,
            guide_extension: 20.0,
            object_search_radius: Some(800.0),
            spatial_cell_size: 100.0,
        }
    }
}

impl SnapConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.snap_threshold.is_finite() && self.snap_threshold > 0.0) {
            return Err(SnapError::invalid_config("snap_threshold must be positive"));
        }
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(SnapError::invalid_config("grid_size must be positive"));
        }
        if !(0.0..=1.0).contains(&self.magnetic_strength) {
            return Err(SnapError::invalid_config(
                "magnetic_strength must lie in [0, 1]",
            ));
        }
        if self.max_simultaneous == 0 {
            return Err(SnapError::invalid_config("max_simultaneous must be at least 1"));
        }
        if self.margins.iter().any(|m| !m.is_finite()) {
            return Err(SnapError::invalid_config("margins must be finite"));
        }
        if !(self.spatial_cell_size.is_finite() && self.spatial_cell_size > 0.0) {
            return Err(SnapError::invalid_config("spatial_cell_size must be positive"));
        }
        if self
            .object_search_radius
            .is_some_and(|r| !(r.is_finite() && r >= 0.0))
        {
            return Err(SnapError::invalid_config(
                "object_search_radius must be non-negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Items beyond this count are ignored (and the result is flagged).
    pub max_analysis_items: usize,
    /// Items whose gap is at most this far apart share a cluster.
    pub cluster_distance: f64,
    /// Spread at which an alignment suggestion reaches full confidence.
    pub alignment_spread_scale: f64,
    /// Gap variation below which a row already counts as distributed.
    pub distribution_tolerance: f64,
    pub cache_capacity: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_analysis_items: 500,
            cluster_distance: 50.0,
            alignment_spread_scale: 200.0,
            distribution_tolerance: 2.0,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.cluster_distance.is_finite() && self.cluster_distance >= 0.0) {
            return Err(SnapError::invalid_config(
                "cluster_distance must be non-negative",
            ));
        }
        if !(self.alignment_spread_scale.is_finite() && self.alignment_spread_scale > 0.0) {
            return Err(SnapError::invalid_config(
                "alignment_spread_scale must be positive",
            ));
        }
        if !(self.distribution_tolerance.is_finite() && self.distribution_tolerance >= 0.0) {
            return Err(SnapError::invalid_config(
                "distribution_tolerance must be non-negative",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(SnapConfig::default().validate().is_ok());
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: SnapConfig =
            serde_json::from_str(r#"{"snap_threshold": 4, "margins": []}"#).unwrap();
        assert_eq!(config.snap_threshold, 4.0);
        assert!(config.margins.is_empty());
        assert_eq!(config.grid_size, 20.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = SnapConfig {
            magnetic_strength: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = SnapConfig {
            object_search_radius: Some(f64::NAN),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = AnalysisConfig {
            alignment_spread_scale: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
