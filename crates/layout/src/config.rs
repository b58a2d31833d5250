//! Layout tunables.
//!
//! Every struct deserialises from a partial JSON document; missing fields
//! take their defaults.

use canvas_geometry::{DEFAULT_CACHE_CAPACITY, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::time::Duration;

use crate::error::{LayoutError, Result};

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LayoutError::invalid_config(format!(
            "{name} must be a finite, non-negative number (got {value})"
        )))
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LayoutError::invalid_config(format!(
            "{name} must be a finite, positive number (got {value})"
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellAlignment {
    #[default]
    Start,
    Center,
    End,
}

/// Flow direction of hierarchical and tree layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    TopBottom,
    BottomTop,
    LeftRight,
    RightLeft,
}

impl Direction {
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Direction::LeftRight | Direction::RightLeft)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Defaults to `ceil(sqrt(n))`.
    pub columns: Option<usize>,
    pub spacing: f64,
    pub alignment: CellAlignment,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: None,
            spacing: 20.0,
            alignment: CellAlignment::Start,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        if self.columns == Some(0) {
            return Err(LayoutError::invalid_config("grid columns must be at least 1"));
        }
        check_non_negative("grid spacing", self.spacing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchicalConfig {
    pub level_separation: f64,
    pub node_separation: f64,
    pub direction: Direction,
    pub minimize_crossings: bool,
    /// Barycenter sweeps (down + up) when minimising crossings.
    pub crossing_sweeps: usize,
}

impl Default for HierarchicalConfig {
    fn default() -> Self {
        Self {
            level_separation: 100.0,
            node_separation: 50.0,
            direction: Direction::TopBottom,
            minimize_crossings: true,
            crossing_sweeps: 4,
        }
    }
}

impl HierarchicalConfig {
    pub fn validate(&self) -> Result<()> {
        check_non_negative("level_separation", self.level_separation)?;
        check_non_negative("node_separation", self.node_separation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    pub iterations: usize,
    pub repulsion: f64,
    pub attraction: f64,
    pub spring_length: f64,
    pub gravity: f64,
    /// Fraction of velocity lost per iteration, in `[0, 1)`.
    pub friction: f64,
    /// Average kinetic energy below which the simulation has converged.
    pub threshold: f64,
    /// Initial per-iteration displacement cap.
    pub max_displacement: f64,
    /// Factor applied to the displacement cap after every iteration.
    pub cooling: f64,
    pub time_budget_ms: Option<u64>,
    pub seed: u64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            repulsion: 5000.0,
            attraction: 0.05,
            spring_length: 150.0,
            gravity: 0.02,
            friction: 0.15,
            threshold: 0.01,
            max_displacement: 50.0,
            cooling: 0.98,
            time_budget_ms: None,
            seed: 42,
        }
    }
}

impl ForceConfig {
    pub fn validate(&self) -> Result<()> {
        check_non_negative("repulsion", self.repulsion)?;
        check_non_negative("attraction", self.attraction)?;
        check_non_negative("spring_length", self.spring_length)?;
        check_non_negative("gravity", self.gravity)?;
        check_non_negative("threshold", self.threshold)?;
        check_positive("max_displacement", self.max_displacement)?;
        if !(0.0..1.0).contains(&self.friction) {
            return Err(LayoutError::invalid_config(format!(
                "friction must be in [0, 1) (got {})",
                self.friction
            )));
        }
        if !(self.cooling > 0.0 && self.cooling <= 1.0) {
            return Err(LayoutError::invalid_config(format!(
                "cooling must be in (0, 1] (got {})",
                self.cooling
            )));
        }
        Ok(())
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }
}

/// Scales applied to [`ForceConfig`] for the organic layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganicConfig {
    pub attraction_scale: f64,
    pub gravity_scale: f64,
    pub spring_length_scale: f64,
}

impl Default for OrganicConfig {
    fn default() -> Self {
        Self {
            attraction_scale: 0.5,
            gravity_scale: 0.5,
            spring_length_scale: 1.5,
        }
    }
}

impl OrganicConfig {
    pub fn apply(&self, force: &ForceConfig) -> ForceConfig {
        ForceConfig {
            attraction: force.attraction * self.attraction_scale,
            gravity: force.gravity * self.gravity_scale,
            spring_length: force.spring_length * self.spring_length_scale,
            ..force.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircularConfig {
    /// Computed from node sizes when unset.
    pub radius: Option<f64>,
    pub start_angle: f64,
    pub sweep_angle: f64,
    pub center: Option<Vec2>,
    /// Gap kept between neighbours when the radius is computed.
    pub spacing: f64,
}

impl Default for CircularConfig {
    fn default() -> Self {
        Self {
            radius: None,
            start_angle: 0.0,
            sweep_angle: TAU,
            center: None,
            spacing: 20.0,
        }
    }
}

impl CircularConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(radius) = self.radius {
            check_non_negative("radius", radius)?;
        }
        if !self.start_angle.is_finite() || !self.sweep_angle.is_finite() {
            return Err(LayoutError::invalid_config("circle angles must be finite"));
        }
        if self.center.is_some_and(|c| !c.is_finite()) {
            return Err(LayoutError::invalid_config("circle center must be finite"));
        }
        check_non_negative("circular spacing", self.spacing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialConfig {
    pub start_radius: f64,
    pub radius_increment: f64,
    pub center: Option<Vec2>,
}

impl Default for RadialConfig {
    fn default() -> Self {
        Self {
            start_radius: 0.0,
            radius_increment: 150.0,
            center: None,
        }
    }
}

impl RadialConfig {
    pub fn validate(&self) -> Result<()> {
        check_non_negative("start_radius", self.start_radius)?;
        check_positive("radius_increment", self.radius_increment)?;
        if self.center.is_some_and(|c| !c.is_finite()) {
            return Err(LayoutError::invalid_config("radial center must be finite"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub level_separation: f64,
    pub sibling_separation: f64,
    pub direction: Direction,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            level_separation: 80.0,
            sibling_separation: 40.0,
            direction: Direction::TopBottom,
        }
    }
}

impl TreeConfig {
    pub fn validate(&self) -> Result<()> {
        check_non_negative("level_separation", self.level_separation)?;
        check_non_negative("sibling_separation", self.sibling_separation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub max_width: f64,
    pub horizontal_spacing: f64,
    pub vertical_spacing: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            max_width: 1200.0,
            horizontal_spacing: 20.0,
            vertical_spacing: 20.0,
        }
    }
}

impl FlowConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive("max_width", self.max_width)?;
        check_non_negative("horizontal_spacing", self.horizontal_spacing)?;
        check_non_negative("vertical_spacing", self.vertical_spacing)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub grid: GridConfig,
    pub hierarchical: HierarchicalConfig,
    pub force: ForceConfig,
    pub organic: OrganicConfig,
    pub circular: CircularConfig,
    pub radial: RadialConfig,
    pub tree: TreeConfig,
    pub flow: FlowConfig,
    pub cache: CacheConfig,
}

impl LayoutConfig {
    /// Check every strategy section up front. Strategies check their own
    /// section again when they run.
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.hierarchical.validate()?;
        self.force.validate()?;
        self.organic.apply(&self.force).validate()?;
        self.circular.validate()?;
        self.radial.validate()?;
        self.tree.validate()?;
        self.flow.validate()?;
        if self.cache.capacity == 0 {
            return Err(LayoutError::invalid_config("cache.capacity must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}
