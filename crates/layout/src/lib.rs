//! Automatic layout of canvas nodes.
//!
//! Register nodes and connections with [`LayoutEngine::set_layout_nodes`],
//! then run any [`LayoutType`] with [`LayoutEngine::execute_layout`]. The
//! engine never touches the caller's data; it returns new positions in a
//! [`LayoutResult`]. [`layout_in_place`] is the shortcut for callers that
//! want positions written back into their own node type.

pub mod circular;
pub mod config;
pub mod engine;
pub mod error;
pub mod flow;
pub mod force;
pub mod graph;
pub mod grid;
pub mod hierarchical;
pub mod layout;
pub mod metrics;
pub mod orient;
pub mod suggestions;
pub mod tree;
pub mod types;

pub use config::{
    CacheConfig, CellAlignment, CircularConfig, Direction, FlowConfig, ForceConfig, GridConfig,
    HierarchicalConfig, LayoutConfig, OrganicConfig, RadialConfig, TreeConfig,
};
pub use engine::{LayoutEngine, LayoutEvent};
pub use error::{LayoutError, Result};
pub use force::ForceSimulation;
pub use graph::{Edge, LayoutGraph};
pub use layout::{Layoutable, layout_in_place};
pub use metrics::LayoutMetrics;
pub use suggestions::{
    Candidate, GraphProfile, LayoutSuggestion, SuggestionScorer, UserPreferences, WeightedBlend,
    generate_layout_suggestions,
};
pub use types::{
    Connection, ConvergenceInfo, LayoutNode, LayoutResult, LayoutStatus, LayoutType, NodeSpec,
    PlacedNode,
};
