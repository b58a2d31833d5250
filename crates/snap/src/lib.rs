//! Snapping and arrangement of canvas items.
//!
//! [`SnapEngine`] turns registered items into snap targets (grid points,
//! item edges, centers, margins and user guides) and resolves a dragged
//! position against them. [`SpaceAnalyzer`] looks at a selection as a whole
//! and proposes alignments and distributions, which [`apply_alignment`] and
//! [`apply_distribution`] turn into position updates. The [`magnetic`]
//! module adds a continuous attraction model on top of the same targets.

pub mod analysis;
pub mod arrange;
pub mod config;
pub mod drag;
pub mod engine;
pub mod error;
pub mod guides;
pub mod item;
pub mod magnetic;
pub mod suggest;
pub mod target;

pub use analysis::{
    AlignmentKind, AlignmentSuggestion, Cluster, DistributionSuggestion, OverlapInfo,
    OverlapSeverity, ReferenceStrategy, SpaceAnalysis, SpaceAnalyzer,
};
pub use arrange::{DistributionConfig, Spacing, apply_alignment, apply_distribution, gaps_after};
pub use config::{AnalysisConfig, SnapConfig, SnapStrengths};
pub use drag::{BatchDragUpdate, DragSession};
pub use engine::{SNAP_DECIMALS, SnapEngine, SnapResult};
pub use error::{Result, SnapError};
pub use guides::AlignmentGuide;
pub use item::{Axis, PositionUpdate, SelectionItem};
pub use magnetic::{
    MagneticConfig, MagneticContribution, MagneticLayer, MagneticProbe, MagneticResult,
    MagneticTarget, PhysicsBody, PhysicsConfig, RelationKind, TargetConstraints, TargetRelation,
};
pub use suggest::{RankedAlignment, ScoreInputs, ScoringStrategy, SuggestionDecorator, WeightedScoring};
pub use target::{SnapDirection, SnapTarget, SnapTargetKind};
