//! Geometry core shared by the canvas layout and snapping engines.
//!
//! Everything here is value-typed and side-effect free, except the indexes
//! and the result cache which own their contents:
//! - [`Vec2`], [`Size`], [`Matrix2D`] and [`BoundingBox`] primitives
//! - [`SpatialHashGrid`] for constant-time region queries
//! - [`QuadTree`] for the magnetic target partition
//! - [`ResultCache`] keyed by canonical [`SnapshotKey`]s
//! - [`EventBus`] for publishing engine events to the host

pub mod bounds;
pub mod cache;
pub mod events;
pub mod matrix;
pub mod precision;
pub mod quadtree;
pub mod spatial;
pub mod vector;

pub use bounds::BoundingBox;
pub use cache::{CacheStats, DEFAULT_CACHE_CAPACITY, ResultCache, SnapshotKey};
pub use events::{EventBus, Observer, SubscriptionId};
pub use matrix::Matrix2D;
pub use precision::{EPSILON, approx_eq, clamp_unit, precise_round, smoothstep};
pub use quadtree::QuadTree;
pub use spatial::SpatialHashGrid;
pub use vector::{Point, Size, Vec2};
