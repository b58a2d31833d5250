//! A single context object for a canvas editing session.
//!
//! [`CanvasEngine`] owns the layout engine, the snap engine, the space
//! analyzer and the magnetic layer, and is configured from one
//! [`EngineConfig`] that can be loaded from JSON. Hosts create one engine per
//! session and pass it around explicitly.

pub mod canvas;
pub mod config;
pub mod error;

pub use canvas::{CanvasEngine, CanvasEvent, items_from_layout};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
