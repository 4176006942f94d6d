//! Forest-disturbance monitoring algorithms
//!
//! Per-scene decision-tree classification of Landsat surface
//! reflectance, per-tile probability aggregation, yearly composite
//! resolution, forestry-class remapping, temporal signal cleaning and
//! multi-decade change detection, plus the batch drivers that run the
//! whole chain over a scene archive.

pub mod aggregate;
pub mod change;
pub mod classify;
pub mod composite;
pub mod config;
mod maybe_rayon;
pub mod pipeline;
pub mod signal;

pub mod prelude {
    pub use crate::aggregate::{TileAccumulator, TileAggregate};
    pub use crate::change::{detect_change, ChangeRecord, ChangeStatus};
    pub use crate::classify::{classify_scene, Classifier, SceneBands};
    pub use crate::composite::{forestry_class, resolve_composite, CompositeInputs};
    pub use crate::config::{RunConfig, Variant};
    pub use crate::pipeline::{Pipeline, RunSummary, SceneOutcome, SceneSource};
    pub use crate::signal::clean_signal;
    pub use eoforest_core::prelude::*;
}
