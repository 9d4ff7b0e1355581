//! Prerequisite-aware knowledge point recommendations.
//!
//! This crate defines the data model, the collaborator store traits, and the
//! recommendation pipeline: signal aggregation, prerequisite gating, priority
//! scoring, and topological sequencing.

pub mod engine;
pub mod error;
pub mod gate;
pub mod graph;
pub mod metrics;
pub mod model;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod sequencer;
pub mod traits;

pub use engine::{EngineConfig, RecommendationEngine, Stores};
pub use error::StoreError;
