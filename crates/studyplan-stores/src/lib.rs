//! Store adapters and configuration for studyplan.
//!
//! Implements the collaborator traits from `studyplan-core` over an
//! in-memory dataset, and loads the settings used to wire an engine.

pub mod config;
pub mod memory;

pub use config::{create_engine, load_config, open_store, StudyplanConfig};
pub use memory::InMemoryStore;
