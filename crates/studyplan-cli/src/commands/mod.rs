pub mod init;
pub mod recommend;
pub mod show;
pub mod unlock;
pub mod validate;

use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;

use studyplan_core::engine::RecommendationEngine;
use studyplan_stores::config::load_config_from;
use studyplan_stores::create_engine;

/// How `recommend` prints its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Markdown,
}

/// Load config, apply command-line overrides and wire the engine.
pub(crate) fn build_engine(
    config_path: Option<&Path>,
    dataset: Option<&Path>,
    limit: Option<usize>,
) -> Result<RecommendationEngine> {
    let mut config = load_config_from(config_path)?;
    if let Some(limit) = limit {
        config.max_results = limit;
    }
    create_engine(&config, dataset)
}
