//! Configuration loading and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use studyplan_core::engine::{EngineConfig, RecommendationEngine, Stores};
use studyplan_core::parser::parse_dataset;
use studyplan_core::sequencer::MAX_RECOMMENDATIONS;

use crate::memory::InMemoryStore;

/// Top-level studyplan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyplanConfig {
    /// Dataset file to serve from. May contain `${VAR}` references.
    #[serde(default)]
    pub dataset: Option<PathBuf>,
    /// Maximum recommendations per call (capped at 50).
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Recent sessions fetched per call.
    #[serde(default = "default_session_limit")]
    pub session_limit: usize,
    /// Completed points that feed the momentum rule.
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    /// Max concurrent users when recommending for a cohort.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

fn default_max_results() -> usize {
    MAX_RECOMMENDATIONS
}
fn default_session_limit() -> usize {
    100
}
fn default_recent_window() -> usize {
    3
}
fn default_parallelism() -> usize {
    4
}

impl Default for StudyplanConfig {
    fn default() -> Self {
        Self {
            dataset: None,
            max_results: default_max_results(),
            session_limit: default_session_limit(),
            recent_window: default_recent_window(),
            parallelism: default_parallelism(),
        }
    }
}

impl StudyplanConfig {
    /// Engine settings derived from this config.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_results: self.max_results.min(MAX_RECOMMENDATIONS),
            session_limit: self.session_limit,
            recent_window: self.recent_window,
            parallelism: self.parallelism.max(1),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not rescanned, so a value that itself contains
/// `${...}` is kept literally.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut cursor = 0;
    while let Some(offset) = result[cursor..].find("${") {
        let start = cursor + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!(
            "{}{}{}",
            &result[..start],
            value,
            &result[start + end + 1..]
        );
        cursor = start + value.len();
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `studyplan.toml` in the current directory
/// 2. `~/.config/studyplan/config.toml`
///
/// Environment variable override: `STUDYPLAN_DATASET`.
pub fn load_config() -> Result<StudyplanConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<StudyplanConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("studyplan.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<StudyplanConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => StudyplanConfig::default(),
    };

    if let Ok(dataset) = std::env::var("STUDYPLAN_DATASET") {
        config.dataset = Some(PathBuf::from(dataset));
    }

    config.dataset = config
        .dataset
        .map(|p| PathBuf::from(resolve_env_vars(&p.to_string_lossy())));

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("studyplan"))
}

/// Build an in-memory store from the configured dataset, or from `dataset`
/// when given explicitly.
pub fn open_store(config: &StudyplanConfig, dataset: Option<&Path>) -> Result<InMemoryStore> {
    let path = dataset
        .map(Path::to_path_buf)
        .or_else(|| config.dataset.clone())
        .context("no dataset configured; pass --dataset or set `dataset` in studyplan.toml")?;
    let data = parse_dataset(&path)?;
    tracing::info!(
        path = %path.display(),
        points = data.points.len(),
        learners = data.learners.len(),
        "dataset loaded"
    );
    Ok(InMemoryStore::from_dataset(data))
}

/// Wire a recommendation engine over the configured dataset.
pub fn create_engine(
    config: &StudyplanConfig,
    dataset: Option<&Path>,
) -> Result<RecommendationEngine> {
    let store = Arc::new(open_store(config, dataset)?);
    Ok(RecommendationEngine::new(
        Stores::shared(store),
        config.engine_config(),
    ))
}
