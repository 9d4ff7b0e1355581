//! TOML dataset parser.
//!
//! Loads a knowledge graph together with per-learner history from a TOML
//! file, and validates it. Timestamps are RFC 3339 strings.
//!
//! ```toml
//! [[points]]
//! id = "fractions"
//! title = "Fractions"
//! subject = "arithmetic"
//! difficulty = 2
//! estimated_time = 25
//! prerequisites = ["division"]
//!
//! [[learners.alice.progress]]
//! point_id = "division"
//! status = "completed"
//! best_score = 85.0
//! completed_at = "2024-05-01T10:00:00Z"
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{
    AssessmentResult, KnowledgePoint, ProgressRecord, StudySession, WrongAnswerRecord,
};

/// A knowledge graph plus learner histories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub points: Vec<KnowledgePoint>,
    /// Learner id -> history.
    #[serde(default)]
    pub learners: BTreeMap<String, LearnerRecords>,
}

/// Everything recorded about one learner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearnerRecords {
    #[serde(default)]
    pub progress: Vec<ProgressRecord>,
    #[serde(default)]
    pub sessions: Vec<StudySession>,
    #[serde(default)]
    pub wrong_answers: Vec<WrongAnswerRecord>,
    #[serde(default)]
    pub assessment: Option<AssessmentResult>,
}

/// Parse a dataset file.
pub fn parse_dataset(path: &Path) -> Result<Dataset> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset file: {}", path.display()))?;

    parse_dataset_str(&content, path)
}

/// Parse a TOML string into a `Dataset` (useful for testing).
pub fn parse_dataset_str(content: &str, source_path: &Path) -> Result<Dataset> {
    toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))
}

/// A dataset validation warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Point the warning is about, if any.
    pub point_id: Option<String>,
    /// Learner the warning is about, if any.
    pub learner: Option<String>,
    pub message: String,
}

impl ValidationWarning {
    fn point(id: &str, message: String) -> Self {
        Self {
            point_id: Some(id.to_string()),
            learner: None,
            message,
        }
    }

    fn learner(learner: &str, point_id: &str, message: String) -> Self {
        Self {
            point_id: Some(point_id.to_string()),
            learner: Some(learner.to_string()),
            message,
        }
    }
}

/// Validate a dataset and return warnings.
///
/// Cycles in the prerequisite graph are not looked for.
pub fn validate_dataset(dataset: &Dataset) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if dataset.points.is_empty() {
        warnings.push(ValidationWarning {
            point_id: None,
            learner: None,
            message: "dataset has no knowledge points".into(),
        });
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for point in &dataset.points {
        *seen.entry(point.id.as_str()).or_default() += 1;
    }
    let known: HashSet<&str> = seen.keys().copied().collect();

    let mut reported_duplicates = HashSet::new();
    for point in &dataset.points {
        if seen[point.id.as_str()] > 1 && reported_duplicates.insert(point.id.as_str()) {
            warnings.push(ValidationWarning::point(
                &point.id,
                format!("duplicate point id (appears {} times)", seen[point.id.as_str()]),
            ));
        }

        if !(1..=5).contains(&point.difficulty) {
            warnings.push(ValidationWarning::point(
                &point.id,
                format!("difficulty {} is outside 1-5", point.difficulty),
            ));
        }

        if point.subject.trim().is_empty() {
            warnings.push(ValidationWarning::point(
                &point.id,
                "subject is empty".to_string(),
            ));
        }

        for prereq in &point.prerequisites {
            if prereq == &point.id {
                warnings.push(ValidationWarning::point(
                    &point.id,
                    "point lists itself as a prerequisite".to_string(),
                ));
            } else if !known.contains(prereq.as_str()) {
                tracing::warn!(point = %point.id, prereq = %prereq, "unknown prerequisite");
                warnings.push(ValidationWarning::point(
                    &point.id,
                    format!("unknown prerequisite '{prereq}'"),
                ));
            }
        }
    }

    for (learner, records) in &dataset.learners {
        for progress in &records.progress {
            if !known.contains(progress.point_id.as_str()) {
                warnings.push(ValidationWarning::learner(
                    learner,
                    &progress.point_id,
                    "progress references unknown point".to_string(),
                ));
            }
            if let Some(score) = progress.best_score {
                if !(0.0..=100.0).contains(&score) {
                    warnings.push(ValidationWarning::learner(
                        learner,
                        &progress.point_id,
                        format!("best score {score} is outside 0-100"),
                    ));
                }
            }
        }

        for answer in &records.wrong_answers {
            if !known.contains(answer.point_id.as_str()) {
                warnings.push(ValidationWarning::learner(
                    learner,
                    &answer.point_id,
                    "wrong answer references unknown point".to_string(),
                ));
            }
        }
    }

    warnings
}
