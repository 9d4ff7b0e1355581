//! Core data model types for studyplan.
//!
//! Reference data (knowledge points), per-learner history (progress,
//! sessions, wrong answers, assessments) and the derived recommendation
//! types the engine produces.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a knowledge point.
pub type PointId = String;

/// An atomic learnable unit in the prerequisite graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgePoint {
    /// Unique identifier.
    pub id: PointId,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Subject this point belongs to (e.g. "algebra").
    pub subject: String,
    /// Difficulty from 1 (easiest) to 5.
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    /// Estimated study time in minutes.
    #[serde(default = "default_estimated_time")]
    pub estimated_time: u32,
    /// Points that must be completed before this one.
    #[serde(default)]
    pub prerequisites: Vec<PointId>,
}

fn default_difficulty() -> u8 {
    1
}

fn default_estimated_time() -> u32 {
    30
}

/// Where a learner stands on a single knowledge point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressStatus::NotStarted => write!(f, "not_started"),
            ProgressStatus::InProgress => write!(f, "in_progress"),
            ProgressStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A learner's progress on one knowledge point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub point_id: PointId,
    #[serde(default)]
    pub status: ProgressStatus,
    /// Best quiz score (0-100). `None` when the point was never scored.
    #[serde(default)]
    pub best_score: Option<f64>,
    #[serde(default)]
    pub quiz_attempts: u32,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    pub fn is_completed(&self) -> bool {
        self.status == ProgressStatus::Completed
    }
}

/// Latest assessment of a learner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Subject -> skill level (0-100).
    #[serde(default)]
    pub skill_profile: HashMap<String, f64>,
    /// Subject -> why it was flagged as weak.
    #[serde(default)]
    pub weaknesses: HashMap<String, String>,
    #[serde(default)]
    pub assessed_at: Option<DateTime<Utc>>,
}

/// A time-bounded study session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    pub start_time: DateTime<Utc>,
    /// Session length in seconds.
    pub duration_secs: u64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub point_id: Option<PointId>,
}

/// A question the learner answered wrongly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrongAnswerRecord {
    pub point_id: PointId,
    #[serde(default)]
    pub question_id: String,
    pub subject: String,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub mastered: bool,
}

/// Why a point was recommended. The last scoring rule that sets a reason wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    General,
    BlockedOnPrerequisite,
    ReinforceWeakSubject,
    HighErrorRate,
    GoodRestartPoint,
    ResumeInProgress,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reason::General => "general recommendation",
            Reason::BlockedOnPrerequisite => "blocked on prerequisite",
            Reason::ReinforceWeakSubject => "reinforce weak subject",
            Reason::HighErrorRate => "high error rate in subject",
            Reason::GoodRestartPoint => "good restart point",
            Reason::ResumeInProgress => "resume in-progress",
        };
        f.write_str(text)
    }
}

/// A scored knowledge point ready for sequencing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub point_id: PointId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subject: String,
    /// Per-call ordering key. Unbounded and meaningless across calls, so it
    /// never leaves the process.
    #[serde(skip)]
    pub priority: f64,
    /// 0-100.
    pub urgency: f64,
    /// 10-95.
    pub predicted_success_rate: f64,
    pub reason: Reason,
    pub estimated_time: u32,
    pub difficulty: u8,
    /// At least one prerequisite is not completed yet.
    #[serde(default)]
    pub blocked: bool,
}

impl Recommendation {
    /// Weighted blend used to order mutually unconstrained candidates.
    pub fn composite_score(&self) -> f64 {
        self.priority * 0.5 + self.urgency * 0.3 + self.predicted_success_rate * 0.2
    }
}

/// A lightweight reference to a knowledge point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRef {
    pub id: PointId,
    pub title: String,
}

/// Result of an unlock check for a single point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockCheck {
    pub can_unlock: bool,
    pub missing_prerequisites: Vec<PointRef>,
}
