//! Learner signal aggregation.
//!
//! Reduces raw progress, session and wrong-answer history into a
//! [`LearningMetrics`] summary consumed by the priority scorer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ProgressRecord, StudySession, WrongAnswerRecord};

/// Error rate assumed when the learner has no scored points yet.
pub const NEUTRAL_ERROR_RATE: f64 = 50.0;
/// Learning speed assumed when no study time was recorded.
pub const DEFAULT_LEARNING_SPEED: f64 = 1.0;
/// Days-since-last-study reported when there are no sessions at all.
pub const IDLE_SENTINEL_DAYS: i64 = 999;

/// Questions assumed per scored point when estimating the error rate.
const QUESTIONS_PER_POINT: f64 = 10.0;

/// Summary of a learner's history. Derived per call, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningMetrics {
    /// Number of completed points.
    pub total_completed: usize,
    /// Sum of session durations in seconds.
    pub total_time_secs: u64,
    /// Seconds of study per completed point.
    pub avg_time_per_point: f64,
    /// Mean best score over scored points.
    pub scores_avg: f64,
    /// Wrong answers per hundred assumed questions.
    pub error_rate: f64,
    /// Completed points per hour of study.
    pub learning_speed: f64,
    /// Whole days since the most recent session started.
    pub days_since_last_study: i64,
}

impl Default for LearningMetrics {
    fn default() -> Self {
        Self {
            total_completed: 0,
            total_time_secs: 0,
            avg_time_per_point: 0.0,
            scores_avg: 0.0,
            error_rate: NEUTRAL_ERROR_RATE,
            learning_speed: DEFAULT_LEARNING_SPEED,
            days_since_last_study: IDLE_SENTINEL_DAYS,
        }
    }
}

/// Compute learning metrics from raw history.
///
/// `now` is the reference instant for `days_since_last_study`; sessions that
/// start after it count as zero days ago.
pub fn compute_metrics(
    progress: &[ProgressRecord],
    sessions: &[StudySession],
    wrong_answers: &[WrongAnswerRecord],
    now: DateTime<Utc>,
) -> LearningMetrics {
    let total_completed = progress.iter().filter(|p| p.is_completed()).count();
    let total_time_secs: u64 = sessions.iter().map(|s| s.duration_secs).sum();

    let avg_time_per_point = if total_completed == 0 {
        0.0
    } else {
        total_time_secs as f64 / total_completed as f64
    };

    let scores: Vec<f64> = progress.iter().filter_map(|p| p.best_score).collect();
    let scores_avg = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    let error_rate = if scores.is_empty() {
        NEUTRAL_ERROR_RATE
    } else {
        wrong_answers.len() as f64 / (scores.len() as f64 * QUESTIONS_PER_POINT) * 100.0
    };

    let learning_speed = if total_time_secs == 0 {
        DEFAULT_LEARNING_SPEED
    } else {
        total_completed as f64 / (total_time_secs as f64 / 3600.0)
    };

    let days_since_last_study = sessions
        .iter()
        .map(|s| s.start_time)
        .max()
        .map(|latest| (now - latest).num_days().max(0))
        .unwrap_or(IDLE_SENTINEL_DAYS);

    LearningMetrics {
        total_completed,
        total_time_secs,
        avg_time_per_point,
        scores_avg,
        error_rate,
        learning_speed,
        days_since_last_study,
    }
}
