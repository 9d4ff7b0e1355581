//! Prerequisite gate.

use std::collections::HashSet;

use crate::model::{KnowledgePoint, ProgressRecord};

/// Outcome of checking a point against a completed-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision<'a> {
    pub can_unlock: bool,
    /// Prerequisites not yet completed, in declaration order.
    pub missing: Vec<&'a str>,
}

/// Ids of the points a learner has completed.
pub fn completed_set(progress: &[ProgressRecord]) -> HashSet<&str> {
    progress
        .iter()
        .filter(|p| p.is_completed())
        .map(|p| p.point_id.as_str())
        .collect()
}

/// Whether every prerequisite of `point` is in `completed`.
pub fn can_unlock<'a>(completed: &HashSet<&str>, point: &'a KnowledgePoint) -> GateDecision<'a> {
    let missing: Vec<&str> = point
        .prerequisites
        .iter()
        .map(String::as_str)
        .filter(|id| !completed.contains(id))
        .collect();
    GateDecision {
        can_unlock: missing.is_empty(),
        missing,
    }
}
