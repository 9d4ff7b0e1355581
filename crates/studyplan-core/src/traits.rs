//! Collaborator store traits.
//!
//! The engine owns no storage. Everything it knows about the graph and the
//! learner is read through these narrow async interfaces, implemented by
//! `studyplan-stores` (or by in-memory fakes in tests).

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{
    AssessmentResult, KnowledgePoint, ProgressRecord, StudySession, WrongAnswerRecord,
};

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// Read access to the knowledge point catalogue.
#[async_trait]
pub trait KnowledgeGraphStore: Send + Sync {
    /// Every knowledge point with its prerequisites.
    async fn fetch_all_points(&self) -> Result<Vec<KnowledgePoint>, StoreError>;

    /// A single point, or `None` if the id is unknown.
    async fn fetch_point(&self, id: &str) -> Result<Option<KnowledgePoint>, StoreError>;
}

// ---------------------------------------------------------------------------
// Learner history
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// All progress records of a user. Unknown users have none.
    async fn fetch_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError>;
}

#[async_trait]
pub trait StudySessionLog: Send + Sync {
    /// At most `limit` sessions of a user, most recent first.
    async fn fetch_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StudySession>, StoreError>;
}

#[async_trait]
pub trait WrongAnswerLog: Send + Sync {
    async fn fetch_wrong_answers(
        &self,
        user_id: &str,
    ) -> Result<Vec<WrongAnswerRecord>, StoreError>;
}

#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// The most recent assessment, if the user ever took one.
    async fn fetch_latest(&self, user_id: &str) -> Result<Option<AssessmentResult>, StoreError>;
}
