//! In-memory store backing all five collaborator traits.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use studyplan_core::error::StoreError;
use studyplan_core::model::{
    AssessmentResult, KnowledgePoint, ProgressRecord, StudySession, WrongAnswerRecord,
};
use studyplan_core::parser::{Dataset, LearnerRecords};
use studyplan_core::traits::{
    AssessmentStore, KnowledgeGraphStore, ProgressStore, StudySessionLog, WrongAnswerLog,
};

/// Collection names used in errors and for failure injection.
pub mod collections {
    pub const POINTS: &str = "points";
    pub const PROGRESS: &str = "progress";
    pub const SESSIONS: &str = "sessions";
    pub const WRONG_ANSWERS: &str = "wrong_answers";
    pub const ASSESSMENTS: &str = "assessments";
}

/// An in-memory, read-only store built from a [`Dataset`].
///
/// Unknown users are treated as brand-new learners with no history.
/// Collections can be marked as failing to exercise error paths.
#[derive(Debug)]
pub struct InMemoryStore {
    points: Vec<KnowledgePoint>,
    learners: HashMap<String, LearnerRecords>,
    failing: HashSet<&'static str>,
    /// Number of fetches served, across all collections.
    fetch_count: AtomicU32,
}

impl InMemoryStore {
    pub fn new(points: Vec<KnowledgePoint>) -> Self {
        Self {
            points,
            learners: HashMap::new(),
            failing: HashSet::new(),
            fetch_count: AtomicU32::new(0),
        }
    }

    pub fn from_dataset(dataset: Dataset) -> Self {
        let mut store = Self::new(dataset.points);
        store.learners = dataset.learners.into_iter().collect();
        store
    }

    /// Add or replace a learner's history.
    pub fn with_learner(mut self, user_id: &str, records: LearnerRecords) -> Self {
        self.learners.insert(user_id.to_string(), records);
        self
    }

    /// Make every fetch from `collection` fail with [`StoreError::Unavailable`].
    pub fn with_failing(mut self, collection: &'static str) -> Self {
        self.failing.insert(collection);
        self
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    fn begin(&self, collection: &'static str) -> Result<(), StoreError> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        if self.failing.contains(collection) {
            tracing::debug!(collection, "injected store failure");
            return Err(StoreError::Unavailable {
                collection,
                message: "marked as failing".into(),
            });
        }
        Ok(())
    }

    fn learner(&self, user_id: &str) -> Option<&LearnerRecords> {
        self.learners.get(user_id)
    }
}

#[async_trait]
impl KnowledgeGraphStore for InMemoryStore {
    async fn fetch_all_points(&self) -> Result<Vec<KnowledgePoint>, StoreError> {
        self.begin(collections::POINTS)?;
        Ok(self.points.clone())
    }

    async fn fetch_point(&self, id: &str) -> Result<Option<KnowledgePoint>, StoreError> {
        self.begin(collections::POINTS)?;
        // Last definition wins, matching the snapshot index.
        Ok(self.points.iter().rev().find(|p| p.id == id).cloned())
    }
}

#[async_trait]
impl ProgressStore for InMemoryStore {
    async fn fetch_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        self.begin(collections::PROGRESS)?;
        Ok(self
            .learner(user_id)
            .map(|l| l.progress.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl StudySessionLog for InMemoryStore {
    async fn fetch_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StudySession>, StoreError> {
        self.begin(collections::SESSIONS)?;
        let mut sessions = self
            .learner(user_id)
            .map(|l| l.sessions.clone())
            .unwrap_or_default();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        sessions.truncate(limit);
        Ok(sessions)
    }
}

#[async_trait]
impl WrongAnswerLog for InMemoryStore {
    async fn fetch_wrong_answers(
        &self,
        user_id: &str,
    ) -> Result<Vec<WrongAnswerRecord>, StoreError> {
        self.begin(collections::WRONG_ANSWERS)?;
        Ok(self
            .learner(user_id)
            .map(|l| l.wrong_answers.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl AssessmentStore for InMemoryStore {
    async fn fetch_latest(&self, user_id: &str) -> Result<Option<AssessmentResult>, StoreError> {
        self.begin(collections::ASSESSMENTS)?;
        Ok(self.learner(user_id).and_then(|l| l.assessment.clone()))
    }
}
