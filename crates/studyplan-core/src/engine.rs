//! Recommendation facade.
//!
//! Fans out the five collaborator fetches, joins them, and runs the
//! aggregation, scoring and sequencing pipeline on the resulting snapshot.
//! Every call is request-scoped: nothing is cached between calls and the
//! engine holds no mutable state, so concurrent calls never interfere.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::error::StoreError;
use crate::gate::{can_unlock, completed_set};
use crate::graph::GraphSnapshot;
use crate::metrics::{compute_metrics, LearningMetrics};
use crate::model::{
    AssessmentResult, PointRef, ProgressRecord, Recommendation, StudySession, UnlockCheck,
    WrongAnswerRecord,
};
use crate::report::StudyPlan;
use crate::scoring::{score, ScoringContext};
use crate::sequencer::{sequence, MAX_RECOMMENDATIONS};
use crate::traits::{
    AssessmentStore, KnowledgeGraphStore, ProgressStore, StudySessionLog, WrongAnswerLog,
};

/// Configuration for the recommendation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum recommendations per call. Values above 50 are capped.
    pub max_results: usize,
    /// How many recent sessions to fetch per call.
    pub session_limit: usize,
    /// Completed points feeding the momentum rule.
    pub recent_window: usize,
    /// Maximum concurrent users in [`RecommendationEngine::recommend_many`].
    pub parallelism: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_results: MAX_RECOMMENDATIONS,
            session_limit: 100,
            recent_window: 3,
            parallelism: 4,
        }
    }
}

/// The collaborators the engine reads from.
#[derive(Clone)]
pub struct Stores {
    pub graph: Arc<dyn KnowledgeGraphStore>,
    pub progress: Arc<dyn ProgressStore>,
    pub sessions: Arc<dyn StudySessionLog>,
    pub wrong_answers: Arc<dyn WrongAnswerLog>,
    pub assessments: Arc<dyn AssessmentStore>,
}

impl Stores {
    /// Use one backend for all five collaborators.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: KnowledgeGraphStore
            + ProgressStore
            + StudySessionLog
            + WrongAnswerLog
            + AssessmentStore
            + 'static,
    {
        Self {
            graph: store.clone(),
            progress: store.clone(),
            sessions: store.clone(),
            wrong_answers: store.clone(),
            assessments: store,
        }
    }
}

/// Everything fetched for one user in one call.
struct LearnerSnapshot {
    graph: GraphSnapshot,
    progress: Vec<ProgressRecord>,
    sessions: Vec<StudySession>,
    wrong_answers: Vec<WrongAnswerRecord>,
    assessment: Option<AssessmentResult>,
}

/// The recommendation engine.
pub struct RecommendationEngine {
    stores: Stores,
    config: EngineConfig,
}

impl RecommendationEngine {
    pub fn new(stores: Stores, config: EngineConfig) -> Self {
        Self { stores, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ranked, prerequisite-ordered recommendations for a user.
    pub async fn recommend(&self, user_id: &str) -> Result<Vec<Recommendation>, StoreError> {
        self.recommend_at(user_id, Utc::now()).await
    }

    /// [`recommend`](Self::recommend) against an explicit clock.
    pub async fn recommend_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>, StoreError> {
        let snapshot = self.fetch(user_id).await?;
        let (_, recommendations) = self.evaluate(user_id, &snapshot, now);
        Ok(recommendations)
    }

    /// Recommendations plus the metrics they were derived from.
    pub async fn plan(&self, user_id: &str) -> Result<StudyPlan, StoreError> {
        self.plan_at(user_id, Utc::now()).await
    }

    pub async fn plan_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<StudyPlan, StoreError> {
        let snapshot = self.fetch(user_id).await?;
        let (metrics, recommendations) = self.evaluate(user_id, &snapshot, now);
        Ok(StudyPlan {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            generated_at: now,
            metrics,
            recommendations,
        })
    }

    /// Whether `point_id` is unlocked for `user_id`, and what is missing if not.
    ///
    /// An unknown `point_id` reports `can_unlock: false` with no missing
    /// prerequisites.
    pub async fn unlock_check(
        &self,
        user_id: &str,
        point_id: &str,
    ) -> Result<UnlockCheck, StoreError> {
        let (target, progress) = tokio::try_join!(
            self.stores.graph.fetch_point(point_id),
            self.stores.progress.fetch_progress(user_id),
        )?;

        let Some(target) = target else {
            tracing::debug!(user_id, point_id, "unlock check for unknown point");
            return Ok(UnlockCheck {
                can_unlock: false,
                missing_prerequisites: Vec::new(),
            });
        };

        let completed = completed_set(&progress);
        let decision = can_unlock(&completed, &target);

        let lookups = decision
            .missing
            .iter()
            .map(|id| self.stores.graph.fetch_point(id));
        let found = try_join_all(lookups).await?;

        let missing_prerequisites = decision
            .missing
            .iter()
            .zip(found)
            .map(|(id, point)| PointRef {
                id: id.to_string(),
                title: point.map(|p| p.title).unwrap_or_default(),
            })
            .collect();

        Ok(UnlockCheck {
            can_unlock: decision.can_unlock,
            missing_prerequisites,
        })
    }

    /// Run [`recommend`](Self::recommend) for several users with bounded
    /// concurrency. Results come back in input order; one user's failure
    /// does not affect the others.
    pub async fn recommend_many(
        &self,
        user_ids: &[String],
    ) -> Vec<(String, Result<Vec<Recommendation>, StoreError>)> {
        self.recommend_many_at(user_ids, Utc::now()).await
    }

    pub async fn recommend_many_at(
        &self,
        user_ids: &[String],
        now: DateTime<Utc>,
    ) -> Vec<(String, Result<Vec<Recommendation>, StoreError>)> {
        let semaphore = Semaphore::new(self.config.parallelism.max(1));

        let mut futures: FuturesUnordered<_> = user_ids
            .iter()
            .enumerate()
            .map(|(idx, user_id)| {
                let semaphore = &semaphore;
                async move {
                    let result = match semaphore.acquire().await {
                        Ok(_permit) => self.recommend_at(user_id, now).await,
                        Err(_) => Err(StoreError::Other(anyhow::anyhow!("semaphore closed"))),
                    };
                    (idx, result)
                }
            })
            .collect();

        let mut results = Vec::with_capacity(user_ids.len());
        while let Some((idx, result)) = futures.next().await {
            if let Err(e) = &result {
                tracing::error!("recommendation failed for {}: {e:#}", user_ids[idx]);
            }
            results.push((idx, result));
        }

        results.sort_by_key(|(idx, _)| *idx);
        results
            .into_iter()
            .map(|(idx, result)| (user_ids[idx].clone(), result))
            .collect()
    }

    /// Issue the five fetches concurrently and join them.
    async fn fetch(&self, user_id: &str) -> Result<LearnerSnapshot, StoreError> {
        let (points, progress, sessions, wrong_answers, assessment) = tokio::try_join!(
            self.stores.graph.fetch_all_points(),
            self.stores.progress.fetch_progress(user_id),
            self.stores
                .sessions
                .fetch_sessions(user_id, self.config.session_limit),
            self.stores.wrong_answers.fetch_wrong_answers(user_id),
            self.stores.assessments.fetch_latest(user_id),
        )?;

        Ok(LearnerSnapshot {
            graph: GraphSnapshot::new(points),
            progress,
            sessions,
            wrong_answers,
            assessment,
        })
    }

    /// Pure, synchronous part of a call: aggregate, score, sequence.
    fn evaluate(
        &self,
        user_id: &str,
        snapshot: &LearnerSnapshot,
        now: DateTime<Utc>,
    ) -> (LearningMetrics, Vec<Recommendation>) {
        let metrics = compute_metrics(
            &snapshot.progress,
            &snapshot.sessions,
            &snapshot.wrong_answers,
            now,
        );
        let completed = completed_set(&snapshot.progress);
        let ctx = ScoringContext::new(
            snapshot.assessment.as_ref(),
            &metrics,
            &completed,
            &snapshot.progress,
            &snapshot.wrong_answers,
            &snapshot.graph,
            self.config.recent_window,
        );

        let candidates: Vec<Recommendation> = snapshot
            .graph
            .points()
            .iter()
            .filter(|p| !completed.contains(p.id.as_str()))
            .map(|p| score(p, &ctx))
            .collect();
        let candidate_count = candidates.len();

        let recommendations = sequence(candidates, &snapshot.graph, self.config.max_results);

        tracing::debug!(
            user_id,
            points = snapshot.graph.len(),
            completed = completed.len(),
            candidates = candidate_count,
            returned = recommendations.len(),
            recent_difficulty = ?ctx.avg_recent_difficulty(),
            "recommendations computed"
        );

        (metrics, recommendations)
    }
}
