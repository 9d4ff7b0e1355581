//! Property tests: ordering, gating, clamping and the result cap hold for
//! arbitrary acyclic graphs and learner histories.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use studyplan_core::engine::{EngineConfig, RecommendationEngine, Stores};
use studyplan_core::model::{
    AssessmentResult, KnowledgePoint, ProgressRecord, ProgressStatus, Recommendation,
    StudySession, UnlockCheck, WrongAnswerRecord,
};
use studyplan_core::parser::LearnerRecords;
use studyplan_stores::InMemoryStore;

const SUBJECTS: [&str; 4] = ["algebra", "geometry", "physics", "chemistry"];
const USER: &str = "learner";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap()
}

/// Difficulty, minutes, subject, progress status, prerequisites.
///
/// Each prerequisite is `(pick, unknown)`: `pick` selects an earlier point
/// unless `unknown` is set, in which case it names a point missing from the
/// graph.
type PointDraw = (u8, u32, usize, u8, Vec<(usize, bool)>);

fn point_draw() -> impl Strategy<Value = PointDraw> {
    (
        1u8..=5,
        5u32..=90,
        0..SUBJECTS.len(),
        0u8..3,
        prop::collection::vec((any::<usize>(), prop::bool::weighted(0.1)), 0..4),
    )
}

#[derive(Debug, Clone)]
struct Case {
    points: Vec<KnowledgePoint>,
    learner: LearnerRecords,
    limit: usize,
}

impl Case {
    fn completed(&self) -> HashSet<&str> {
        self.learner
            .progress
            .iter()
            .filter(|p| p.is_completed())
            .map(|p| p.point_id.as_str())
            .collect()
    }
}

fn build_case(
    draws: Vec<PointDraw>,
    unmastered: Vec<usize>,
    skills: Vec<Option<f64>>,
    weak: Vec<bool>,
    assessed: bool,
    last_session: Option<(i64, u64)>,
    limit: usize,
) -> Case {
    let mut points = Vec::with_capacity(draws.len());
    let mut progress = Vec::new();

    for (i, (difficulty, minutes, subject, status, prereqs)) in draws.into_iter().enumerate() {
        let id = format!("p{i}");
        let prerequisites = prereqs
            .into_iter()
            .map(|(pick, unknown)| {
                if unknown || i == 0 {
                    format!("ghost{}", pick % 5)
                } else {
                    format!("p{}", pick % i)
                }
            })
            .collect();

        let status = match status {
            0 => None,
            1 => Some(ProgressStatus::InProgress),
            _ => Some(ProgressStatus::Completed),
        };
        if let Some(status) = status {
            let done = status == ProgressStatus::Completed;
            progress.push(ProgressRecord {
                point_id: id.clone(),
                status,
                best_score: done.then_some(40.0 + (i % 60) as f64),
                quiz_attempts: 1,
                completed_at: done.then(|| now() - Duration::hours(i as i64)),
            });
        }

        points.push(KnowledgePoint {
            id,
            title: String::new(),
            subject: SUBJECTS[subject].to_string(),
            difficulty,
            estimated_time: minutes,
            prerequisites,
        });
    }

    let wrong_answers = unmastered
        .iter()
        .enumerate()
        .flat_map(|(k, &count)| {
            (0..count).map(move |q| WrongAnswerRecord {
                point_id: "p0".into(),
                question_id: format!("{}-{q}", SUBJECTS[k]),
                subject: SUBJECTS[k].to_string(),
                retry_count: 1,
                mastered: false,
            })
        })
        .collect();

    let assessment = assessed.then(|| AssessmentResult {
        skill_profile: SUBJECTS
            .iter()
            .zip(&skills)
            .filter_map(|(s, level)| level.map(|l| (s.to_string(), l)))
            .collect(),
        weaknesses: SUBJECTS
            .iter()
            .zip(&weak)
            .filter(|(_, &w)| w)
            .map(|(s, _)| (s.to_string(), "flagged".to_string()))
            .collect(),
        assessed_at: None,
    });

    let sessions = last_session
        .map(|(days_ago, secs)| StudySession {
            start_time: now() - Duration::days(days_ago),
            duration_secs: secs,
            subject: None,
            point_id: None,
        })
        .into_iter()
        .collect();

    Case {
        points,
        learner: LearnerRecords {
            progress,
            sessions,
            wrong_answers,
            assessment,
        },
        limit,
    }
}

prop_compose! {
    fn arb_case()(
        draws in prop::collection::vec(point_draw(), 1..120),
        unmastered in prop::collection::vec(0usize..9, SUBJECTS.len()),
        skills in prop::collection::vec(prop::option::of(0.0f64..=100.0), SUBJECTS.len()),
        weak in prop::collection::vec(any::<bool>(), SUBJECTS.len()),
        assessed in any::<bool>(),
        last_session in prop::option::of((0i64..30, 60u64..7200)),
        limit in 0usize..70,
    ) -> Case {
        build_case(draws, unmastered, skills, weak, assessed, last_session, limit)
    }
}

fn engine_for(case: &Case) -> RecommendationEngine {
    let store = InMemoryStore::new(case.points.clone()).with_learner(USER, case.learner.clone());
    let config = EngineConfig {
        max_results: case.limit,
        ..EngineConfig::default()
    };
    RecommendationEngine::new(Stores::shared(Arc::new(store)), config)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn recommend_twice(case: &Case) -> (Vec<Recommendation>, Vec<Recommendation>) {
    let engine = engine_for(case);
    runtime().block_on(async {
        let first = engine.recommend_at(USER, now()).await.unwrap();
        let second = engine.recommend_at(USER, now()).await.unwrap();
        (first, second)
    })
}

fn check_invariants(case: &Case, recs: &[Recommendation]) -> Result<(), TestCaseError> {
    let completed = case.completed();
    let by_id: HashMap<&str, &KnowledgePoint> =
        case.points.iter().map(|p| (p.id.as_str(), p)).collect();
    let candidates = case
        .points
        .iter()
        .filter(|p| !completed.contains(p.id.as_str()))
        .count();

    prop_assert_eq!(recs.len(), case.limit.min(50).min(candidates));

    let positions: HashMap<&str, usize> = recs
        .iter()
        .enumerate()
        .map(|(idx, r)| (r.point_id.as_str(), idx))
        .collect();
    prop_assert_eq!(positions.len(), recs.len(), "duplicate point in output");

    for (idx, rec) in recs.iter().enumerate() {
        prop_assert!(!completed.contains(rec.point_id.as_str()));
        prop_assert!((0.0..=100.0).contains(&rec.urgency), "urgency {}", rec.urgency);
        prop_assert!(
            (10.0..=95.0).contains(&rec.predicted_success_rate),
            "success rate {}",
            rec.predicted_success_rate
        );

        let point = by_id[rec.point_id.as_str()];
        let locked = point
            .prerequisites
            .iter()
            .any(|q| !completed.contains(q.as_str()));
        prop_assert_eq!(rec.blocked, locked, "blocked flag for {}", rec.point_id);
        if rec.blocked {
            prop_assert_eq!(rec.predicted_success_rate, 20.0);
        }

        for prereq in &point.prerequisites {
            if let Some(&before) = positions.get(prereq.as_str()) {
                prop_assert!(
                    before < idx,
                    "{} (at {}) must precede {} (at {})",
                    prereq,
                    before,
                    rec.point_id,
                    idx
                );
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_recommendations_hold_invariants(case in arb_case()) {
        let (first, second) = recommend_twice(&case);
        prop_assert_eq!(&first, &second);
        check_invariants(&case, &first)?;
    }

    #[test]
    fn prop_unlock_check_matches_completed_prerequisites(
        case in arb_case(),
        pick in any::<usize>(),
    ) {
        let target = &case.points[pick % case.points.len()];
        let engine = engine_for(&case);
        let check: UnlockCheck = runtime()
            .block_on(engine.unlock_check(USER, &target.id))
            .unwrap();

        let completed = case.completed();
        let missing: Vec<&str> = target
            .prerequisites
            .iter()
            .map(String::as_str)
            .filter(|q| !completed.contains(q))
            .collect();
        let reported: Vec<&str> = check
            .missing_prerequisites
            .iter()
            .map(|p| p.id.as_str())
            .collect();

        prop_assert_eq!(check.can_unlock, missing.is_empty());
        prop_assert_eq!(reported, missing);
    }
}
