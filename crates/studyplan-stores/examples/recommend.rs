//! Recommend example: wire an in-memory store into the engine by hand.
//!
//! Builds a tiny algebra course in code, records one learner's progress and
//! prints their study order plus the unlock status of the hardest point.
//! Engine limits come from `studyplan.toml` when one is present.
//!
//! ```bash
//! cargo run -p studyplan-stores --example recommend
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};

use studyplan_core::engine::{RecommendationEngine, Stores};
use studyplan_core::model::{KnowledgePoint, ProgressRecord, ProgressStatus, StudySession};
use studyplan_core::parser::LearnerRecords;
use studyplan_stores::{load_config, InMemoryStore};

fn point(id: &str, difficulty: u8, minutes: u32, prerequisites: &[&str]) -> KnowledgePoint {
    KnowledgePoint {
        id: id.to_string(),
        title: id.replace('_', " "),
        subject: "algebra".to_string(),
        difficulty,
        estimated_time: minutes,
        prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Only the engine limits are used; the dataset path is ignored here
    let config = load_config()?;

    let points = vec![
        point("integers", 1, 20, &[]),
        point("fractions", 2, 30, &["integers"]),
        point("linear_equations", 3, 40, &["fractions"]),
        point("quadratics", 4, 50, &["linear_equations"]),
        point("ratios", 2, 25, &["fractions"]),
    ];

    let now = Utc::now();
    let learner = LearnerRecords {
        progress: vec![ProgressRecord {
            point_id: "integers".into(),
            status: ProgressStatus::Completed,
            best_score: Some(88.0),
            quiz_attempts: 2,
            completed_at: Some(now - Duration::days(1)),
        }],
        sessions: vec![StudySession {
            start_time: now - Duration::days(1),
            duration_secs: 1800,
            subject: Some("algebra".into()),
            point_id: Some("integers".into()),
        }],
        ..LearnerRecords::default()
    };

    let store = InMemoryStore::new(points).with_learner("ada", learner);
    let engine = RecommendationEngine::new(Stores::shared(Arc::new(store)), config.engine_config());

    let recs = engine.recommend("ada").await?;
    println!("Study order for ada:");
    for (i, rec) in recs.iter().enumerate() {
        let lock = if rec.blocked { " [locked]" } else { "" };
        println!(
            "  {}. {} ({} min, {:.0}% predicted){lock}: {}",
            i + 1,
            rec.point_id,
            rec.estimated_time,
            rec.predicted_success_rate,
            rec.reason
        );
    }

    let check = engine.unlock_check("ada", "quadratics").await?;
    if check.can_unlock {
        println!("quadratics is unlocked");
    } else {
        let missing: Vec<&str> = check
            .missing_prerequisites
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        println!("quadratics still needs: {}", missing.join(", "));
    }

    Ok(())
}
