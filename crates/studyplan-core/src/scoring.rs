//! Multi-factor priority scoring.
//!
//! Every candidate starts from the same baseline and is pushed around by an
//! ordered list of rules. Each rule looks at the point and the learner
//! context and returns an [`Adjustment`]; adjustments are folded left to
//! right. Numeric deltas add up, success-rate operations apply in rule order
//! and the last rule that names a [`Reason`] wins.
//!
//! ```text
//! gate -> assessment -> pace -> errors -> restart -> easy win
//!      -> short session -> continuation -> momentum -> clamp
//! ```

use std::collections::{HashMap, HashSet};

use crate::gate::can_unlock;
use crate::graph::GraphSnapshot;
use crate::metrics::LearningMetrics;
use crate::model::{
    AssessmentResult, KnowledgePoint, ProgressRecord, ProgressStatus, Reason, Recommendation,
    WrongAnswerRecord,
};

pub const BASE_PRIORITY: f64 = 50.0;
pub const BASE_URGENCY: f64 = 50.0;
pub const BASE_SUCCESS_RATE: f64 = 70.0;
/// Success rate of a point whose prerequisites are not all completed.
pub const BLOCKED_SUCCESS_RATE: f64 = 20.0;

pub const MIN_SUCCESS_RATE: f64 = 10.0;
pub const MAX_SUCCESS_RATE: f64 = 95.0;
pub const MIN_URGENCY: f64 = 0.0;
pub const MAX_URGENCY: f64 = 100.0;

/// Unmastered wrong answers in a subject above which the subject is under pressure.
const ERROR_PRESSURE_THRESHOLD: usize = 5;
/// Days of inactivity after which easy points make a good restart.
const RESTART_IDLE_DAYS: i64 = 7;

/// How a rule changes the predicted success rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuccessRateOp {
    Set(f64),
    Offset(f64),
    /// Add `by`, never going above `cap`.
    RaiseCapped { by: f64, cap: f64 },
}

impl SuccessRateOp {
    fn apply(self, current: f64) -> f64 {
        match self {
            SuccessRateOp::Set(value) => value,
            SuccessRateOp::Offset(delta) => current + delta,
            SuccessRateOp::RaiseCapped { by, cap } => (current + by).min(cap),
        }
    }
}

/// The effect of a single rule on a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Adjustment {
    pub priority: f64,
    pub urgency: f64,
    pub success_rate: Option<SuccessRateOp>,
    pub reason: Option<Reason>,
}

impl Adjustment {
    fn priority(delta: f64) -> Self {
        Self {
            priority: delta,
            ..Default::default()
        }
    }
}

/// A scoring rule. Returns `None` when it does not apply.
pub type Rule = fn(&KnowledgePoint, &ScoringContext<'_>) -> Option<Adjustment>;

/// Rules in evaluation order.
pub const RULES: [(&str, Rule); 9] = [
    ("prerequisite_gate", prerequisite_gate),
    ("assessment_alignment", assessment_alignment),
    ("pace_matching", pace_matching),
    ("subject_error_pressure", subject_error_pressure),
    ("re_engagement", re_engagement),
    ("easy_win", easy_win),
    ("short_session", short_session),
    ("continuation", continuation),
    ("momentum", momentum),
];

/// Learner-wide inputs shared by every candidate in one call.
///
/// Derived lookups (in-progress set, per-subject error counts, recent
/// difficulty) are computed once here rather than per candidate.
#[derive(Debug)]
pub struct ScoringContext<'a> {
    pub assessment: Option<&'a AssessmentResult>,
    pub metrics: &'a LearningMetrics,
    pub completed: &'a HashSet<&'a str>,
    in_progress: HashSet<&'a str>,
    unmastered_by_subject: HashMap<&'a str, usize>,
    avg_recent_difficulty: Option<f64>,
}

impl<'a> ScoringContext<'a> {
    /// Build the context. `recent_window` is how many of the most recently
    /// completed points feed the momentum rule.
    pub fn new(
        assessment: Option<&'a AssessmentResult>,
        metrics: &'a LearningMetrics,
        completed: &'a HashSet<&'a str>,
        progress: &'a [ProgressRecord],
        wrong_answers: &'a [WrongAnswerRecord],
        graph: &'a GraphSnapshot,
        recent_window: usize,
    ) -> Self {
        let in_progress = progress
            .iter()
            .filter(|p| p.status == ProgressStatus::InProgress)
            .map(|p| p.point_id.as_str())
            .collect();

        let mut unmastered_by_subject: HashMap<&str, usize> = HashMap::new();
        for answer in wrong_answers.iter().filter(|w| !w.mastered) {
            *unmastered_by_subject
                .entry(answer.subject.as_str())
                .or_default() += 1;
        }

        Self {
            assessment,
            metrics,
            completed,
            in_progress,
            unmastered_by_subject,
            avg_recent_difficulty: recent_difficulty(progress, graph, recent_window),
        }
    }

    pub fn avg_recent_difficulty(&self) -> Option<f64> {
        self.avg_recent_difficulty
    }
}

/// Mean difficulty of the most recently completed points that exist in the graph.
fn recent_difficulty(
    progress: &[ProgressRecord],
    graph: &GraphSnapshot,
    window: usize,
) -> Option<f64> {
    let mut completed: Vec<&ProgressRecord> =
        progress.iter().filter(|p| p.is_completed()).collect();
    // Newest first; undated completions sort last. The sort is stable so
    // records with equal timestamps keep store order.
    completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    let difficulties: Vec<f64> = completed
        .iter()
        .filter_map(|p| graph.get(&p.point_id))
        .take(window)
        .map(|p| f64::from(p.difficulty))
        .collect();

    if difficulties.is_empty() {
        None
    } else {
        Some(difficulties.iter().sum::<f64>() / difficulties.len() as f64)
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

pub fn prerequisite_gate(point: &KnowledgePoint, ctx: &ScoringContext<'_>) -> Option<Adjustment> {
    if can_unlock(ctx.completed, point).can_unlock {
        return None;
    }
    Some(Adjustment {
        priority: -100.0,
        urgency: 0.0,
        success_rate: Some(SuccessRateOp::Set(BLOCKED_SUCCESS_RATE)),
        reason: Some(Reason::BlockedOnPrerequisite),
    })
}

pub fn assessment_alignment(
    point: &KnowledgePoint,
    ctx: &ScoringContext<'_>,
) -> Option<Adjustment> {
    let assessment = ctx.assessment?;
    let mut adj = Adjustment::default();

    if assessment.weaknesses.contains_key(&point.subject) {
        adj.priority += 40.0;
        adj.urgency += 30.0;
        adj.reason = Some(Reason::ReinforceWeakSubject);
    }

    if let Some(&skill) = assessment.skill_profile.get(&point.subject) {
        let baseline = f64::from(point.difficulty) * 20.0;
        let match_score = 100.0 - (skill - baseline).abs();
        adj.priority += match_score * 0.3;

        let rate = if skill >= baseline + 20.0 {
            90.0
        } else if skill >= baseline {
            80.0
        } else if skill >= baseline - 20.0 {
            65.0
        } else {
            adj.priority -= 20.0;
            40.0
        };
        adj.success_rate = Some(SuccessRateOp::Set(rate));
    }

    (adj != Adjustment::default()).then_some(adj)
}

pub fn pace_matching(point: &KnowledgePoint, ctx: &ScoringContext<'_>) -> Option<Adjustment> {
    let speed = ctx.metrics.learning_speed;
    let fast_and_hard = speed > 2.0 && point.difficulty >= 3;
    let slow_and_easy = speed < 1.0 && point.difficulty <= 2;
    (fast_and_hard || slow_and_easy).then(|| Adjustment::priority(15.0))
}

pub fn subject_error_pressure(
    point: &KnowledgePoint,
    ctx: &ScoringContext<'_>,
) -> Option<Adjustment> {
    let unmastered = ctx
        .unmastered_by_subject
        .get(point.subject.as_str())
        .copied()
        .unwrap_or(0);
    (unmastered > ERROR_PRESSURE_THRESHOLD).then_some(Adjustment {
        priority: 25.0,
        urgency: 20.0,
        success_rate: None,
        reason: Some(Reason::HighErrorRate),
    })
}

pub fn re_engagement(point: &KnowledgePoint, ctx: &ScoringContext<'_>) -> Option<Adjustment> {
    (ctx.metrics.days_since_last_study > RESTART_IDLE_DAYS && point.difficulty <= 2).then_some(
        Adjustment {
            priority: 20.0,
            reason: Some(Reason::GoodRestartPoint),
            ..Default::default()
        },
    )
}

pub fn easy_win(point: &KnowledgePoint, _ctx: &ScoringContext<'_>) -> Option<Adjustment> {
    (point.difficulty == 1).then_some(Adjustment {
        priority: 15.0,
        success_rate: Some(SuccessRateOp::RaiseCapped {
            by: 15.0,
            cap: MAX_SUCCESS_RATE,
        }),
        ..Default::default()
    })
}

pub fn short_session(point: &KnowledgePoint, _ctx: &ScoringContext<'_>) -> Option<Adjustment> {
    (point.estimated_time <= 30).then(|| Adjustment::priority(10.0))
}

pub fn continuation(point: &KnowledgePoint, ctx: &ScoringContext<'_>) -> Option<Adjustment> {
    ctx.in_progress
        .contains(point.id.as_str())
        .then_some(Adjustment {
            priority: 50.0,
            urgency: 40.0,
            success_rate: None,
            reason: Some(Reason::ResumeInProgress),
        })
}

pub fn momentum(point: &KnowledgePoint, ctx: &ScoringContext<'_>) -> Option<Adjustment> {
    let recent = ctx.avg_recent_difficulty?;
    let gap = (f64::from(point.difficulty) - recent).abs();
    if gap > 2.0 {
        Some(Adjustment {
            priority: -15.0,
            success_rate: Some(SuccessRateOp::Offset(-10.0)),
            ..Default::default()
        })
    } else if gap <= 0.5 {
        Some(Adjustment::priority(10.0))
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Fold
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoreState {
    priority: f64,
    urgency: f64,
    success_rate: f64,
    reason: Reason,
}

impl ScoreState {
    fn initial() -> Self {
        Self {
            priority: BASE_PRIORITY,
            urgency: BASE_URGENCY,
            success_rate: BASE_SUCCESS_RATE,
            reason: Reason::General,
        }
    }

    fn apply(&mut self, adj: &Adjustment) {
        self.priority += adj.priority;
        self.urgency += adj.urgency;
        if let Some(op) = adj.success_rate {
            self.success_rate = op.apply(self.success_rate);
        }
        if let Some(reason) = adj.reason {
            self.reason = reason;
        }
    }
}

/// Score a single candidate point.
///
/// `priority` is left unclamped; `urgency` is clamped to 0-100 and the
/// predicted success rate to 10-95. A blocked point always reports the
/// blocked success rate, whatever later rules did to it.
pub fn score(point: &KnowledgePoint, ctx: &ScoringContext<'_>) -> Recommendation {
    let mut state = ScoreState::initial();
    let mut blocked = false;

    for (name, rule) in RULES.iter() {
        if let Some(adj) = rule(point, ctx) {
            tracing::trace!(point = %point.id, rule = *name, ?adj, "rule applied");
            if adj.reason == Some(Reason::BlockedOnPrerequisite) {
                blocked = true;
            }
            state.apply(&adj);
        }
    }

    if blocked {
        state.success_rate = BLOCKED_SUCCESS_RATE;
    }

    Recommendation {
        point_id: point.id.clone(),
        title: point.title.clone(),
        subject: point.subject.clone(),
        priority: state.priority,
        urgency: state.urgency.clamp(MIN_URGENCY, MAX_URGENCY),
        predicted_success_rate: state.success_rate.clamp(MIN_SUCCESS_RATE, MAX_SUCCESS_RATE),
        reason: state.reason,
        estimated_time: point.estimated_time,
        difficulty: point.difficulty,
        blocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::LearningMetrics;
    use chrono::{TimeZone, Utc};

    fn point(
        id: &str,
        subject: &str,
        difficulty: u8,
        minutes: u32,
        prereqs: &[&str],
    ) -> KnowledgePoint {
        KnowledgePoint {
            id: id.into(),
            title: id.to_uppercase(),
            subject: subject.into(),
            difficulty,
            estimated_time: minutes,
            prerequisites: prereqs.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Metrics that trigger none of the pace or restart rules.
    fn quiet_metrics() -> LearningMetrics {
        LearningMetrics {
            learning_speed: 1.5,
            days_since_last_study: 1,
            ..LearningMetrics::default()
        }
    }

    struct Fixture {
        graph: GraphSnapshot,
        progress: Vec<ProgressRecord>,
        wrong_answers: Vec<WrongAnswerRecord>,
        assessment: Option<AssessmentResult>,
        metrics: LearningMetrics,
    }

    impl Fixture {
        fn new(points: Vec<KnowledgePoint>) -> Self {
            Self {
                graph: GraphSnapshot::new(points),
                progress: vec![],
                wrong_answers: vec![],
                assessment: None,
                metrics: quiet_metrics(),
            }
        }

        fn complete(mut self, id: &str, day: u32) -> Self {
            self.progress.push(ProgressRecord {
                point_id: id.into(),
                status: ProgressStatus::Completed,
                best_score: Some(90.0),
                quiz_attempts: 1,
                completed_at: Some(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()),
            });
            self
        }

        fn score(&self, id: &str) -> Recommendation {
            let completed = crate::gate::completed_set(&self.progress);
            let ctx = ScoringContext::new(
                self.assessment.as_ref(),
                &self.metrics,
                &completed,
                &self.progress,
                &self.wrong_answers,
                &self.graph,
                3,
            );
            score(self.graph.get(id).unwrap(), &ctx)
        }
    }

    #[test]
    fn baseline_for_plain_point() {
        let fx = Fixture::new(vec![point("p", "math", 3, 60, &[])]);
        let rec = fx.score("p");
        assert_eq!(rec.priority, 50.0);
        assert_eq!(rec.urgency, 50.0);
        assert_eq!(rec.predicted_success_rate, 70.0);
        assert_eq!(rec.reason, Reason::General);
        assert!(!rec.blocked);
    }

    #[test]
    fn blocked_point_penalised_and_pinned() {
        let fx = Fixture::new(vec![
            point("a", "math", 3, 60, &[]),
            point("p", "math", 3, 60, &["a"]),
        ]);
        let rec = fx.score("p");
        assert_eq!(rec.priority, -50.0);
        assert_eq!(rec.predicted_success_rate, 20.0);
        assert_eq!(rec.reason, Reason::BlockedOnPrerequisite);
        assert!(rec.blocked);
    }

    #[test]
    fn blocked_rate_survives_assessment_and_easy_win() {
        let mut fx = Fixture::new(vec![
            point("a", "math", 1, 20, &[]),
            point("p", "math", 1, 20, &["a"]),
        ]);
        fx.assessment = Some(AssessmentResult {
            skill_profile: [("math".to_string(), 90.0)].into_iter().collect(),
            ..Default::default()
        });
        let rec = fx.score("p");
        assert_eq!(rec.predicted_success_rate, 20.0);
        assert!(rec.blocked);
    }

    #[test]
    fn weakness_reinforcement() {
        let mut fx = Fixture::new(vec![point("p", "geometry", 3, 60, &[])]);
        fx.assessment = Some(AssessmentResult {
            weaknesses: [("geometry".to_string(), "low quiz scores".to_string())]
                .into_iter()
                .collect(),
            ..Default::default()
        });
        let rec = fx.score("p");
        assert_eq!(rec.priority, 90.0);
        assert_eq!(rec.urgency, 80.0);
        assert_eq!(rec.reason, Reason::ReinforceWeakSubject);
        // No skill level recorded: success rate untouched.
        assert_eq!(rec.predicted_success_rate, 70.0);
    }

    #[test]
    fn skill_bands() {
        let cases = [
            // (skill, expected rate, expected priority)
            (80.0, 90.0, 50.0 + 80.0 * 0.3),
            (60.0, 80.0, 50.0 + 100.0 * 0.3),
            (45.0, 65.0, 50.0 + 85.0 * 0.3),
            (10.0, 40.0, 50.0 + 50.0 * 0.3 - 20.0),
        ];
        for (skill, rate, priority) in cases {
            let mut fx = Fixture::new(vec![point("p", "math", 3, 60, &[])]);
            fx.assessment = Some(AssessmentResult {
                skill_profile: [("math".to_string(), skill)].into_iter().collect(),
                ..Default::default()
            });
            let rec = fx.score("p");
            assert_eq!(rec.predicted_success_rate, rate, "skill {skill}");
            assert!(
                (rec.priority - priority).abs() < 1e-9,
                "skill {skill}: expected {priority}, got {}",
                rec.priority
            );
        }
    }

    #[test]
    fn pace_matching_both_directions() {
        let mut fx = Fixture::new(vec![
            point("hard", "math", 4, 60, &[]),
            point("easy", "math", 2, 60, &[]),
        ]);
        fx.metrics.learning_speed = 3.0;
        assert_eq!(fx.score("hard").priority, 65.0);
        assert_eq!(fx.score("easy").priority, 50.0);

        fx.metrics.learning_speed = 0.5;
        assert_eq!(fx.score("hard").priority, 50.0);
        assert_eq!(fx.score("easy").priority, 65.0);
    }

    #[test]
    fn error_pressure_needs_more_than_five_unmastered() {
        let mut fx = Fixture::new(vec![point("p", "physics", 3, 60, &[])]);
        let wrong = |mastered| WrongAnswerRecord {
            point_id: "x".into(),
            question_id: "q".into(),
            subject: "physics".into(),
            retry_count: 1,
            mastered,
        };
        fx.wrong_answers = (0..5).map(|_| wrong(false)).collect();
        fx.wrong_answers.push(wrong(true));
        assert_eq!(fx.score("p").reason, Reason::General);

        fx.wrong_answers.push(wrong(false));
        let rec = fx.score("p");
        assert_eq!(rec.priority, 75.0);
        assert_eq!(rec.urgency, 70.0);
        assert_eq!(rec.reason, Reason::HighErrorRate);
    }

    #[test]
    fn restart_point_after_idle_week() {
        let mut fx = Fixture::new(vec![point("p", "math", 2, 60, &[])]);
        fx.metrics.days_since_last_study = 8;
        let rec = fx.score("p");
        assert_eq!(rec.priority, 70.0);
        assert_eq!(rec.reason, Reason::GoodRestartPoint);
    }

    #[test]
    fn easy_win_and_short_session() {
        let fx = Fixture::new(vec![point("p", "math", 1, 15, &[])]);
        let rec = fx.score("p");
        assert_eq!(rec.priority, 75.0);
        assert_eq!(rec.predicted_success_rate, 85.0);
    }

    #[test]
    fn easy_win_caps_success_rate() {
        let mut fx = Fixture::new(vec![point("p", "math", 1, 60, &[])]);
        fx.assessment = Some(AssessmentResult {
            skill_profile: [("math".to_string(), 100.0)].into_iter().collect(),
            ..Default::default()
        });
        assert_eq!(fx.score("p").predicted_success_rate, 95.0);
    }

    #[test]
    fn continuation_overrides_reason() {
        let mut fx = Fixture::new(vec![point("p", "math", 3, 60, &[])]);
        fx.metrics.days_since_last_study = 30;
        fx.progress.push(ProgressRecord {
            point_id: "p".into(),
            status: ProgressStatus::InProgress,
            best_score: None,
            quiz_attempts: 0,
            completed_at: None,
        });
        let rec = fx.score("p");
        assert_eq!(rec.priority, 100.0);
        assert_eq!(rec.urgency, 90.0);
        assert_eq!(rec.reason, Reason::ResumeInProgress);
    }

    #[test]
    fn momentum_uses_three_most_recent_completions() {
        let fx = Fixture::new(vec![
            point("old", "math", 5, 60, &[]),
            point("r1", "math", 1, 60, &[]),
            point("r2", "math", 1, 60, &[]),
            point("r3", "math", 1, 60, &[]),
            point("near", "math", 1, 60, &[]),
            point("far", "math", 4, 60, &[]),
            point("mid", "math", 2, 60, &[]),
        ])
        .complete("old", 1)
        .complete("r1", 10)
        .complete("r2", 11)
        .complete("r3", 12);

        let completed = crate::gate::completed_set(&fx.progress);
        let ctx = ScoringContext::new(
            None,
            &fx.metrics,
            &completed,
            &fx.progress,
            &fx.wrong_answers,
            &fx.graph,
            3,
        );
        assert_eq!(ctx.avg_recent_difficulty(), Some(1.0));

        // gap 0 -> +10, plus easy win +15
        assert_eq!(fx.score("near").priority, 75.0);
        // gap 3 -> -15 and -10 success rate
        let far = fx.score("far");
        assert_eq!(far.priority, 35.0);
        assert_eq!(far.predicted_success_rate, 60.0);
        // gap 1 -> nothing
        assert_eq!(fx.score("mid").priority, 50.0);
    }

    #[test]
    fn momentum_skipped_without_completions() {
        let fx = Fixture::new(vec![point("p", "math", 5, 60, &[])]);
        assert_eq!(fx.score("p").priority, 50.0);
    }

    #[test]
    fn urgency_and_success_rate_are_clamped() {
        let mut fx = Fixture::new(vec![point("p", "chem", 5, 60, &[])]);
        fx.assessment = Some(AssessmentResult {
            skill_profile: [("chem".to_string(), 0.0)].into_iter().collect(),
            weaknesses: [("chem".to_string(), "weak".to_string())]
                .into_iter()
                .collect(),
            ..Default::default()
        });
        fx.wrong_answers = (0..6)
            .map(|i| WrongAnswerRecord {
                point_id: "p".into(),
                question_id: format!("q{i}"),
                subject: "chem".into(),
                retry_count: 0,
                mastered: false,
            })
            .collect();
        fx.progress.push(ProgressRecord {
            point_id: "p".into(),
            status: ProgressStatus::InProgress,
            best_score: None,
            quiz_attempts: 0,
            completed_at: None,
        });
        // One completed point at difficulty 1 puts the gap at 4.
        fx.graph = GraphSnapshot::new(vec![
            point("p", "chem", 5, 60, &[]),
            point("basics", "chem", 1, 60, &[]),
        ]);
        let fx = fx.complete("basics", 2);

        let rec = fx.score("p");
        // 50 + 30 + 20 + 40 = 140
        assert_eq!(rec.urgency, 100.0);
        // 40 - 10 = 30, within range
        assert_eq!(rec.predicted_success_rate, 30.0);
        assert!(rec.predicted_success_rate >= MIN_SUCCESS_RATE);
    }

    #[test]
    fn success_rate_never_below_floor() {
        let op = SuccessRateOp::Offset(-100.0);
        assert_eq!(op.apply(30.0), -70.0);
        let mut fx = Fixture::new(vec![
            point("p", "chem", 5, 60, &[]),
            point("basics", "chem", 1, 60, &[]),
        ]);
        fx.assessment = Some(AssessmentResult {
            skill_profile: [("chem".to_string(), 0.0)].into_iter().collect(),
            ..Default::default()
        });
        let fx = fx.complete("basics", 3);
        // 40 then -10 = 30: never below the floor
        assert!(fx.score("p").predicted_success_rate >= 10.0);
    }

    #[test]
    fn rules_are_in_documented_order() {
        let names: Vec<&str> = RULES.iter().map(|(name, _)| *name).collect();
        assert_eq!(names.first(), Some(&"prerequisite_gate"));
        assert_eq!(names.last(), Some(&"momentum"));
        assert_eq!(names.len(), 9);
    }
}
