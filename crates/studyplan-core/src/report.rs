//! Study plan report with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics::LearningMetrics;
use crate::model::Recommendation;

/// A sequenced study plan for one learner.
///
/// Recommendation priorities are ordering keys local to the call that
/// produced them and are not serialized; the order of `recommendations`
/// is what carries that information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyPlan {
    /// Unique plan identifier.
    pub id: Uuid,
    pub user_id: String,
    /// Reference instant the plan was computed against.
    pub generated_at: DateTime<Utc>,
    /// Learner metrics the scores were derived from.
    pub metrics: LearningMetrics,
    /// Recommendations in study order.
    pub recommendations: Vec<Recommendation>,
}

impl StudyPlan {
    /// Sum of estimated study minutes across the plan.
    pub fn total_estimated_time(&self) -> u32 {
        self.recommendations.iter().map(|r| r.estimated_time).sum()
    }

    /// Points still waiting on a prerequisite.
    pub fn blocked_count(&self) -> usize {
        self.recommendations.iter().filter(|r| r.blocked).count()
    }

    /// Save the plan as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize plan")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write plan to {}", path.display()))?;
        Ok(())
    }

    /// Load a plan from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read plan from {}", path.display()))?;
        let plan: StudyPlan = serde_json::from_str(&content).context("failed to parse plan JSON")?;
        Ok(plan)
    }

    /// Render the plan as a markdown table.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str(&format!("## Study plan for {}\n\n", self.user_id));
        md.push_str(&format!(
            "{} points, ~{} min, {} blocked\n\n",
            self.recommendations.len(),
            self.total_estimated_time(),
            self.blocked_count()
        ));

        if self.recommendations.is_empty() {
            md.push_str("Nothing left to study.\n");
            return md;
        }

        md.push_str("| # | Point | Subject | Difficulty | Minutes | Success % | Reason |\n");
        md.push_str("|---|-------|---------|------------|---------|-----------|--------|\n");
        for (i, r) in self.recommendations.iter().enumerate() {
            let name = if r.title.is_empty() {
                r.point_id.as_str()
            } else {
                r.title.as_str()
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {:.0} | {} |\n",
                i + 1,
                name,
                r.subject,
                r.difficulty,
                r.estimated_time,
                r.predicted_success_rate,
                r.reason
            ));
        }
        md
    }
}
