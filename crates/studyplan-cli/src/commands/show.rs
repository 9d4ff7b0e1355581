//! The `studyplan show` command.

use std::path::PathBuf;

use anyhow::Result;

use studyplan_core::report::StudyPlan;

use super::recommend::render_plan;
use super::OutputFormat;

pub fn execute(plan_path: PathBuf, format: OutputFormat) -> Result<()> {
    let plan = StudyPlan::load_json(&plan_path)?;
    println!(
        "Plan {} generated {}",
        plan.id,
        plan.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    render_plan(&plan, format)
}
