//! The `studyplan recommend` command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;

use studyplan_core::model::Recommendation;
use studyplan_core::report::StudyPlan;

use super::{build_engine, OutputFormat};

pub async fn execute(
    users: String,
    limit: Option<usize>,
    format: OutputFormat,
    output: Option<PathBuf>,
    dataset: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let user_ids: Vec<String> = users
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    anyhow::ensure!(!user_ids.is_empty(), "at least one --user is required");
    anyhow::ensure!(
        output.is_none() || user_ids.len() == 1,
        "--output needs exactly one --user"
    );

    let engine = build_engine(config_path.as_deref(), dataset.as_deref(), limit)?;
    let now = Utc::now();

    if let [user_id] = user_ids.as_slice() {
        let plan = engine.plan_at(user_id, now).await?;
        render_plan(&plan, format)?;
        if let Some(path) = &output {
            plan.save_json(path)?;
            eprintln!("Plan saved to: {}", path.display());
        }
        return Ok(());
    }

    let results = engine.recommend_many_at(&user_ids, now).await;
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    tracing::info!(
        learners = user_ids.len(),
        failed,
        parallelism = engine.config().parallelism,
        "cohort recommendations computed"
    );

    match format {
        OutputFormat::Json => {
            let mut by_user: BTreeMap<&str, &[Recommendation]> = BTreeMap::new();
            for (user_id, result) in &results {
                if let Ok(recs) = result {
                    by_user.insert(user_id, recs);
                }
            }
            println!("{}", serde_json::to_string_pretty(&by_user)?);
        }
        OutputFormat::Table | OutputFormat::Markdown => {
            for (user_id, result) in &results {
                match result {
                    Ok(recs) => {
                        println!("Learner: {user_id}");
                        if format == OutputFormat::Table {
                            print_table(recs);
                        } else {
                            print_markdown_rows(recs);
                        }
                        println!();
                    }
                    Err(e) => eprintln!("  ERROR: {user_id}: {e}"),
                }
            }
        }
    }

    anyhow::ensure!(
        failed == 0,
        "{failed} of {} learner(s) failed",
        user_ids.len()
    );
    Ok(())
}

/// Print a single learner's plan in the requested format.
pub(crate) fn render_plan(plan: &StudyPlan, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_plan(plan),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(plan)?),
        OutputFormat::Markdown => print!("{}", plan.to_markdown()),
    }
    Ok(())
}

fn print_plan(plan: &StudyPlan) {
    println!(
        "Learner: {} ({} completed, {:.2} points/hour, last studied {} day(s) ago)",
        plan.user_id,
        plan.metrics.total_completed,
        plan.metrics.learning_speed,
        plan.metrics.days_since_last_study
    );
    print_table(&plan.recommendations);
    println!(
        "{} point(s), ~{} min, {} blocked",
        plan.recommendations.len(),
        plan.total_estimated_time(),
        plan.blocked_count()
    );
}

fn print_table(recs: &[Recommendation]) {
    use comfy_table::{Cell, Table};

    if recs.is_empty() {
        println!("Nothing left to study.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "#",
        "Point",
        "Subject",
        "Difficulty",
        "Minutes",
        "Urgency",
        "Success %",
        "Reason",
    ]);

    for (i, rec) in recs.iter().enumerate() {
        let reason = if rec.blocked {
            format!("{} (locked)", rec.reason)
        } else {
            rec.reason.to_string()
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&rec.point_id),
            Cell::new(&rec.subject),
            Cell::new(rec.difficulty),
            Cell::new(rec.estimated_time),
            Cell::new(format!("{:.0}", rec.urgency)),
            Cell::new(format!("{:.0}", rec.predicted_success_rate)),
            Cell::new(reason),
        ]);
    }

    println!("{table}");
}

fn print_markdown_rows(recs: &[Recommendation]) {
    println!("| # | Point | Reason |");
    println!("|---|-------|--------|");
    for (i, rec) in recs.iter().enumerate() {
        println!("| {} | {} | {} |", i + 1, rec.point_id, rec.reason);
    }
}
