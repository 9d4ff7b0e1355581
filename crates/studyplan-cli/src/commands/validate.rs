//! The `studyplan validate` command.

use std::path::PathBuf;

use anyhow::Result;

use studyplan_core::parser::{parse_dataset, validate_dataset};

pub fn execute(dataset_path: PathBuf) -> Result<()> {
    let dataset = parse_dataset(&dataset_path)?;
    println!(
        "Dataset: {} ({} points, {} learners)",
        dataset_path.display(),
        dataset.points.len(),
        dataset.learners.len()
    );

    let warnings = validate_dataset(&dataset);
    for w in &warnings {
        let prefix = match (&w.learner, &w.point_id) {
            (Some(learner), Some(id)) => format!("  [{learner}/{id}]"),
            (None, Some(id)) => format!("  [{id}]"),
            _ => "  ".to_string(),
        };
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Dataset valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
