//! The `studyplan unlock` command.

use std::path::PathBuf;

use anyhow::Result;

use super::build_engine;

pub async fn execute(
    user_id: String,
    point_id: String,
    json: bool,
    dataset: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let engine = build_engine(config_path.as_deref(), dataset.as_deref(), None)?;
    let check = engine.unlock_check(&user_id, &point_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&check)?);
        return Ok(());
    }

    if check.can_unlock {
        println!("{point_id}: unlocked for {user_id}");
    } else if check.missing_prerequisites.is_empty() {
        // Unknown points report locked with nothing missing.
        println!("{point_id}: locked for {user_id} (unknown point)");
    } else {
        println!("{point_id}: locked for {user_id}");
        println!("Missing prerequisites:");
        for missing in &check.missing_prerequisites {
            if missing.title.is_empty() {
                println!("  - {}", missing.id);
            } else {
                println!("  - {} ({})", missing.id, missing.title);
            }
        }
    }

    Ok(())
}
