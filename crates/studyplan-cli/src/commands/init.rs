//! The `studyplan init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("studyplan.toml").exists() {
        println!("studyplan.toml already exists, skipping.");
    } else {
        std::fs::write("studyplan.toml", SAMPLE_CONFIG)?;
        println!("Created studyplan.toml");
    }

    std::fs::create_dir_all("datasets")?;
    let sample_path = std::path::Path::new("datasets/sample.toml");
    if sample_path.exists() {
        println!("datasets/sample.toml already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_DATASET)?;
        println!("Created datasets/sample.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: studyplan validate --dataset datasets/sample.toml");
    println!("  2. Run: studyplan recommend --user alice");
    println!("  3. Run: studyplan unlock --user alice --point fractions");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# studyplan configuration

dataset = "datasets/sample.toml"
max_results = 20
session_limit = 100
recent_window = 3
parallelism = 4
"#;

const SAMPLE_DATASET: &str = r#"[[points]]
id = "counting"
title = "Counting"
subject = "arithmetic"
difficulty = 1
estimated_time = 15

[[points]]
id = "addition"
title = "Addition"
subject = "arithmetic"
difficulty = 1
estimated_time = 20
prerequisites = ["counting"]

[[points]]
id = "multiplication"
title = "Multiplication"
subject = "arithmetic"
difficulty = 2
estimated_time = 30
prerequisites = ["addition"]

[[points]]
id = "division"
title = "Division"
subject = "arithmetic"
difficulty = 3
estimated_time = 40
prerequisites = ["multiplication"]

[[points]]
id = "fractions"
title = "Fractions"
subject = "arithmetic"
difficulty = 3
estimated_time = 45
prerequisites = ["division", "multiplication"]

[[points]]
id = "shapes"
title = "Basic shapes"
subject = "geometry"
difficulty = 1
estimated_time = 20

[[points]]
id = "area"
title = "Area"
subject = "geometry"
difficulty = 3
estimated_time = 40
prerequisites = ["shapes", "multiplication"]

[[learners.alice.progress]]
point_id = "counting"
status = "completed"
best_score = 95.0
quiz_attempts = 1
completed_at = "2024-05-01T10:00:00Z"

[[learners.alice.progress]]
point_id = "addition"
status = "completed"
best_score = 80.0
quiz_attempts = 2
completed_at = "2024-05-03T10:00:00Z"

[[learners.alice.progress]]
point_id = "multiplication"
status = "in_progress"

[[learners.alice.sessions]]
start_time = "2024-05-03T09:15:00Z"
duration_secs = 2700
subject = "arithmetic"
point_id = "addition"

[[learners.alice.wrong_answers]]
point_id = "addition"
question_id = "add-carry-3"
subject = "arithmetic"
retry_count = 1

[learners.alice.assessment]
assessed_at = "2024-04-28T12:00:00Z"

[learners.alice.assessment.skill_profile]
arithmetic = 45.0
geometry = 20.0

[learners.alice.assessment.weaknesses]
geometry = "struggles with spatial reasoning"
"#;
