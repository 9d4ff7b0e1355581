//! The studyplan command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::OutputFormat;

#[derive(Parser)]
#[command(
    name = "studyplan",
    version,
    about = "Prerequisite-aware study recommendations"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend what to study next
    Recommend {
        /// Learner id, or several comma-separated ids
        #[arg(long)]
        user: String,

        /// Maximum recommendations per learner (at most 50)
        #[arg(long)]
        limit: Option<usize>,

        /// Output format: table, json, markdown
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Also save the plan as JSON (single learner only)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Dataset file (overrides the config)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render a plan saved with `recommend --output`
    Show {
        /// Saved plan JSON
        #[arg(long)]
        plan: PathBuf,

        /// Output format: table, json, markdown
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Check whether a knowledge point is unlocked for a learner
    Unlock {
        /// Learner id
        #[arg(long)]
        user: String,

        /// Knowledge point id
        #[arg(long)]
        point: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Dataset file (overrides the config)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a dataset file
    Validate {
        /// Path to the dataset TOML
        #[arg(long)]
        dataset: PathBuf,
    },

    /// Create a starter config and sample dataset
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("studyplan=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Recommend {
            user,
            limit,
            format,
            output,
            dataset,
            config,
        } => commands::recommend::execute(user, limit, format, output, dataset, config).await,
        Commands::Show { plan, format } => commands::show::execute(plan, format),
        Commands::Unlock {
            user,
            point,
            json,
            dataset,
            config,
        } => commands::unlock::execute(user, point, json, dataset, config).await,
        Commands::Validate { dataset } => commands::validate::execute(dataset),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
