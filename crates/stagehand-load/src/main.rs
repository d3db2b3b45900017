//! stagehand CLI
//!
//! Prints the statements of a CSV load and its subset views without
//! connecting to a warehouse.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use stagehand_core::{InferenceConfig, Namespace};
use stagehand_load::loader::{DEFAULT_MERGE_KEY, DEFAULT_STAGE};
use stagehand_load::{create_subsets, read_subset_config, DryRunSession, Loader, Pipeline};

/// Schema inference and SQL planning for staged CSV loads.
#[derive(Parser)]
#[command(name = "stagehand")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Default database for partial names.
    #[arg(long, env = "SNOWFLAKE_DATABASE", default_value = "ETL_DB")]
    database: String,

    /// Default schema for partial names.
    #[arg(long, env = "SNOWFLAKE_SCHEMA", default_value = "PUBLIC")]
    schema: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the inferred column types of a CSV file as JSON.
    Infer {
        /// CSV file with a header row.
        #[arg(long)]
        csv: PathBuf,

        /// Minimum share of JSON containers for a VARIANT column.
        #[arg(long, default_value_t = 0.6)]
        json_threshold: f64,

        /// Minimum share of parseable dates for a DATE column.
        #[arg(long, default_value_t = 0.8)]
        date_threshold: f64,
    },

    /// Print every statement of a load (and optional subset views).
    Plan {
        /// CSV file with a header row.
        #[arg(long)]
        csv: PathBuf,

        /// Target table.
        #[arg(short, long, default_value = "events")]
        table: String,

        /// Merge key column.
        #[arg(short, long, default_value = DEFAULT_MERGE_KEY)]
        key: String,

        /// Internal stage name.
        #[arg(long, default_value = DEFAULT_STAGE)]
        stage: String,

        /// Subset view definitions (YAML, or JSON for a `.json` file).
        #[arg(long)]
        subsets: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let ns = Namespace::new(cli.database, cli.schema);

    match cli.command {
        Commands::Infer {
            csv,
            json_threshold,
            date_threshold,
        } => {
            let config = InferenceConfig::default()
                .with_json_threshold(json_threshold)
                .with_date_threshold(date_threshold);
            let types = Pipeline::new("events").inference(config).infer(&csv)?;
            println!("{}", serde_json::to_string_pretty(&types)?);
        }

        Commands::Plan {
            csv,
            table,
            key,
            stage,
            subsets,
        } => {
            info!("Dry run mode - SQL will be printed but not executed.");

            // Subset sources are assumed to share the CSV's columns.
            let pipeline = Pipeline::new(table).checks(false);
            let columns: Vec<String> = pipeline.infer(&csv)?.columns().map(str::to_string).collect();
            let session = DryRunSession::new().with_columns(columns);
            let mut loader = Loader::new(session, ns.clone()).stage(stage).merge_key(key);

            let mut summary = pipeline.run(&mut loader, &csv).await?;

            if let Some(path) = subsets {
                let config = read_subset_config(&path)?;
                summary.views = create_subsets(loader.session_mut(), &ns, &config).await?;
            }

            eprintln!("{summary}");
        }
    }

    Ok(())
}
