use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use training_etl::app::ports::DestinationConnector;
use training_etl::config::{DestinationConfig, PipelineConfig};
use training_etl::infra::in_memory_destination::InMemoryDestination;
use training_etl::infra::mysql_adapter::MySqlConnector;
use training_etl::logging;
use training_etl::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "training_etl")]
#[command(about = "Load employee training records from CSV into MySQL")]
#[command(version = "0.1.0")]
struct Cli {
    /// Pipeline config file (defaults to ./etl.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage the first input file as raw records
    Extract,
    /// Clean the raw records and stage the result
    Transform,
    /// Insert the cleaned records into the destination table
    Load {
        /// Use an in-memory table instead of MySQL
        #[arg(long)]
        dry_run: bool,
    },
    /// Run extract, transform and load in order
    Run {
        /// Use an in-memory table instead of MySQL
        #[arg(long)]
        dry_run: bool,
    },
}

fn connector(dry_run: bool, config: &PipelineConfig) -> Box<dyn DestinationConnector> {
    if dry_run {
        Box::new(InMemoryDestination::new())
    } else {
        Box::new(MySqlConnector::new(config.connect_timeout()))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match PipelineConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };
    let _log_guard = match logging::init_logging(&config.log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed: {:#}", e);
            println!("❌ Run failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: PipelineConfig) -> anyhow::Result<()> {
    info!(?config, "Loaded pipeline config");
    let pipeline = Pipeline::new(config.clone());

    match command {
        Commands::Extract => {
            let report = pipeline.extract()?;
            println!(
                "📥 Extracted {} rows from {}",
                report.rows,
                report.source_file.display()
            );
        }
        Commands::Transform => {
            let report = pipeline.transform()?;
            println!(
                "🔧 Transformed data. Dropped {} rows with missing values and {} with invalid dates. Remaining: {}",
                report.dropped_missing_values, report.dropped_invalid_dates, report.remaining_rows
            );
        }
        Commands::Load { dry_run } => {
            let destination = DestinationConfig::from_env()?;
            let connector = connector(dry_run, &config);
            let report = pipeline.load(&destination, connector.as_ref()).await?;
            println!("💾 Loaded {} rows into {}", report.rows_inserted, report.table);
        }
        Commands::Run { dry_run } => {
            let connector = connector(dry_run, &config);
            let report = pipeline
                .run(DestinationConfig::from_env, connector.as_ref())
                .await?;
            println!("\n📊 Pipeline Results:");
            println!("   Source file: {}", report.extract.source_file.display());
            println!("   Extracted: {}", report.extract.rows);
            println!(
                "   Dropped (missing values): {}",
                report.transform.dropped_missing_values
            );
            println!(
                "   Dropped (invalid dates): {}",
                report.transform.dropped_invalid_dates
            );
            println!("   Loaded: {}", report.load.rows_inserted);
        }
    }
    Ok(())
}
