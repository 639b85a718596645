//! migra-pipeline - batch ETL over county socioeconomic data
//!
//! Acquires raw census, Data Commons, and manually dropped datasets,
//! cleans them into canonical per-dataset tables, derives forecasts and
//! composite indices, and loads everything into the SQLite database the
//! dashboard serves from.

use clap::{Parser, Subcommand};
use migra_common::{Environment, Settings};
use migra_pipeline::paths::DataPaths;
use migra_pipeline::{acquisition, analysis, cleaning, load};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "migra-pipeline", about = "County socioeconomic data pipeline")]
struct Args {
    /// Environment: dev or prod
    #[arg(long, env = "MIGRA_ENV")]
    env: Option<String>,

    /// SQLite connection string, e.g. sqlite://data/migra.db
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Download raw datasets and verify manual drops
    Acquire,
    /// Clean raw files into canonical tables
    Clean,
    /// Derive forecasts, indices, and rankings from cleaned tables
    Analyze,
    /// Load processed tables into the database
    Load,
    /// Run every stage in order
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let environment = Environment::resolve(args.env.as_deref())?;
    let command = args.command.unwrap_or(Command::Run);

    let require_api_key = matches!(command, Command::Acquire | Command::Run);
    let settings = Settings::resolve(environment, args.database_url.as_deref(), require_api_key)?;
    let paths = DataPaths::new(&settings.data_root);

    info!("Starting migra-pipeline ({})", settings.environment);

    match command {
        Command::Acquire => acquisition::run(&settings, &paths).await?,
        Command::Clean => cleaning::run(&paths)?,
        Command::Analyze => analysis::run(&paths)?,
        Command::Load => load::run(&settings, &paths).await?,
        Command::Run => {
            acquisition::run(&settings, &paths).await?;
            cleaning::run(&paths)?;
            analysis::run(&paths)?;
            load::run(&settings, &paths).await?;
        }
    }

    Ok(())
}
