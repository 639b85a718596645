//! migra-web - dashboard over the pipeline database

use clap::Parser;
use migra_common::db::connect_readonly;
use migra_common::{Environment, Settings};
use migra_web::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "migra-web", about = "County socioeconomic dashboard")]
struct Args {
    /// Environment: dev or prod
    #[arg(long, env = "MIGRA_ENV")]
    env: Option<String>,

    /// Port to listen on
    #[arg(long, env = "MIGRA_WEB_PORT", default_value_t = 8750)]
    port: u16,

    /// SQLite connection string, e.g. sqlite://data/migra.db
    #[arg(long)]
    database_url: Option<String>,
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
    let settings = Settings::resolve(environment, args.database_url.as_deref(), false)?;

    let db = connect_readonly(&settings.database_url).await.map_err(|e| {
        anyhow::anyhow!(
            "cannot open {} read-only ({}); run migra-pipeline first",
            settings.database_url,
            e
        )
    })?;

    let app = build_router(AppState::new(db));
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("migra-web ({}) listening on {}", settings.environment, addr);
    axum::serve(listener, app).await?;

    Ok(())
}
