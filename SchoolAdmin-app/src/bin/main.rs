use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use school_admin_app::cli::Args;
use school_admin_app::commands::execute;
use school_admin_data::config::ApiConfig;
use school_admin_data::repository::{HttpResourceRepository, ResourceRepositoryTrait};

/// The main entry point for the SchoolAdmin console
///
/// This function:
/// 1. Initializes environment variables from .env file
/// 2. Sets up tracing for logging
/// 3. Reads the backend configuration
/// 4. Runs the requested command against the backend
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables from .env file
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    // Initialize tracing for structured logging; stdout is reserved for command output
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(false)
            .with_ansi(true)
            .with_timer(fmt::time::uptime())
            .with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    let config = ApiConfig::from_env().context("backend configuration is incomplete")?;
    info!("Using SchoolAdmin backend at {}", config.base_url);

    let repository: Arc<dyn ResourceRepositoryTrait> =
        Arc::new(HttpResourceRepository::new(&config).context("cannot build HTTP client")?);

    match execute(repository, args.command).await {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            Err(e)
        }
    }
}
