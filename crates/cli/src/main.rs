//! `briefctl` -- operational orchestrator for the briefing pipeline.
//!
//! Prepares the dependent backing services (embedding backend, feed
//! gateway), keeps the backend in exactly one of its two runtime modes,
//! and runs the collection worker for one or all registered jobs with
//! per-job log capture and aggregate success/failure reporting.

mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::config::OrchestratorConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "briefctl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse();
    let config = OrchestratorConfig::from_env();
    tracing::debug!(
        env_file = %config.env_file.display(),
        worker = %config.worker_program,
        "Loaded orchestrator configuration"
    );

    let status = match args.command {
        Command::Run { job, flags, json } => {
            commands::run_single(&config, &job, flags.to_params(), json).await?
        }
        Command::RunAll { flags, json } => {
            commands::run_batch(&config, flags.to_params(), json).await?
        }
        Command::Mode { mode } => {
            commands::switch_mode(&config, &mode).await?;
            0
        }
        Command::Latest { job } => {
            commands::show_latest(&config, &job)?;
            0
        }
    };

    std::process::exit(status);
}
