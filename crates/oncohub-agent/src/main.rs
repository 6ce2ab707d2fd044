//! Oncohub: clinical report retrieval and mutation evidence normalisation.
//! Entry point for the `oncohub` binary.

mod cli;
mod commands;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use oncohub_common::OncohubError;
use oncohub_config::Config;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("oncohub=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "Oncohub starting");

    run(cli).await
}

/// Dispatches the subcommand. Clinical errors get their user-facing message
/// printed before being returned.
async fn run(cli: Cli) -> anyhow::Result<()> {
    let result = dispatch(cli).await;
    if let Err(e) = &result {
        error!(error = %e, "Command failed");
        if let Some(err) = e.downcast_ref::<OncohubError>() {
            eprintln!("{}", err.user_message());
        }
    }
    result
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    match cli.command {
        Commands::LoginAndFetch { username, patient_id, out } => {
            commands::login_and_fetch(&config, &username, &patient_id, out).await
        }
        Commands::Normalize { analysis, json } => commands::normalize(&config, &analysis, json),
        Commands::Config => {
            print!("{}", commands::show_config(&config)?);
            Ok(())
        }
    }
}
