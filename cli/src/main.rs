//! `firefly`: command-line client for a Firefly III server.
//!
//! Connection settings come from `FIREFLY_III_URL` and `FIREFLY_III_TOKEN`,
//! read from the environment or a `.env` file (see `firefly_core::settings`).

mod commands;
mod display;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use firefly_core::{FireflyClient, Settings};

use crate::commands::{handle_command, Command};

#[derive(Parser)]
#[command(
    name = "firefly",
    version,
    about = "Command-line client for the Firefly III personal finance manager"
)]
struct Cli {
    /// Log every request, retry and response
    #[arg(long, global = true)]
    debug: bool,

    /// Read settings from this file instead of ./.env
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn init_tracing(debug: bool) -> Result<()> {
    let default = if debug { "firefly=debug" } else { "firefly=info" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()?;
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.env_file {
        Some(path) => Settings::from_env_file(path),
        None => Settings::from_env(),
    }
    .context("invalid configuration")?;

    let debug = cli.debug || settings.debug;
    init_tracing(debug)?;
    debug!(?settings, "loaded settings");

    let client = FireflyClient::new(settings.with_debug(debug)).context("failed to create HTTP client")?;
    handle_command(&client, cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
