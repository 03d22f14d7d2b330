//! Courier CLI
//!
//! Sends one message to a list of recipients through the SMTP relay named in
//! a TOML configuration file, one delivery attempt per recipient.

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use courier_dispatch::DispatchConfig;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

/// Send email to a list of recipients, one by one.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        long,
        short,
        env = "COURIER_CONFIG",
        default_value = "courier.toml",
        global = true
    )]
    config: PathBuf,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a message to every recipient.
    Send(commands::send::SendArgs),
    /// Check that the SMTP relay is reachable.
    Check,
}

/// Install the stderr `fmt` subscriber. `RUST_LOG` wins over the config's
/// `debug` flag.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = DispatchConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    init_tracing(config.debug);
    debug!(
        path = %cli.config.display(),
        host = %config.smtp.host,
        language = %config.language,
        "configuration loaded"
    );

    match cli.command {
        Command::Send(args) => commands::send::run(config, &args, &cli.format).await,
        Command::Check => commands::check::run(&config).await,
    }
}
