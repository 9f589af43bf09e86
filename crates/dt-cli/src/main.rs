use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use dt_core::SystemClock;
use tracing_subscriber::EnvFilter;

use dt_cli::commands::{breadcrumb, report, reset, status, total, watch};
use dt_cli::{Cli, Commands, Config};

/// Load config, ensuring the ledger's parent directory exists.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.ledger_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create ledger directory")?;
    }

    Ok(config)
}

/// Runs the event loop on a dedicated runtime.
fn run_watch(config: &Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let result = runtime.block_on(watch::run(config, SystemClock, input, &mut stdout));

    // A pending stdin read never completes on its own; the ledger has
    // already been written by the time `run` returns.
    runtime.shutdown_background();
    result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr; `dt watch` uses stdout for status lines
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut stdout = std::io::stdout();

    match &cli.command {
        Some(Commands::Watch) => {
            let config = load_config(cli.config.as_deref())?;
            run_watch(&config)?;
        }
        Some(Commands::Report { path, json }) => {
            let config = load_config(cli.config.as_deref())?;
            report::run(&mut stdout, &config, path.as_deref(), *json)?;
        }
        Some(Commands::Total { path, json }) => {
            let config = load_config(cli.config.as_deref())?;
            total::run(&mut stdout, &config, path, *json)?;
        }
        Some(Commands::Breadcrumb { path, json }) => {
            let config = load_config(cli.config.as_deref())?;
            breadcrumb::run(&mut stdout, &config, path, *json)?;
        }
        Some(Commands::Status) => {
            let config = load_config(cli.config.as_deref())?;
            status::run(&mut stdout, &config)?;
        }
        Some(Commands::Reset { path }) => {
            let config = load_config(cli.config.as_deref())?;
            reset::run(&mut stdout, &config, path)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
