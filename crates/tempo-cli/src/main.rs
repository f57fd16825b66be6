use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tempo_cli::commands::sync;
use tempo_cli::date::parse_date_arg;
use tempo_cli::{Cli, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    // Range arguments are validated before configuration or the network
    // come into play.
    let from = cli
        .from
        .as_deref()
        .map(parse_date_arg)
        .transpose()
        .context("invalid value for --from argument")?;
    let until = cli
        .until
        .as_deref()
        .map(parse_date_arg)
        .transpose()
        .context("invalid value for --until argument")?;

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let report = sync::run(&config, from, until)?;
    println!(
        "Submitted {} worklog(s), ignored {} record(s).",
        report.submitted, report.ignored
    );
    Ok(())
}
