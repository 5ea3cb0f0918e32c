// League stats entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout stays clean JSON)
// 2. Load config, copying missing files from defaults/
// 3. Build the CSV source
// 4. Fetch every configured sheet concurrently
// 5. Derive the report and print the requested view

mod cli;
mod commands;
mod fetch;

use anyhow::Context;
use clap::Parser;
use pennant_core::config;
use pennant_core::pipeline;
use pennant_core::source::{CsvDirSource, RowSource};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    let cli = cli::Cli::parse();

    // 2. Load config
    let config = config::load_config(&cli.root).context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} playoff rounds, display count {}",
        config.league.name,
        config.playoffs.rounds.len(),
        config.leaderboards.display_count
    );

    // 3. Source. Each sheet is read once per run, so no cache sits in front.
    let data_dir = cli.root.join(&config.source.data_dir);
    let source: Arc<dyn RowSource> = Arc::new(CsvDirSource::new(&data_dir));
    info!("Reading sheets from {}", data_dir.display());

    // 4. Fetch
    let snapshot = fetch::fetch_snapshot(source, config.sheets.ranges())
        .await
        .context("failed to load league sheets")?;

    // 5. Derive and print
    let report = pipeline::derive_report(&snapshot, &config, chrono::Utc::now());
    let value = commands::render(&cli.command, &report)?;
    let output = if cli.compact {
        serde_json::to_string(&value)
    } else {
        serde_json::to_string_pretty(&value)
    }
    .context("failed to serialize output")?;
    println!("{output}");

    Ok(())
}

/// Initialize the tracing subscriber.
///
/// Logs go to stderr. Set `RUST_LOG` to override the default filter.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pennant=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
