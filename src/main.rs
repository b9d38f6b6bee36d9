//! Event-Relay main entry point
//!
//! This is the command-line interface for the Event-Relay listing relay.

use clap::Parser;
use event_relay::config::{load_config_with_hash, Config};
use event_relay::crawler::{run_relay, Scheduler};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Event-Relay: relays new event listings to an ingestion API
///
/// Event-Relay polls event-directory pages on a fixed interval, extracts
/// event rows, skips ones it has already sent and posts the rest to the
/// configured ingestion endpoint.
#[derive(Parser, Debug)]
#[command(name = "event-relay")]
#[command(version = "1.0.0")]
#[command(about = "Relays new event listings to an ingestion API", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single cycle and exit
    #[arg(long, conflicts_with = "dry_run")]
    once: bool,

    /// Validate config and show what would be polled without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.once {
        handle_once(&config).await?;
    } else {
        handle_relay(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("event_relay=info,warn"),
            1 => EnvFilter::new("event_relay=debug,info"),
            2 => EnvFilter::new("event_relay=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be polled
fn handle_dry_run(config: &Config) {
    println!("=== Event-Relay Dry Run ===\n");

    println!("Sources ({}):", config.sources.urls.len());
    for url in &config.sources.urls {
        println!("  - {}", url);
    }

    println!("\nSchedule:");
    println!("  Interval: {}h", config.schedule.interval_hours);
    println!("  Max records per source: {}", config.schedule.max_records);

    println!("\nRender:");
    println!(
        "  Readiness timeout: {}s",
        config.render.readiness_timeout_secs
    );
    println!("  User agent: {}", config.render.user_agent);

    println!("\nIngest:");
    println!("  Endpoint: {}", config.ingest.endpoint);
    println!("  Delivery: {:?}", config.ingest.delivery);

    match &config.state {
        Some(state) => println!("\nState: {}", state.path),
        None => println!("\nState: in-memory only"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --once mode: a single cycle, then exit
async fn handle_once(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut scheduler = Scheduler::from_config(config)?;
    let state = scheduler.initial_state()?;
    let state = scheduler.run_once(state).await;

    tracing::info!(
        "Single cycle finished, {} fingerprints across {} sources",
        state.total_fingerprints(),
        state.len()
    );
    Ok(())
}

/// Handles the main relay loop
async fn handle_relay(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Polling {} sources every {}h",
        config.sources.urls.len(),
        config.schedule.interval_hours
    );

    match run_relay(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Relay failed: {}", e);
            Err(e.into())
        }
    }
}
