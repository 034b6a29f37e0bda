//! gram-send - Background daemon for scheduled publishing
//!
//! Monitors the scheduled post queue and automatically publishes content
//! at the scheduled time.

use clap::Parser;
use libgramcast::{Config, Database, GraphPublisher, Reconciler, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "gram-send")]
#[command(version)]
#[command(about = "Background daemon for scheduled publishing")]
#[command(long_about = "\
gram-send - Background daemon for scheduled publishing

DESCRIPTION:
    gram-send is a long-running daemon that monitors the Gramcast queue
    and automatically publishes scheduled posts at the right time.

    Each tick it queries the database for pending posts whose scheduled
    time has arrived, resolves the owner's Instagram connection, performs
    the two-phase container publish against the Graph API, and records
    the per-post outcome. One post's failure never affects the others.

USAGE:
    # Run in foreground (logs to stderr)
    gram-send

    # Run with custom poll interval
    gram-send --poll-interval 30

    # Enable verbose logging
    gram-send --verbose

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current tick)

CONFIGURATION:
    Configuration file: ~/.config/gramcast/config.toml
    Database location: ~/.local/share/gramcast/posts.db

    [scheduling]
    poll_interval = 60              # seconds between ticks
    # max_concurrent_publishes = 8  # omit for unbounded fan-out

    The publish access token is read from GRAMCAST_ACCESS_TOKEN or the
    configured instagram.token_file.

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime or configuration error

For more information, visit: https://github.com/gramcast/gramcast
")]
struct Cli {
    /// Poll interval in seconds (overrides config)
    #[arg(long, value_name = "SECONDS")]
    #[arg(help = "How often to check for scheduled posts (default: 60)")]
    poll_interval: Option<u64>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    #[arg(help = "Enable verbose logging (useful for debugging)")]
    verbose: bool,

    /// Run once and exit (for testing)
    #[arg(long, hide = true)]
    #[arg(help = "Process due posts once and exit (for testing)")]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Everything the pipeline needs is resolved once, up front
    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;
    let publisher = Arc::new(GraphPublisher::from_config(&config)?);
    let reconciler = Reconciler::new(db, publisher)
        .with_max_concurrent(config.scheduling.max_concurrent_publishes);

    info!("gram-send daemon starting");

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    let poll_interval = cli.poll_interval.unwrap_or(config.scheduling.poll_interval);
    info!("Poll interval: {}s", poll_interval);

    if cli.once {
        run_tick(&reconciler).await;
        info!("gram-send: processed posts once, exiting");
    } else {
        run_daemon_loop(&reconciler, poll_interval, shutdown).await;
    }

    info!("gram-send daemon stopped");
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Set up signal handlers for graceful shutdown
#[cfg(unix)]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(|e| {
        libgramcast::GramcastError::InvalidInput(format!("Signal setup failed: {}", e))
    })?;

    std::thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGTERM | SIGINT => {
                    info!("Received shutdown signal, stopping gracefully...");
                    shutdown.store(true, Ordering::Relaxed);
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn setup_signal_handlers(_shutdown: Arc<AtomicBool>) -> Result<()> {
    Ok(())
}

/// Main daemon loop
async fn run_daemon_loop(reconciler: &Reconciler, poll_interval: u64, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("Shutdown requested, stopping daemon loop");
            break;
        }

        run_tick(reconciler).await;

        // Sleep until the next poll, checking for shutdown every second
        for _ in 0..poll_interval {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            sleep(Duration::from_secs(1)).await;
        }
    }
}

/// Run one tick, logging the outcome.
///
/// A tick-level failure (e.g. the store being unreachable) is logged and
/// swallowed; the next tick retries independently.
async fn run_tick(reconciler: &Reconciler) {
    match reconciler.run_tick().await {
        Ok(outcome) if outcome.selected == 0 => {}
        Ok(outcome) => {
            info!(
                "Tick complete: {} due, {} published, {} failed",
                outcome.selected, outcome.published, outcome.failed
            );
        }
        Err(e) => {
            error!("Error processing scheduled posts: {}", e);
        }
    }
}
