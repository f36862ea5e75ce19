//! Vanitywatch - Discord vanity URL availability monitor.
//!
//! # Commands
//!
//! - `vanitywatch run`: Start the monitor daemon
//! - `vanitywatch migrate`: Migrate a legacy state file to the current schema
//!
//! # Environment Variables
//!
//! See the [`vanitywatch::config`] module for available configuration options.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use directories::BaseDirs;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vanitywatch::checker::InviteChecker;
use vanitywatch::config::Config;
use vanitywatch::health::{create_router, AppState};
use vanitywatch::notifier::DiscordNotifier;
use vanitywatch::persistence::StatePersister;
use vanitywatch::scheduler::Scheduler;
use vanitywatch::store::MonitorStore;

/// Default state directory name relative to home.
const DEFAULT_STATE_DIR: &str = ".vanitywatch";

/// Default state file name.
const DEFAULT_STATE_FILE: &str = "monitors.json";

/// Vanitywatch - Discord vanity URL availability monitor.
///
/// Polls monitored vanity codes on a fixed interval and notifies the
/// registering channel once when a code becomes available.
#[derive(Parser, Debug)]
#[command(name = "vanitywatch")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    VANITYWATCH_BOT_TOKEN            Bot token (required for 'run')
    VANITYWATCH_STATE_FILE           State file (default: ~/.vanitywatch/monitors.json)
    VANITYWATCH_CHECK_INTERVAL_SECS  Seconds between checks (default: 30)
    VANITYWATCH_REQUEST_TIMEOUT_SECS Per-request timeout (default: 5)
    VANITYWATCH_API_BASE             Discord API base URL
    VANITYWATCH_PORT                 Health endpoint port (default: 8080)

EXAMPLES:
    # Start the monitor
    export VANITYWATCH_BOT_TOKEN=...
    vanitywatch run

    # Migrate an old state file in place
    vanitywatch migrate --state-file ./monitors.json
")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the monitor daemon.
    ///
    /// Loads the state file (migrating legacy data if found), then runs the
    /// availability scheduler and the liveness endpoint until shutdown.
    Run,

    /// Migrate a legacy state file to the current schema.
    ///
    /// Loads the file, rewrites it in the versioned composite-key schema,
    /// and reports the entry count. A no-op for files already migrated.
    Migrate {
        /// State file path (default: VANITYWATCH_STATE_FILE or ~/.vanitywatch/monitors.json).
        #[arg(short, long)]
        state_file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    match cli.command {
        Command::Run => runtime.block_on(run_daemon()),
        Command::Migrate { state_file } => runtime.block_on(run_migrate(state_file)),
    }
}

/// Runs the monitor daemon.
async fn run_daemon() -> Result<()> {
    init_logging();

    info!("Starting vanitywatch");

    let config = Config::from_env().context("Failed to load configuration")?;

    info!(
        state_file = %config.state_file.display(),
        check_interval_secs = config.check_interval_secs,
        api_base = %config.api_base,
        "Configuration loaded"
    );

    // Load persisted monitors. A corrupt state file aborts startup rather
    // than silently discarding user monitors.
    let store = MonitorStore::new();
    let persister = StatePersister::new(config.state_file.clone());
    let entries = persister.load().await.context(format!(
        "Failed to load state file {}",
        config.state_file.display()
    ))?;

    info!(monitors = entries.len(), "State loaded");
    store.replace_all(entries).await;

    // Wire up the scheduler with its collaborators.
    let checker = Arc::new(InviteChecker::new(
        config.api_base.clone(),
        config.request_timeout(),
    ));
    let notifier = Arc::new(DiscordNotifier::new(
        config.api_base.clone(),
        config.bot_token.clone(),
        config.request_timeout(),
    ));
    let scheduler = Scheduler::new(
        store.clone(),
        persister.clone(),
        checker,
        notifier,
        config.check_interval(),
    );
    let scheduler_handle = tokio::spawn(async move { scheduler.run().await });

    // Liveness endpoint.
    let app = create_router(AppState::new(store.clone()));
    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .context(format!("Failed to bind to {bind_addr}"))?;

    info!(address = %bind_addr, "Health endpoint listening");
    info!("Monitor running. Press Ctrl+C to stop.");

    let server = axum::serve(listener, app).with_graceful_shutdown(wait_for_shutdown());
    if let Err(err) = server.await {
        error!(error = %err, "Health endpoint error");
    }

    // Graceful shutdown: stop checking, then one final best-effort save.
    info!("Shutting down...");
    scheduler_handle.abort();

    match persister.save(&store).await {
        Ok(()) => info!("Final state saved"),
        Err(err) => error!(error = %err, "Failed to save state during shutdown"),
    }

    info!("Monitor stopped");
    Ok(())
}

/// Runs the migrate command against a state file.
async fn run_migrate(state_file: Option<PathBuf>) -> Result<()> {
    init_logging();

    let path = match state_file {
        Some(path) => path,
        None => default_state_file()?,
    };

    let persister = StatePersister::new(path.clone());
    let entries = persister
        .load()
        .await
        .context(format!("Failed to migrate {}", path.display()))?;

    println!("{}: {} monitor(s) in current schema", path.display(), entries.len());
    Ok(())
}

/// Resolves the state file path from the environment or the default location.
fn default_state_file() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("VANITYWATCH_STATE_FILE") {
        return Ok(PathBuf::from(path));
    }

    let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
    Ok(base_dirs
        .home_dir()
        .join(DEFAULT_STATE_DIR)
        .join(DEFAULT_STATE_FILE))
}

/// Initializes the logging subsystem.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
