//! # Depot Agent Library
//!
//! Core library for the Depot agent process: the local-first data layer a
//! warehouse UI talks to.
//!
//! ## Module Organization
//! ```text
//! depot_agent/
//! ├── lib.rs          ◄─── You are here (context, startup, run loop)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── sync.rs     ◄─── Sync coordinator state
//! │   └── config.rs   ◄─── Configuration state
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── inventory.rs
//! │   ├── pull_sheet.rs
//! │   ├── sync.rs
//! │   └── lifecycle.rs
//! └── error.rs        ◄─── ApiError + response envelope
//! ```

pub mod commands;
pub mod error;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use state::{ConfigState, DbState, SyncState};

use depot_db::{Database, DbConfig};
use depot_sync::{SimulatedBackend, SyncConfig, SyncCoordinator};

// =============================================================================
// Application Context
// =============================================================================

/// Everything a command handler can ask for, built once at startup.
///
/// The context owns the explicit open/close lifecycle of the store: the
/// entry point constructs it after `Database::new` succeeds and closes the
/// pool when the run loop exits. Nothing else opens connections.
pub struct AppContext {
    /// The embedded store.
    pub db: DbState,

    /// The sync coordinator.
    pub sync: SyncState,

    /// Read-only process configuration.
    pub config: ConfigState,

    /// Fired by the `quit` command; the run loop waits on it.
    shutdown: Arc<Notify>,
}

impl AppContext {
    /// Builds the context over an already-open store.
    ///
    /// The remote push stays simulated until a real backend client exists;
    /// swapping one in means handing a different [`depot_sync::RemoteBackend`]
    /// to the coordinator here.
    pub fn new(db: Database, config: SyncConfig, data_dir: PathBuf) -> Self {
        let coordinator =
            SyncCoordinator::new(db.clone(), Arc::new(SimulatedBackend), config.policy);

        AppContext {
            db: DbState::new(db),
            sync: SyncState::new(Arc::new(coordinator)),
            config: ConfigState::new(&config, data_dir),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Requests a graceful shutdown of the run loop.
    pub fn request_shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Resolves once shutdown has been requested.
    pub async fn shutdown_requested(&self) {
        self.shutdown.notified().await;
    }

    /// Closes the store. Called exactly once, by the run loop on exit.
    pub async fn close(&self) {
        self.db.inner().close().await;
    }
}

// =============================================================================
// Startup
// =============================================================================

/// Runs the agent process.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Agent Startup                                     │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter                                │
/// │     • Default: INFO, can be overridden with RUST_LOG                    │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • depot.toml from the platform config dir                           │
/// │     • DEPOT_* environment overrides                                     │
/// │                                                                         │
/// │  3. Open the Store ───────────────────────────────────────────────────► │
/// │     • SQLite with WAL mode in the platform data dir                     │
/// │     • Run pending migrations (failure aborts startup)                   │
/// │                                                                         │
/// │  4. Build Context ────────────────────────────────────────────────────► │
/// │     • DbState, SyncState (simulated backend), ConfigState               │
/// │                                                                         │
/// │  5. Serve until Ctrl-C or the quit command ───────────────────────────► │
/// │                                                                         │
/// │  6. Close the store and exit ─────────────────────────────────────────► │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Depot agent");

    let config = SyncConfig::load_or_default(None);
    let data_dir = get_data_dir()?;
    let db_path = data_dir.join("depot.db");
    info!(?db_path, "Database path determined");

    // Opening the store runs migrations; a migration fault aborts startup
    // rather than serving commands against a half-migrated schema.
    let db = Database::new(DbConfig::new(db_path)).await?;
    info!("Database connected and migrations applied");

    let ctx = AppContext::new(db, config, data_dir);

    let status = ctx.sync.coordinator().status().await?;
    info!(
        device = %ctx.config.device_name,
        offline = ctx.config.offline,
        pending_changes = status.pending,
        failed_changes = status.failed,
        "Agent ready"
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C");
        }
        _ = ctx.shutdown_requested() => {
            info!("Shutdown requested via quit command");
        }
    }

    ctx.close().await;
    info!("Agent stopped");

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=depot=trace` - Show trace for depot crates only
/// - Default: INFO level, sqlx chatter suppressed
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,depot=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

/// Determines the data directory holding the database file.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.depot.warehouse/`
/// - **Windows**: `%APPDATA%\depot\warehouse\data\`
/// - **Linux**: `~/.local/share/warehouse/`
///
/// ## Development Override
/// Set `DEPOT_DATA_DIR` to use a custom directory.
fn get_data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    // Check for override
    if let Ok(dir) = std::env::var("DEPOT_DATA_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)?;
        return Ok(dir);
    }

    // Use platform-specific app data directory
    let proj_dirs = directories::ProjectDirs::from("com", "depot", "warehouse")
        .ok_or("Could not determine app data directory")?;

    let data_dir = proj_dirs.data_dir();

    // Create directory if it doesn't exist
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.to_path_buf())
}
