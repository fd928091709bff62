//! # Configuration State
//!
//! Read-only process configuration, resolved once at startup.

use std::path::PathBuf;

use depot_sync::SyncConfig;

/// Process configuration snapshot. Read-only after initialization.
#[derive(Debug, Clone)]
pub struct ConfigState {
    /// Stable device UUID.
    pub device_id: String,

    /// Human-readable device name.
    pub device_name: String,

    /// Directory holding the database file.
    pub data_dir: PathBuf,

    /// True when no remote endpoint is configured; the install runs
    /// local-only and pushes are simulated.
    pub offline: bool,
}

impl ConfigState {
    /// Builds the state from the loaded sync config and resolved data dir.
    pub fn new(config: &SyncConfig, data_dir: PathBuf) -> Self {
        ConfigState {
            device_id: config.device.id.clone(),
            device_name: config.device.name.clone(),
            data_dir,
            offline: config.is_offline(),
        }
    }
}
