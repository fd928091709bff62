//! # Sync Configuration
//!
//! Configuration management for the sync layer.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DEPOT_REMOTE_URL=https://api.example.com/sync                      │
//! │     DEPOT_DEVICE_ID=abc-123                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/depot/depot.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.depot.warehouse/depot.toml (mac) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     no remote (offline), auto-generated device_id                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # depot.toml
//! [device]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! name = "Warehouse Front Desk"
//!
//! [remote]
//! # Leave unset to run fully offline.
//! url = "https://api.example.com/sync"
//!
//! [policy]
//! max_attempts = 3
//! batch_size = 100
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};
use crate::policy::SyncPolicy;

// =============================================================================
// Sections
// =============================================================================

/// Identity of this installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Stable device UUID, generated on first run.
    #[serde(default = "generate_device_id")]
    pub id: String,

    /// Human-readable device name.
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn generate_device_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_device_name() -> String {
    "Warehouse Terminal".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            id: generate_device_id(),
            name: default_device_name(),
        }
    }
}

/// Remote system-of-record settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the remote sync endpoint. `None` means this install
    /// runs fully offline and pushes are simulated.
    #[serde(default)]
    pub url: Option<String>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Device-specific configuration.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Remote backend settings.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Retry/batch policy.
    #[serde(default)]
    pub policy: SyncPolicy,
}

impl SyncConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (depot.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        // Try to load from config file
        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        // Override with environment variables
        config.apply_env_overrides();

        // Validate the configuration
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::InvalidConfig("No config path available".into()))?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.device.id.is_empty() {
            return Err(SyncError::MissingDeviceId);
        }

        if let Some(ref url) = self.remote.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SyncError::InvalidUrl(format!(
                    "Remote URL must start with http:// or https://, got: {}",
                    url
                )));
            }
        }

        if self.policy.batch_size == 0 {
            return Err(SyncError::InvalidConfig(
                "batch_size must be greater than 0".into(),
            ));
        }

        if self.policy.max_attempts < 0 {
            return Err(SyncError::InvalidConfig(
                "max_attempts must not be negative".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("DEPOT_DEVICE_ID") {
            debug!(device_id = %id, "Overriding device ID from environment");
            self.device.id = id;
        }

        if let Ok(name) = std::env::var("DEPOT_DEVICE_NAME") {
            self.device.name = name;
        }

        if let Ok(url) = std::env::var("DEPOT_REMOTE_URL") {
            debug!(url = %url, "Overriding remote URL from environment");
            self.remote.url = Some(url);
        }

        if let Ok(max) = std::env::var("DEPOT_SYNC_MAX_ATTEMPTS") {
            if let Ok(n) = max.parse::<i64>() {
                self.policy.max_attempts = n;
            }
        }

        if let Ok(size) = std::env::var("DEPOT_SYNC_BATCH_SIZE") {
            if let Ok(n) = size.parse::<u32>() {
                self.policy.batch_size = n;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "depot", "warehouse")
            .map(|dirs| dirs.config_dir().join("depot.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the device ID.
    pub fn device_id(&self) -> &str {
        &self.device.id
    }

    /// True when no remote endpoint is configured: the install is
    /// local-only and pushes are simulated.
    pub fn is_offline(&self) -> bool {
        self.remote.url.is_none()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_offline_and_valid() {
        let config = SyncConfig::default();
        assert!(config.is_offline());
        assert!(!config.device.id.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [device]
            id = "dev-1"
            name = "Front Desk"

            [remote]
            url = "https://api.example.com/sync"

            [policy]
            max_attempts = 5
            batch_size = 50
        "#;
        let config: SyncConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.device.id, "dev-1");
        assert!(!config.is_offline());
        assert_eq!(config.policy.max_attempts, 5);
        assert_eq!(config.policy.batch_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: SyncConfig = toml::from_str("[device]\nname = \"Dock\"").unwrap();
        assert_eq!(config.device.name, "Dock");
        assert!(!config.device.id.is_empty());
        assert_eq!(config.policy.max_attempts, 3);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SyncConfig::default();
        config.remote.url = Some("ftp://nope".to_string());
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        let mut config = SyncConfig::default();
        config.policy.batch_size = 0;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));

        let mut config = SyncConfig::default();
        config.device.id = String::new();
        assert!(matches!(config.validate(), Err(SyncError::MissingDeviceId)));
    }
}
