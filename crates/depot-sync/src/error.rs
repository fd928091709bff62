//! # Sync Error Types

use thiserror::Error;

use depot_db::DbError;

/// Errors from the sync coordinator and its configuration.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A sync run is already in progress.
    ///
    /// `sync_now` is serialized by a coordinator-held mutex; a second
    /// caller gets this instead of racing the first on the same batch.
    #[error("A sync run is already in progress")]
    SyncInProgress,

    /// The remote backend rejected the whole push (transport-level fault,
    /// as opposed to per-record failures which are recorded on the
    /// change records themselves).
    #[error("Remote backend error: {0}")]
    Backend(String),

    /// Store error bubbled up from depot-db.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Device ID missing from configuration.
    #[error("Device ID is missing from configuration")]
    MissingDeviceId,

    /// Remote URL is malformed.
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    /// Some other configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file I/O failed.
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed.
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Config could not be serialized for saving.
    #[error("Config serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
