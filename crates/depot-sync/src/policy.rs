//! # Sync Policy
//!
//! Tunable knobs for the sync coordinator. The retry ceiling lives here as
//! configuration rather than as a literal buried in the coordinator.

use serde::{Deserialize, Serialize};

fn default_max_attempts() -> i64 {
    3
}

fn default_batch_size() -> u32 {
    100
}

fn default_prune_after_days() -> u32 {
    30
}

/// Retry and batching policy for sync runs.
///
/// ## Failure Classification
/// ```text
/// sync_attempts <= max_attempts  → pending (still eligible for pushes)
/// sync_attempts >  max_attempts  → failed  (needs a manual clear_error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPolicy {
    /// Retry ceiling: once a record's attempt counter exceeds this, it is
    /// reported as failed and excluded from further pushes until an
    /// operator clears it.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,

    /// Maximum records per push to the backend.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Synced change records older than this many days are pruned.
    #[serde(default = "default_prune_after_days")]
    pub prune_after_days: u32,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        SyncPolicy {
            max_attempts: default_max_attempts(),
            batch_size: default_batch_size(),
            prune_after_days: default_prune_after_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = SyncPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.batch_size, 100);
        assert_eq!(policy.prune_after_days, 30);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let policy: SyncPolicy = toml::from_str("max_attempts = 5").unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.batch_size, 100);
    }
}
