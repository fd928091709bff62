//! # Remote Backend Seam
//!
//! The push side of sync is a trait: the remote system of record is an
//! external collaborator whose wire protocol is owned elsewhere. The
//! coordinator only assumes the backend upserts idempotently per record id,
//! which is what makes replaying a pending record after a crash safe.
//!
//! `SimulatedBackend` is the stand-in used until the real endpoint exists:
//! it acknowledges every record without transmitting anything.

use async_trait::async_trait;
use tracing::debug;

use crate::error::SyncResult;
use depot_core::ChangeRecord;

// =============================================================================
// Push Report
// =============================================================================

/// A push failure for one record.
#[derive(Debug, Clone)]
pub struct PushFailure {
    /// The change record that failed.
    pub change_id: String,
    /// Backend-supplied error text, stored on the record for the operator.
    pub error: String,
}

/// Per-record outcome of one batch push.
#[derive(Debug, Clone, Default)]
pub struct PushReport {
    /// IDs of records the backend acknowledged.
    pub acked: Vec<String>,
    /// Records the backend rejected, with error text.
    pub failed: Vec<PushFailure>,
}

impl PushReport {
    /// A report acknowledging every record in the batch.
    pub fn ack_all(batch: &[ChangeRecord]) -> Self {
        PushReport {
            acked: batch.iter().map(|c| c.id.clone()).collect(),
            failed: Vec::new(),
        }
    }
}

// =============================================================================
// Trait
// =============================================================================

/// The remote system of record, seen from the coordinator.
///
/// ## Contract
/// - `push` is given a FIFO batch of pending change records
/// - The returned report partitions the batch into acked and failed ids
/// - Returning `Err` signals a transport-level fault: nothing in the batch
///   was processed and the whole sync run fails
/// - The backend is assumed to upsert idempotently per record id, so
///   re-pushing an already-acked record is harmless
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Pushes a batch of change records, returning per-record outcomes.
    async fn push(&self, batch: &[ChangeRecord]) -> SyncResult<PushReport>;
}

// =============================================================================
// Simulated Backend
// =============================================================================

/// Stand-in backend: acknowledges every record without any network I/O.
///
/// This is what ships while the real endpoint is being built. Swapping in
/// the real client is a matter of implementing [`RemoteBackend`] over it
/// and handing that to the coordinator instead.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend;

#[async_trait]
impl RemoteBackend for SimulatedBackend {
    async fn push(&self, batch: &[ChangeRecord]) -> SyncResult<PushReport> {
        debug!(count = batch.len(), "Simulating push (no remote configured)");
        Ok(PushReport::ack_all(batch))
    }
}
