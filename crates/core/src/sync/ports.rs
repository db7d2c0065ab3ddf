//! Port interfaces for sync operations
//!
//! The local write path never blocks on these: every method here is called
//! from the dispatch side of a fire-and-forget task, and failures stay at
//! the sync boundary.

use async_trait::async_trait;
use punchclock_domain::{AttendanceEvent, PunchOutUpdate, RemoteAttendanceRecord, Result};

/// Trait for the remote attendance store (rows + selfie objects).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert a new remote row for a punch-in.
    async fn insert_punch_in(&self, record: &RemoteAttendanceRecord) -> Result<()>;

    /// Patch the employee's open remote row (null `punch_out_time`) with the
    /// punch-out. Matching zero rows is not an error.
    async fn complete_punch_out(&self, employee_id: &str, update: &PunchOutUpdate) -> Result<()>;

    /// Upload a local selfie and return its public URL. `Ok(None)` means the
    /// file was missing; callers degrade to a null image URL.
    async fn upload_selfie(
        &self,
        local_path: &str,
        captured_at_millis: i64,
    ) -> Result<Option<String>>;

    /// Lightweight reachability probe (limited read).
    async fn probe(&self) -> Result<()>;
}

/// Trait for the hand-off point between the state machine and sync.
#[async_trait]
pub trait PunchReplicator: Send + Sync {
    /// Mirror one locally durable event to the remote store.
    async fn replicate(&self, event: &AttendanceEvent) -> Result<()>;
}
