//! Port interfaces for the attendance event log
//!
//! These traits define the boundary between the state machine and the
//! durable store that owns `AttendanceEvent` persistence.

use async_trait::async_trait;
use punchclock_domain::{AttendanceEvent, NewAttendanceEvent, Result};
use tokio::sync::broadcast;

/// Trait for the append-only attendance event log.
///
/// Ordering contract: "most recent" means highest `employee_time_millis`,
/// tie-broken by `id` descending.
#[async_trait]
pub trait AttendanceEventRepository: Send + Sync {
    /// Append an event and return its assigned id.
    async fn insert(&self, event: NewAttendanceEvent) -> Result<i64>;

    /// Most recent event for an employee, or `None` if they never punched.
    async fn most_recent_for_employee(&self, employee_id: &str)
        -> Result<Option<AttendanceEvent>>;

    /// All events for an employee, descending by `employee_time_millis`.
    async fn all_for_employee(&self, employee_id: &str) -> Result<Vec<AttendanceEvent>>;

    /// Events with `employee_time_millis` in `[start, end)`, ascending.
    async fn range_for_employee(
        &self,
        employee_id: &str,
        start_millis: i64,
        end_millis: i64,
    ) -> Result<Vec<AttendanceEvent>>;

    /// Live feed of inserted events. Subscribers filter by employee.
    fn observe(&self) -> broadcast::Receiver<AttendanceEvent>;
}
