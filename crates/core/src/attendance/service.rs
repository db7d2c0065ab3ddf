//! Attendance state machine - core business logic
//!
//! Punch state is derived, never stored: the most recent event for an
//! employee maps directly to `PunchedIn`/`PunchedOut`. The service enforces
//! strict IN/OUT alternation by serializing the read-then-write sequence per
//! employee, and hands every durable event to an optional replicator without
//! awaiting the remote outcome.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::Utc;
use punchclock_domain::{
    AttendanceEvent, NewAttendanceEvent, PunchClockError, PunchType, Result,
};
use tracing::warn;

use super::ports::AttendanceEventRepository;
use crate::reasons::ReasonCatalog;
use crate::sync::ports::PunchReplicator;

/// Derived punch status for one employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchState {
    PunchedIn,
    PunchedOut,
}

/// Result of a punch request.
#[derive(Debug, Clone)]
pub enum PunchOutcome {
    /// An IN event was appended.
    PunchedIn(AttendanceEvent),
    /// The employee is already punched in; nothing was written. The caller
    /// must collect an out-reason and call [`AttendanceService::confirm_punch_out`].
    ConfirmationRequired,
}

/// Per-employee mutual exclusion for the read-then-write critical section.
///
/// Two rapid taps for the same employee must not both observe `PunchedOut`
/// and append two IN events.
struct EmployeeLocks {
    inner: StdMutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl EmployeeLocks {
    fn new() -> Self {
        Self { inner: StdMutex::new(HashMap::new()) }
    }

    fn lock_for(&self, employee_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(map.entry(employee_id.to_string()).or_default())
    }
}

/// Attendance state machine service
pub struct AttendanceService {
    repository: Arc<dyn AttendanceEventRepository>,
    reasons: Option<Arc<ReasonCatalog>>,
    replicator: Option<Arc<dyn PunchReplicator>>,
    locks: EmployeeLocks,
}

impl AttendanceService {
    /// Create a new attendance service over the event log.
    pub fn new(repository: Arc<dyn AttendanceEventRepository>) -> Self {
        Self { repository, reasons: None, replicator: None, locks: EmployeeLocks::new() }
    }

    /// Record office-work reasons into the catalog on confirmed punch-outs.
    pub fn with_reason_catalog(mut self, reasons: Arc<ReasonCatalog>) -> Self {
        self.reasons = Some(reasons);
        self
    }

    /// Mirror confirmed punches to a remote store, fire-and-forget.
    pub fn with_replicator(mut self, replicator: Arc<dyn PunchReplicator>) -> Self {
        self.replicator = Some(replicator);
        self
    }

    /// Derive the current punch state from the most recent event.
    pub async fn punch_state(&self, employee_id: &str) -> Result<PunchState> {
        let last = self.repository.most_recent_for_employee(employee_id).await?;
        Ok(match last {
            Some(event) if event.punch_type == PunchType::In => PunchState::PunchedIn,
            _ => PunchState::PunchedOut,
        })
    }

    /// Handle a punch request.
    ///
    /// If the employee is punched out, appends an IN event immediately. If
    /// they are punched in, appends nothing and asks the caller to confirm
    /// the punch-out with a reason first.
    pub async fn request_punch(
        &self,
        employee_id: &str,
        selfie_path: Option<String>,
    ) -> Result<PunchOutcome> {
        validate_employee_id(employee_id)?;

        let lock = self.locks.lock_for(employee_id);
        let _guard = lock.lock().await;

        if self.punch_state(employee_id).await? == PunchState::PunchedIn {
            return Ok(PunchOutcome::ConfirmationRequired);
        }

        let mut event =
            NewAttendanceEvent::punched_now(employee_id, PunchType::In, now_millis());
        event.selfie_path = selfie_path;

        let event = self.append(event).await?;
        Ok(PunchOutcome::PunchedIn(event))
    }

    /// Complete a punch-out with the supplied metadata.
    ///
    /// `reason` may be blank only for office work; `work_reason` is required
    /// for office work and ignored otherwise. Appends exactly one OUT event.
    pub async fn confirm_punch_out(
        &self,
        employee_id: &str,
        reason: &str,
        is_office_work: bool,
        work_reason: Option<&str>,
        selfie_path: Option<String>,
    ) -> Result<AttendanceEvent> {
        validate_employee_id(employee_id)?;

        let work_reason = work_reason.map(str::trim).filter(|text| !text.is_empty());
        if is_office_work && work_reason.is_none() {
            return Err(PunchClockError::Validation(
                "work reason is required for office work punch-outs".into(),
            ));
        }
        if !is_office_work && reason.trim().is_empty() {
            return Err(PunchClockError::Validation(
                "a reason is required when leaving for personal reasons".into(),
            ));
        }

        let lock = self.locks.lock_for(employee_id);
        let _guard = lock.lock().await;

        let mut event =
            NewAttendanceEvent::punched_now(employee_id, PunchType::Out, now_millis());
        event.reason = Some(reason.to_string()).filter(|text| !text.trim().is_empty());
        event.is_office_work = is_office_work;
        event.work_reason = if is_office_work { work_reason.map(str::to_string) } else { None };
        event.selfie_path = selfie_path;

        let event = self.append(event).await?;

        if let (true, Some(text), Some(reasons)) = (is_office_work, work_reason, &self.reasons) {
            // Catalog updates are auxiliary; a failure must not undo the punch.
            if let Err(err) = reasons.record_usage(text, event.employee_time_millis).await {
                warn!(error = %err, "failed to record work reason usage");
            }
        }

        Ok(event)
    }

    async fn append(&self, event: NewAttendanceEvent) -> Result<AttendanceEvent> {
        let id = self.repository.insert(event.clone()).await?;
        let event = event.with_id(id);
        self.dispatch_replication(event.clone());
        Ok(event)
    }

    /// Hand the event to the replicator without blocking the local path.
    fn dispatch_replication(&self, event: AttendanceEvent) {
        let Some(replicator) = self.replicator.as_ref().map(Arc::clone) else {
            return;
        };
        tokio::spawn(async move {
            if let Err(err) = replicator.replicate(&event).await {
                warn!(
                    error = %err,
                    event_id = event.id,
                    employee_id = %event.employee_id,
                    "failed to mirror punch to remote store"
                );
            }
        });
    }
}

fn validate_employee_id(employee_id: &str) -> Result<()> {
    if employee_id.trim().is_empty() {
        return Err(PunchClockError::Validation("employee id must not be empty".into()));
    }
    Ok(())
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
