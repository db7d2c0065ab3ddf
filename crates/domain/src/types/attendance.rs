//! Attendance event types
//!
//! The local event log is append-only: an [`AttendanceEvent`] is immutable
//! once inserted. All ordering and aggregation uses `employee_time_millis`,
//! the authoritative business timestamp; `system_time_millis` records the
//! device clock at capture and is never corrected.

use serde::{Deserialize, Serialize};

use crate::errors::{PunchClockError, Result};

/// Direction of a punch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PunchType {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl PunchType {
    /// Stable string form used in the local schema ("IN"/"OUT").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }

    /// Parse the stored string form.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "IN" => Ok(Self::In),
            "OUT" => Ok(Self::Out),
            other => Err(PunchClockError::Validation(format!("unknown punch type: {other}"))),
        }
    }
}

impl std::fmt::Display for PunchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single punch event as stored in the local log.
///
/// Invariant: events for a given employee, ordered by `id`, alternate
/// IN/OUT starting with IN. The state machine enforces this on write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEvent {
    /// Monotonic local identifier, assigned on insert.
    pub id: i64,
    pub employee_id: String,
    pub punch_type: PunchType,
    /// Device clock at capture (epoch ms), immutable.
    pub system_time_millis: i64,
    /// Authoritative business timestamp (epoch ms); equals
    /// `system_time_millis` unless manually corrected.
    pub employee_time_millis: i64,
    pub is_manually_edited: bool,
    /// Free text supplied when leaving for personal reasons.
    pub reason: Option<String>,
    /// Description of office-related work, used when `is_office_work`.
    pub work_reason: Option<String>,
    /// When true, the interval ending at this OUT counts toward office hours.
    pub is_office_work: bool,
    /// Local path to a captured photo; consumed only by the sync engine.
    pub selfie_path: Option<String>,
}

/// A punch event awaiting insertion; the log store assigns the id.
#[derive(Debug, Clone)]
pub struct NewAttendanceEvent {
    pub employee_id: String,
    pub punch_type: PunchType,
    pub system_time_millis: i64,
    pub employee_time_millis: i64,
    pub is_manually_edited: bool,
    pub reason: Option<String>,
    pub work_reason: Option<String>,
    pub is_office_work: bool,
    pub selfie_path: Option<String>,
}

impl NewAttendanceEvent {
    /// Build a punch captured at `now_millis` with no corrections applied.
    pub fn punched_now(employee_id: impl Into<String>, punch_type: PunchType, now_millis: i64) -> Self {
        Self {
            employee_id: employee_id.into(),
            punch_type,
            system_time_millis: now_millis,
            employee_time_millis: now_millis,
            is_manually_edited: false,
            reason: None,
            work_reason: None,
            is_office_work: false,
            selfie_path: None,
        }
    }

    /// Attach the event's assigned id, producing the stored form.
    pub fn with_id(self, id: i64) -> AttendanceEvent {
        AttendanceEvent {
            id,
            employee_id: self.employee_id,
            punch_type: self.punch_type,
            system_time_millis: self.system_time_millis,
            employee_time_millis: self.employee_time_millis,
            is_manually_edited: self.is_manually_edited,
            reason: self.reason,
            work_reason: self.work_reason,
            is_office_work: self.is_office_work,
            selfie_path: self.selfie_path,
        }
    }
}

/// A free-text out-of-office reason, ranked by reuse for autocomplete.
///
/// Created on first use of a novel reason string; updated on reuse, never
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeWorkReason {
    /// Unique key; matched case-insensitively on search.
    pub reason: String,
    pub usage_count: i64,
    pub last_used_millis: i64,
}

/// One calendar day of punches, newest first. Derived, not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAttendance {
    /// Calendar day key (`YYYY-MM-DD`, local calendar).
    pub date: String,
    pub events: Vec<AttendanceEvent>,
}

/// Office hours worked on a single day. Derived, not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOfficeHours {
    /// Calendar day key (`YYYY-MM-DD`, local calendar).
    pub day: String,
    /// Fractional hours from paired office-work intervals.
    pub office_hours: f64,
}
