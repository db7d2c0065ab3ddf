//! Application constants
//!
//! Centralized location for domain-level constants used throughout the
//! application.

// Remote store layout
pub const ATTENDANCE_TABLE: &str = "attendance";
pub const EMPLOYEES_TABLE: &str = "employees";
pub const SELFIE_BUCKET: &str = "selfies";

// Heartbeat configuration
pub const HEARTBEAT_INTERVAL_SECS: u64 = 5;
pub const HEARTBEAT_PROBE_TIMEOUT_SECS: u64 = 5;

// Time conversion
pub const MILLIS_PER_HOUR: f64 = 3_600_000.0;
