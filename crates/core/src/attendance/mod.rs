//! Attendance state machine and event log ports

pub mod ports;
pub mod service;

pub use ports::AttendanceEventRepository;
pub use service::{AttendanceService, PunchOutcome, PunchState};
