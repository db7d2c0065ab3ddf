//! # PunchClock Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The attendance state machine and its validation rules
//! - Aggregation of the event log into daily/monthly reports
//! - The reason catalog for autocomplete
//! - Port/adapter interfaces (traits) for storage and sync
//!
//! ## Architecture Principles
//! - Only depends on `punchclock-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod attendance;
pub mod reasons;
pub mod reports;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use attendance::ports::AttendanceEventRepository;
pub use attendance::service::{AttendanceService, PunchOutcome, PunchState};
pub use reasons::{ReasonCatalog, WorkReasonRepository};
pub use reports::{daily_hours, group_by_date, ReportsService};
pub use sync::ports::{PunchReplicator, RemoteStore};
pub use sync::service::SyncService;
