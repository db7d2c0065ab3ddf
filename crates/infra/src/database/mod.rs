//! SQLite-backed repositories for the local attendance store

pub mod attendance_repository;
pub mod manager;
pub mod work_reason_repository;

pub use attendance_repository::SqliteAttendanceRepository;
pub use manager::DbManager;
pub use work_reason_repository::SqliteWorkReasonRepository;
