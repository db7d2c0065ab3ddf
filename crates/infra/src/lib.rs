//! # PunchClock Infrastructure
//!
//! Infrastructure adapters for the PunchClock core:
//! - SQLite-backed event log and reason catalog repositories
//! - Supabase REST client, selfie uploads, and reachability heartbeat
//! - Configuration store with a live watch stream
//! - Sync manager tying remote lifecycle to configuration changes
//!
//! All adapters implement the port traits from `punchclock-core` and map
//! their library errors into `punchclock_domain::PunchClockError`.

pub mod config;
pub mod database;
pub mod errors;
pub mod remote;
pub mod sync;

pub use config::ConfigStore;
pub use database::{DbManager, SqliteAttendanceRepository, SqliteWorkReasonRepository};
pub use remote::{
    ConnectionStatusListener, HeartbeatMonitor, NameserverClient, RemoteError, SupabaseClient,
};
pub use sync::{SyncHandle, SyncManager};
