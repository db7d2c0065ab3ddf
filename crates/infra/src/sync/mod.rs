//! Sync engine lifecycle: config-driven connect, heartbeat, replication

pub mod manager;

pub use manager::{SyncHandle, SyncManager};
