//! Best-effort replication of punches to a remote store

pub mod ports;
pub mod service;

pub use ports::{PunchReplicator, RemoteStore};
pub use service::SyncService;
