//! Connectivity status reported by the sync engine

use serde::{Deserialize, Serialize};

/// Reachability of the remote store as observed by the heartbeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail")]
pub enum ConnectionStatus {
    /// No probe has completed yet.
    Unknown,
    /// Remote configuration is absent or incomplete.
    SetupRequired,
    /// Last probe reached the remote store.
    Online,
    /// Last probe failed; carries the error class for diagnostics.
    Offline { error_class: String },
}

impl ConnectionStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}
