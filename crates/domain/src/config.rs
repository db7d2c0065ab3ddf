//! Configuration structures

use serde::{Deserialize, Serialize};

use crate::constants::{HEARTBEAT_INTERVAL_SECS, HEARTBEAT_PROBE_TIMEOUT_SECS};

/// Remote store endpoint and credentials.
///
/// The sync engine only connects while both fields are non-blank; a blank
/// config means "setup required", not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    pub key: String,
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self { url: url.into(), key: key.into() }
    }

    /// Both endpoint and key are present (non-blank).
    pub fn is_complete(&self) -> bool {
        !self.url.trim().is_empty() && !self.key.trim().is_empty()
    }
}

/// Heartbeat probe cadence and timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    pub interval_secs: u64,
    pub probe_timeout_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: HEARTBEAT_INTERVAL_SECS,
            probe_timeout_secs: HEARTBEAT_PROBE_TIMEOUT_SECS,
        }
    }
}
