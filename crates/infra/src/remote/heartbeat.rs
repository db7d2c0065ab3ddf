//! Background reachability monitoring for the remote store.
//!
//! The monitor follows the worker pattern:
//! - `HeartbeatMonitor`: lifecycle coordinator (owns the task handle)
//! - `heartbeat_worker()`: pure async worker function (easier to test)
//! - `ConnectionStatusListener`: trait for downstream status handling
//!
//! Probes run at a fixed interval with a per-probe timeout, and listeners
//! are only notified on transitions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use punchclock_core::RemoteStore;
use punchclock_domain::{ConnectionStatus, HeartbeatConfig, PunchClockError, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Listener for connection status changes.
///
/// Called only when the status actually changes, not on every probe.
#[async_trait]
pub trait ConnectionStatusListener: Send + Sync {
    async fn on_status_changed(&self, status: ConnectionStatus);
}

/// Remote reachability monitor with explicit lifecycle.
pub struct HeartbeatMonitor {
    remote: Arc<dyn RemoteStore>,
    listener: Arc<dyn ConnectionStatusListener>,
    config: HeartbeatConfig,
    task_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
}

impl HeartbeatMonitor {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        listener: Arc<dyn ConnectionStatusListener>,
        config: HeartbeatConfig,
    ) -> Self {
        Self {
            remote,
            listener,
            config,
            task_handle: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Start background probing. Errors if already running.
    pub fn start(&mut self) -> Result<()> {
        if self.task_handle.is_some() {
            return Err(PunchClockError::Internal("heartbeat monitor already running".into()));
        }

        let cancel = self.cancellation.clone();
        let remote = Arc::clone(&self.remote);
        let listener = Arc::clone(&self.listener);
        let interval = Duration::from_secs(self.config.interval_secs);
        let probe_timeout = Duration::from_secs(self.config.probe_timeout_secs);

        info!(interval_secs = self.config.interval_secs, "starting heartbeat monitor");

        let handle = tokio::spawn(async move {
            heartbeat_worker(remote, listener, interval, probe_timeout, cancel).await;
        });

        self.task_handle = Some(handle);
        Ok(())
    }

    /// Signal the worker to stop and wait for it to finish.
    pub async fn stop(&mut self) -> Result<()> {
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .map_err(|_| PunchClockError::Internal("heartbeat shutdown timeout".into()))?
                .map_err(|err| PunchClockError::Internal(format!("task join failed: {err}")))?;
        }

        info!("heartbeat monitor stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some() && !self.cancellation.is_cancelled()
    }
}

/// Pure worker loop, separated from the monitor for testability.
///
/// Starts in `Unknown`, probes every `interval`, and emits only on
/// transitions. A probe timeout counts as offline.
async fn heartbeat_worker(
    remote: Arc<dyn RemoteStore>,
    listener: Arc<dyn ConnectionStatusListener>,
    interval: Duration,
    probe_timeout: Duration,
    cancel: CancellationToken,
) {
    let mut current = ConnectionStatus::Unknown;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("heartbeat worker shutting down");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                let probed = tokio::time::timeout(probe_timeout, remote.probe()).await;

                let next = match probed {
                    Ok(Ok(())) => ConnectionStatus::Online,
                    // A well-formed "not found" still proves the endpoint answered.
                    Ok(Err(PunchClockError::NotFound(_))) => ConnectionStatus::Online,
                    Ok(Err(err)) => {
                        warn!(error = %err, "heartbeat probe failed");
                        ConnectionStatus::Offline { error_class: classify(&err) }
                    }
                    Err(_) => {
                        warn!("heartbeat probe timed out");
                        ConnectionStatus::Offline { error_class: "timeout".into() }
                    }
                };

                if next != current {
                    info!(previous = ?current, next = ?next, "connection status changed");
                    listener.on_status_changed(next.clone()).await;
                    current = next;
                }
            }
        }
    }
}

fn classify(err: &PunchClockError) -> String {
    match err {
        PunchClockError::Remote(_) => "remote".into(),
        PunchClockError::Config(_) => "config".into(),
        PunchClockError::Validation(_) => "validation".into(),
        PunchClockError::Storage(_) => "storage".into(),
        PunchClockError::NotFound(_) => "not_found".into(),
        PunchClockError::Internal(_) => "internal".into(),
    }
}
