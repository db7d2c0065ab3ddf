//! Sync engine coordinator.
//!
//! Watches the config store and (re)builds the remote pipeline whenever the
//! credentials change: a blank config tears everything down and reports
//! `SetupRequired`; a complete one builds a Supabase client, installs a
//! `SyncService` behind the shared handle, and restarts the heartbeat.
//!
//! The `SyncHandle` given to the punch state machine stays valid across
//! reconfiguration. While unconfigured it drops replication requests on the
//! floor (the punch is already locally durable).

use std::sync::Arc;

use async_trait::async_trait;
use punchclock_core::{PunchReplicator, SyncService};
use punchclock_domain::{
    AttendanceEvent, ConnectionStatus, HeartbeatConfig, PunchClockError, RemoteConfig, Result,
};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::remote::heartbeat::{ConnectionStatusListener, HeartbeatMonitor};
use crate::remote::supabase::SupabaseClient;

type SyncSlot = Arc<RwLock<Option<Arc<SyncService>>>>;

/// Replication entry point handed to the punch state machine.
///
/// Cheap to clone; all clones observe the same underlying sync service.
#[derive(Clone)]
pub struct SyncHandle {
    slot: SyncSlot,
}

#[async_trait]
impl PunchReplicator for SyncHandle {
    async fn replicate(&self, event: &AttendanceEvent) -> Result<()> {
        let service = self.slot.read().await.clone();
        match service {
            Some(service) => service.replicate(event).await,
            None => {
                debug!(
                    employee_id = %event.employee_id,
                    "sync not configured, punch stays local only"
                );
                Ok(())
            }
        }
    }
}

/// Forwards heartbeat transitions onto the status channel.
struct StatusForwarder {
    status_tx: watch::Sender<ConnectionStatus>,
}

#[async_trait]
impl ConnectionStatusListener for StatusForwarder {
    async fn on_status_changed(&self, status: ConnectionStatus) {
        self.status_tx.send_replace(status);
    }
}

/// Owns the sync engine lifecycle.
pub struct SyncManager {
    config_rx: watch::Receiver<RemoteConfig>,
    heartbeat_config: HeartbeatConfig,
    status_tx: watch::Sender<ConnectionStatus>,
    slot: SyncSlot,
    task_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
}

impl SyncManager {
    pub fn new(config_rx: watch::Receiver<RemoteConfig>, heartbeat_config: HeartbeatConfig) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Unknown);
        Self {
            config_rx,
            heartbeat_config,
            status_tx,
            slot: Arc::new(RwLock::new(None)),
            task_handle: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Handle for the punch state machine. Valid before and after `start`.
    pub fn replicator(&self) -> SyncHandle {
        SyncHandle { slot: Arc::clone(&self.slot) }
    }

    /// Subscribe to connection status updates.
    pub fn status_watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// Start the config-watching worker. Errors if already running.
    pub fn start(&mut self) -> Result<()> {
        if self.task_handle.is_some() {
            return Err(PunchClockError::Internal("sync manager already running".into()));
        }

        let cancel = self.cancellation.clone();
        let config_rx = self.config_rx.clone();
        let heartbeat_config = self.heartbeat_config.clone();
        let status_tx = self.status_tx.clone();
        let slot = Arc::clone(&self.slot);

        info!("starting sync manager");
        let handle = tokio::spawn(async move {
            sync_worker(config_rx, heartbeat_config, status_tx, slot, cancel).await;
        });

        self.task_handle = Some(handle);
        Ok(())
    }

    /// Tear down the worker and any running heartbeat.
    pub async fn stop(&mut self) -> Result<()> {
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            tokio::time::timeout(std::time::Duration::from_secs(5), handle)
                .await
                .map_err(|_| PunchClockError::Internal("sync manager shutdown timeout".into()))?
                .map_err(|err| PunchClockError::Internal(format!("task join failed: {err}")))?;
        }

        *self.slot.write().await = None;
        info!("sync manager stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some() && !self.cancellation.is_cancelled()
    }
}

/// Applies the current config, then reapplies on every change until
/// cancelled.
async fn sync_worker(
    mut config_rx: watch::Receiver<RemoteConfig>,
    heartbeat_config: HeartbeatConfig,
    status_tx: watch::Sender<ConnectionStatus>,
    slot: SyncSlot,
    cancel: CancellationToken,
) {
    let mut heartbeat: Option<HeartbeatMonitor> = None;

    let initial = config_rx.borrow_and_update().clone();
    apply_config(&initial, &heartbeat_config, &status_tx, &slot, &mut heartbeat).await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("sync worker shutting down");
                break;
            }
            changed = config_rx.changed() => {
                if changed.is_err() {
                    // Config store dropped; nothing further can change.
                    break;
                }
                let config = config_rx.borrow_and_update().clone();
                apply_config(&config, &heartbeat_config, &status_tx, &slot, &mut heartbeat).await;
            }
        }
    }

    if let Some(mut monitor) = heartbeat.take() {
        let _ = monitor.stop().await;
    }
}

async fn apply_config(
    config: &RemoteConfig,
    heartbeat_config: &HeartbeatConfig,
    status_tx: &watch::Sender<ConnectionStatus>,
    slot: &SyncSlot,
    heartbeat: &mut Option<HeartbeatMonitor>,
) {
    if let Some(mut monitor) = heartbeat.take() {
        let _ = monitor.stop().await;
    }

    if !config.is_complete() {
        *slot.write().await = None;
        status_tx.send_replace(ConnectionStatus::SetupRequired);
        info!("remote config incomplete, sync disabled until setup");
        return;
    }

    let client = match SupabaseClient::new(config) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            error!(error = %err, "remote client rejected config");
            *slot.write().await = None;
            status_tx.send_replace(ConnectionStatus::Offline {
                error_class: "config".into(),
            });
            return;
        }
    };

    *slot.write().await = Some(Arc::new(SyncService::new(client.clone())));
    status_tx.send_replace(ConnectionStatus::Unknown);

    let listener = Arc::new(StatusForwarder { status_tx: status_tx.clone() });
    let mut monitor = HeartbeatMonitor::new(client, listener, heartbeat_config.clone());
    if let Err(err) = monitor.start() {
        error!(error = %err, "failed to start heartbeat");
        return;
    }
    *heartbeat = Some(monitor);

    info!("sync engine connected to remote store");
}
