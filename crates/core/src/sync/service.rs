//! Punch mirroring - builds remote records from local events
//!
//! Protocol per punch: upload the selfie first (failure degrades to a null
//! image URL), then insert a fresh row for IN or patch the open row for
//! OUT. The remote row uses ISO-8601 timestamps with the local offset.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, SecondsFormat, TimeZone};
use punchclock_domain::{
    AttendanceEvent, PunchOutUpdate, PunchType, RemoteAttendanceRecord, Result,
};
use tracing::{debug, warn};

use super::ports::{PunchReplicator, RemoteStore};

/// Mirrors locally durable punches to the remote store.
pub struct SyncService {
    remote: Arc<dyn RemoteStore>,
}

impl SyncService {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    /// Replicate one event.
    ///
    /// Remote failures are returned for the dispatcher to log; nothing here
    /// touches local state.
    pub async fn sync_punch(&self, event: &AttendanceEvent) -> Result<()> {
        let punch_time = format_punch_time(event.employee_time_millis);
        let image_url = self.upload_selfie_if_any(event).await;

        match event.punch_type {
            PunchType::In => {
                let record = RemoteAttendanceRecord {
                    employee_id: event.employee_id.clone(),
                    punch_in_time: Some(punch_time),
                    punch_out_time: None,
                    image_url,
                    punch_out_image_url: None,
                    is_synced: true,
                };
                self.remote.insert_punch_in(&record).await?;
                debug!(employee_id = %event.employee_id, "punch-in mirrored to remote store");
            }
            PunchType::Out => {
                let update = PunchOutUpdate {
                    punch_out_time: punch_time,
                    punch_out_image_url: image_url,
                    is_synced: true,
                };
                self.remote.complete_punch_out(&event.employee_id, &update).await?;
                debug!(employee_id = %event.employee_id, "punch-out mirrored to remote store");
            }
        }

        Ok(())
    }

    async fn upload_selfie_if_any(&self, event: &AttendanceEvent) -> Option<String> {
        let path = event.selfie_path.as_deref()?;
        match self.remote.upload_selfie(path, event.system_time_millis).await {
            Ok(url) => url,
            Err(err) => {
                // Degrade to a null image URL, not a sync failure.
                warn!(error = %err, path, "selfie upload failed");
                None
            }
        }
    }
}

#[async_trait]
impl PunchReplicator for SyncService {
    async fn replicate(&self, event: &AttendanceEvent) -> Result<()> {
        self.sync_punch(event).await
    }
}

/// ISO-8601 with milliseconds and the local UTC offset, the format the
/// remote table stores.
pub fn format_punch_time(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).earliest() {
        Some(datetime) => datetime.to_rfc3339_opts(SecondsFormat::Millis, false),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use punchclock_domain::{NewAttendanceEvent, PunchClockError};

    use super::*;

    #[derive(Default)]
    struct RecordingRemote {
        inserts: Mutex<Vec<RemoteAttendanceRecord>>,
        updates: Mutex<Vec<(String, PunchOutUpdate)>>,
        uploads: Mutex<Vec<String>>,
        fail_uploads: bool,
        fail_inserts: bool,
    }

    #[async_trait]
    impl RemoteStore for RecordingRemote {
        async fn insert_punch_in(&self, record: &RemoteAttendanceRecord) -> Result<()> {
            if self.fail_inserts {
                return Err(PunchClockError::Remote("503 service unavailable".into()));
            }
            self.inserts.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn complete_punch_out(
            &self,
            employee_id: &str,
            update: &PunchOutUpdate,
        ) -> Result<()> {
            self.updates.lock().unwrap().push((employee_id.to_string(), update.clone()));
            Ok(())
        }

        async fn upload_selfie(
            &self,
            local_path: &str,
            _captured_at_millis: i64,
        ) -> Result<Option<String>> {
            if self.fail_uploads {
                return Err(PunchClockError::Remote("bucket unavailable".into()));
            }
            self.uploads.lock().unwrap().push(local_path.to_string());
            Ok(Some(format!("https://cdn.example/{local_path}")))
        }

        async fn probe(&self) -> Result<()> {
            Ok(())
        }
    }

    fn punch(punch_type: PunchType, selfie_path: Option<&str>) -> AttendanceEvent {
        let mut event =
            NewAttendanceEvent::punched_now("emp-1", punch_type, 1_770_000_000_000);
        event.selfie_path = selfie_path.map(str::to_string);
        event.with_id(1)
    }

    #[tokio::test]
    async fn punch_in_inserts_open_row() {
        let remote = Arc::new(RecordingRemote::default());
        let service = SyncService::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);

        service.sync_punch(&punch(PunchType::In, None)).await.unwrap();

        let inserts = remote.inserts.lock().unwrap();
        assert_eq!(inserts.len(), 1);
        assert_eq!(inserts[0].employee_id, "emp-1");
        assert!(inserts[0].punch_in_time.is_some());
        assert!(inserts[0].punch_out_time.is_none());
        assert!(inserts[0].is_synced);
    }

    #[tokio::test]
    async fn punch_out_patches_open_row() {
        let remote = Arc::new(RecordingRemote::default());
        let service = SyncService::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);

        service.sync_punch(&punch(PunchType::Out, None)).await.unwrap();

        let updates = remote.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "emp-1");
        assert!(!updates[0].1.punch_out_time.is_empty());
        assert!(remote.inserts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn selfie_url_rides_along_with_the_record() {
        let remote = Arc::new(RecordingRemote::default());
        let service = SyncService::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);

        service.sync_punch(&punch(PunchType::In, Some("selfie.jpg"))).await.unwrap();

        assert_eq!(remote.uploads.lock().unwrap().len(), 1);
        let inserts = remote.inserts.lock().unwrap();
        assert_eq!(inserts[0].image_url.as_deref(), Some("https://cdn.example/selfie.jpg"));
    }

    #[tokio::test]
    async fn upload_failure_degrades_to_null_image_url() {
        let remote =
            Arc::new(RecordingRemote { fail_uploads: true, ..RecordingRemote::default() });
        let service = SyncService::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);

        service.sync_punch(&punch(PunchType::In, Some("selfie.jpg"))).await.unwrap();

        let inserts = remote.inserts.lock().unwrap();
        assert_eq!(inserts.len(), 1, "record still synced without the image");
        assert!(inserts[0].image_url.is_none());
    }

    #[tokio::test]
    async fn remote_failure_is_returned_not_swallowed_here() {
        let remote =
            Arc::new(RecordingRemote { fail_inserts: true, ..RecordingRemote::default() });
        let service = SyncService::new(Arc::clone(&remote) as Arc<dyn RemoteStore>);

        let err = service.sync_punch(&punch(PunchType::In, None)).await.unwrap_err();
        assert!(matches!(err, PunchClockError::Remote(_)));
    }

    #[test]
    fn punch_time_has_millis_and_offset() {
        let formatted = format_punch_time(1_770_000_000_000);
        // e.g. 2026-02-02T03:20:00.000+05:30
        assert!(formatted.contains('T'));
        assert!(formatted.contains('.'));
    }
}
