//! SQLite-backed attendance event log.
//!
//! Implements the async `AttendanceEventRepository` port. The log is
//! append-only; every successful insert is also pushed to a broadcast
//! channel so observers (reports, UI state) can react without polling.
//! All queries run on the shared r2d2 pool via `spawn_blocking`.

use std::sync::Arc;

use async_trait::async_trait;
use punchclock_core::AttendanceEventRepository;
use punchclock_domain::{
    AttendanceEvent, NewAttendanceEvent, PunchClockError, PunchType, Result,
};
use rusqlite::{params, Row};
use tokio::sync::broadcast;
use tokio::task;

use super::manager::{map_sql_error, DbManager};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Attendance event repository backed by SQLite.
pub struct SqliteAttendanceRepository {
    db: Arc<DbManager>,
    events_tx: broadcast::Sender<AttendanceEvent>,
}

impl SqliteAttendanceRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { db, events_tx }
    }
}

const INSERT_EVENT_SQL: &str = "INSERT INTO attendance_records (
        employee_id, punch_type, system_time_millis, employee_time_millis,
        is_manually_edited, reason, work_reason, is_office_work, selfie_path
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

const EVENT_COLUMNS: &str = "id, employee_id, punch_type, system_time_millis,
        employee_time_millis, is_manually_edited, reason, work_reason,
        is_office_work, selfie_path";

#[async_trait]
impl AttendanceEventRepository for SqliteAttendanceRepository {
    async fn insert(&self, event: NewAttendanceEvent) -> Result<i64> {
        let db = Arc::clone(&self.db);
        let stored = event.clone();

        let id = task::spawn_blocking(move || -> Result<i64> {
            let conn = db.get_connection()?;
            conn.execute(
                INSERT_EVENT_SQL,
                params![
                    event.employee_id,
                    event.punch_type.as_str(),
                    event.system_time_millis,
                    event.employee_time_millis,
                    event.is_manually_edited,
                    event.reason,
                    event.work_reason,
                    event.is_office_work,
                    event.selfie_path,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_join_error)??;

        // Receiver lag or absence is not an error for the writer.
        let _ = self.events_tx.send(stored.with_id(id));
        Ok(id)
    }

    async fn most_recent_for_employee(
        &self,
        employee_id: &str,
    ) -> Result<Option<AttendanceEvent>> {
        let db = Arc::clone(&self.db);
        let employee_id = employee_id.to_string();

        task::spawn_blocking(move || -> Result<Option<AttendanceEvent>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "SELECT {EVENT_COLUMNS} FROM attendance_records
                 WHERE employee_id = ?1
                 ORDER BY employee_time_millis DESC, id DESC
                 LIMIT 1"
            );
            match conn.query_row(&sql, params![employee_id], map_event_row) {
                Ok(event) => Ok(Some(event)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(err) => Err(map_sql_error(err)),
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn all_for_employee(&self, employee_id: &str) -> Result<Vec<AttendanceEvent>> {
        let db = Arc::clone(&self.db);
        let employee_id = employee_id.to_string();

        task::spawn_blocking(move || -> Result<Vec<AttendanceEvent>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "SELECT {EVENT_COLUMNS} FROM attendance_records
                 WHERE employee_id = ?1
                 ORDER BY employee_time_millis DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![employee_id], map_event_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(rows)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn range_for_employee(
        &self,
        employee_id: &str,
        start_millis: i64,
        end_millis: i64,
    ) -> Result<Vec<AttendanceEvent>> {
        let db = Arc::clone(&self.db);
        let employee_id = employee_id.to_string();

        task::spawn_blocking(move || -> Result<Vec<AttendanceEvent>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "SELECT {EVENT_COLUMNS} FROM attendance_records
                 WHERE employee_id = ?1
                   AND employee_time_millis >= ?2
                   AND employee_time_millis < ?3
                 ORDER BY employee_time_millis ASC, id ASC"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![employee_id, start_millis, end_millis], map_event_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(rows)
        })
        .await
        .map_err(map_join_error)?
    }

    fn observe(&self) -> broadcast::Receiver<AttendanceEvent> {
        self.events_tx.subscribe()
    }
}

fn map_event_row(row: &Row<'_>) -> rusqlite::Result<AttendanceEvent> {
    let raw_type: String = row.get(2)?;
    let punch_type = PunchType::parse(&raw_type).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string())),
        )
    })?;

    Ok(AttendanceEvent {
        id: row.get(0)?,
        employee_id: row.get(1)?,
        punch_type,
        system_time_millis: row.get(3)?,
        employee_time_millis: row.get(4)?,
        is_manually_edited: row.get(5)?,
        reason: row.get(6)?,
        work_reason: row.get(7)?,
        is_office_work: row.get(8)?,
        selfie_path: row.get(9)?,
    })
}

fn map_join_error(err: task::JoinError) -> PunchClockError {
    if err.is_cancelled() {
        PunchClockError::Internal("blocking attendance repository task cancelled".into())
    } else {
        PunchClockError::Internal(format!("blocking attendance repository task failed: {err}"))
    }
}
