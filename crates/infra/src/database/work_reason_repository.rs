//! SQLite-backed catalog of office work reasons.

use std::sync::Arc;

use async_trait::async_trait;
use punchclock_core::WorkReasonRepository;
use punchclock_domain::{OfficeWorkReason, PunchClockError, Result};
use rusqlite::{params, Row};
use tokio::task;

use super::manager::{map_sql_error, DbManager};

/// Work reason repository backed by SQLite.
pub struct SqliteWorkReasonRepository {
    db: Arc<DbManager>,
}

impl SqliteWorkReasonRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

const SEARCH_REASONS_SQL: &str = "SELECT reason, usage_count, last_used_millis
    FROM office_work_reasons
    WHERE reason LIKE '%' || ?1 || '%'
    ORDER BY usage_count DESC, last_used_millis DESC";

const INSERT_REASON_SQL: &str = "INSERT INTO office_work_reasons
    (reason, usage_count, last_used_millis) VALUES (?1, ?2, ?3)";

const INCREMENT_REASON_SQL: &str = "UPDATE office_work_reasons
    SET usage_count = usage_count + 1, last_used_millis = ?2
    WHERE reason = ?1";

#[async_trait]
impl WorkReasonRepository for SqliteWorkReasonRepository {
    async fn search(&self, fragment: &str) -> Result<Vec<OfficeWorkReason>> {
        let db = Arc::clone(&self.db);
        let fragment = fragment.to_string();

        task::spawn_blocking(move || -> Result<Vec<OfficeWorkReason>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(SEARCH_REASONS_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![fragment], map_reason_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(rows)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn insert(&self, reason: &OfficeWorkReason) -> Result<()> {
        let db = Arc::clone(&self.db);
        let reason = reason.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                INSERT_REASON_SQL,
                params![reason.reason, reason.usage_count, reason.last_used_millis],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn increment_usage(&self, reason: &str, used_at_millis: i64) -> Result<()> {
        let db = Arc::clone(&self.db);
        let reason = reason.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(INCREMENT_REASON_SQL, params![reason, used_at_millis])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_reason_row(row: &Row<'_>) -> rusqlite::Result<OfficeWorkReason> {
    Ok(OfficeWorkReason {
        reason: row.get(0)?,
        usage_count: row.get(1)?,
        last_used_millis: row.get(2)?,
    })
}

fn map_join_error(err: task::JoinError) -> PunchClockError {
    PunchClockError::Internal(format!("blocking work reason task failed: {err}"))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn setup() -> (SqliteWorkReasonRepository, TempDir) {
        let temp_dir = TempDir::new().expect("tempdir created");
        let db_path = temp_dir.path().join("reasons.db");

        let manager = Arc::new(DbManager::new(&db_path, 4).expect("db manager created"));
        manager.run_migrations().expect("migrations run");

        (SqliteWorkReasonRepository::new(manager), temp_dir)
    }

    fn reason(text: &str, used_at_millis: i64) -> OfficeWorkReason {
        OfficeWorkReason {
            reason: text.to_string(),
            usage_count: 1,
            last_used_millis: used_at_millis,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn search_matches_substrings() {
        let (repo, _dir) = setup().await;

        repo.insert(&reason("client site visit", 1_000)).await.unwrap();
        repo.insert(&reason("warehouse audit", 2_000)).await.unwrap();

        let hits = repo.search("site").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].reason, "client site visit");
        assert_eq!(hits[0].usage_count, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn search_orders_by_usage_then_recency() {
        let (repo, _dir) = setup().await;

        repo.insert(&reason("site visit", 1_000)).await.unwrap();
        repo.insert(&reason("site survey", 2_000)).await.unwrap();
        repo.increment_usage("site visit", 3_000).await.unwrap();

        let hits = repo.search("site").await.unwrap();
        assert_eq!(hits[0].reason, "site visit");
        assert_eq!(hits[0].usage_count, 2);
        assert_eq!(hits[1].reason, "site survey");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn increment_updates_last_used() {
        let (repo, _dir) = setup().await;

        repo.insert(&reason("delivery run", 1_000)).await.unwrap();
        repo.increment_usage("delivery run", 9_000).await.unwrap();

        let hits = repo.search("delivery").await.unwrap();
        assert_eq!(hits[0].last_used_millis, 9_000);
        assert_eq!(hits[0].usage_count, 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn increment_on_unknown_reason_is_a_no_op() {
        let (repo, _dir) = setup().await;
        repo.increment_usage("missing", 1_000).await.unwrap();
        assert!(repo.search("missing").await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn duplicate_insert_is_rejected() {
        let (repo, _dir) = setup().await;

        repo.insert(&reason("site visit", 1_000)).await.unwrap();
        let err = repo.insert(&reason("site visit", 2_000)).await.unwrap_err();
        assert!(matches!(err, PunchClockError::Storage(_)));
    }
}
