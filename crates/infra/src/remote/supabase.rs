//! Supabase REST adapter for the remote attendance store.
//!
//! Rows go through PostgREST (`/rest/v1`), selfies through the storage API
//! (`/storage/v1`). Every request carries the project anon key as both the
//! `apikey` header and a bearer token.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use punchclock_core::RemoteStore;
use punchclock_domain::constants::{ATTENDANCE_TABLE, EMPLOYEES_TABLE, SELFIE_BUCKET};
use punchclock_domain::{PunchOutUpdate, RemoteAttendanceRecord, RemoteConfig, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use tracing::{debug, warn};

use super::error::RemoteError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for one Supabase project.
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
}

impl SupabaseClient {
    /// Build a client from a complete remote config.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key_value = HeaderValue::from_str(config.key.trim())
            .map_err(|err| RemoteError::Validation(format!("invalid api key: {err}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.key.trim()))
            .map_err(|err| RemoteError::Validation(format!("invalid api key: {err}")))?;
        headers.insert("apikey", key_value);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(RemoteError::from)?;

        Ok(Self { http, base_url: config.url.trim().trim_end_matches('/').to_string() })
    }

    async fn insert_row<T: Serialize>(
        &self,
        table: &str,
        row: &T,
    ) -> std::result::Result<(), RemoteError> {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;
        check_status(response).await
    }

    /// Patch the employee's open row, matched by a null `punch_out_time`.
    /// PostgREST reports success even when zero rows match.
    async fn update_open_punch(
        &self,
        employee_id: &str,
        update: &PunchOutUpdate,
    ) -> std::result::Result<(), RemoteError> {
        let url = format!("{}/rest/v1/{ATTENDANCE_TABLE}", self.base_url);
        let response = self
            .http
            .patch(&url)
            .query(&[
                ("employee_id", format!("eq.{employee_id}")),
                ("punch_out_time", "is.null".to_string()),
            ])
            .header("Prefer", "return=minimal")
            .json(update)
            .send()
            .await?;
        check_status(response).await
    }

    async fn select_limited(&self, table: &str) -> std::result::Result<(), RemoteError> {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        let response =
            self.http.get(&url).query(&[("select", "employee_id"), ("limit", "1")]).send().await?;
        check_status(response).await
    }

    /// Upload an object into the selfie bucket and return its public URL.
    async fn put_object(
        &self,
        object_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> std::result::Result<String, RemoteError> {
        let url = format!("{}/storage/v1/object/{SELFIE_BUCKET}/{object_name}", self.base_url);
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;
        check_status(response).await?;

        Ok(format!(
            "{}/storage/v1/object/public/{SELFIE_BUCKET}/{object_name}",
            self.base_url
        ))
    }
}

async fn check_status(response: reqwest::Response) -> std::result::Result<(), RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::from_status(status, body))
}

fn content_type_for(file_name: &str) -> &'static str {
    match Path::new(file_name).extension().and_then(|ext| ext.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl RemoteStore for SupabaseClient {
    async fn insert_punch_in(&self, record: &RemoteAttendanceRecord) -> Result<()> {
        self.insert_row(ATTENDANCE_TABLE, record).await?;
        Ok(())
    }

    async fn complete_punch_out(&self, employee_id: &str, update: &PunchOutUpdate) -> Result<()> {
        self.update_open_punch(employee_id, update).await?;
        Ok(())
    }

    async fn upload_selfie(
        &self,
        local_path: &str,
        captured_at_millis: i64,
    ) -> Result<Option<String>> {
        let bytes = match tokio::fs::read(local_path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                // The photo may have been cleaned up locally; the punch row
                // still syncs with a null image URL.
                warn!(path = local_path, error = %err, "selfie file unreadable, skipping upload");
                return Ok(None);
            }
        };

        let file_name = Path::new(local_path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("selfie.jpg");
        let object_name = format!("selfie_{captured_at_millis}_{file_name}");
        let content_type = content_type_for(file_name);

        let url = self.put_object(&object_name, content_type, bytes).await?;
        debug!(object_name, "selfie uploaded");
        Ok(Some(url))
    }

    async fn probe(&self) -> Result<()> {
        match self.select_limited(EMPLOYEES_TABLE).await {
            Ok(()) => Ok(()),
            // A missing table still proves the endpoint answered.
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
