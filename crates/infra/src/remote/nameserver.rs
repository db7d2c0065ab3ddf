//! Nameserver lookup for remote store credentials.
//!
//! During device enrollment the app posts its organisation uuid and pin to
//! the nameserver's `/api/config/get` endpoint, which answers with the
//! Supabase endpoint and anon key inside a `config` envelope. Deployed
//! nameservers disagree on field names, so resolution walks a candidate
//! list instead of binding to one schema.

use std::time::Duration;

use punchclock_domain::{PunchClockError, RemoteConfig, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::error::RemoteError;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(15);
const CONFIG_PATH: &str = "/api/config/get";

const URL_FIELDS: &[&str] = &["url", "supabaseUrl", "supabase_url"];
const KEY_FIELDS: &[&str] =
    &["anonKey", "supabaseKey", "supabase_key", "supabaseAnonKey", "supabase_anon_key"];

#[derive(Debug, Serialize)]
struct ConfigRequest<'a> {
    uuid: &'a str,
    pin: &'a str,
}

/// Client for the enrollment nameserver.
pub struct NameserverClient {
    http: reqwest::Client,
    base_url: String,
}

impl NameserverClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(RemoteError::from)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// Exchange enrollment credentials for a remote config.
    pub async fn fetch_remote_config(&self, uuid: &str, pin: &str) -> Result<RemoteConfig> {
        let url = format!("{}{CONFIG_PATH}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&ConfigRequest { uuid, pin })
            .send()
            .await
            .map_err(RemoteError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status, body).into());
        }

        let payload: Value = response.json().await.map_err(RemoteError::from)?;
        if payload.get("success").and_then(Value::as_bool) == Some(false) {
            let detail = payload
                .get("error")
                .or_else(|| payload.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("lookup rejected");
            return Err(PunchClockError::Config(format!("nameserver refused lookup: {detail}")));
        }

        let config = payload.get("config").ok_or_else(|| {
            PunchClockError::Config("nameserver response has no config object".into())
        })?;
        let endpoint = resolve_field(config, URL_FIELDS).ok_or_else(|| {
            PunchClockError::Config("nameserver config is missing the endpoint url".into())
        })?;
        let key = resolve_field(config, KEY_FIELDS).ok_or_else(|| {
            PunchClockError::Config("nameserver config is missing the api key".into())
        })?;

        debug!("remote config resolved from nameserver");
        Ok(RemoteConfig::new(endpoint, key))
    }
}

/// First non-blank string value among the candidate field names.
fn resolve_field(payload: &Value, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|name| payload.get(name))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
