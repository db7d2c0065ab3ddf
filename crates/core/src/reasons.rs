//! Reason catalog for out-of-office autocomplete
//!
//! Tracks free-text office-work reasons with usage-frequency ranking. Rows
//! are created on first use and updated on reuse, never deleted.

use std::sync::Arc;

use async_trait::async_trait;
use punchclock_domain::{OfficeWorkReason, Result};

/// Trait for persisting office-work reasons.
#[async_trait]
pub trait WorkReasonRepository: Send + Sync {
    /// Case-insensitive substring search, ordered by `usage_count` desc then
    /// `last_used_millis` desc.
    async fn search(&self, query: &str) -> Result<Vec<OfficeWorkReason>>;

    /// Insert a novel reason row.
    async fn insert(&self, reason: &OfficeWorkReason) -> Result<()>;

    /// Increment usage for an exact reason text and refresh its timestamp.
    async fn increment_usage(&self, reason: &str, now_millis: i64) -> Result<()>;
}

/// Usage-ranked catalog of office-work reasons.
pub struct ReasonCatalog {
    repository: Arc<dyn WorkReasonRepository>,
}

impl ReasonCatalog {
    pub fn new(repository: Arc<dyn WorkReasonRepository>) -> Self {
        Self { repository }
    }

    /// Autocomplete lookup.
    pub async fn search(&self, query: &str) -> Result<Vec<OfficeWorkReason>> {
        self.repository.search(query).await
    }

    /// Record one use of `text`.
    ///
    /// The "already exists" check is a substring match, mirroring the
    /// historical behaviour of this catalog: a hit against a longer reason
    /// containing `text` suppresses the insert, and the increment then
    /// targets the exact text (possibly affecting zero rows). See DESIGN.md.
    pub async fn record_usage(&self, text: &str, now_millis: i64) -> Result<()> {
        let existing = self.repository.search(text).await?;
        if existing.is_empty() {
            self.repository
                .insert(&OfficeWorkReason {
                    reason: text.to_string(),
                    usage_count: 1,
                    last_used_millis: now_millis,
                })
                .await
        } else {
            self.repository.increment_usage(text, now_millis).await
        }
    }
}
