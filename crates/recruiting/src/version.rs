//! Immutable generated artifacts attached to a job.
//!
//! Versions are numbered per job starting at 1; each generation run appends
//! exactly one version with `max(existing) + 1`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use talentflow_core::JobId;

/// Generated posting text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextVersion {
    pub job_id: JobId,
    pub version: u32,
    pub content: String,
    pub prompt: Option<String>,
    /// Provider/model that produced the content (`mock-template` for fallbacks).
    pub model: String,
    pub created_at: DateTime<Utc>,
}

/// Generated posting image (stored as a reference, not bytes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageVersion {
    pub job_id: JobId,
    pub version: u32,
    pub image_url: String,
    pub prompt: Option<String>,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

/// Next version number given the numbers already stored for one job.
pub fn next_version_number(existing: impl IntoIterator<Item = u32>) -> u32 {
    existing.into_iter().max().unwrap_or(0) + 1
}
