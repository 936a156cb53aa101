//! The connector contract.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Snapshot of a job handed to a board. Built by the caller right before the
/// call; connectors never see persisted entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPostingData {
    /// Our job id, sent as the board's reference id.
    pub reference_id: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub employment_type: Option<String>,
    pub requirements: Option<String>,
    /// Latest generated posting text, if any.
    pub content: Option<String>,
    /// Latest generated image reference, if any.
    pub image_url: Option<String>,
}

/// Result of a board call that reached the board.
///
/// `success: false` means the board answered and refused; transport problems
/// are reported as [`ConnectorError`] instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorOutcome {
    pub success: bool,
    pub external_id: Option<String>,
    pub error: Option<String>,
    pub status_code: Option<u16>,
    /// Raw board response body for diagnostics.
    pub raw: Option<Value>,
}

impl ConnectorOutcome {
    pub fn ok(external_id: impl Into<String>) -> Self {
        Self {
            success: true,
            external_id: Some(external_id.into()),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn unsupported(capability: &str) -> Self {
        Self::failed(format!("{capability} is not supported by this connector"))
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub external_id: String,
    pub candidate_name: Option<String>,
    pub email: Option<String>,
    pub message: String,
    pub received_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub views: u64,
    pub clicks: u64,
    pub applications: u64,
}

/// Optional capabilities a variant actually implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub reply_to_inquiry: bool,
    pub fetch_inquiries: bool,
    pub fetch_daily_metrics: bool,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities {
        reply_to_inquiry: false,
        fetch_inquiries: false,
        fetch_daily_metrics: false,
    };
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectorError {
    #[error("unknown connector type: {0}")]
    UnknownType(String),

    #[error("invalid connector configuration: {0}")]
    Configuration(String),

    #[error("job board unreachable: {0}")]
    Transport(String),
}

impl ConnectorError {
    /// Only transport failures can succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConnectorError::Transport(_))
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        ConnectorError::Transport(err.to_string())
    }
}

/// One job board.
///
/// Optional capabilities default to safe no-ops; callers check
/// [`JobBoardConnector::capabilities`] before relying on them.
#[async_trait]
pub trait JobBoardConnector: Send + Sync {
    /// The registry type string this variant is registered under.
    fn connector_type(&self) -> &'static str;

    async fn publish(&self, job: &JobPostingData) -> Result<ConnectorOutcome, ConnectorError>;

    async fn update(
        &self,
        external_id: &str,
        job: &JobPostingData,
    ) -> Result<ConnectorOutcome, ConnectorError>;

    async fn stop(&self, external_id: &str) -> Result<ConnectorOutcome, ConnectorError>;

    /// Lightweight auth check. Never errors; unreachable boards report `false`.
    async fn test_connection(&self) -> bool;

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    async fn reply_to_inquiry(
        &self,
        _external_id: &str,
        _message: &str,
    ) -> Result<ConnectorOutcome, ConnectorError> {
        Ok(ConnectorOutcome::unsupported("replyToInquiry"))
    }

    async fn fetch_inquiries(&self, _external_job_id: &str) -> Result<Vec<Inquiry>, ConnectorError> {
        Ok(Vec::new())
    }

    async fn fetch_daily_metrics(
        &self,
        _external_job_id: &str,
        _date: NaiveDate,
    ) -> Result<Option<DailyMetrics>, ConnectorError> {
        Ok(None)
    }
}
