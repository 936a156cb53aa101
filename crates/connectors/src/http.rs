//! Shared HTTP plumbing for board variants.

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::connector::{ConnectorError, ConnectorOutcome};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub enum BoardAuth {
    Bearer(String),
    ApiKey { header: &'static str, key: String },
}

/// Decoded board response (non-JSON bodies are kept as a JSON string).
#[derive(Debug, Clone)]
pub struct BoardResponse {
    pub status: u16,
    pub body: Value,
}

impl BoardResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 2xx with an id found at `id_pointer` => success, anything else => refusal.
    pub fn into_outcome(self, id_pointer: &str) -> ConnectorOutcome {
        if !self.is_success() {
            return self.into_failure();
        }
        match self.body.pointer(id_pointer).and_then(id_as_string) {
            Some(id) => ConnectorOutcome::ok(id)
                .with_status(self.status)
                .with_raw(self.body),
            None => ConnectorOutcome::failed(format!("board response has no `{id_pointer}`"))
                .with_status(self.status)
                .with_raw(self.body),
        }
    }

    /// 2xx => success carrying a known external id, anything else => refusal.
    pub fn into_ack(self, external_id: &str) -> ConnectorOutcome {
        if !self.is_success() {
            return self.into_failure();
        }
        ConnectorOutcome::ok(external_id)
            .with_status(self.status)
            .with_raw(self.body)
    }

    fn into_failure(self) -> ConnectorOutcome {
        let body = match &self.body {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        ConnectorOutcome::failed(format!("HTTP {}: {}", self.status, body))
            .with_status(self.status)
            .with_raw(self.body)
    }
}

fn id_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct BoardClient {
    client: reqwest::Client,
    base_url: String,
    auth: BoardAuth,
}

impl BoardClient {
    pub fn new(base_url: &str, auth: BoardAuth, timeout: Duration) -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectorError::Configuration(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<BoardResponse, ConnectorError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "job board request");

        let mut req = self.client.request(method, &url);
        req = match &self.auth {
            BoardAuth::Bearer(token) => req.bearer_auth(token),
            BoardAuth::ApiKey { header, key } => req.header(*header, key),
        };
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await?;
        let status = res.status().as_u16();
        let text = res.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(BoardResponse { status, body })
    }

    /// Auth probe used by `test_connection`.
    pub async fn probe(&self, path: &str) -> bool {
        match self.send(Method::GET, path, None).await {
            Ok(res) => res.is_success(),
            Err(e) => {
                debug!(error = %e, "job board probe failed");
                false
            }
        }
    }
}
