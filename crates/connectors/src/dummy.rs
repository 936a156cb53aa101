//! In-process board for demos and tests.
//!
//! Config:
//! - `mode`: `"accept"` (default), `"reject"` (board refuses) or `"unreachable"`
//!   (transport error)
//! - `error`: refusal message used in `reject` mode

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::config::ConnectorConfig;
use crate::connector::{ConnectorError, ConnectorOutcome, JobBoardConnector, JobPostingData};

pub const TYPE: &str = "dummy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Accept,
    Reject,
    Unreachable,
}

#[derive(Debug, Clone)]
pub struct DummyConnector {
    mode: Mode,
    error: String,
}

impl DummyConnector {
    pub fn accepting() -> Self {
        Self {
            mode: Mode::Accept,
            error: String::new(),
        }
    }

    pub fn from_config(config: &ConnectorConfig) -> Result<Self, ConnectorError> {
        let mode = match config.str_or("mode", "accept") {
            "accept" => Mode::Accept,
            "reject" => Mode::Reject,
            "unreachable" => Mode::Unreachable,
            other => {
                return Err(ConnectorError::Configuration(format!(
                    "unknown dummy mode `{other}`"
                )));
            }
        };
        Ok(Self {
            mode,
            error: config.str_or("error", "rejected by dummy board").to_string(),
        })
    }

    fn respond(&self, external_id: impl FnOnce() -> String) -> Result<ConnectorOutcome, ConnectorError> {
        match self.mode {
            Mode::Accept => Ok(ConnectorOutcome::ok(external_id()).with_status(201)),
            Mode::Reject => Ok(ConnectorOutcome::failed(self.error.clone()).with_status(422)),
            Mode::Unreachable => Err(ConnectorError::Transport("dummy board unreachable".to_string())),
        }
    }
}

#[async_trait]
impl JobBoardConnector for DummyConnector {
    fn connector_type(&self) -> &'static str {
        TYPE
    }

    async fn publish(&self, job: &JobPostingData) -> Result<ConnectorOutcome, ConnectorError> {
        debug!(reference = %job.reference_id, "dummy publish");
        self.respond(|| format!("dummy-{}", Uuid::now_v7().simple()))
    }

    async fn update(
        &self,
        external_id: &str,
        _job: &JobPostingData,
    ) -> Result<ConnectorOutcome, ConnectorError> {
        self.respond(|| external_id.to_string())
    }

    async fn stop(&self, external_id: &str) -> Result<ConnectorOutcome, ConnectorError> {
        self.respond(|| external_id.to_string())
    }

    async fn test_connection(&self) -> bool {
        self.mode != Mode::Unreachable
    }
}
