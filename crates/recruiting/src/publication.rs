use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use talentflow_core::{ConnectorId, Entity, JobId, PublicationId, StateMachine};

/// Status of one (job, connector) publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublicationStatus {
    Pending,
    Publishing,
    Published,
    Failed,
    Stopped,
}

impl PublicationStatus {
    /// Whether the posting is (or is about to be) live on the board.
    pub fn is_live(self) -> bool {
        matches!(self, PublicationStatus::Publishing | PublicationStatus::Published)
    }
}

impl StateMachine for PublicationStatus {
    const ENTITY: &'static str = "publication";

    fn can_transition_to(self, next: Self) -> bool {
        use PublicationStatus::*;
        matches!(
            (self, next),
            (Pending, Publishing)
                | (Publishing, Published)
                | (Publishing, Failed)
                // a retried task re-enters PUBLISHING after a thrown attempt
                | (Failed, Publishing)
                | (Failed, Pending)
                | (Stopped, Pending)
                | (Pending, Stopped)
                | (Publishing, Stopped)
                | (Published, Stopped)
                | (Failed, Stopped)
        )
    }
}

/// Named publication status writes.
pub mod transitions {
    use talentflow_core::Transition;

    use super::PublicationStatus::{self, *};

    pub const START: Transition<PublicationStatus> = Transition::new(&[Pending, Failed], Publishing);
    pub const SUCCEED: Transition<PublicationStatus> = Transition::new(&[Publishing], Published);
    pub const FAIL: Transition<PublicationStatus> = Transition::new(&[Publishing], Failed);
    pub const STOP: Transition<PublicationStatus> =
        Transition::new(&[Pending, Publishing, Published, Failed], Stopped);
    pub const REQUEUE: Transition<PublicationStatus> = Transition::new(&[Failed, Stopped], Pending);
}

/// One row per (job, connector) pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub id: PublicationId,
    pub job_id: JobId,
    pub connector_id: ConnectorId,
    pub status: PublicationStatus,
    /// Board-assigned id, set once the board accepted the posting.
    pub external_id: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Publication {
    pub fn pending(job_id: JobId, connector_id: ConnectorId) -> Self {
        let now = Utc::now();
        Self {
            id: PublicationId::new(),
            job_id,
            connector_id,
            status: PublicationStatus::Pending,
            external_id: None,
            published_at: None,
            stopped_at: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Publication {
    type Id = PublicationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationAction {
    Publish,
    Update,
    Stop,
}

/// Append-only record of a publish/stop attempt, with raw request/response
/// kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationLog {
    pub id: Uuid,
    pub publication_id: PublicationId,
    pub action: PublicationAction,
    pub success: bool,
    pub error: Option<String>,
    pub request: Option<serde_json::Value>,
    pub response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl PublicationLog {
    pub fn success(publication_id: PublicationId, action: PublicationAction) -> Self {
        Self {
            id: Uuid::now_v7(),
            publication_id,
            action,
            success: true,
            error: None,
            request: None,
            response: None,
            created_at: Utc::now(),
        }
    }

    pub fn failure(
        publication_id: PublicationId,
        action: PublicationAction,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::success(publication_id, action)
        }
    }

    pub fn with_request(mut self, request: serde_json::Value) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_response(mut self, response: serde_json::Value) -> Self {
        self.response = Some(response);
        self
    }
}
