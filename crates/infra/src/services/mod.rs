//! Synchronous, request-facing operations.
//!
//! Services validate ownership and state up front, so callers get not-found
//! and state-conflict errors immediately; everything slow goes through the
//! task queues.

mod approval;
mod connector;
mod enqueue;
mod events;
mod publication;

pub use approval::ApprovalService;
pub use connector::{ConnectionTest, ConnectorService};
pub use enqueue::{EnqueueService, PublicationEnqueued};
pub use events::InboundEventService;
pub use publication::PublicationService;

use talentflow_connectors::ConnectorError;
use talentflow_core::DomainError;
use thiserror::Error;

use crate::store::StoreError;
use crate::tasks::QueueError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage error: {0}")]
    Store(String),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(e) => ServiceError::Domain(e),
            StoreError::Backend(msg) => ServiceError::Store(msg),
        }
    }
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Domain(e) if e.is_not_found())
    }

    pub fn is_state_conflict(&self) -> bool {
        matches!(self, ServiceError::Domain(e) if e.is_state_conflict())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
