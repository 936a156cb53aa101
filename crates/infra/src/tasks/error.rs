use talentflow_core::DomainError;
use thiserror::Error;

use super::types::{QueueName, TaskId};
use crate::store::StoreError;

/// Queue-level failures (enqueue, status, manual retry).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue {0} is shut down")]
    Closed(QueueName),

    #[error("task {task} not found in queue {queue}")]
    TaskNotFound { queue: QueueName, task: TaskId },

    #[error("task {0} is not in the failed state")]
    NotFailed(TaskId),

    #[error("unknown queue: {0}")]
    UnknownQueue(String),

    #[error("task payload could not be encoded: {0}")]
    Payload(String),
}

/// Outcome classification for a failed handler run.
///
/// Only [`TaskError::Transient`] is retried; everything else fails the task
/// on the spot because another attempt cannot change the result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    /// Referenced entity missing or outside the payload's tenant.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    StateConflict(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Includes unknown connector types and inactive connectors.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The external service answered and refused.
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("{0}")]
    Transient(String),
}

impl TaskError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Transient(_))
    }
}

impl From<DomainError> for TaskError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(_) | DomainError::Unauthorized => TaskError::NotFound(err.to_string()),
            DomainError::StateConflict { .. } => TaskError::StateConflict(err.to_string()),
            DomainError::Validation(_) | DomainError::InvalidId(_) => {
                TaskError::InvalidPayload(err.to_string())
            }
            // duplicate version numbers: a retry recomputes max+1
            DomainError::Conflict(_) => TaskError::Transient(err.to_string()),
        }
    }
}

impl From<StoreError> for TaskError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(e) => e.into(),
            StoreError::Backend(msg) => TaskError::Transient(msg),
        }
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(err: serde_json::Error) -> Self {
        TaskError::InvalidPayload(err.to_string())
    }
}
