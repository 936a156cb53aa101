use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use talentflow_connectors::ConnectorError;
use talentflow_core::DomainError;
use talentflow_infra::services::ServiceError;
use talentflow_infra::tasks::QueueError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Queue(e) => queue_error_to_response(e),
        ServiceError::Connector(ConnectorError::Transport(msg)) => {
            json_error(StatusCode::BAD_GATEWAY, "connector_unreachable", msg)
        }
        ServiceError::Connector(e) => {
            json_error(StatusCode::BAD_REQUEST, "connector_configuration", e.to_string())
        }
        ServiceError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        ServiceError::Store(msg) => {
            error!(error = %msg, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::StateConflict { .. } => {
            json_error(StatusCode::CONFLICT, "state_conflict", message)
        }
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::Validation(_) | DomainError::InvalidId(_) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", message)
        }
        DomainError::Unauthorized => json_error(StatusCode::FORBIDDEN, "forbidden", message),
    }
}

pub fn queue_error_to_response(err: QueueError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        QueueError::TaskNotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", message),
        QueueError::UnknownQueue(_) => json_error(StatusCode::NOT_FOUND, "unknown_queue", message),
        QueueError::NotFailed(_) => json_error(StatusCode::CONFLICT, "state_conflict", message),
        QueueError::Closed(_) => json_error(StatusCode::SERVICE_UNAVAILABLE, "queue_closed", message),
        QueueError::Payload(_) => {
            error!(error = %message, "task payload encoding failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "queue_error", message)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path id, answering 400 on malformed input.
pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &'static str) -> Result<T, axum::response::Response> {
    raw.parse().map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("{what} id `{raw}` is not a valid id"),
        )
    })
}
