//! Task status surface: counts per queue, single-task status, dead-letter
//! inspection and manual retry.
//!
//! Task lookups are scoped to the caller's tenant through the payload's
//! `tenantId`; a foreign task answers 404 exactly like an unknown one.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use talentflow_auth::Role;
use talentflow_infra::tasks::{QueueName, TaskId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::RequestContext;

const DEFAULT_FAILED_LIMIT: usize = 50;

pub fn router() -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/job/:queue_name/:task_id", get(task_status))
        .route("/job/:queue_name/:task_id/retry", post(retry_task))
        .route("/failed/:queue_name", get(list_failed))
}

pub async fn stats(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(services.queues.stats())
}

pub async fn task_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path((queue_name, task_id)): Path<(String, String)>,
) -> axum::response::Response {
    let (queue, task_id) = match parse_task_path(&queue_name, &task_id) {
        Ok(parsed) => parsed,
        Err(res) => return res,
    };

    match services.queues.status_for_tenant(queue, task_id, ctx.tenant_id()) {
        Some(view) => (StatusCode::OK, Json(view)).into_response(),
        None => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("task {task_id} not found in queue {queue}"),
        ),
    }
}

pub async fn list_failed(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(queue_name): Path<String>,
    Query(query): Query<dto::FailedQuery>,
) -> axum::response::Response {
    let queue = match parse_queue(&queue_name) {
        Ok(q) => q,
        Err(res) => return res,
    };
    let limit = query.limit.unwrap_or(DEFAULT_FAILED_LIMIT);
    let items = services
        .queues
        .list_failed_for_tenant(queue, ctx.tenant_id(), limit);
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn retry_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path((queue_name, task_id)): Path<(String, String)>,
) -> axum::response::Response {
    if let Err(res) = ctx.require_any_role(&[Role::ADMIN]) {
        return res;
    }
    let (queue, task_id) = match parse_task_path(&queue_name, &task_id) {
        Ok(parsed) => parsed,
        Err(res) => return res,
    };

    let retried = services
        .queues
        .retry_failed_for_tenant(queue, task_id, ctx.tenant_id());
    match retried {
        Ok(handle) => (StatusCode::ACCEPTED, Json(handle)).into_response(),
        Err(e) => errors::queue_error_to_response(e),
    }
}

fn parse_queue(raw: &str) -> Result<QueueName, axum::response::Response> {
    raw.parse::<QueueName>()
        .map_err(|msg| errors::json_error(StatusCode::NOT_FOUND, "unknown_queue", msg))
}

fn parse_task_path(
    queue_name: &str,
    task_id: &str,
) -> Result<(QueueName, TaskId), axum::response::Response> {
    Ok((parse_queue(queue_name)?, errors::parse_id(task_id, "task")?))
}
