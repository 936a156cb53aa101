//! Job routes: seeding, generation, approval submission and publication.
//!
//! Generation and publication only enqueue; the response carries the task
//! handle to poll at `/queue/job/:queueName/:taskId`.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use talentflow_core::JobId;
use talentflow_infra::store::RecruitingStore;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_job))
        .route("/:id", get(get_job))
        .route("/:id/generate/text", post(generate_text))
        .route("/:id/generate/image", post(generate_image))
        .route("/:id/submit-approval", post(submit_approval))
        .route("/:id/publish", post(publish))
}

pub async fn create_job(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CreateJobRequest>,
) -> axum::response::Response {
    if body.title.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "title must not be empty");
    }
    let job = body.into_job();
    if let Err(e) = services.store.insert_job(ctx.tenant_id(), job.clone()) {
        return errors::service_error_to_response(e.into());
    }
    info!(job_id = %job.id, tenant = %ctx.tenant_id(), "job created");
    (StatusCode::CREATED, Json(job)).into_response()
}

pub async fn get_job(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: JobId = match errors::parse_id(&id, "job") {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.store.get_job(ctx.tenant_id(), id) {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(e) => errors::service_error_to_response(e.into()),
    }
}

pub async fn generate_text(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    body: Option<Json<dto::GenerateRequest>>,
) -> axum::response::Response {
    let id: JobId = match errors::parse_id(&id, "job") {
        Ok(id) => id,
        Err(res) => return res,
    };
    let prompt = body.and_then(|Json(b)| b.prompt);
    match services.enqueue.enqueue_text_generation(ctx.tenant_id(), id, prompt) {
        Ok(handle) => (StatusCode::ACCEPTED, Json(handle)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn generate_image(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    body: Option<Json<dto::GenerateRequest>>,
) -> axum::response::Response {
    let id: JobId = match errors::parse_id(&id, "job") {
        Ok(id) => id,
        Err(res) => return res,
    };
    let prompt = body.and_then(|Json(b)| b.prompt);
    match services.enqueue.enqueue_image_generation(ctx.tenant_id(), id, prompt) {
        Ok(handle) => (StatusCode::ACCEPTED, Json(handle)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn submit_approval(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: JobId = match errors::parse_id(&id, "job") {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services
        .approvals
        .submit(ctx.tenant_id(), id, Some(ctx.user_id()))
    {
        Ok(approval) => (StatusCode::CREATED, Json(approval)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn publish(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::PublishRequest>,
) -> axum::response::Response {
    let id: JobId = match errors::parse_id(&id, "job") {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services
        .enqueue
        .enqueue_publication(ctx.tenant_id(), id, body.connector_id)
    {
        Ok(queued) => (StatusCode::ACCEPTED, Json(queued)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
