use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use talentflow_core::PublicationId;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/:id", get(get_publication))
        .route("/:id/stop", post(stop))
        .route("/:id/logs", get(logs))
}

pub async fn get_publication(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PublicationId = match errors::parse_id(&id, "publication") {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.publications.get(ctx.tenant_id(), id) {
        Ok(publication) => (StatusCode::OK, Json(publication)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Local status flip only; the board listing is left as is.
pub async fn stop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PublicationId = match errors::parse_id(&id, "publication") {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.publications.stop(ctx.tenant_id(), id) {
        Ok(publication) => (StatusCode::OK, Json(publication)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn logs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PublicationId = match errors::parse_id(&id, "publication") {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.publications.logs(ctx.tenant_id(), id) {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
