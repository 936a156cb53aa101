use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use talentflow_auth::Role;
use talentflow_core::ApprovalId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::RequestContext;

const REVIEW_ROLES: &[&str] = &[Role::ADMIN, Role::REVIEWER];

pub fn router() -> Router {
    Router::new()
        .route("/:id/approve", post(approve))
        .route("/:id/reject", post(reject))
        .route("/:id/reviews", get(reviews))
}

pub async fn approve(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    body: Option<Json<dto::ReviewRequest>>,
) -> axum::response::Response {
    if let Err(res) = ctx.require_any_role(REVIEW_ROLES) {
        return res;
    }
    let id: ApprovalId = match errors::parse_id(&id, "approval") {
        Ok(id) => id,
        Err(res) => return res,
    };
    let comment = body.and_then(|Json(b)| b.comment);

    match services
        .approvals
        .approve(ctx.tenant_id(), id, Some(ctx.user_id()), comment)
        .await
    {
        Ok(approval) => (StatusCode::OK, Json(approval)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn reject(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    body: Option<Json<dto::ReviewRequest>>,
) -> axum::response::Response {
    if let Err(res) = ctx.require_any_role(REVIEW_ROLES) {
        return res;
    }
    let id: ApprovalId = match errors::parse_id(&id, "approval") {
        Ok(id) => id,
        Err(res) => return res,
    };
    let comment = body.and_then(|Json(b)| b.comment);

    match services
        .approvals
        .reject(ctx.tenant_id(), id, Some(ctx.user_id()), comment)
        .await
    {
        Ok(approval) => (StatusCode::OK, Json(approval)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn reviews(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ApprovalId = match errors::parse_id(&id, "approval") {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.approvals.reviews(ctx.tenant_id(), id) {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
