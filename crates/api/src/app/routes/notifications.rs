use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};

use talentflow_infra::tasks::EmailPayload;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new().route("/email", post(send_email))
}

pub async fn send_email(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<EmailPayload>,
) -> axum::response::Response {
    match services.enqueue.enqueue_email(ctx.tenant_id(), body) {
        Ok(handle) => (StatusCode::ACCEPTED, Json(handle)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
