use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use tracing::info;

use talentflow_auth::Role;
use talentflow_infra::notifications::INBOUND_PREFIX;
use talentflow_infra::store::RecruitingStore;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_webhook))
        .route("/inbound/:source", post(receive_inbound))
}

pub async fn register_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CreateWebhookRequest>,
) -> axum::response::Response {
    if let Err(res) = ctx.require_any_role(&[Role::ADMIN]) {
        return res;
    }
    if !(body.url.starts_with("http://") || body.url.starts_with("https://")) {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "url must be http(s)");
    }

    let endpoint = body.into_endpoint(ctx.tenant_id());
    if let Err(e) = services.store.insert_webhook(endpoint.clone()) {
        return errors::service_error_to_response(e.into());
    }
    info!(webhook_id = %endpoint.id, tenant = %ctx.tenant_id(), "webhook registered");
    (StatusCode::CREATED, Json(endpoint)).into_response()
}

/// Event pushed by an integration on behalf of the token's tenant. Answers
/// 202 once fan-out has started; delivery outcomes are only logged.
pub async fn receive_inbound(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(source): Path<String>,
    Json(body): Json<dto::InboundEventRequest>,
) -> axum::response::Response {
    match services
        .events
        .receive(ctx.tenant_id(), &source, &body.event, body.job_id, body.data)
    {
        Ok(sent) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({
                "event": format!("{INBOUND_PREFIX}.{source}.{}", body.event),
                "email": sent.email,
                "webhooksDispatched": sent.webhooks.is_some(),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
