use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::RequestContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<RequestContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "tenant_id": ctx.tenant_id().to_string(),
        "user_id": ctx.user_id().to_string(),
        "roles": ctx.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
    }))
}
