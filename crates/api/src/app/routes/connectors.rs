use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use talentflow_auth::Role;
use talentflow_core::ConnectorId;
use talentflow_infra::store::RecruitingStore;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_connector))
        .route("/types", get(types))
        .route("/:id/test", post(test_connection))
}

pub async fn create_connector(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CreateConnectorRequest>,
) -> axum::response::Response {
    if let Err(res) = ctx.require_any_role(&[Role::ADMIN]) {
        return res;
    }
    if !services.connectors.types().contains(&body.connector_type) {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("unknown connector type: {}", body.connector_type),
        );
    }

    let record = body.into_record(ctx.tenant_id());
    if let Err(e) = services.store.insert_connector(record.clone()) {
        return errors::service_error_to_response(e.into());
    }
    info!(connector_id = %record.id, connector_type = %record.connector_type, "connector registered");

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": record.id,
            "name": record.name,
            "type": record.connector_type,
            "isActive": record.is_active,
        })),
    )
        .into_response()
}

pub async fn types(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(serde_json::json!({ "types": services.connectors.types() }))
}

pub async fn test_connection(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ConnectorId = match errors::parse_id(&id, "connector") {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.connectors.test(ctx.tenant_id(), id).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
