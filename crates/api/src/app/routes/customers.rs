use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use tracing::info;

use talentflow_infra::store::RecruitingStore;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new().route("/", post(create_customer))
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CreateCustomerRequest>,
) -> axum::response::Response {
    if body.name.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "name must not be empty");
    }
    let customer = body.into_customer(ctx.tenant_id());
    if let Err(e) = services.store.insert_customer(customer.clone()) {
        return errors::service_error_to_response(e.into());
    }
    info!(customer_id = %customer.id, tenant = %ctx.tenant_id(), "customer created");
    (StatusCode::CREATED, Json(customer)).into_response()
}
