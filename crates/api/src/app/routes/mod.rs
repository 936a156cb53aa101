use axum::{routing::get, Router};

pub mod approvals;
pub mod connectors;
pub mod customers;
pub mod jobs;
pub mod notifications;
pub mod publications;
pub mod queue;
pub mod system;
pub mod webhooks;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/queue", queue::router())
        .nest("/customers", customers::router())
        .nest("/jobs", jobs::router())
        .nest("/approvals", approvals::router())
        .nest("/publications", publications::router())
        .nest("/connectors", connectors::router())
        .nest("/webhooks", webhooks::router())
        .nest("/notifications", notifications::router())
}
