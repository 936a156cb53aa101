//! Indeed-style board: bearer token auth, JSON job resources, candidate inbox.
//!
//! Config: `apiToken` (required), `apiUrl`, `employerId`, `timeoutSecs`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};

use crate::config::ConnectorConfig;
use crate::connector::{
    Capabilities, ConnectorError, ConnectorOutcome, Inquiry, JobBoardConnector, JobPostingData,
};
use crate::http::{BoardAuth, BoardClient, DEFAULT_TIMEOUT};

pub const TYPE: &str = "indeed";
const DEFAULT_API_URL: &str = "https://apis.indeed.com/v1";

#[derive(Debug, Clone)]
pub struct IndeedConnector {
    http: BoardClient,
    employer_id: Option<String>,
}

impl IndeedConnector {
    pub fn from_config(config: &ConnectorConfig) -> Result<Self, ConnectorError> {
        let token = config.require_str("apiToken")?;
        let timeout = config
            .get_u64("timeoutSecs")
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        let http = BoardClient::new(
            config.str_or("apiUrl", DEFAULT_API_URL),
            BoardAuth::Bearer(token.to_string()),
            timeout,
        )?;
        Ok(Self {
            http,
            employer_id: config.get_str("employerId").map(str::to_string),
        })
    }

    fn body(&self, job: &JobPostingData) -> Value {
        json!({
            "referenceId": job.reference_id,
            "employerId": self.employer_id,
            "title": job.title,
            "description": job.content.as_deref().unwrap_or(&job.description),
            "location": job.location,
            "salary": job.salary,
            "jobType": job.employment_type,
            "requirements": job.requirements,
            "imageUrl": job.image_url,
        })
    }
}

#[async_trait]
impl JobBoardConnector for IndeedConnector {
    fn connector_type(&self) -> &'static str {
        TYPE
    }

    async fn publish(&self, job: &JobPostingData) -> Result<ConnectorOutcome, ConnectorError> {
        let res = self.http.send(Method::POST, "/jobs", Some(&self.body(job))).await?;
        Ok(res.into_outcome("/id"))
    }

    async fn update(
        &self,
        external_id: &str,
        job: &JobPostingData,
    ) -> Result<ConnectorOutcome, ConnectorError> {
        let res = self
            .http
            .send(Method::PUT, &format!("/jobs/{external_id}"), Some(&self.body(job)))
            .await?;
        Ok(res.into_ack(external_id))
    }

    async fn stop(&self, external_id: &str) -> Result<ConnectorOutcome, ConnectorError> {
        let res = self
            .http
            .send(Method::POST, &format!("/jobs/{external_id}/close"), None)
            .await?;
        Ok(res.into_ack(external_id))
    }

    async fn test_connection(&self) -> bool {
        self.http.probe("/me").await
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            reply_to_inquiry: true,
            fetch_inquiries: true,
            fetch_daily_metrics: false,
        }
    }

    async fn reply_to_inquiry(
        &self,
        external_id: &str,
        message: &str,
    ) -> Result<ConnectorOutcome, ConnectorError> {
        let res = self
            .http
            .send(
                Method::POST,
                &format!("/applications/{external_id}/messages"),
                Some(&json!({ "message": message })),
            )
            .await?;
        Ok(res.into_ack(external_id))
    }

    async fn fetch_inquiries(&self, external_job_id: &str) -> Result<Vec<Inquiry>, ConnectorError> {
        let res = self
            .http
            .send(Method::GET, &format!("/jobs/{external_job_id}/applications"), None)
            .await?;
        if !res.is_success() {
            return Err(ConnectorError::Transport(format!(
                "listing applications returned HTTP {}",
                res.status
            )));
        }

        let items = res
            .body
            .get("applications")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(items
            .iter()
            .filter_map(|item| {
                Some(Inquiry {
                    external_id: item.get("id")?.as_str()?.to_string(),
                    candidate_name: item.get("name").and_then(Value::as_str).map(str::to_string),
                    email: item.get("email").and_then(Value::as_str).map(str::to_string),
                    message: item
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    received_at: item
                        .get("createdAt")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::spawn_board;
    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
    };

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer secret")
    }

    async fn connector() -> IndeedConnector {
        let router = Router::new()
            .route(
                "/jobs",
                post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                    if !authorized(&headers) {
                        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad token"})))
                            .into_response();
                    }
                    if body["title"] == "" {
                        return (StatusCode::BAD_REQUEST, "title required").into_response();
                    }
                    (StatusCode::CREATED, Json(json!({ "id": "ind-1" }))).into_response()
                }),
            )
            .route(
                "/jobs/:id/close",
                post(|Path(id): Path<String>| async move {
                    Json(json!({ "id": id, "status": "closed" }))
                }),
            )
            .route(
                "/jobs/:id/applications",
                get(|| async {
                    Json(json!({ "applications": [
                        { "id": "app-1", "name": "Ada", "message": "Hello" },
                        { "name": "missing id is skipped" }
                    ]}))
                }),
            )
            .route(
                "/me",
                get(|headers: HeaderMap| async move {
                    if authorized(&headers) { StatusCode::OK } else { StatusCode::UNAUTHORIZED }
                }),
            );
        let base = spawn_board(router).await;
        let cfg = ConnectorConfig::from_value(json!({ "apiToken": "secret", "apiUrl": base })).unwrap();
        IndeedConnector::from_config(&cfg).unwrap()
    }

    fn job(title: &str) -> JobPostingData {
        JobPostingData {
            reference_id: "job-1".to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn token_is_required() {
        let cfg = ConnectorConfig::from_value(json!({})).unwrap();
        assert!(matches!(
            IndeedConnector::from_config(&cfg),
            Err(ConnectorError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn publish_returns_board_id() {
        let outcome = connector().await.publish(&job("Welder")).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.external_id.as_deref(), Some("ind-1"));
        assert_eq!(outcome.status_code, Some(201));
    }

    #[tokio::test]
    async fn board_refusal_is_a_failed_outcome() {
        let outcome = connector().await.publish(&job("")).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.status_code, Some(400));
        assert!(outcome.error.unwrap().contains("title required"));
    }

    #[tokio::test]
    async fn stop_and_connection_check() {
        let c = connector().await;
        let outcome = c.stop("ind-1").await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.external_id.as_deref(), Some("ind-1"));
        assert!(c.test_connection().await);
    }

    #[tokio::test]
    async fn inquiries_are_mapped() {
        let c = connector().await;
        assert!(c.capabilities().fetch_inquiries);
        let inquiries = c.fetch_inquiries("ind-1").await.unwrap();
        assert_eq!(inquiries.len(), 1);
        assert_eq!(inquiries[0].candidate_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn unreachable_board_is_a_transport_error() {
        let cfg = ConnectorConfig::from_value(json!({
            "apiToken": "secret",
            "apiUrl": "http://127.0.0.1:9",
            "timeoutSecs": 2
        }))
        .unwrap();
        let c = IndeedConnector::from_config(&cfg).unwrap();
        let err = c.publish(&job("Welder")).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(!c.test_connection().await);
    }
}
