//! StepStone-style board: API key header, listings, daily statistics.
//!
//! Config: `apiKey` (required), `apiUrl`, `companyId`, `timeoutSecs`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{Value, json};

use crate::config::ConnectorConfig;
use crate::connector::{
    Capabilities, ConnectorError, ConnectorOutcome, DailyMetrics, JobBoardConnector, JobPostingData,
};
use crate::http::{BoardAuth, BoardClient, DEFAULT_TIMEOUT};

pub const TYPE: &str = "stepstone";
const DEFAULT_API_URL: &str = "https://api.stepstone.de/partner/v1";
const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Clone)]
pub struct StepStoneConnector {
    http: BoardClient,
    company_id: Option<String>,
}

impl StepStoneConnector {
    pub fn from_config(config: &ConnectorConfig) -> Result<Self, ConnectorError> {
        let key = config.require_str("apiKey")?;
        let timeout = config
            .get_u64("timeoutSecs")
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        let http = BoardClient::new(
            config.str_or("apiUrl", DEFAULT_API_URL),
            BoardAuth::ApiKey {
                header: API_KEY_HEADER,
                key: key.to_string(),
            },
            timeout,
        )?;
        Ok(Self {
            http,
            company_id: config.get_str("companyId").map(str::to_string),
        })
    }

    fn listing(&self, job: &JobPostingData) -> Value {
        json!({
            "externalReference": job.reference_id,
            "companyId": self.company_id,
            "jobTitle": job.title,
            "jobDescription": job.content.as_deref().unwrap_or(&job.description),
            "workplace": job.location,
            "salaryText": job.salary,
            "contractType": job.employment_type,
            "candidateProfile": job.requirements,
            "headerImage": job.image_url,
        })
    }
}

#[async_trait]
impl JobBoardConnector for StepStoneConnector {
    fn connector_type(&self) -> &'static str {
        TYPE
    }

    async fn publish(&self, job: &JobPostingData) -> Result<ConnectorOutcome, ConnectorError> {
        let res = self
            .http
            .send(Method::POST, "/listings", Some(&self.listing(job)))
            .await?;
        Ok(res.into_outcome("/listingId"))
    }

    async fn update(
        &self,
        external_id: &str,
        job: &JobPostingData,
    ) -> Result<ConnectorOutcome, ConnectorError> {
        let res = self
            .http
            .send(Method::PUT, &format!("/listings/{external_id}"), Some(&self.listing(job)))
            .await?;
        Ok(res.into_ack(external_id))
    }

    async fn stop(&self, external_id: &str) -> Result<ConnectorOutcome, ConnectorError> {
        let res = self
            .http
            .send(Method::POST, &format!("/listings/{external_id}/deactivate"), None)
            .await?;
        Ok(res.into_ack(external_id))
    }

    async fn test_connection(&self) -> bool {
        self.http.probe("/auth/verify").await
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            fetch_daily_metrics: true,
            ..Capabilities::NONE
        }
    }

    async fn fetch_daily_metrics(
        &self,
        external_job_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyMetrics>, ConnectorError> {
        let path = format!(
            "/listings/{external_job_id}/statistics?date={}",
            date.format("%Y-%m-%d")
        );
        let res = self.http.send(Method::GET, &path, None).await?;
        if res.status == 404 {
            return Ok(None);
        }
        if !res.is_success() {
            return Err(ConnectorError::Transport(format!(
                "statistics returned HTTP {}",
                res.status
            )));
        }

        let count = |key: &str| res.body.get(key).and_then(Value::as_u64).unwrap_or(0);
        Ok(Some(DailyMetrics {
            date,
            views: count("views"),
            clicks: count("clicks"),
            applications: count("applications"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::spawn_board;
    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
    };
    use std::collections::HashMap;

    async fn connector() -> StepStoneConnector {
        let router = Router::new()
            .route(
                "/listings",
                post(|headers: HeaderMap| async move {
                    if headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) != Some("k") {
                        return StatusCode::FORBIDDEN.into_response();
                    }
                    (StatusCode::CREATED, Json(json!({ "listingId": "ss-9" }))).into_response()
                }),
            )
            .route(
                "/listings/:id/statistics",
                get(
                    |Path(id): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
                        if id == "gone" {
                            return StatusCode::NOT_FOUND.into_response();
                        }
                        assert_eq!(q.get("date").map(String::as_str), Some("2024-03-01"));
                        Json(json!({ "views": 10, "clicks": 3, "applications": 1 })).into_response()
                    },
                ),
            );
        let base = spawn_board(router).await;
        let cfg = ConnectorConfig::from_value(json!({ "apiKey": "k", "apiUrl": base })).unwrap();
        StepStoneConnector::from_config(&cfg).unwrap()
    }

    #[tokio::test]
    async fn publish_reads_listing_id() {
        let outcome = connector()
            .await
            .publish(&JobPostingData::default())
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.external_id.as_deref(), Some("ss-9"));
    }

    #[tokio::test]
    async fn daily_metrics_for_known_and_unknown_listing() {
        let c = connector().await;
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let metrics = c.fetch_daily_metrics("ss-9", date).await.unwrap().unwrap();
        assert_eq!(metrics.views, 10);
        assert_eq!(metrics.applications, 1);

        assert!(c.fetch_daily_metrics("gone", date).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn inquiries_are_not_supported() {
        let c = connector().await;
        assert!(!c.capabilities().fetch_inquiries);
        assert!(c.fetch_inquiries("ss-9").await.unwrap().is_empty());
    }
}
