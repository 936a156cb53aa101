//! Tenant-registered webhook endpoints and signed, fire-and-forget delivery.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, warn};

use talentflow_core::{Entity, TenantId, TenantOwned, WebhookId};

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
pub const EVENT_HEADER: &str = "X-Webhook-Event";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEndpoint {
    pub id: WebhookId,
    pub tenant_id: TenantId,
    pub url: String,
    #[serde(skip_serializing)]
    pub secret: String,
    /// Event names, or `*` for everything.
    pub events: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl WebhookEndpoint {
    pub fn new(
        tenant_id: TenantId,
        url: impl Into<String>,
        secret: impl Into<String>,
        events: Vec<String>,
    ) -> Self {
        Self {
            id: WebhookId::new(),
            tenant_id,
            url: url.into(),
            secret: secret.into(),
            events,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn subscribes_to(&self, event: &str) -> bool {
        self.is_active && self.events.iter().any(|e| e == "*" || e == event)
    }
}

impl Entity for WebhookEndpoint {
    type Id = WebhookId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantOwned for WebhookEndpoint {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Delivery body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    pub event: String,
    pub tenant_id: TenantId,
    pub occurred_at: DateTime<Utc>,
    pub data: Value,
}

impl WebhookEvent {
    pub fn new(event: impl Into<String>, tenant_id: TenantId, data: Value) -> Self {
        Self {
            event: event.into(),
            tenant_id,
            occurred_at: Utc::now(),
            data,
        }
    }
}

/// `sha256=<hex hmac-sha256(secret, body)>`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length; the error branch is unreachable.
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub webhook_id: WebhookId,
    pub status: Option<u16>,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn delivered(&self) -> bool {
        self.error.is_none()
    }
}

/// Parallel, single-attempt webhook delivery.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
}

impl WebhookDispatcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// POST `event` to every endpoint at once. Outcomes are logged, never retried.
    pub async fn dispatch(
        &self,
        endpoints: &[WebhookEndpoint],
        event: &WebhookEvent,
    ) -> Vec<DeliveryOutcome> {
        let body = match serde_json::to_vec(event) {
            Ok(body) => body,
            Err(e) => {
                warn!(event = %event.event, error = %e, "webhook payload encoding failed");
                return Vec::new();
            }
        };

        let deliveries = endpoints
            .iter()
            .filter(|ep| ep.subscribes_to(&event.event))
            .map(|ep| self.deliver(ep, &event.event, body.clone()));
        join_all(deliveries).await
    }

    async fn deliver(&self, endpoint: &WebhookEndpoint, event: &str, body: Vec<u8>) -> DeliveryOutcome {
        let signature = sign(&endpoint.secret, &body);
        let result = self
            .client
            .post(&endpoint.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(EVENT_HEADER, event)
            .body(body)
            .send()
            .await;

        let outcome = match result {
            Ok(res) if res.status().is_success() => DeliveryOutcome {
                webhook_id: endpoint.id,
                status: Some(res.status().as_u16()),
                error: None,
            },
            Ok(res) => DeliveryOutcome {
                webhook_id: endpoint.id,
                status: Some(res.status().as_u16()),
                error: Some(format!("endpoint answered HTTP {}", res.status())),
            },
            Err(e) => DeliveryOutcome {
                webhook_id: endpoint.id,
                status: None,
                error: Some(e.to_string()),
            },
        };

        match &outcome.error {
            None => debug!(webhook_id = %endpoint.id, event, "webhook delivered"),
            Some(error) => warn!(webhook_id = %endpoint.id, event, error = %error, "webhook delivery failed"),
        }
        outcome
    }
}
