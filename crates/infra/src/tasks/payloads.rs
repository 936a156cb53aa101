//! JSON payload schema of each queue.
//!
//! Every payload that references persisted entities carries the tenant id;
//! handlers re-validate ownership with it before touching anything.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use talentflow_core::{ConnectorId, JobId, PublicationId, TenantId};

/// `text-generation` and `image-generation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPayload {
    pub job_id: JobId,
    pub tenant_id: TenantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// `publication`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationPayload {
    pub publication_id: PublicationId,
    pub job_id: JobId,
    pub connector_id: ConnectorId,
    pub tenant_id: TenantId,
}

/// `email`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPayload {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,
}

impl EmailPayload {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            template: None,
            data: None,
            tenant_id: None,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>, data: Value) -> Self {
        self.template = Some(template.into());
        self.data = Some(data);
        self
    }

    pub fn for_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Minimal shape check; delivery failures are the sender's business.
    pub fn validate(&self) -> Result<(), String> {
        let to = self.to.trim();
        if to.is_empty() || !to.contains('@') {
            return Err(format!("invalid recipient `{}`", self.to));
        }
        if self.subject.trim().is_empty() {
            return Err("subject must not be empty".to_string());
        }
        Ok(())
    }
}
