use serde::Deserialize;
use serde_json::{Map, Value};

use talentflow_core::{ConnectorId, CustomerId, JobId, TenantId};
use talentflow_infra::notifications::WebhookEndpoint;
use talentflow_recruiting::{ConnectorRecord, Customer, Job};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewRequest {
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub connector_id: ConnectorId,
}

#[derive(Debug, Deserialize)]
pub struct FailedQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub name: String,
    pub contact_email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub customer_id: CustomerId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub employment_type: Option<String>,
    pub requirements: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnectorRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub connector_type: String,
    #[serde(default)]
    pub config: Map<String, Value>,
    /// Shared connectors are visible to every tenant.
    #[serde(default)]
    pub shared: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateWebhookRequest {
    pub url: String,
    pub secret: String,
    #[serde(default = "all_events")]
    pub events: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEventRequest {
    pub event: String,
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub data: Value,
}

fn all_events() -> Vec<String> {
    vec!["*".to_string()]
}

// -------------------------
// Request -> domain mapping
// -------------------------

impl CreateCustomerRequest {
    pub fn into_customer(self, tenant_id: TenantId) -> Customer {
        let customer = Customer::new(tenant_id, self.name);
        match self.contact_email {
            Some(email) => customer.with_contact_email(email),
            None => customer,
        }
    }
}

impl CreateJobRequest {
    pub fn into_job(self) -> Job {
        let mut job = Job::draft(self.customer_id, self.title).with_description(self.description);
        if let Some(location) = self.location {
            job = job.with_location(location);
        }
        if let Some(salary) = self.salary {
            job = job.with_salary(salary);
        }
        if let Some(employment_type) = self.employment_type {
            job = job.with_employment_type(employment_type);
        }
        if let Some(requirements) = self.requirements {
            job = job.with_requirements(requirements);
        }
        job
    }
}

impl CreateConnectorRequest {
    pub fn into_record(self, tenant_id: TenantId) -> ConnectorRecord {
        let record = ConnectorRecord::new(self.name, self.connector_type).with_config(self.config);
        if self.shared {
            record
        } else {
            record.for_tenant(tenant_id)
        }
    }
}

impl CreateWebhookRequest {
    pub fn into_endpoint(self, tenant_id: TenantId) -> WebhookEndpoint {
        WebhookEndpoint::new(tenant_id, self.url, self.secret, self.events)
    }
}
