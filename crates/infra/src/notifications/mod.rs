//! Best-effort outbound notifications.
//!
//! Approval decisions and inbound integration events fan out to an email
//! (enqueued on the `email` queue) and to the tenant's subscribed webhooks.
//! Both are single-attempt side effects: failures are logged and never reach
//! the caller.

pub mod email;
pub mod webhook;

use std::sync::Arc;

use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use talentflow_core::TenantId;
use talentflow_recruiting::{Approval, ApprovalDecision, Job};

use crate::store::RecruitingStore;
use crate::tasks::{EmailPayload, QueueName, QueueRegistry, TaskHandle};

pub use email::{
    EmailError, EmailMessage, EmailSender, InMemoryEmailSender, LogEmailSender, SmtpConfig,
    SmtpEmailSender, SmtpSecurity,
};
pub use webhook::{
    DeliveryOutcome, EVENT_HEADER, SIGNATURE_HEADER, WebhookDispatcher, WebhookEndpoint,
    WebhookEvent, sign,
};

pub const APPROVAL_APPROVED: &str = "approval.approved";
pub const APPROVAL_REJECTED: &str = "approval.rejected";
/// Prefix of every webhook event relayed from an inbound integration.
pub const INBOUND_PREFIX: &str = "inbound";

/// Event pushed to us by an external system (job board, ATS).
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub source: String,
    pub event: String,
    pub data: serde_json::Value,
}

impl InboundEvent {
    /// `inbound.<source>.<event>`, the name subscribers match on.
    pub fn webhook_event(&self) -> String {
        format!("{INBOUND_PREFIX}.{}.{}", self.source, self.event)
    }
}

/// What a fan-out actually kicked off.
#[derive(Debug, Default)]
pub struct Dispatched {
    pub email: Option<TaskHandle>,
    pub webhooks: Option<JoinHandle<Vec<DeliveryOutcome>>>,
}

#[derive(Clone)]
pub struct Notifier {
    queues: Arc<QueueRegistry>,
    store: Arc<dyn RecruitingStore>,
    webhooks: WebhookDispatcher,
}

impl Notifier {
    pub fn new(
        queues: Arc<QueueRegistry>,
        store: Arc<dyn RecruitingStore>,
        webhooks: WebhookDispatcher,
    ) -> Self {
        Self {
            queues,
            store,
            webhooks,
        }
    }

    /// Must run inside a tokio runtime: webhook delivery is spawned.
    pub fn approval_decided(
        &self,
        tenant_id: TenantId,
        approval: &Approval,
        job: &Job,
        decision: ApprovalDecision,
        comment: Option<&str>,
    ) -> Dispatched {
        let event = match decision {
            ApprovalDecision::Approved => APPROVAL_APPROVED,
            ApprovalDecision::Rejected => APPROVAL_REJECTED,
        };
        let data = json!({
            "approvalId": approval.id,
            "jobId": job.id,
            "jobTitle": job.title,
            "decision": decision.as_str(),
            "comment": comment,
        });

        let email = EmailPayload::new(
            "",
            format!("Job posting {{{{jobTitle}}}} was {}", decision.as_str()),
            "The job posting \"{{jobTitle}}\" was {{decision}} by a reviewer.",
        )
        .with_template(format!("approval-{}", decision.as_str()), data.clone());

        Dispatched {
            email: self.email_customer(tenant_id, job, email),
            webhooks: self.fan_out(tenant_id, event, data),
        }
    }

    /// Relay an inbound event to the tenant's webhooks and, when it concerns
    /// a job, email the job's customer contact.
    pub fn inbound_event(&self, tenant_id: TenantId, inbound: &InboundEvent, job: Option<&Job>) -> Dispatched {
        let name = inbound.webhook_event();
        let data = json!({
            "source": inbound.source,
            "event": inbound.event,
            "jobId": job.map(|j| j.id),
            "jobTitle": job.map(|j| j.title.as_str()),
            "payload": inbound.data,
        });

        let email = job.and_then(|job| {
            let payload = EmailPayload::new(
                "",
                "New {{event}} from {{source}} for {{jobTitle}}",
                "{{source}} reported \"{{event}}\" for the job posting \"{{jobTitle}}\".",
            )
            .with_template("inbound-event", data.clone());
            self.email_customer(tenant_id, job, payload)
        });

        Dispatched {
            email,
            webhooks: self.fan_out(tenant_id, &name, data),
        }
    }

    /// Enqueue `email` to the contact of `job`'s customer, if it has one.
    fn email_customer(&self, tenant_id: TenantId, job: &Job, mut email: EmailPayload) -> Option<TaskHandle> {
        let customer = match self.store.get_customer(tenant_id, job.customer_id) {
            Ok(customer) => customer,
            Err(e) => {
                warn!(tenant = %tenant_id, job_id = %job.id, error = %e, "notification email skipped");
                return None;
            }
        };
        email.to = customer.contact_email?;
        let payload = email.for_tenant(tenant_id);

        match self.queues.enqueue(QueueName::Email, &payload, None) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(tenant = %tenant_id, job_id = %job.id, error = %e, "notification email not enqueued");
                None
            }
        }
    }

    fn fan_out(
        &self,
        tenant_id: TenantId,
        event: &str,
        data: serde_json::Value,
    ) -> Option<JoinHandle<Vec<DeliveryOutcome>>> {
        let endpoints = match self.store.webhooks_for(tenant_id, event) {
            Ok(endpoints) if endpoints.is_empty() => return None,
            Ok(endpoints) => endpoints,
            Err(e) => {
                warn!(tenant = %tenant_id, event, error = %e, "webhook lookup failed");
                return None;
            }
        };

        debug!(tenant = %tenant_id, event, endpoints = endpoints.len(), "dispatching webhooks");
        let dispatcher = self.webhooks.clone();
        let event = WebhookEvent::new(event, tenant_id, data);
        Some(tokio::spawn(async move {
            dispatcher.dispatch(&endpoints, &event).await
        }))
    }
}
