use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use talentflow_core::{DomainError, JobId, TenantId};

use super::ServiceResult;
use crate::notifications::{Dispatched, InboundEvent, Notifier};
use crate::store::RecruitingStore;

/// Entry point for events pushed by external integrations.
#[derive(Clone)]
pub struct InboundEventService {
    store: Arc<dyn RecruitingStore>,
    notifier: Notifier,
}

impl InboundEventService {
    pub fn new(store: Arc<dyn RecruitingStore>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    /// Validate the event and start its fan-out. A `job_id` must belong to
    /// the tenant. Delivery itself is best-effort and never fails the call.
    pub fn receive(
        &self,
        tenant_id: TenantId,
        source: &str,
        event: &str,
        job_id: Option<JobId>,
        data: Value,
    ) -> ServiceResult<Dispatched> {
        validate_name("source", source)?;
        validate_name("event", event)?;
        let job = job_id
            .map(|id| self.store.get_job(tenant_id, id))
            .transpose()?;

        let inbound = InboundEvent {
            source: source.to_string(),
            event: event.to_string(),
            data,
        };
        info!(
            tenant = %tenant_id,
            event = %inbound.webhook_event(),
            job_id = ?job_id,
            "inbound event received"
        );
        Ok(self.notifier.inbound_event(tenant_id, &inbound, job.as_ref()))
    }
}

/// Lowercase dotted identifiers only; they become part of webhook event names.
fn validate_name(what: &str, name: &str) -> Result<(), DomainError> {
    let ok = !name.is_empty()
        && name.len() <= 64
        && !name.starts_with('.')
        && !name.ends_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '_'));
    if ok {
        Ok(())
    } else {
        Err(DomainError::validation(format!("invalid {what} name `{name}`")))
    }
}
