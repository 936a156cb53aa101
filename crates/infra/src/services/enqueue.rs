use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use talentflow_core::{ConnectorId, DomainError, JobId, PublicationId, TenantId};
use talentflow_recruiting::publication::transitions;
use talentflow_recruiting::{JobStatus, Publication, PublicationStatus};

use super::ServiceResult;
use crate::store::{PublicationPatch, RecruitingStore};
use crate::tasks::{
    EmailPayload, GenerationPayload, PublicationPayload, QueueName, QueueRegistry, TaskHandle,
};

/// Handle for a queued publication plus the row it will drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationEnqueued {
    #[serde(flatten)]
    pub handle: TaskHandle,
    pub publication_id: PublicationId,
}

/// Validates ownership and state, then hands work to the queues.
#[derive(Clone)]
pub struct EnqueueService {
    store: Arc<dyn RecruitingStore>,
    queues: Arc<QueueRegistry>,
}

impl EnqueueService {
    pub fn new(store: Arc<dyn RecruitingStore>, queues: Arc<QueueRegistry>) -> Self {
        Self { store, queues }
    }

    pub fn enqueue_text_generation(
        &self,
        tenant_id: TenantId,
        job_id: JobId,
        prompt: Option<String>,
    ) -> ServiceResult<TaskHandle> {
        self.enqueue_generation(QueueName::TextGeneration, tenant_id, job_id, prompt)
    }

    pub fn enqueue_image_generation(
        &self,
        tenant_id: TenantId,
        job_id: JobId,
        prompt: Option<String>,
    ) -> ServiceResult<TaskHandle> {
        self.enqueue_generation(QueueName::ImageGeneration, tenant_id, job_id, prompt)
    }

    fn enqueue_generation(
        &self,
        queue: QueueName,
        tenant_id: TenantId,
        job_id: JobId,
        prompt: Option<String>,
    ) -> ServiceResult<TaskHandle> {
        let job = self.store.get_job(tenant_id, job_id)?;
        let payload = GenerationPayload {
            job_id: job.id,
            tenant_id,
            prompt: prompt.filter(|p| !p.trim().is_empty()),
        };
        let handle = self.queues.enqueue(queue, &payload, None)?;
        info!(queue = %queue, task_id = %handle.task_id, job_id = %job.id, tenant = %tenant_id, "generation enqueued");
        Ok(handle)
    }

    /// Create (or reuse) the job/connector publication row and queue it.
    ///
    /// PENDING rows are reused as is, FAILED and STOPPED rows are moved back to
    /// PENDING, and live rows are rejected.
    pub fn enqueue_publication(
        &self,
        tenant_id: TenantId,
        job_id: JobId,
        connector_id: ConnectorId,
    ) -> ServiceResult<PublicationEnqueued> {
        let job = self.store.get_job(tenant_id, job_id)?;
        if !job.status.is_publishable() {
            return Err(DomainError::state_conflict("job", job.status, JobStatus::Publishing).into());
        }

        let connector = self.store.get_connector(tenant_id, connector_id)?;
        if !connector.is_active {
            return Err(DomainError::validation(format!("connector {} is inactive", connector.id)).into());
        }

        let publication = match self.store.find_publication(tenant_id, job.id, connector.id)? {
            None => {
                let publication = Publication::pending(job.id, connector.id);
                self.store.insert_publication(tenant_id, publication.clone())?;
                publication
            }
            Some(existing) if existing.status == PublicationStatus::Pending => existing,
            Some(existing) => self.store.transition_publication(
                tenant_id,
                existing.id,
                transitions::REQUEUE,
                PublicationPatch::default(),
            )?,
        };

        let payload = PublicationPayload {
            publication_id: publication.id,
            job_id: job.id,
            connector_id: connector.id,
            tenant_id,
        };
        let handle = self.queues.enqueue(QueueName::Publication, &payload, None)?;
        info!(
            task_id = %handle.task_id,
            publication_id = %publication.id,
            job_id = %job.id,
            tenant = %tenant_id,
            "publication enqueued"
        );
        Ok(PublicationEnqueued {
            handle,
            publication_id: publication.id,
        })
    }

    pub fn enqueue_email(&self, tenant_id: TenantId, payload: EmailPayload) -> ServiceResult<TaskHandle> {
        payload.validate().map_err(DomainError::Validation)?;
        let payload = payload.for_tenant(tenant_id);
        Ok(self.queues.enqueue(QueueName::Email, &payload, None)?)
    }
}
