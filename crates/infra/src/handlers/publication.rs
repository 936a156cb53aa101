//! `publication` handler: push one job to one board.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, warn};

use talentflow_connectors::{ConnectorConfig, ConnectorRegistry, JobBoardConnector, JobPostingData};
use talentflow_core::TenantId;
use talentflow_recruiting::publication::transitions;
use talentflow_recruiting::{JobStatus, Publication, PublicationAction, PublicationLog, job};

use crate::store::{PublicationPatch, RecruitingStore};
use crate::tasks::{PublicationPayload, TaskContext, TaskError, TaskHandler};

pub struct PublicationHandler {
    store: Arc<dyn RecruitingStore>,
    connectors: Arc<ConnectorRegistry>,
}

impl PublicationHandler {
    pub fn new(store: Arc<dyn RecruitingStore>, connectors: Arc<ConnectorRegistry>) -> Self {
        Self { store, connectors }
    }

    /// Publication -> FAILED plus a failure log row. Both are best-effort: the
    /// task error returned by the caller is what matters.
    fn record_failure(
        &self,
        tenant_id: TenantId,
        publication: &Publication,
        error: &str,
        response: Option<Value>,
    ) {
        if let Err(e) = self.store.transition_publication(
            tenant_id,
            publication.id,
            transitions::FAIL,
            PublicationPatch::error(error),
        ) {
            warn!(publication_id = %publication.id, error = %e, "could not mark publication failed");
        }

        let mut log = PublicationLog::failure(publication.id, PublicationAction::Publish, error);
        if let Some(response) = response {
            log = log.with_response(response);
        }
        if let Err(e) = self.store.append_publication_log(tenant_id, log) {
            warn!(publication_id = %publication.id, error = %e, "could not write publication log");
        }
    }

    fn resolve_connector(
        &self,
        tenant_id: TenantId,
        publication: &Publication,
    ) -> Result<Box<dyn JobBoardConnector>, String> {
        let record = self
            .store
            .get_connector(tenant_id, publication.connector_id)
            .map_err(|e| e.to_string())?;
        if !record.is_active {
            return Err(format!("connector {} is inactive", record.id));
        }
        self.connectors
            .create(&record.connector_type, &ConnectorConfig::from(record.config))
            .map_err(|e| e.to_string())
    }

    fn posting_data(&self, tenant_id: TenantId, publication: &Publication) -> Result<JobPostingData, TaskError> {
        let job = self.store.get_job(tenant_id, publication.job_id)?;
        let text = self
            .store
            .text_versions(tenant_id, job.id)?
            .into_iter()
            .max_by_key(|v| v.version);
        let image = self
            .store
            .image_versions(tenant_id, job.id)?
            .into_iter()
            .max_by_key(|v| v.version);

        Ok(JobPostingData {
            reference_id: job.id.to_string(),
            title: job.title,
            description: job.description,
            location: job.location,
            salary: job.salary,
            employment_type: job.employment_type,
            requirements: job.requirements,
            content: text.map(|v| v.content),
            image_url: image.map(|v| v.image_url),
        })
    }

    fn mark_job_published(&self, tenant_id: TenantId, publication: &Publication) {
        let current = match self.store.get_job(tenant_id, publication.job_id) {
            Ok(job) => job,
            Err(e) => {
                warn!(job_id = %publication.job_id, error = %e, "job vanished after publish");
                return;
            }
        };
        if current.status == JobStatus::Published {
            return;
        }
        if let Err(e) = self
            .store
            .transition_job(tenant_id, current.id, job::transitions::MARK_PUBLISHED)
        {
            warn!(job_id = %current.id, status = current.status.as_str(), error = %e, "job status not advanced to PUBLISHED");
        }
    }
}

#[async_trait]
impl TaskHandler for PublicationHandler {
    async fn handle(&self, ctx: &TaskContext) -> Result<Value, TaskError> {
        let payload: PublicationPayload = ctx.payload()?;
        let tenant_id = payload.tenant_id;

        let publication = self.store.get_publication(tenant_id, payload.publication_id)?;
        if publication.job_id != payload.job_id || publication.connector_id != payload.connector_id {
            return Err(TaskError::InvalidPayload(format!(
                "payload does not match publication {}",
                publication.id
            )));
        }
        ctx.progress(10);

        let publication = self.store.transition_publication(
            tenant_id,
            publication.id,
            transitions::START,
            PublicationPatch::default(),
        )?;

        let connector = match self.resolve_connector(tenant_id, &publication) {
            Ok(connector) => connector,
            Err(error) => {
                self.record_failure(tenant_id, &publication, &error, None);
                return Err(TaskError::Configuration(error));
            }
        };
        let data = match self.posting_data(tenant_id, &publication) {
            Ok(data) => data,
            Err(e) => {
                self.record_failure(tenant_id, &publication, &e.to_string(), None);
                return Err(e);
            }
        };
        ctx.progress(30);

        let request = serde_json::to_value(&data).ok();
        let outcome = match connector.publish(&data).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let error = e.to_string();
                self.record_failure(tenant_id, &publication, &error, None);
                return Err(if e.is_retryable() {
                    TaskError::Transient(error)
                } else {
                    TaskError::Configuration(error)
                });
            }
        };
        ctx.progress(70);

        if !outcome.success {
            let error = outcome
                .error
                .clone()
                .unwrap_or_else(|| "board refused the posting".to_string());
            self.record_failure(tenant_id, &publication, &error, outcome.raw.clone());
            return Err(TaskError::Rejected(error));
        }

        let external_id = outcome.external_id.clone().unwrap_or_default();
        let mut log = PublicationLog::success(publication.id, PublicationAction::Publish);
        if let Some(request) = request {
            log = log.with_request(request);
        }
        log = log.with_response(serde_json::to_value(&outcome).unwrap_or(Value::Null));

        match self.store.transition_publication(
            tenant_id,
            publication.id,
            transitions::SUCCEED,
            PublicationPatch::external_id(external_id.clone()),
        ) {
            Ok(_) => {}
            Err(e) if e.is_state_conflict() => {
                // stopped while the board call was in flight: stop wins
                warn!(
                    publication_id = %publication.id,
                    external_id = %external_id,
                    "publication stopped during publish; keeping STOPPED"
                );
                self.store
                    .set_publication_external_id(tenant_id, publication.id, external_id.clone())?;
                self.store.append_publication_log(tenant_id, log)?;
                ctx.progress(100);
                return Ok(json!({
                    "publicationId": publication.id,
                    "externalId": external_id,
                    "status": "STOPPED",
                }));
            }
            Err(e) => return Err(e.into()),
        }

        self.store.append_publication_log(tenant_id, log)?;
        self.mark_job_published(tenant_id, &publication);
        ctx.progress(100);

        info!(
            publication_id = %publication.id,
            job_id = %publication.job_id,
            tenant = %tenant_id,
            external_id = %external_id,
            "publication live"
        );
        Ok(json!({
            "publicationId": publication.id,
            "externalId": external_id,
            "status": "PUBLISHED",
        }))
    }
}
