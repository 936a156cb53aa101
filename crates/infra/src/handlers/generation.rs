//! `text-generation` / `image-generation` handlers.
//!
//! Generation is best-effort: when the configured provider fails, the
//! deterministic template provider fills in so every run yields a version.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use talentflow_ai::{
    GenerationRequest, ImageGenerator, MockImageGenerator, MockTextGenerator, TextGenerator,
};
use talentflow_core::{JobId, TenantId};
use talentflow_recruiting::job::transitions;
use talentflow_recruiting::{ImageVersion, Job, JobStatus, TextVersion, next_version_number};

use crate::store::RecruitingStore;
use crate::tasks::{GenerationPayload, TaskContext, TaskError, TaskHandler};

fn request_for(job: &Job, prompt: Option<String>) -> GenerationRequest {
    GenerationRequest {
        title: job.title.clone(),
        description: job.description.clone(),
        location: job.location.clone(),
        salary: job.salary.clone(),
        employment_type: job.employment_type.clone(),
        requirements: job.requirements.clone(),
        prompt,
    }
}

/// DRAFT -> GENERATED, never regressing a job that already moved on.
fn mark_generated(store: &dyn RecruitingStore, tenant_id: TenantId, job: &Job) -> Result<(), TaskError> {
    if job.status != JobStatus::Draft {
        return Ok(());
    }
    match store.transition_job(tenant_id, job.id, transitions::MARK_GENERATED) {
        Ok(_) => Ok(()),
        Err(e) if e.is_state_conflict() => {
            debug!(job_id = %job.id, "job left DRAFT concurrently; status untouched");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn result(job_id: JobId, version: u32, model: &str) -> Value {
    json!({ "jobId": job_id, "version": version, "model": model })
}

pub struct TextGenerationHandler {
    store: Arc<dyn RecruitingStore>,
    provider: Arc<dyn TextGenerator>,
    fallback: MockTextGenerator,
}

impl TextGenerationHandler {
    pub fn new(store: Arc<dyn RecruitingStore>, provider: Arc<dyn TextGenerator>) -> Self {
        Self {
            store,
            provider,
            fallback: MockTextGenerator::new(),
        }
    }
}

#[async_trait]
impl TaskHandler for TextGenerationHandler {
    async fn handle(&self, ctx: &TaskContext) -> Result<Value, TaskError> {
        let payload: GenerationPayload = ctx.payload()?;
        let tenant_id = payload.tenant_id;
        let job = self.store.get_job(tenant_id, payload.job_id)?;
        ctx.progress(10);

        let existing = self.store.text_versions(tenant_id, job.id)?;
        let version = next_version_number(existing.iter().map(|v| v.version));
        let request = request_for(&job, payload.prompt.clone());

        let generated = match self.provider.generate_text(&request).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(job_id = %job.id, tenant = %tenant_id, error = %e, "text provider failed; using template");
                self.fallback.render(&request)
            }
        };
        ctx.progress(70);

        self.store.insert_text_version(
            tenant_id,
            TextVersion {
                job_id: job.id,
                version,
                content: generated.content,
                prompt: payload.prompt,
                model: generated.model.clone(),
                created_at: Utc::now(),
            },
        )?;
        mark_generated(self.store.as_ref(), tenant_id, &job)?;
        ctx.progress(100);

        info!(job_id = %job.id, tenant = %tenant_id, version, model = %generated.model, "text version stored");
        Ok(result(job.id, version, &generated.model))
    }
}

pub struct ImageGenerationHandler {
    store: Arc<dyn RecruitingStore>,
    provider: Arc<dyn ImageGenerator>,
    fallback: MockImageGenerator,
}

impl ImageGenerationHandler {
    pub fn new(store: Arc<dyn RecruitingStore>, provider: Arc<dyn ImageGenerator>) -> Self {
        Self {
            store,
            provider,
            fallback: MockImageGenerator::new(),
        }
    }
}

#[async_trait]
impl TaskHandler for ImageGenerationHandler {
    async fn handle(&self, ctx: &TaskContext) -> Result<Value, TaskError> {
        let payload: GenerationPayload = ctx.payload()?;
        let tenant_id = payload.tenant_id;
        let job = self.store.get_job(tenant_id, payload.job_id)?;
        ctx.progress(10);

        let existing = self.store.image_versions(tenant_id, job.id)?;
        let version = next_version_number(existing.iter().map(|v| v.version));
        let request = request_for(&job, payload.prompt.clone());

        let generated = match self.provider.generate_image(&request).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(job_id = %job.id, tenant = %tenant_id, error = %e, "image provider failed; using template");
                self.fallback.render(&request)
            }
        };
        ctx.progress(70);

        self.store.insert_image_version(
            tenant_id,
            ImageVersion {
                job_id: job.id,
                version,
                image_url: generated.image_url,
                prompt: payload.prompt,
                model: generated.model.clone(),
                created_at: Utc::now(),
            },
        )?;
        mark_generated(self.store.as_ref(), tenant_id, &job)?;
        ctx.progress(100);

        info!(job_id = %job.id, tenant = %tenant_id, version, model = %generated.model, "image version stored");
        Ok(result(job.id, version, &generated.model))
    }
}
