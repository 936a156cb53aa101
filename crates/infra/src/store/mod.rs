//! Persistence collaborator consumed by handlers and services.
//!
//! Every read is tenant-scoped: jobs and publications resolve their tenant
//! through the Job -> Customer chain, and anything outside the caller's tenant
//! is reported as not found. Status writes go through a [`Transition`] and are
//! applied as a compare-and-swap under the store's own guard.

mod memory;

pub use memory::InMemoryRecruitingStore;

use talentflow_core::{
    ApprovalId, ConnectorId, CustomerId, DomainError, JobId, PublicationId, TenantId, Transition,
};
use talentflow_recruiting::{
    Approval, ApprovalReview, ApprovalStatus, ConnectorRecord, Customer, ImageVersion, Job,
    JobStatus, Publication, PublicationLog, PublicationStatus, TextVersion,
};
use thiserror::Error;

use crate::notifications::WebhookEndpoint;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Backend unavailable or timed out; worth retrying.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Domain(e) if e.is_not_found())
    }

    pub fn is_state_conflict(&self) -> bool {
        matches!(self, StoreError::Domain(e) if e.is_state_conflict())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Side fields written together with a publication status swap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationPatch {
    pub external_id: Option<String>,
    pub error: Option<String>,
}

impl PublicationPatch {
    pub fn external_id(id: impl Into<String>) -> Self {
        Self {
            external_id: Some(id.into()),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            external_id: None,
            error: Some(error.into()),
        }
    }
}

pub trait RecruitingStore: Send + Sync {
    fn insert_customer(&self, customer: Customer) -> StoreResult<()>;
    fn get_customer(&self, tenant_id: TenantId, id: CustomerId) -> StoreResult<Customer>;

    /// Fails with not found unless the job's customer belongs to `tenant_id`.
    fn insert_job(&self, tenant_id: TenantId, job: Job) -> StoreResult<()>;
    fn get_job(&self, tenant_id: TenantId, id: JobId) -> StoreResult<Job>;
    /// Compare-and-swap on `Job.status`; returns the updated job.
    fn transition_job(
        &self,
        tenant_id: TenantId,
        id: JobId,
        transition: Transition<JobStatus>,
    ) -> StoreResult<Job>;

    fn text_versions(&self, tenant_id: TenantId, job_id: JobId) -> StoreResult<Vec<TextVersion>>;
    /// Rejects a duplicate (job, version) with a conflict.
    fn insert_text_version(&self, tenant_id: TenantId, version: TextVersion) -> StoreResult<()>;
    fn image_versions(&self, tenant_id: TenantId, job_id: JobId) -> StoreResult<Vec<ImageVersion>>;
    fn insert_image_version(&self, tenant_id: TenantId, version: ImageVersion) -> StoreResult<()>;

    fn insert_approval(&self, approval: Approval) -> StoreResult<()>;
    fn get_approval(&self, tenant_id: TenantId, id: ApprovalId) -> StoreResult<Approval>;
    /// Compare-and-swap on `Approval.status`; stamps `decided_at`.
    fn decide_approval(
        &self,
        tenant_id: TenantId,
        id: ApprovalId,
        transition: Transition<ApprovalStatus>,
    ) -> StoreResult<Approval>;
    fn insert_review(&self, tenant_id: TenantId, review: ApprovalReview) -> StoreResult<()>;
    fn reviews(&self, tenant_id: TenantId, approval_id: ApprovalId) -> StoreResult<Vec<ApprovalReview>>;
    fn approvals_for_job(&self, tenant_id: TenantId, job_id: JobId) -> StoreResult<Vec<Approval>>;

    fn insert_connector(&self, connector: ConnectorRecord) -> StoreResult<()>;
    /// Tenant-owned or shared connectors only.
    fn get_connector(&self, tenant_id: TenantId, id: ConnectorId) -> StoreResult<ConnectorRecord>;

    fn insert_publication(&self, tenant_id: TenantId, publication: Publication) -> StoreResult<()>;
    fn get_publication(&self, tenant_id: TenantId, id: PublicationId) -> StoreResult<Publication>;
    fn find_publication(
        &self,
        tenant_id: TenantId,
        job_id: JobId,
        connector_id: ConnectorId,
    ) -> StoreResult<Option<Publication>>;
    fn publications_for_job(&self, tenant_id: TenantId, job_id: JobId) -> StoreResult<Vec<Publication>>;
    /// Compare-and-swap on `Publication.status` plus the patch fields.
    fn transition_publication(
        &self,
        tenant_id: TenantId,
        id: PublicationId,
        transition: Transition<PublicationStatus>,
        patch: PublicationPatch,
    ) -> StoreResult<Publication>;
    /// Record a board id without touching the status.
    fn set_publication_external_id(
        &self,
        tenant_id: TenantId,
        id: PublicationId,
        external_id: String,
    ) -> StoreResult<Publication>;

    fn append_publication_log(&self, tenant_id: TenantId, log: PublicationLog) -> StoreResult<()>;
    fn publication_logs(&self, tenant_id: TenantId, id: PublicationId) -> StoreResult<Vec<PublicationLog>>;

    fn insert_webhook(&self, webhook: WebhookEndpoint) -> StoreResult<()>;
    fn webhooks_for(&self, tenant_id: TenantId, event: &str) -> StoreResult<Vec<WebhookEndpoint>>;
}
