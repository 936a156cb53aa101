use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use talentflow_core::{
    ApprovalId, ConnectorId, CustomerId, DomainError, JobId, PublicationId, TenantId, Transition,
};
use talentflow_recruiting::{
    Approval, ApprovalReview, ApprovalStatus, ConnectorRecord, Customer, ImageVersion, Job,
    JobStatus, Publication, PublicationLog, PublicationStatus, TextVersion,
};

use super::{PublicationPatch, RecruitingStore, StoreError, StoreResult};
use crate::notifications::WebhookEndpoint;

#[derive(Debug, Default)]
struct Tables {
    customers: HashMap<CustomerId, Customer>,
    jobs: HashMap<JobId, Job>,
    text_versions: HashMap<JobId, Vec<TextVersion>>,
    image_versions: HashMap<JobId, Vec<ImageVersion>>,
    approvals: HashMap<ApprovalId, Approval>,
    reviews: HashMap<ApprovalId, Vec<ApprovalReview>>,
    connectors: HashMap<ConnectorId, ConnectorRecord>,
    publications: HashMap<PublicationId, Publication>,
    publication_logs: HashMap<PublicationId, Vec<PublicationLog>>,
    webhooks: Vec<WebhookEndpoint>,
}

impl Tables {
    fn job_tenant(&self, job: &Job) -> Option<TenantId> {
        self.customers.get(&job.customer_id).map(|c| c.tenant_id)
    }

    fn job(&self, tenant_id: TenantId, id: JobId) -> StoreResult<&Job> {
        self.jobs
            .get(&id)
            .filter(|job| self.job_tenant(job) == Some(tenant_id))
            .ok_or_else(|| DomainError::not_found("job").into())
    }

    fn job_mut(&mut self, tenant_id: TenantId, id: JobId) -> StoreResult<&mut Job> {
        self.job(tenant_id, id)?;
        self.jobs
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("job").into())
    }

    fn publication(&self, tenant_id: TenantId, id: PublicationId) -> StoreResult<&Publication> {
        self.publications
            .get(&id)
            .filter(|p| self.job(tenant_id, p.job_id).is_ok())
            .ok_or_else(|| DomainError::not_found("publication").into())
    }

    fn publication_mut(
        &mut self,
        tenant_id: TenantId,
        id: PublicationId,
    ) -> StoreResult<&mut Publication> {
        self.publication(tenant_id, id)?;
        self.publications
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("publication").into())
    }

    fn approval(&self, tenant_id: TenantId, id: ApprovalId) -> StoreResult<&Approval> {
        self.approvals
            .get(&id)
            .filter(|a| a.tenant_id == tenant_id)
            .ok_or_else(|| DomainError::not_found("approval").into())
    }
}

/// In-memory recruiting store for tests/dev.
///
/// A single lock covers every table, so tenant resolution and the status
/// compare-and-swap happen under one guard.
#[derive(Debug, Default)]
pub struct InMemoryRecruitingStore {
    tables: RwLock<Tables>,
}

impl InMemoryRecruitingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecruitingStore for InMemoryRecruitingStore {
    fn insert_customer(&self, customer: Customer) -> StoreResult<()> {
        self.write().customers.insert(customer.id, customer);
        Ok(())
    }

    fn get_customer(&self, tenant_id: TenantId, id: CustomerId) -> StoreResult<Customer> {
        self.read()
            .customers
            .get(&id)
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("customer").into())
    }

    fn insert_job(&self, tenant_id: TenantId, job: Job) -> StoreResult<()> {
        let mut tables = self.write();
        if tables.job_tenant(&job) != Some(tenant_id) {
            return Err(DomainError::not_found("customer").into());
        }
        tables.jobs.insert(job.id, job);
        Ok(())
    }

    fn get_job(&self, tenant_id: TenantId, id: JobId) -> StoreResult<Job> {
        self.read().job(tenant_id, id).cloned()
    }

    fn transition_job(
        &self,
        tenant_id: TenantId,
        id: JobId,
        transition: Transition<JobStatus>,
    ) -> StoreResult<Job> {
        let mut tables = self.write();
        let job = tables.job_mut(tenant_id, id)?;
        transition.apply(&mut job.status)?;
        let now = Utc::now();
        job.updated_at = now;
        if job.status == JobStatus::Published && job.published_at.is_none() {
            job.published_at = Some(now);
        }
        Ok(job.clone())
    }

    fn text_versions(&self, tenant_id: TenantId, job_id: JobId) -> StoreResult<Vec<TextVersion>> {
        let tables = self.read();
        tables.job(tenant_id, job_id)?;
        Ok(tables.text_versions.get(&job_id).cloned().unwrap_or_default())
    }

    fn insert_text_version(&self, tenant_id: TenantId, version: TextVersion) -> StoreResult<()> {
        let mut tables = self.write();
        tables.job(tenant_id, version.job_id)?;
        let versions = tables.text_versions.entry(version.job_id).or_default();
        if versions.iter().any(|v| v.version == version.version) {
            return Err(DomainError::conflict(format!(
                "text version {} already exists",
                version.version
            ))
            .into());
        }
        versions.push(version);
        Ok(())
    }

    fn image_versions(&self, tenant_id: TenantId, job_id: JobId) -> StoreResult<Vec<ImageVersion>> {
        let tables = self.read();
        tables.job(tenant_id, job_id)?;
        Ok(tables.image_versions.get(&job_id).cloned().unwrap_or_default())
    }

    fn insert_image_version(&self, tenant_id: TenantId, version: ImageVersion) -> StoreResult<()> {
        let mut tables = self.write();
        tables.job(tenant_id, version.job_id)?;
        let versions = tables.image_versions.entry(version.job_id).or_default();
        if versions.iter().any(|v| v.version == version.version) {
            return Err(DomainError::conflict(format!(
                "image version {} already exists",
                version.version
            ))
            .into());
        }
        versions.push(version);
        Ok(())
    }

    fn insert_approval(&self, approval: Approval) -> StoreResult<()> {
        let mut tables = self.write();
        tables.job(approval.tenant_id, approval.job_id)?;
        tables.approvals.insert(approval.id, approval);
        Ok(())
    }

    fn get_approval(&self, tenant_id: TenantId, id: ApprovalId) -> StoreResult<Approval> {
        self.read().approval(tenant_id, id).cloned()
    }

    fn decide_approval(
        &self,
        tenant_id: TenantId,
        id: ApprovalId,
        transition: Transition<ApprovalStatus>,
    ) -> StoreResult<Approval> {
        let mut tables = self.write();
        tables.approval(tenant_id, id)?;
        let approval = tables
            .approvals
            .get_mut(&id)
            .ok_or(StoreError::Domain(DomainError::not_found("approval")))?;
        transition.apply(&mut approval.status)?;
        approval.decided_at = Some(Utc::now());
        Ok(approval.clone())
    }

    fn insert_review(&self, tenant_id: TenantId, review: ApprovalReview) -> StoreResult<()> {
        let mut tables = self.write();
        tables.approval(tenant_id, review.approval_id)?;
        tables.reviews.entry(review.approval_id).or_default().push(review);
        Ok(())
    }

    fn reviews(&self, tenant_id: TenantId, approval_id: ApprovalId) -> StoreResult<Vec<ApprovalReview>> {
        let tables = self.read();
        tables.approval(tenant_id, approval_id)?;
        Ok(tables.reviews.get(&approval_id).cloned().unwrap_or_default())
    }

    fn approvals_for_job(&self, tenant_id: TenantId, job_id: JobId) -> StoreResult<Vec<Approval>> {
        let tables = self.read();
        tables.job(tenant_id, job_id)?;
        let mut approvals: Vec<_> = tables
            .approvals
            .values()
            .filter(|a| a.job_id == job_id && a.tenant_id == tenant_id)
            .cloned()
            .collect();
        approvals.sort_by_key(|a| a.created_at);
        Ok(approvals)
    }

    fn insert_connector(&self, connector: ConnectorRecord) -> StoreResult<()> {
        self.write().connectors.insert(connector.id, connector);
        Ok(())
    }

    fn get_connector(&self, tenant_id: TenantId, id: ConnectorId) -> StoreResult<ConnectorRecord> {
        self.read()
            .connectors
            .get(&id)
            .filter(|c| c.is_visible_to(tenant_id))
            .cloned()
            .ok_or_else(|| DomainError::not_found("connector").into())
    }

    fn insert_publication(&self, tenant_id: TenantId, publication: Publication) -> StoreResult<()> {
        let mut tables = self.write();
        tables.job(tenant_id, publication.job_id)?;
        let duplicate = tables.publications.values().any(|p| {
            p.id != publication.id
                && p.job_id == publication.job_id
                && p.connector_id == publication.connector_id
        });
        if duplicate {
            return Err(DomainError::conflict("publication already exists for job and connector").into());
        }
        tables.publications.insert(publication.id, publication);
        Ok(())
    }

    fn get_publication(&self, tenant_id: TenantId, id: PublicationId) -> StoreResult<Publication> {
        self.read().publication(tenant_id, id).cloned()
    }

    fn find_publication(
        &self,
        tenant_id: TenantId,
        job_id: JobId,
        connector_id: ConnectorId,
    ) -> StoreResult<Option<Publication>> {
        let tables = self.read();
        tables.job(tenant_id, job_id)?;
        Ok(tables
            .publications
            .values()
            .find(|p| p.job_id == job_id && p.connector_id == connector_id)
            .cloned())
    }

    fn publications_for_job(&self, tenant_id: TenantId, job_id: JobId) -> StoreResult<Vec<Publication>> {
        let tables = self.read();
        tables.job(tenant_id, job_id)?;
        let mut publications: Vec<_> = tables
            .publications
            .values()
            .filter(|p| p.job_id == job_id)
            .cloned()
            .collect();
        publications.sort_by_key(|p| p.created_at);
        Ok(publications)
    }

    fn transition_publication(
        &self,
        tenant_id: TenantId,
        id: PublicationId,
        transition: Transition<PublicationStatus>,
        patch: PublicationPatch,
    ) -> StoreResult<Publication> {
        let mut tables = self.write();
        let publication = tables.publication_mut(tenant_id, id)?;
        transition.apply(&mut publication.status)?;

        let now = Utc::now();
        publication.updated_at = now;
        match publication.status {
            PublicationStatus::Published => {
                publication.published_at = Some(now);
                publication.last_error = None;
            }
            PublicationStatus::Stopped => publication.stopped_at = Some(now),
            PublicationStatus::Pending => publication.last_error = None,
            PublicationStatus::Publishing | PublicationStatus::Failed => {}
        }
        if let Some(external_id) = patch.external_id {
            publication.external_id = Some(external_id);
        }
        if let Some(error) = patch.error {
            publication.last_error = Some(error);
        }
        Ok(publication.clone())
    }

    fn set_publication_external_id(
        &self,
        tenant_id: TenantId,
        id: PublicationId,
        external_id: String,
    ) -> StoreResult<Publication> {
        let mut tables = self.write();
        let publication = tables.publication_mut(tenant_id, id)?;
        publication.external_id = Some(external_id);
        publication.updated_at = Utc::now();
        Ok(publication.clone())
    }

    fn append_publication_log(&self, tenant_id: TenantId, log: PublicationLog) -> StoreResult<()> {
        let mut tables = self.write();
        tables.publication(tenant_id, log.publication_id)?;
        tables
            .publication_logs
            .entry(log.publication_id)
            .or_default()
            .push(log);
        Ok(())
    }

    fn publication_logs(&self, tenant_id: TenantId, id: PublicationId) -> StoreResult<Vec<PublicationLog>> {
        let tables = self.read();
        tables.publication(tenant_id, id)?;
        Ok(tables.publication_logs.get(&id).cloned().unwrap_or_default())
    }

    fn insert_webhook(&self, webhook: WebhookEndpoint) -> StoreResult<()> {
        self.write().webhooks.push(webhook);
        Ok(())
    }

    fn webhooks_for(&self, tenant_id: TenantId, event: &str) -> StoreResult<Vec<WebhookEndpoint>> {
        Ok(self
            .read()
            .webhooks
            .iter()
            .filter(|w| w.tenant_id == tenant_id && w.subscribes_to(event))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talentflow_recruiting::{job, publication};

    fn seeded() -> (InMemoryRecruitingStore, TenantId, Job) {
        let store = InMemoryRecruitingStore::new();
        let tenant = TenantId::new();
        let customer = Customer::new(tenant, "Acme");
        let job = Job::draft(customer.id, "Backend Engineer");
        store.insert_customer(customer).unwrap();
        store.insert_job(tenant, job.clone()).unwrap();
        (store, tenant, job)
    }

    fn text(job_id: JobId, version: u32) -> TextVersion {
        TextVersion {
            job_id,
            version,
            content: "text".into(),
            prompt: None,
            model: "mock-template".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn jobs_are_invisible_to_other_tenants() {
        let (store, tenant, job) = seeded();
        assert!(store.get_job(tenant, job.id).is_ok());
        let err = store.get_job(TenantId::new(), job.id).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn job_insert_requires_customer_in_tenant() {
        let (store, _, job) = seeded();
        let err = store
            .insert_job(TenantId::new(), Job::draft(job.customer_id, "x"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn transition_job_is_compare_and_swap() {
        let (store, tenant, job) = seeded();
        let updated = store.transition_job(tenant, job.id, job::transitions::MARK_GENERATED).unwrap();
        assert_eq!(updated.status, JobStatus::Generated);

        let err = store
            .transition_job(tenant, job.id, job::transitions::MARK_GENERATED)
            .unwrap_err();
        assert!(err.is_state_conflict());
        assert_eq!(store.get_job(tenant, job.id).unwrap().status, JobStatus::Generated);
    }

    #[test]
    fn duplicate_version_numbers_conflict() {
        let (store, tenant, job) = seeded();
        store.insert_text_version(tenant, text(job.id, 1)).unwrap();
        let err = store.insert_text_version(tenant, text(job.id, 1)).unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Conflict(_))));
        store.insert_text_version(tenant, text(job.id, 2)).unwrap();
        assert_eq!(store.text_versions(tenant, job.id).unwrap().len(), 2);
    }

    #[test]
    fn shared_connectors_are_visible_to_every_tenant() {
        let store = InMemoryRecruitingStore::new();
        let (a, b) = (TenantId::new(), TenantId::new());
        let shared = ConnectorRecord::new("Dummy", "dummy");
        let private = ConnectorRecord::new("Own", "dummy").for_tenant(a);
        store.insert_connector(shared.clone()).unwrap();
        store.insert_connector(private.clone()).unwrap();

        assert!(store.get_connector(b, shared.id).is_ok());
        assert!(store.get_connector(a, private.id).is_ok());
        assert!(store.get_connector(b, private.id).unwrap_err().is_not_found());
    }

    #[test]
    fn publication_transitions_stamp_timestamps_and_patch() {
        let (store, tenant, job) = seeded();
        let connector = ConnectorRecord::new("Dummy", "dummy");
        let p = Publication::pending(job.id, connector.id);
        store.insert_connector(connector).unwrap();
        store.insert_publication(tenant, p.clone()).unwrap();

        store
            .transition_publication(tenant, p.id, publication::transitions::START, PublicationPatch::default())
            .unwrap();
        let published = store
            .transition_publication(
                tenant,
                p.id,
                publication::transitions::SUCCEED,
                PublicationPatch::external_id("ext-1"),
            )
            .unwrap();
        assert_eq!(published.external_id.as_deref(), Some("ext-1"));
        assert!(published.published_at.is_some());

        let stopped = store
            .transition_publication(tenant, p.id, publication::transitions::STOP, PublicationPatch::default())
            .unwrap();
        assert_eq!(stopped.status, PublicationStatus::Stopped);
        assert!(stopped.stopped_at.is_some());

        let err = store
            .transition_publication(tenant, p.id, publication::transitions::SUCCEED, PublicationPatch::default())
            .unwrap_err();
        assert!(err.is_state_conflict());
    }

    #[test]
    fn one_publication_per_job_and_connector() {
        let (store, tenant, job) = seeded();
        let connector = ConnectorId::new();
        store.insert_publication(tenant, Publication::pending(job.id, connector)).unwrap();
        assert!(store.insert_publication(tenant, Publication::pending(job.id, connector)).is_err());
        assert!(store.find_publication(tenant, job.id, connector).unwrap().is_some());
    }

    #[test]
    fn publication_logs_follow_tenant_scope() {
        let (store, tenant, job) = seeded();
        let p = Publication::pending(job.id, ConnectorId::new());
        store.insert_publication(tenant, p.clone()).unwrap();
        store
            .append_publication_log(tenant, PublicationLog::success(p.id, talentflow_recruiting::PublicationAction::Publish))
            .unwrap();

        assert_eq!(store.publication_logs(tenant, p.id).unwrap().len(), 1);
        assert!(store.publication_logs(TenantId::new(), p.id).is_err());
    }
}
