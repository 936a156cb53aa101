use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use talentflow_core::{ApprovalId, JobId, TenantId, Transition, UserId};
use talentflow_recruiting::{
    Approval, ApprovalDecision, ApprovalReview, ApprovalStatus, JobStatus, approval, job,
};

use super::ServiceResult;
use crate::notifications::Notifier;
use crate::store::RecruitingStore;

#[derive(Clone)]
pub struct ApprovalService {
    store: Arc<dyn RecruitingStore>,
    notifier: Notifier,
}

impl ApprovalService {
    pub fn new(store: Arc<dyn RecruitingStore>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    /// Open an approval for the job's latest versions and move the job to
    /// PENDING_APPROVAL. Only DRAFT and GENERATED jobs can be submitted.
    pub fn submit(
        &self,
        tenant_id: TenantId,
        job_id: JobId,
        requested_by: Option<UserId>,
    ) -> ServiceResult<Approval> {
        let current = self.store.get_job(tenant_id, job_id)?;
        job::transitions::SUBMIT_FOR_APPROVAL.check(current.status)?;

        let text_version = self
            .store
            .text_versions(tenant_id, job_id)?
            .iter()
            .map(|v| v.version)
            .max();
        let image_version = self
            .store
            .image_versions(tenant_id, job_id)?
            .iter()
            .map(|v| v.version)
            .max();

        let mut pending = Approval::pending(tenant_id, job_id, text_version, image_version);
        if let Some(user) = requested_by {
            pending = pending.requested_by(user);
        }

        // the job swap goes first so concurrent submits cannot open two approvals
        self.store
            .transition_job(tenant_id, job_id, job::transitions::SUBMIT_FOR_APPROVAL)?;
        self.store.insert_approval(pending.clone())?;

        info!(approval_id = %pending.id, job_id = %job_id, tenant = %tenant_id, "approval requested");
        Ok(pending)
    }

    pub async fn approve(
        &self,
        tenant_id: TenantId,
        approval_id: ApprovalId,
        reviewer: Option<UserId>,
        comment: Option<String>,
    ) -> ServiceResult<Approval> {
        self.decide(tenant_id, approval_id, ApprovalDecision::Approved, reviewer, comment)
            .await
    }

    pub async fn reject(
        &self,
        tenant_id: TenantId,
        approval_id: ApprovalId,
        reviewer: Option<UserId>,
        comment: Option<String>,
    ) -> ServiceResult<Approval> {
        self.decide(tenant_id, approval_id, ApprovalDecision::Rejected, reviewer, comment)
            .await
    }

    pub fn reviews(&self, tenant_id: TenantId, approval_id: ApprovalId) -> ServiceResult<Vec<ApprovalReview>> {
        Ok(self.store.reviews(tenant_id, approval_id)?)
    }

    async fn decide(
        &self,
        tenant_id: TenantId,
        approval_id: ApprovalId,
        decision: ApprovalDecision,
        reviewer: Option<UserId>,
        comment: Option<String>,
    ) -> ServiceResult<Approval> {
        let (approval_write, job_write): (Transition<ApprovalStatus>, Transition<JobStatus>) =
            match decision {
                ApprovalDecision::Approved => (approval::transitions::APPROVE, job::transitions::APPROVE),
                ApprovalDecision::Rejected => (approval::transitions::REJECT, job::transitions::REJECT),
            };

        let pending = self.store.get_approval(tenant_id, approval_id)?;
        // a second decision fails here and leaves everything untouched
        approval_write.check(pending.status)?;

        // job first: a lost job swap leaves the approval pending
        let updated = self
            .store
            .transition_job(tenant_id, pending.job_id, job_write)?;
        let decided = match self.store.decide_approval(tenant_id, approval_id, approval_write) {
            Ok(decided) => decided,
            Err(e) => {
                warn!(
                    approval_id = %approval_id,
                    job_id = %updated.id,
                    error = %e,
                    "job moved but approval could not be decided"
                );
                return Err(e.into());
            }
        };

        self.store.insert_review(
            tenant_id,
            ApprovalReview {
                approval_id,
                reviewer,
                decision,
                comment: comment.clone(),
                created_at: Utc::now(),
            },
        )?;

        info!(
            approval_id = %approval_id,
            job_id = %updated.id,
            tenant = %tenant_id,
            decision = decision.as_str(),
            "approval decided"
        );
        self.notifier
            .approval_decided(tenant_id, &decided, &updated, decision, comment.as_deref());
        Ok(decided)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::WebhookDispatcher;
    use crate::services::ServiceError;
    use crate::store::InMemoryRecruitingStore;
    use crate::tasks::{QueueName, QueueRegistry};
    use std::time::Duration;
    use talentflow_recruiting::{Customer, Job};

    struct Fixture {
        store: Arc<InMemoryRecruitingStore>,
        queues: Arc<QueueRegistry>,
        service: ApprovalService,
        tenant: TenantId,
    }

    impl Fixture {
        fn new() -> Self {
            let store = InMemoryRecruitingStore::arc();
            let queues = Arc::new(QueueRegistry::with_defaults());
            let notifier = Notifier::new(
                queues.clone(),
                store.clone(),
                WebhookDispatcher::new(Duration::from_millis(200)),
            );
            Self {
                service: ApprovalService::new(store.clone(), notifier),
                store,
                queues,
                tenant: TenantId::new(),
            }
        }

        fn job(&self, status: JobStatus) -> Job {
            let customer = Customer::new(self.tenant, "Acme").with_contact_email("hr@acme.test");
            let job = Job::draft(customer.id, "Designer").with_status(status);
            self.store.insert_customer(customer).unwrap();
            self.store.insert_job(self.tenant, job.clone()).unwrap();
            job
        }

        fn job_status(&self, id: JobId) -> JobStatus {
            self.store.get_job(self.tenant, id).unwrap().status
        }
    }

    #[test]
    fn submit_moves_job_and_snapshots_versions() {
        let fx = Fixture::new();
        let job = fx.job(JobStatus::Generated);
        fx.store
            .insert_text_version(
                fx.tenant,
                talentflow_recruiting::TextVersion {
                    job_id: job.id,
                    version: 1,
                    content: "c".into(),
                    prompt: None,
                    model: "m".into(),
                    created_at: Utc::now(),
                },
            )
            .unwrap();

        let approval = fx.service.submit(fx.tenant, job.id, None).unwrap();
        assert_eq!(approval.status, ApprovalStatus::Pending);
        assert_eq!(approval.text_version, Some(1));
        assert_eq!(approval.image_version, None);
        assert_eq!(fx.job_status(job.id), JobStatus::PendingApproval);
    }

    #[test]
    fn submit_from_published_is_a_conflict_without_approval_row() {
        let fx = Fixture::new();
        let job = fx.job(JobStatus::Published);

        let err = fx.service.submit(fx.tenant, job.id, None).unwrap_err();
        assert!(err.is_state_conflict());
        assert!(fx.store.approvals_for_job(fx.tenant, job.id).unwrap().is_empty());
        assert_eq!(fx.job_status(job.id), JobStatus::Published);
    }

    #[tokio::test]
    async fn second_approve_is_rejected_and_changes_nothing() {
        let fx = Fixture::new();
        let job = fx.job(JobStatus::Draft);
        let approval = fx.service.submit(fx.tenant, job.id, None).unwrap();

        let decided = fx
            .service
            .approve(fx.tenant, approval.id, Some(UserId::new()), None)
            .await
            .unwrap();
        assert_eq!(decided.status, ApprovalStatus::Approved);
        assert!(decided.decided_at.is_some());
        assert_eq!(fx.job_status(job.id), JobStatus::Approved);

        let err = fx
            .service
            .approve(fx.tenant, approval.id, None, None)
            .await
            .unwrap_err();
        assert!(err.is_state_conflict());
        assert_eq!(
            fx.store.get_approval(fx.tenant, approval.id).unwrap().decided_at,
            decided.decided_at
        );
        assert_eq!(fx.job_status(job.id), JobStatus::Approved);
        assert_eq!(fx.service.reviews(fx.tenant, approval.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reject_returns_job_to_draft_and_notifies() {
        let fx = Fixture::new();
        let job = fx.job(JobStatus::Generated);
        let approval = fx.service.submit(fx.tenant, job.id, None).unwrap();

        fx.service
            .reject(fx.tenant, approval.id, None, Some("tone is off".into()))
            .await
            .unwrap();
        assert_eq!(fx.job_status(job.id), JobStatus::Draft);

        let reviews = fx.service.reviews(fx.tenant, approval.id).unwrap();
        assert_eq!(reviews[0].decision, ApprovalDecision::Rejected);
        assert_eq!(reviews[0].comment.as_deref(), Some("tone is off"));

        let email = fx
            .queues
            .stats()
            .into_iter()
            .find(|s| s.queue_name == QueueName::Email.as_str())
            .unwrap();
        assert_eq!(email.waiting, 1);
    }

    #[tokio::test]
    async fn job_moved_elsewhere_leaves_approval_pending() {
        let fx = Fixture::new();
        let job = fx.job(JobStatus::Draft);
        let approval = fx.service.submit(fx.tenant, job.id, None).unwrap();
        fx.store
            .transition_job(fx.tenant, job.id, job::transitions::REJECT)
            .unwrap();

        let err = fx
            .service
            .approve(fx.tenant, approval.id, Some(UserId::new()), None)
            .await
            .unwrap_err();
        assert!(err.is_state_conflict());

        let stored = fx.store.get_approval(fx.tenant, approval.id).unwrap();
        assert_eq!(stored.status, ApprovalStatus::Pending);
        assert!(stored.decided_at.is_none());
        assert!(fx.service.reviews(fx.tenant, approval.id).unwrap().is_empty());
        assert_eq!(fx.job_status(job.id), JobStatus::Draft);
        assert!(fx.queues.stats().iter().all(|s| s.waiting == 0));
    }

    #[tokio::test]
    async fn other_tenants_cannot_decide() {
        let fx = Fixture::new();
        let job = fx.job(JobStatus::Draft);
        let approval = fx.service.submit(fx.tenant, job.id, None).unwrap();

        let err = fx
            .service
            .approve(TenantId::new(), approval.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(_)));
        assert!(err.is_not_found());
        assert_eq!(fx.job_status(job.id), JobStatus::PendingApproval);
    }
}
