use std::sync::Arc;

use tracing::{debug, info, warn};

use talentflow_core::{PublicationId, TenantId};
use talentflow_recruiting::{Publication, PublicationAction, PublicationLog, job, publication};

use super::ServiceResult;
use crate::store::{PublicationPatch, RecruitingStore};

#[derive(Clone)]
pub struct PublicationService {
    store: Arc<dyn RecruitingStore>,
}

impl PublicationService {
    pub fn new(store: Arc<dyn RecruitingStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, tenant_id: TenantId, id: PublicationId) -> ServiceResult<Publication> {
        Ok(self.store.get_publication(tenant_id, id)?)
    }

    /// Flip the publication to STOPPED and log it. The board itself is not
    /// called, and an in-flight publish task is not cancelled.
    ///
    /// When no other publication of the job is still live the job moves to
    /// STOPPED as well.
    pub fn stop(&self, tenant_id: TenantId, id: PublicationId) -> ServiceResult<Publication> {
        let stopped = self.store.transition_publication(
            tenant_id,
            id,
            publication::transitions::STOP,
            PublicationPatch::default(),
        )?;
        self.store.append_publication_log(
            tenant_id,
            PublicationLog::success(stopped.id, PublicationAction::Stop),
        )?;
        info!(publication_id = %stopped.id, job_id = %stopped.job_id, tenant = %tenant_id, "publication stopped");

        let still_live = self
            .store
            .publications_for_job(tenant_id, stopped.job_id)?
            .iter()
            .any(|p| p.id != stopped.id && p.status.is_live());
        if !still_live {
            match self
                .store
                .transition_job(tenant_id, stopped.job_id, job::transitions::MARK_STOPPED)
            {
                Ok(_) => {}
                Err(e) if e.is_state_conflict() => {
                    debug!(job_id = %stopped.job_id, "job not in a live state; status untouched");
                }
                Err(e) => warn!(job_id = %stopped.job_id, error = %e, "could not stop job"),
            }
        }
        Ok(stopped)
    }

    pub fn logs(&self, tenant_id: TenantId, id: PublicationId) -> ServiceResult<Vec<PublicationLog>> {
        Ok(self.store.publication_logs(tenant_id, id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRecruitingStore;
    use talentflow_core::ConnectorId;
    use talentflow_recruiting::{Customer, Job, JobStatus, PublicationStatus};

    fn live(store: &InMemoryRecruitingStore, tenant: TenantId, job: &Job) -> Publication {
        let p = Publication::pending(job.id, ConnectorId::new());
        store.insert_publication(tenant, p.clone()).unwrap();
        for t in [publication::transitions::START, publication::transitions::SUCCEED] {
            store
                .transition_publication(tenant, p.id, t, PublicationPatch::external_id("ext"))
                .unwrap();
        }
        p
    }

    fn seeded() -> (Arc<InMemoryRecruitingStore>, TenantId, Job) {
        let store = InMemoryRecruitingStore::arc();
        let tenant = TenantId::new();
        let customer = Customer::new(tenant, "Acme");
        let job = Job::draft(customer.id, "Nurse").with_status(JobStatus::Published);
        store.insert_customer(customer).unwrap();
        store.insert_job(tenant, job.clone()).unwrap();
        (store, tenant, job)
    }

    #[test]
    fn stopping_last_live_publication_stops_job() {
        let (store, tenant, job) = seeded();
        let a = live(&store, tenant, &job);
        let b = live(&store, tenant, &job);
        let service = PublicationService::new(store.clone());

        let stopped = service.stop(tenant, a.id).unwrap();
        assert_eq!(stopped.status, PublicationStatus::Stopped);
        assert_eq!(store.get_job(tenant, job.id).unwrap().status, JobStatus::Published);

        service.stop(tenant, b.id).unwrap();
        assert_eq!(store.get_job(tenant, job.id).unwrap().status, JobStatus::Stopped);

        let logs = service.logs(tenant, b.id).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, PublicationAction::Stop);
    }

    #[test]
    fn stopping_twice_is_a_conflict() {
        let (store, tenant, job) = seeded();
        let p = live(&store, tenant, &job);
        let service = PublicationService::new(store.clone());

        service.stop(tenant, p.id).unwrap();
        assert!(service.stop(tenant, p.id).unwrap_err().is_state_conflict());
        assert_eq!(service.logs(tenant, p.id).unwrap().len(), 1);
    }

    #[test]
    fn stop_is_tenant_scoped() {
        let (store, tenant, job) = seeded();
        let p = live(&store, tenant, &job);
        let service = PublicationService::new(store.clone());

        assert!(service.stop(TenantId::new(), p.id).unwrap_err().is_not_found());
        assert_eq!(service.get(tenant, p.id).unwrap().status, PublicationStatus::Published);
    }
}
