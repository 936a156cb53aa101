use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use talentflow_core::{CustomerId, Entity, JobId, StateMachine};

/// Job posting lifecycle.
///
/// ```text
/// DRAFT -> GENERATED -> PENDING_APPROVAL -> APPROVED -> PUBLISHING -> PUBLISHED
///   ^                         |                            |
///   +------ (reject) ---------+               PUBLISH_FAILED / STOPPED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Draft,
    Generated,
    PendingApproval,
    Approved,
    Publishing,
    Published,
    PublishFailed,
    Stopped,
}

impl JobStatus {
    /// Whether a posting may be sent to a job board from this state.
    pub fn is_publishable(self) -> bool {
        matches!(
            self,
            JobStatus::Approved | JobStatus::Published | JobStatus::PublishFailed | JobStatus::Stopped
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Draft => "DRAFT",
            JobStatus::Generated => "GENERATED",
            JobStatus::PendingApproval => "PENDING_APPROVAL",
            JobStatus::Approved => "APPROVED",
            JobStatus::Publishing => "PUBLISHING",
            JobStatus::Published => "PUBLISHED",
            JobStatus::PublishFailed => "PUBLISH_FAILED",
            JobStatus::Stopped => "STOPPED",
        }
    }
}

impl StateMachine for JobStatus {
    const ENTITY: &'static str = "job";

    fn can_transition_to(self, next: Self) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Draft, Generated)
                | (Draft, PendingApproval)
                | (Generated, PendingApproval)
                | (PendingApproval, Approved)
                | (PendingApproval, Draft)
                | (Approved, Publishing)
                | (Approved, Published)
                | (Publishing, Published)
                | (Publishing, PublishFailed)
                | (Publishing, Stopped)
                | (Published, Stopped)
                | (PublishFailed, Publishing)
                | (PublishFailed, Published)
                | (PublishFailed, Stopped)
                | (Stopped, Publishing)
                | (Stopped, Published)
        )
    }
}

/// Named job status writes.
pub mod transitions {
    use talentflow_core::Transition;

    use super::JobStatus::{self, *};

    /// Generation handlers: one-way, never regresses a later status.
    pub const MARK_GENERATED: Transition<JobStatus> = Transition::new(&[Draft], Generated);

    pub const SUBMIT_FOR_APPROVAL: Transition<JobStatus> =
        Transition::new(&[Draft, Generated], PendingApproval);

    pub const APPROVE: Transition<JobStatus> = Transition::new(&[PendingApproval], Approved);

    pub const REJECT: Transition<JobStatus> = Transition::new(&[PendingApproval], Draft);

    pub const MARK_PUBLISHED: Transition<JobStatus> =
        Transition::new(&[Approved, Publishing, PublishFailed, Stopped], Published);

    pub const MARK_STOPPED: Transition<JobStatus> =
        Transition::new(&[Publishing, Published, PublishFailed], Stopped);
}

/// Recruitment job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub customer_id: CustomerId,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub employment_type: Option<String>,
    pub requirements: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn draft(customer_id: CustomerId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            customer_id,
            title: title.into(),
            description: String::new(),
            location: None,
            salary: None,
            employment_type: None,
            requirements: None,
            status: JobStatus::Draft,
            created_at: now,
            updated_at: now,
            published_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_salary(mut self, salary: impl Into<String>) -> Self {
        self.salary = Some(salary.into());
        self
    }

    pub fn with_employment_type(mut self, employment_type: impl Into<String>) -> Self {
        self.employment_type = Some(employment_type.into());
        self
    }

    pub fn with_requirements(mut self, requirements: impl Into<String>) -> Self {
        self.requirements = Some(requirements.into());
        self
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }
}

impl Entity for Job {
    type Id = JobId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
