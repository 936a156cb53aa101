use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use talentflow_core::{ApprovalId, Entity, JobId, StateMachine, TenantId, TenantOwned, UserId};

/// Approval cycle status. Terminal once decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl StateMachine for ApprovalStatus {
    const ENTITY: &'static str = "approval";

    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (ApprovalStatus::Pending, ApprovalStatus::Approved)
                | (ApprovalStatus::Pending, ApprovalStatus::Rejected)
        )
    }
}

/// Named approval status writes.
pub mod transitions {
    use talentflow_core::Transition;

    use super::ApprovalStatus::{self, *};

    pub const APPROVE: Transition<ApprovalStatus> = Transition::new(&[Pending], Approved);
    pub const REJECT: Transition<ApprovalStatus> = Transition::new(&[Pending], Rejected);
}

/// Reviewer decision recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

impl ApprovalDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalDecision::Approved => "approved",
            ApprovalDecision::Rejected => "rejected",
        }
    }
}

/// One review cycle for a job snapshot.
///
/// The snapshot pins the text/image version numbers that were current when the
/// job was submitted, so reviewers approve exactly what they saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub id: ApprovalId,
    pub tenant_id: TenantId,
    pub job_id: JobId,
    pub status: ApprovalStatus,
    pub text_version: Option<u32>,
    pub image_version: Option<u32>,
    pub requested_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Approval {
    pub fn pending(
        tenant_id: TenantId,
        job_id: JobId,
        text_version: Option<u32>,
        image_version: Option<u32>,
    ) -> Self {
        Self {
            id: ApprovalId::new(),
            tenant_id,
            job_id,
            status: ApprovalStatus::Pending,
            text_version,
            image_version,
            requested_by: None,
            created_at: Utc::now(),
            decided_at: None,
        }
    }

    pub fn requested_by(mut self, user: UserId) -> Self {
        self.requested_by = Some(user);
        self
    }
}

impl Entity for Approval {
    type Id = ApprovalId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantOwned for Approval {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Append-only audit record of a single approve/reject action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalReview {
    pub approval_id: ApprovalId,
    pub reviewer: Option<UserId>,
    pub decision: ApprovalDecision,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::transitions::*;
    use super::*;

    #[test]
    fn decided_approvals_are_terminal() {
        let mut slot = ApprovalStatus::Pending;
        APPROVE.apply(&mut slot).unwrap();

        let err = APPROVE.apply(&mut slot).unwrap_err();
        assert!(err.is_state_conflict());
        assert!(REJECT.apply(&mut slot).is_err());
        assert_eq!(slot, ApprovalStatus::Approved);
    }
}
