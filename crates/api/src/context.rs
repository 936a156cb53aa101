//! Per-request caller identity, derived from the verified bearer token and
//! attached to the request by the auth middleware.

use axum::http::StatusCode;
use axum::response::Response;

use talentflow_auth::{JwtClaims, Role, has_any_role};
use talentflow_core::{TenantId, UserId};

use crate::app::errors;

/// Who is calling, and on behalf of which tenant.
///
/// Every store and queue lookup made for the request is scoped by
/// [`RequestContext::tenant_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    tenant_id: TenantId,
    user_id: UserId,
    roles: Vec<Role>,
}

impl RequestContext {
    pub fn new(tenant_id: TenantId, user_id: UserId, roles: Vec<Role>) -> Self {
        Self {
            tenant_id,
            user_id,
            roles,
        }
    }

    pub fn from_claims(claims: JwtClaims) -> Self {
        Self::new(claims.tenant_id, claims.sub, claims.roles)
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Token subject; recorded as requester/reviewer on approvals.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn has_any_role(&self, wanted: &[&str]) -> bool {
        has_any_role(&self.roles, wanted)
    }

    /// 403 unless the caller holds one of `wanted`.
    pub fn require_any_role(&self, wanted: &[&str]) -> Result<(), Response> {
        if self.has_any_role(wanted) {
            return Ok(());
        }
        Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("requires one of the roles: {}", wanted.join(", ")),
        ))
    }
}
