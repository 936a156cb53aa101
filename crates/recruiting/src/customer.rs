use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use talentflow_core::{CustomerId, Entity, TenantId, TenantOwned};

/// A client company whose jobs are being recruited for. Belongs to one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub tenant_id: TenantId,
    pub name: String,
    /// Recipient for approval notifications.
    pub contact_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(tenant_id: TenantId, name: impl Into<String>) -> Self {
        Self {
            id: CustomerId::new(),
            tenant_id,
            name: name.into(),
            contact_email: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_contact_email(mut self, email: impl Into<String>) -> Self {
        self.contact_email = Some(email.into());
        self
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantOwned for Customer {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
