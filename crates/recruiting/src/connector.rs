use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use talentflow_core::{ConnectorId, Entity, TenantId};

/// Stored connector configuration.
///
/// `connector_type` selects the implementation at runtime; `config` is opaque
/// here and only interpreted by that implementation (credentials, endpoints).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorRecord {
    pub id: ConnectorId,
    /// `None` for admin-managed connectors shared by all tenants.
    pub tenant_id: Option<TenantId>,
    pub name: String,
    #[serde(rename = "type")]
    pub connector_type: String,
    pub config: Map<String, Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ConnectorRecord {
    pub fn new(name: impl Into<String>, connector_type: impl Into<String>) -> Self {
        Self {
            id: ConnectorId::new(),
            tenant_id: None,
            name: name.into(),
            connector_type: connector_type.into(),
            config: Map::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn for_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_config(mut self, config: Map<String, Value>) -> Self {
        self.config = config;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn is_visible_to(&self, tenant_id: TenantId) -> bool {
        self.tenant_id.map_or(true, |t| t == tenant_id)
    }
}

impl Entity for ConnectorRecord {
    type Id = ConnectorId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
