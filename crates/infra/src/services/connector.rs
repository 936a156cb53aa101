use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use talentflow_connectors::{Capabilities, ConnectorConfig, ConnectorRegistry};
use talentflow_core::{ConnectorId, TenantId};

use super::ServiceResult;
use crate::store::RecruitingStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTest {
    pub connector_id: ConnectorId,
    #[serde(rename = "type")]
    pub connector_type: String,
    pub ok: bool,
    pub capabilities: Capabilities,
}

#[derive(Clone)]
pub struct ConnectorService {
    store: Arc<dyn RecruitingStore>,
    registry: Arc<ConnectorRegistry>,
}

impl ConnectorService {
    pub fn new(store: Arc<dyn RecruitingStore>, registry: Arc<ConnectorRegistry>) -> Self {
        Self { store, registry }
    }

    /// Build the connector from its stored config and run its auth check.
    pub async fn test(&self, tenant_id: TenantId, id: ConnectorId) -> ServiceResult<ConnectionTest> {
        let record = self.store.get_connector(tenant_id, id)?;
        let connector = self
            .registry
            .create(&record.connector_type, &ConnectorConfig::from(record.config))?;
        let ok = connector.test_connection().await;
        info!(connector_id = %id, connector_type = %record.connector_type, ok, "connection tested");

        Ok(ConnectionTest {
            connector_id: id,
            connector_type: record.connector_type,
            ok,
            capabilities: connector.capabilities(),
        })
    }

    pub fn types(&self) -> Vec<String> {
        self.registry.types()
    }
}
