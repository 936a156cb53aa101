use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::ConnectorConfig;
use crate::connector::{ConnectorError, JobBoardConnector};
use crate::{dummy, indeed, stepstone};

/// Builds a connector instance from its stored configuration.
pub type ConnectorFactory = Arc<
    dyn Fn(&ConnectorConfig) -> Result<Box<dyn JobBoardConnector>, ConnectorError> + Send + Sync,
>;

fn boxed<C: JobBoardConnector + 'static>(
    built: Result<C, ConnectorError>,
) -> Result<Box<dyn JobBoardConnector>, ConnectorError> {
    Ok(Box::new(built?))
}

/// Maps connector type strings to factories.
///
/// Type lookups are case-insensitive; keys are stored lowercased.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    factories: BTreeMap<String, ConnectorFactory>,
}

impl ConnectorRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the built-in boards (`dummy`, `indeed`, `stepstone`).
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(
            dummy::TYPE,
            Arc::new(|cfg: &ConnectorConfig| boxed(dummy::DummyConnector::from_config(cfg))),
        );
        registry.register(
            indeed::TYPE,
            Arc::new(|cfg: &ConnectorConfig| boxed(indeed::IndeedConnector::from_config(cfg))),
        );
        registry.register(
            stepstone::TYPE,
            Arc::new(|cfg: &ConnectorConfig| {
                boxed(stepstone::StepStoneConnector::from_config(cfg))
            }),
        );
        registry
    }

    /// Adds or replaces the factory for `connector_type`.
    pub fn register(&mut self, connector_type: &str, factory: ConnectorFactory) {
        self.factories
            .insert(connector_type.to_ascii_lowercase(), factory);
    }

    pub fn create(
        &self,
        connector_type: &str,
        config: &ConnectorConfig,
    ) -> Result<Box<dyn JobBoardConnector>, ConnectorError> {
        let key = connector_type.to_ascii_lowercase();
        let factory = self
            .factories
            .get(&key)
            .ok_or_else(|| ConnectorError::UnknownType(connector_type.to_string()))?;
        debug!(connector_type = %key, "creating connector");
        factory(config)
    }

    /// Registered types, sorted.
    pub fn types(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn supports(&self, connector_type: &str) -> bool {
        self.factories
            .contains_key(&connector_type.to_ascii_lowercase())
    }
}

impl std::fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("types", &self.types())
            .finish()
    }
}
