use serde_json::{Map, Value};

use crate::connector::ConnectorError;

/// Opaque, implementation-specific connector configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectorConfig(Map<String, Value>);

impl ConnectorConfig {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    /// Build from an arbitrary JSON value; only objects are accepted.
    pub fn from_value(value: Value) -> Result<Self, ConnectorError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(ConnectorError::Configuration(format!(
                "connector config must be an object, got {other}"
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn require_str(&self, key: &str) -> Result<&str, ConnectorError> {
        self.get_str(key)
            .ok_or_else(|| ConnectorError::Configuration(format!("missing `{key}`")))
    }

    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(default)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ConnectorConfig {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}
