//! Named connectors owned by the application.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::debug;

use crate::client::Connector;
use crate::config::ConnectorConfig;
use crate::error::{Error, Result};
use crate::session::{AwsSessionFactory, SessionFactory};

/// Maps names to connectors.
///
/// ```ignore
/// let mut registry = Registry::new();
/// registry.define("metrics", Connector::new(config));
///
/// let connector = registry.get_mut("metrics")?;
/// connector.write("readings", &records).await?;
/// ```
#[derive(Debug)]
pub struct Registry<F: SessionFactory = AwsSessionFactory> {
    connectors: HashMap<String, Connector<F>>,
}

impl<F: SessionFactory> Default for Registry<F> {
    fn default() -> Self {
        Self {
            connectors: HashMap::new(),
        }
    }
}

impl Registry<AwsSessionFactory> {
    /// Define an AWS-backed connector from a configuration.
    pub fn define_config(
        &mut self,
        name: impl Into<String>,
        config: ConnectorConfig,
    ) -> &mut Connector<AwsSessionFactory> {
        self.define(name, Connector::new(config))
    }
}

impl<F: SessionFactory> Registry<F> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector under a name, replacing any previous one.
    pub fn define(&mut self, name: impl Into<String>, connector: Connector<F>) -> &mut Connector<F> {
        match self.connectors.entry(name.into()) {
            Entry::Occupied(mut e) => {
                debug!(name = %e.key(), "replacing connector");
                e.insert(connector);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(connector),
        }
    }

    /// Look up a connector.
    pub fn get(&self, name: &str) -> Result<&Connector<F>> {
        self.connectors
            .get(name)
            .ok_or_else(|| Error::ConnectorNotFound {
                name: name.to_string(),
            })
    }

    /// Look up a connector for calls that may connect.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Connector<F>> {
        self.connectors
            .get_mut(name)
            .ok_or_else(|| Error::ConnectorNotFound {
                name: name.to_string(),
            })
    }

    /// Remove a connector, dropping its session.
    pub fn remove(&mut self, name: &str) -> Option<Connector<F>> {
        self.connectors.remove(name)
    }

    /// Whether a connector is defined under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.connectors.contains_key(name)
    }

    /// Defined names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connectors.keys().map(String::as_str)
    }

    /// Number of defined connectors.
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    /// Whether no connector is defined.
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(database: &str) -> ConnectorConfig {
        ConnectorConfig::builder()
            .region("eu-west-1")
            .database(database)
            .build()
            .unwrap()
    }

    #[test]
    fn test_get_defined_connector() {
        let mut registry = Registry::new();
        registry.define_config("metrics", config("db1"));

        assert_eq!(registry.get("metrics").unwrap().database(), "db1");
        assert!(registry.contains("metrics"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_undefined_name_is_not_found() {
        let mut registry: Registry = Registry::new();

        match registry.get("missing") {
            Err(Error::ConnectorNotFound { name }) => assert_eq!(name, "missing"),
            other => panic!("expected ConnectorNotFound, got {:?}", other),
        }
        assert!(matches!(
            registry.get_mut("missing"),
            Err(Error::ConnectorNotFound { .. })
        ));
    }

    #[test]
    fn test_define_replaces_existing() {
        let mut registry = Registry::new();
        registry.define_config("metrics", config("db1"));
        registry.define_config("metrics", config("db2"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("metrics").unwrap().database(), "db2");
    }

    #[test]
    fn test_remove() {
        let mut registry = Registry::new();
        registry.define_config("a", config("db"));
        registry.define_config("b", config("db"));

        assert!(registry.remove("a").is_some());
        assert!(registry.get("a").is_err());
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["b"]);
    }
}
