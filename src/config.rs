//! Connector and table configuration.

use serde::Deserialize;

use crate::error::{Error, Result};

/// API version the bundled SDK clients speak.
pub const API_VERSION: &str = "2018-11-01";

/// Connection settings for one connector.
///
/// Built once, either through [`ConnectorConfig::builder`] or by deserializing
/// from any serde format, and handed to the connector by value.
#[derive(Clone, Deserialize)]
pub struct ConnectorConfig {
    /// Access key id.
    pub user: String,
    /// Secret access key.
    pub password: String,
    /// Region the session is scoped to (e.g. `eu-west-1`).
    pub region: String,
    /// Requested API version. `None`, `"latest"` and [`API_VERSION`] are
    /// accepted.
    #[serde(default)]
    pub version: Option<String>,
    /// Database that writes, `last`/`first` and table calls target.
    pub database: String,
    /// Custom endpoint (local emulators). Disables endpoint discovery.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl ConnectorConfig {
    /// Start building a configuration.
    pub fn builder() -> ConnectorConfigBuilder {
        ConnectorConfigBuilder::default()
    }

    /// Check that the requested API version is one the SDK can serve.
    pub fn validate_version(&self) -> Result<()> {
        match self.version.as_deref() {
            None | Some("") | Some("latest") | Some(API_VERSION) => Ok(()),
            Some(other) => Err(Error::Config(format!(
                "unsupported API version '{}', expected '{}'",
                other, API_VERSION
            ))),
        }
    }
}

impl std::fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("region", &self.region)
            .field("version", &self.version)
            .field("database", &self.database)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// Builder for [`ConnectorConfig`].
#[derive(Clone, Debug, Default)]
pub struct ConnectorConfigBuilder {
    user: String,
    password: String,
    region: Option<String>,
    version: Option<String>,
    database: Option<String>,
    endpoint_url: Option<String>,
}

impl ConnectorConfigBuilder {
    /// Access key id.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Secret access key.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Service region, e.g. `eu-west-1`.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// API version; `latest` or the pinned version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Target database.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Fixed endpoint. Disables endpoint discovery.
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Finish the configuration. Region and database are required.
    pub fn build(self) -> Result<ConnectorConfig> {
        let region = self
            .region
            .ok_or_else(|| Error::Config("region is required".to_string()))?;
        let database = self
            .database
            .ok_or_else(|| Error::Config("database is required".to_string()))?;

        Ok(ConnectorConfig {
            user: self.user,
            password: self.password,
            region,
            version: self.version,
            database,
            endpoint_url: self.endpoint_url,
        })
    }
}

/// Default memory store retention: one year, in hours.
pub const DEFAULT_MEMORY_RETENTION_HOURS: i64 = 8766;

/// Default magnetic store retention: two hundred years, in days.
pub const DEFAULT_MAGNETIC_RETENTION_DAYS: i64 = 73000;

/// Properties of a table to create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    pub memory_retention_hours: i64,
    pub magnetic_retention_days: i64,
    pub enable_magnetic_store_writes: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            memory_retention_hours: DEFAULT_MEMORY_RETENTION_HOURS,
            magnetic_retention_days: DEFAULT_MAGNETIC_RETENTION_DAYS,
            enable_magnetic_store_writes: true,
        }
    }
}
