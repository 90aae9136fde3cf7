//! Error types for timestream-connector.

use thiserror::Error;

/// Boxed error returned by the AWS SDK, kept intact so callers can downcast it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for timestream-connector operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No connector was defined under the requested name.
    #[error("Connector '{name}' doesn't exist")]
    ConnectorNotFound {
        /// Name that was looked up.
        name: String,
    },

    /// Connector configuration is incomplete or unsupported.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A call to the service failed. The SDK error is carried unchanged.
    #[error("{operation} failed: {source}")]
    Service {
        /// Service operation that failed (e.g. `WriteRecords`).
        operation: &'static str,
        /// Underlying SDK error.
        #[source]
        source: BoxError,
    },

    /// A JSON value could not be used as a measure value.
    #[error("Unsupported measure value: {0}")]
    InvalidValue(String),

    /// Failed to serialize a record to JSON.
    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap an SDK error for the given operation.
    pub fn service(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Error::Service {
            operation,
            source: source.into(),
        }
    }

    /// Returns true for errors raised by the service or its SDK.
    pub fn is_service(&self) -> bool {
        matches!(self, Error::Service { .. })
    }
}

/// Result type alias for timestream-connector operations.
pub type Result<T> = std::result::Result<T, Error>;
