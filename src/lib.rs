//! # timestream-connector
//!
//! Async connector for Amazon Timestream: configure credentials once, then
//! query, write and manage tables through a lazily created session.
//!
//! ## Quick Start
//!
//! ```ignore
//! use timestream_connector::{Connector, ConnectorConfig, MultiMeasureInput, Record};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConnectorConfig::builder()
//!         .user("AKIA...")
//!         .password("...")
//!         .region("eu-west-1")
//!         .database("sensors")
//!         .build()?;
//!     let mut connector = Connector::new(config);
//!
//!     let reading = MultiMeasureInput::new()
//!         .name("reading")
//!         .dimension("sensor", "a")
//!         .measure("temperature", 21.5)
//!         .measure("online", true);
//!     connector.write("readings", &[Record::multi("0", reading)]).await?;
//!
//!     for row in connector.query(r#"SELECT * FROM "sensors"."readings" LIMIT 10"#).await? {
//!         println!("{:?}", row.get("temperature"));
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Lazy sessions**: the SDK session is built on first use and reused
//! - **Batched writes**: records are sent in chunks of 100, the service limit
//! - **Multi-measure records**: typed measures with dimension-derived names
//! - **Paginated queries**: rows are collected, or streamed page by page
//! - **Named connectors**: an application-owned [`Registry`]

pub mod client;
pub mod config;
pub mod error;
pub mod record;
pub mod registry;
pub mod session;
pub mod types;
pub mod value;

// Re-export main types at crate root
pub use client::{ConnectionState, Connector, MAX_RECORDS_PER_WRITE};
pub use config::{ConnectorConfig, ConnectorConfigBuilder, TableOptions};
pub use error::{Error, Result};
pub use record::{
    MeasureEntry, MultiMeasureInput, Record, RecordInput, SingleMeasureInput, WriteRecord,
};
pub use registry::Registry;
pub use session::{AwsSession, AwsSessionFactory, Session, SessionFactory};
pub use types::{
    DatabaseDescription, Dimension, MeasureValueType, QueryPage, Retention, Row,
    TableDescription, TimeUnit, WriteResult,
};
pub use value::MeasureValue;
