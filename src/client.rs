//! Timestream connector.
//!
//! This module provides the main `Connector` type: it owns one connection
//! configuration, establishes a session lazily on first use and routes
//! queries, batched writes and table administration through it.

use std::pin::Pin;

use async_stream::stream;
use futures::{Stream, StreamExt};
use tracing::{debug, info};

use crate::config::{ConnectorConfig, TableOptions};
use crate::error::{Error, Result};
use crate::record::{Record, to_write_records};
use crate::session::{AwsSessionFactory, Session, SessionFactory};
use crate::types::{DatabaseDescription, Row, TableDescription, WriteResult};

/// Maximum number of records the service accepts in one write call.
pub const MAX_RECORDS_PER_WRITE: usize = 100;

/// Connection state of a connector.
#[derive(Debug, Default)]
pub enum ConnectionState<S> {
    /// No session yet, or the session was torn down.
    #[default]
    Unconnected,
    /// An active session.
    Connected(S),
}

impl<S> ConnectionState<S> {
    /// The active session, if any.
    pub fn session(&self) -> Option<&S> {
        match self {
            ConnectionState::Connected(s) => Some(s),
            ConnectionState::Unconnected => None,
        }
    }

    /// Whether a session is active.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }
}

/// Connector for one database of the time-series service.
///
/// The session is created on the first call that needs it and reused until
/// [`Connector::disconnect`]. All calls are sequential; errors from the
/// service propagate unchanged.
///
/// # Example
///
/// ```ignore
/// use timestream_connector::{Connector, ConnectorConfig, Record};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ConnectorConfig::builder()
///         .user("AKIA...")
///         .password("...")
///         .region("eu-west-1")
///         .database("sensors")
///         .build()?;
///     let mut connector = Connector::new(config);
///
///     let record = Record::single("temp", "21.5", 1_700_000_000).with_dimension("sensor", "a");
///     connector.write("readings", &[record]).await?;
///
///     if let Some(row) = connector.last("readings", Some("sensor = 'a'")).await? {
///         println!("latest: {:?}", row.get("measure_value::double"));
///     }
///     Ok(())
/// }
/// ```
pub struct Connector<F: SessionFactory = AwsSessionFactory> {
    config: ConnectorConfig,
    factory: F,
    state: ConnectionState<F::Session>,
}

impl Connector<AwsSessionFactory> {
    /// Create a connector backed by the AWS SDK.
    pub fn new(config: ConnectorConfig) -> Self {
        Self::with_factory(config, AwsSessionFactory)
    }
}

impl<F: SessionFactory> Connector<F> {
    /// Create a connector with a custom session factory.
    pub fn with_factory(config: ConnectorConfig, factory: F) -> Self {
        Self {
            config,
            factory,
            state: ConnectionState::Unconnected,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Get the target database name.
    pub fn database(&self) -> &str {
        &self.config.database
    }

    /// Current connection state.
    pub fn state(&self) -> &ConnectionState<F::Session> {
        &self.state
    }

    /// Return the active session, establishing it if needed.
    ///
    /// Idempotent: an existing session is returned as is. There is no retry;
    /// factory errors propagate.
    pub async fn connect(&mut self) -> Result<&F::Session> {
        self.ensure_connected().await?;
        self.active()
    }

    /// Drop the session. The next call reconnects.
    pub fn disconnect(&mut self) {
        if self.state.is_connected() {
            info!(database = %self.config.database, "disconnecting");
        }
        self.state = ConnectionState::Unconnected;
    }

    async fn ensure_connected(&mut self) -> Result<()> {
        if let ConnectionState::Unconnected = self.state {
            let session = self.factory.connect(&self.config).await?;
            info!(
                region = %self.config.region,
                database = %self.config.database,
                "connected"
            );
            self.state = ConnectionState::Connected(session);
        }
        Ok(())
    }

    fn active(&self) -> Result<&F::Session> {
        self.state
            .session()
            .ok_or_else(|| Error::Config("connector has no active session".to_string()))
    }

    /// Execute a query and collect every row, across all result pages.
    ///
    /// The query string is sent verbatim; callers are responsible for
    /// escaping.
    pub async fn query(&mut self, query: &str) -> Result<Vec<Row>> {
        let mut stream = self.query_stream(query).await?;
        let mut rows = Vec::new();

        while let Some(row) = stream.next().await {
            rows.push(row?);
        }

        Ok(rows)
    }

    /// Execute a query and return rows as a stream, fetching pages on demand.
    pub async fn query_stream(
        &mut self,
        query: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<Row>> + Send + '_>>> {
        self.ensure_connected().await?;
        let session = self.active()?;
        let query = query.to_string();
        debug!(query = %query, "query");

        let s = stream! {
            let mut next_token = None;
            loop {
                let page = match session.query_page(&query, next_token.take()).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                };
                let token = page.next_token.clone();
                for row in page.into_rows() {
                    yield Ok(row);
                }
                match token {
                    Some(token) => next_token = Some(token),
                    None => break,
                }
            }
        };

        Ok(Box::pin(s))
    }

    /// Write records to a table in batches of [`MAX_RECORDS_PER_WRITE`].
    ///
    /// Batches are sent in input order, one at a time. The result of the
    /// last batch is returned. A failing batch stops the write: earlier
    /// batches stay written and later ones are never sent. An empty slice
    /// is still sent as one empty batch, so the service decides whether it
    /// is acceptable.
    pub async fn write(&mut self, table: &str, records: &[Record]) -> Result<WriteResult> {
        self.ensure_connected().await?;
        let session = self.active()?;
        let database = &self.config.database;

        let chunks: Vec<&[Record]> = if records.is_empty() {
            vec![records]
        } else {
            records.chunks(MAX_RECORDS_PER_WRITE).collect()
        };

        let mut result = WriteResult::default();
        for (i, chunk) in chunks.into_iter().enumerate() {
            debug!(
                database = %database,
                table = %table,
                chunk = i,
                records = chunk.len(),
                "writing records"
            );
            result = session
                .write_records(database, table, to_write_records(chunk))
                .await?;
        }
        Ok(result)
    }

    /// Latest row of a table, optionally filtered by a raw WHERE fragment.
    pub async fn last(&mut self, table: &str, filter: Option<&str>) -> Result<Option<Row>> {
        let query = self.single_row_query(table, filter, "DESC");
        Ok(self.query(&query).await?.into_iter().next())
    }

    /// Earliest row of a table, optionally filtered by a raw WHERE fragment.
    pub async fn first(&mut self, table: &str, filter: Option<&str>) -> Result<Option<Row>> {
        let query = self.single_row_query(table, filter, "ASC");
        Ok(self.query(&query).await?.into_iter().next())
    }

    /// Build the one-row query used by `last` and `first`.
    ///
    /// The filter is spliced in unescaped; an empty filter means none.
    pub fn single_row_query(&self, table: &str, filter: Option<&str>, order: &str) -> String {
        let filter = match filter {
            Some(f) if !f.is_empty() => format!(" WHERE {}", f),
            _ => String::new(),
        };
        format!(
            "SELECT * FROM \"{}\".\"{}\"{} ORDER BY time {} LIMIT 1",
            self.config.database, table, filter, order
        )
    }

    /// Create a database and return its description.
    pub async fn create_database(&mut self, name: &str) -> Result<DatabaseDescription> {
        self.ensure_connected().await?;
        self.active()?.create_database(name).await
    }

    /// Delete a database.
    pub async fn delete_database(&mut self, name: &str) -> Result<()> {
        self.ensure_connected().await?;
        self.active()?.delete_database(name).await
    }

    /// Describe a database; a missing one is a service error.
    pub async fn describe_database(&mut self, name: &str) -> Result<DatabaseDescription> {
        self.ensure_connected().await?;
        self.active()?.describe_database(name).await
    }

    /// Check for a database by describing it.
    ///
    /// Any failure, including connection and permission errors, reads as
    /// `false`: absence and transient errors are not distinguished.
    pub async fn exists_database(&mut self, name: &str) -> bool {
        match self.describe_database(name).await {
            Ok(_) => true,
            Err(e) => {
                debug!(database = %name, error = %e, "database existence check failed");
                false
            }
        }
    }

    /// Create a table in the connector's database.
    pub async fn create_table(
        &mut self,
        table: &str,
        options: TableOptions,
    ) -> Result<TableDescription> {
        self.ensure_connected().await?;
        self.active()?
            .create_table(&self.config.database, table, &options)
            .await
    }

    /// Describe a table in the connector's database.
    pub async fn describe_table(&mut self, table: &str) -> Result<TableDescription> {
        self.ensure_connected().await?;
        self.active()?
            .describe_table(&self.config.database, table)
            .await
    }

    /// Check for a table by describing it.
    ///
    /// Any failure reads as `false`, the same way as [`Connector::exists_database`].
    pub async fn exists_table(&mut self, table: &str) -> bool {
        match self.describe_table(table).await {
            Ok(_) => true,
            Err(e) => {
                debug!(table = %table, error = %e, "table existence check failed");
                false
            }
        }
    }

    /// Delete a table from the connector's database.
    pub async fn delete_table(&mut self, table: &str) -> Result<()> {
        self.ensure_connected().await?;
        self.active()?
            .delete_table(&self.config.database, table)
            .await
    }
}

impl<F: SessionFactory> std::fmt::Debug for Connector<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("config", &self.config)
            .field("connected", &self.state.is_connected())
            .finish()
    }
}
