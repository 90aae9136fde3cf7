//! Sessions against the service.
//!
//! A [`SessionFactory`] builds a [`Session`] from a [`ConnectorConfig`]; the
//! connector calls the factory at most once per connection and then routes
//! every query, write and administrative call through the session.
//! [`AwsSessionFactory`] is the production implementation over the AWS SDK.

use std::future::Future;

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_timestreamquery as tsq;
use aws_sdk_timestreamwrite as tsw;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::{ConnectorConfig, TableOptions};
use crate::error::{Error, Result};
use crate::record::WriteRecord;
use crate::types::{DatabaseDescription, QueryPage, Retention, TableDescription, WriteResult};

/// Builds sessions for a connector.
pub trait SessionFactory {
    /// Session type produced by this factory.
    type Session: Session;

    /// Establish a session for the given configuration.
    fn connect(&self, config: &ConnectorConfig) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// The service calls a connector needs. Each maps one-to-one onto an API call.
pub trait Session: Send + Sync {
    /// Run a query and return one page of results.
    fn query_page(
        &self,
        query: &str,
        next_token: Option<String>,
    ) -> impl Future<Output = Result<QueryPage>> + Send;

    /// Write one batch of records.
    fn write_records(
        &self,
        database: &str,
        table: &str,
        records: Vec<WriteRecord>,
    ) -> impl Future<Output = Result<WriteResult>> + Send;

    fn create_database(&self, name: &str) -> impl Future<Output = Result<DatabaseDescription>> + Send;

    fn delete_database(&self, name: &str) -> impl Future<Output = Result<()>> + Send;

    fn describe_database(&self, name: &str) -> impl Future<Output = Result<DatabaseDescription>> + Send;

    fn create_table(
        &self,
        database: &str,
        table: &str,
        options: &TableOptions,
    ) -> impl Future<Output = Result<TableDescription>> + Send;

    fn describe_table(
        &self,
        database: &str,
        table: &str,
    ) -> impl Future<Output = Result<TableDescription>> + Send;

    fn delete_table(&self, database: &str, table: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Creates sessions backed by the AWS SDK clients.
///
/// Unless `endpoint_url` is set, `connect` turns on endpoint discovery and
/// spawns the SDK's two endpoint refresh tasks on the current tokio runtime.
/// They live as long as the returned [`AwsSession`] and are aborted when it
/// drops. No other task is spawned.
#[derive(Clone, Copy, Debug, Default)]
pub struct AwsSessionFactory;

impl SessionFactory for AwsSessionFactory {
    type Session = AwsSession;

    async fn connect(&self, config: &ConnectorConfig) -> Result<AwsSession> {
        config.validate_version()?;

        let credentials = Credentials::new(
            config.user.clone(),
            config.password.clone(),
            None,
            None,
            "timestream-connector",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let write = tsw::Client::new(&sdk_config);
        let query = tsq::Client::new(&sdk_config);

        // The service resolves cell endpoints per account; a custom endpoint
        // is used as-is.
        if config.endpoint_url.is_some() {
            return Ok(AwsSession {
                write,
                query,
                reloaders: Vec::new(),
            });
        }

        let (write, write_reload) = write
            .with_endpoint_discovery_enabled()
            .await
            .map_err(|e| Error::service("DescribeEndpoints", e))?;
        let (query, query_reload) = query
            .with_endpoint_discovery_enabled()
            .await
            .map_err(|e| Error::service("DescribeEndpoints", e))?;

        let reloaders = vec![
            tokio::spawn(write_reload.reload_task()),
            tokio::spawn(query_reload.reload_task()),
        ];

        debug!(region = %config.region, "endpoint discovery enabled");
        Ok(AwsSession {
            write,
            query,
            reloaders,
        })
    }
}

/// Session holding the write and query clients.
///
/// Dropping the session stops the SDK's endpoint refresh tasks.
#[derive(Debug)]
pub struct AwsSession {
    write: tsw::Client,
    query: tsq::Client,
    reloaders: Vec<JoinHandle<()>>,
}

impl AwsSession {
    /// The underlying write client.
    pub fn write_client(&self) -> &tsw::Client {
        &self.write
    }

    /// The underlying query client.
    pub fn query_client(&self) -> &tsq::Client {
        &self.query
    }
}

impl Drop for AwsSession {
    fn drop(&mut self) {
        for handle in &self.reloaders {
            handle.abort();
        }
    }
}

impl Session for AwsSession {
    async fn query_page(&self, query: &str, next_token: Option<String>) -> Result<QueryPage> {
        let output = self
            .query
            .query()
            .query_string(query)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| Error::service("Query", e))?;

        Ok(to_query_page(
            output.column_info(),
            output.rows(),
            output.next_token(),
        ))
    }

    async fn write_records(
        &self,
        database: &str,
        table: &str,
        records: Vec<WriteRecord>,
    ) -> Result<WriteResult> {
        let records = records
            .iter()
            .map(to_sdk_record)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::service("WriteRecords", e))?;

        let output = self
            .write
            .write_records()
            .database_name(database)
            .table_name(table)
            .set_records(Some(records))
            .send()
            .await
            .map_err(|e| Error::service("WriteRecords", e))?;

        Ok(output
            .records_ingested()
            .map(|r| WriteResult {
                records_ingested: r.total(),
                memory_store: r.memory_store(),
                magnetic_store: r.magnetic_store(),
            })
            .unwrap_or_default())
    }

    async fn create_database(&self, name: &str) -> Result<DatabaseDescription> {
        let output = self
            .write
            .create_database()
            .database_name(name)
            .send()
            .await
            .map_err(|e| Error::service("CreateDatabase", e))?;
        Ok(describe_db(name, output.database()))
    }

    async fn delete_database(&self, name: &str) -> Result<()> {
        self.write
            .delete_database()
            .database_name(name)
            .send()
            .await
            .map_err(|e| Error::service("DeleteDatabase", e))?;
        Ok(())
    }

    async fn describe_database(&self, name: &str) -> Result<DatabaseDescription> {
        let output = self
            .write
            .describe_database()
            .database_name(name)
            .send()
            .await
            .map_err(|e| Error::service("DescribeDatabase", e))?;
        Ok(describe_db(name, output.database()))
    }

    async fn create_table(
        &self,
        database: &str,
        table: &str,
        options: &TableOptions,
    ) -> Result<TableDescription> {
        let (magnetic_writes, retention) =
            table_properties(options).map_err(|e| Error::service("CreateTable", e))?;

        let output = self
            .write
            .create_table()
            .database_name(database)
            .table_name(table)
            .magnetic_store_write_properties(magnetic_writes)
            .retention_properties(retention)
            .send()
            .await
            .map_err(|e| Error::service("CreateTable", e))?;
        Ok(describe_tbl(database, table, output.table()))
    }

    async fn describe_table(&self, database: &str, table: &str) -> Result<TableDescription> {
        let output = self
            .write
            .describe_table()
            .database_name(database)
            .table_name(table)
            .send()
            .await
            .map_err(|e| Error::service("DescribeTable", e))?;
        Ok(describe_tbl(database, table, output.table()))
    }

    async fn delete_table(&self, database: &str, table: &str) -> Result<()> {
        self.write
            .delete_table()
            .database_name(database)
            .table_name(table)
            .send()
            .await
            .map_err(|e| Error::service("DeleteTable", e))?;
        Ok(())
    }
}

/// Map one page of query output onto column names and scalar cells.
///
/// Unnamed columns get an empty name.
fn to_query_page(
    columns: &[tsq::types::ColumnInfo],
    rows: &[tsq::types::Row],
    next_token: Option<&str>,
) -> QueryPage {
    QueryPage {
        columns: columns
            .iter()
            .map(|c| c.name().unwrap_or_default().to_string())
            .collect(),
        rows: rows
            .iter()
            .map(|row| row.data().iter().map(scalar).collect())
            .collect(),
        next_token: next_token.map(str::to_string),
    }
}

/// Scalar of a datum; explicit nulls and non-scalar data map to `None`.
fn scalar(datum: &tsq::types::Datum) -> Option<String> {
    if datum.null_value() == Some(true) {
        return None;
    }
    datum.scalar_value().map(str::to_string)
}

fn to_sdk_record(
    record: &WriteRecord,
) -> std::result::Result<tsw::types::Record, tsw::error::BuildError> {
    let dimensions = record
        .dimensions
        .iter()
        .map(|d| {
            tsw::types::Dimension::builder()
                .name(&d.name)
                .value(&d.value)
                .build()
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let measure_values = match &record.measure_values {
        Some(values) => Some(
            values
                .iter()
                .map(|m| {
                    tsw::types::MeasureValue::builder()
                        .name(&m.name)
                        .value(&m.value)
                        .r#type(tsw::types::MeasureValueType::from(m.value_type.as_str()))
                        .build()
                })
                .collect::<std::result::Result<Vec<_>, _>>()?,
        ),
        None => None,
    };

    Ok(tsw::types::Record::builder()
        .set_dimensions(Some(dimensions))
        .measure_name(&record.measure_name)
        .set_measure_value(record.measure_value.clone())
        .set_measure_value_type(
            record
                .measure_value_type
                .map(|t| tsw::types::MeasureValueType::from(t.as_str())),
        )
        .set_measure_values(measure_values)
        .time(&record.time)
        .time_unit(tsw::types::TimeUnit::from(record.time_unit.as_str()))
        .version(record.version)
        .build())
}

fn table_properties(
    options: &TableOptions,
) -> std::result::Result<
    (
        tsw::types::MagneticStoreWriteProperties,
        tsw::types::RetentionProperties,
    ),
    tsw::error::BuildError,
> {
    let magnetic_writes = tsw::types::MagneticStoreWriteProperties::builder()
        .enable_magnetic_store_writes(options.enable_magnetic_store_writes)
        .build()?;
    let retention = tsw::types::RetentionProperties::builder()
        .memory_store_retention_period_in_hours(options.memory_retention_hours)
        .magnetic_store_retention_period_in_days(options.magnetic_retention_days)
        .build()?;
    Ok((magnetic_writes, retention))
}

fn describe_db(name: &str, db: Option<&tsw::types::Database>) -> DatabaseDescription {
    match db {
        Some(db) => DatabaseDescription {
            name: db.database_name().unwrap_or(name).to_string(),
            arn: db.arn().map(str::to_string),
            table_count: db.table_count(),
            kms_key_id: db.kms_key_id().map(str::to_string),
        },
        None => DatabaseDescription {
            name: name.to_string(),
            ..Default::default()
        },
    }
}

fn describe_tbl(database: &str, table: &str, tbl: Option<&tsw::types::Table>) -> TableDescription {
    let Some(tbl) = tbl else {
        return TableDescription {
            name: table.to_string(),
            database_name: database.to_string(),
            ..Default::default()
        };
    };

    TableDescription {
        name: tbl.table_name().unwrap_or(table).to_string(),
        database_name: tbl.database_name().unwrap_or(database).to_string(),
        arn: tbl.arn().map(str::to_string),
        status: tbl.table_status().map(|s| s.as_str().to_string()),
        retention: tbl.retention_properties().map(|r| Retention {
            memory_hours: r.memory_store_retention_period_in_hours(),
            magnetic_days: r.magnetic_store_retention_period_in_days(),
        }),
        magnetic_store_writes: tbl
            .magnetic_store_write_properties()
            .map(|p| p.enable_magnetic_store_writes())
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::types::TimeUnit;
    use crate::value::MeasureValue;
    use crate::MultiMeasureInput;

    #[test]
    fn test_single_record_converts_to_sdk_shape() {
        let wire = Record::single("temp", "21.5", 10)
            .with_dimension("sensor", "a")
            .with_time_unit(TimeUnit::Milliseconds)
            .to_write_record_with_version(4);

        let sdk = to_sdk_record(&wire).unwrap();
        assert_eq!(sdk.measure_name(), Some("temp"));
        assert_eq!(sdk.measure_value(), Some("21.5"));
        assert!(sdk.measure_value_type().is_none());
        assert!(sdk.measure_values().is_empty());
        assert_eq!(sdk.time(), Some("10"));
        assert_eq!(sdk.time_unit(), Some(&tsw::types::TimeUnit::Milliseconds));
        assert_eq!(sdk.version(), Some(4));
        assert_eq!(sdk.dimensions()[0].name(), "sensor");
        assert_eq!(sdk.dimensions()[0].value(), "a");
    }

    #[test]
    fn test_multi_record_converts_to_sdk_shape() {
        let input = MultiMeasureInput::new()
            .time(1)
            .measure("x", MeasureValue::Long(1))
            .measure("z", "ok");
        let wire = Record::multi("0", input).to_write_record_with_version(1);

        let sdk = to_sdk_record(&wire).unwrap();
        assert_eq!(
            sdk.measure_value_type(),
            Some(&tsw::types::MeasureValueType::Multi)
        );
        let values = sdk.measure_values();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].r#type(), &tsw::types::MeasureValueType::Double);
        assert_eq!(values[1].r#type(), &tsw::types::MeasureValueType::Varchar);
    }

    #[test]
    fn test_scalar_datum() {
        let value = tsq::types::Datum::builder().scalar_value("21.5").build();
        assert_eq!(scalar(&value), Some("21.5".to_string()));

        let null = tsq::types::Datum::builder().null_value(true).build();
        assert_eq!(scalar(&null), None);

        // Null flag wins over a stray scalar.
        let flagged = tsq::types::Datum::builder()
            .scalar_value("x")
            .null_value(true)
            .build();
        assert_eq!(scalar(&flagged), None);

        let empty = tsq::types::Datum::builder().build();
        assert_eq!(scalar(&empty), None);
    }

    #[test]
    fn test_query_output_maps_to_page() {
        let columns = vec![
            tsq::types::ColumnInfo::builder().name("sensor").build(),
            tsq::types::ColumnInfo::builder().name("measure_value::double").build(),
            tsq::types::ColumnInfo::builder().build(),
        ];
        let rows = vec![
            tsq::types::Row::builder()
                .data(tsq::types::Datum::builder().scalar_value("a").build())
                .data(tsq::types::Datum::builder().null_value(true).build())
                .data(tsq::types::Datum::builder().scalar_value("x").build())
                .build()
                .unwrap(),
        ];

        let page = to_query_page(&columns, &rows, Some("tok"));
        assert_eq!(page.columns, vec!["sensor", "measure_value::double", ""]);
        assert_eq!(page.next_token.as_deref(), Some("tok"));

        let rows = page.into_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("sensor"), Some("a"));
        assert_eq!(rows[0].get("measure_value::double"), None);

        let last = to_query_page(&columns, &[], None);
        assert!(last.rows.is_empty());
        assert!(last.next_token.is_none());
    }

    #[test]
    fn test_default_table_options_reach_sdk_properties() {
        let (magnetic, retention) = table_properties(&TableOptions::default()).unwrap();
        assert!(magnetic.enable_magnetic_store_writes());
        assert_eq!(retention.memory_store_retention_period_in_hours(), 8766);
        assert_eq!(retention.magnetic_store_retention_period_in_days(), 73000);

        let options = TableOptions {
            memory_retention_hours: 12,
            magnetic_retention_days: 30,
            enable_magnetic_store_writes: false,
        };
        let (magnetic, retention) = table_properties(&options).unwrap();
        assert!(!magnetic.enable_magnetic_store_writes());
        assert_eq!(retention.memory_store_retention_period_in_hours(), 12);
        assert_eq!(retention.magnetic_store_retention_period_in_days(), 30);
    }

    #[test]
    fn test_describe_tbl_falls_back_to_request_names() {
        let missing = describe_tbl("sensors", "readings", None);
        assert_eq!(missing.name, "readings");
        assert_eq!(missing.database_name, "sensors");
        assert!(missing.arn.is_none());
        assert!(missing.retention.is_none());
        assert!(!missing.magnetic_store_writes);

        let partial = tsw::types::Table::builder().arn("arn:table").build();
        let desc = describe_tbl("sensors", "readings", Some(&partial));
        assert_eq!(desc.name, "readings");
        assert_eq!(desc.database_name, "sensors");
        assert_eq!(desc.arn.as_deref(), Some("arn:table"));
        assert!(desc.status.is_none());
        assert!(desc.retention.is_none());
        assert!(!desc.magnetic_store_writes);
    }

    #[test]
    fn test_describe_tbl_reads_service_fields() {
        let (magnetic, retention) = table_properties(&TableOptions::default()).unwrap();
        let table = tsw::types::Table::builder()
            .table_name("other")
            .database_name("db2")
            .table_status(tsw::types::TableStatus::Active)
            .retention_properties(retention)
            .magnetic_store_write_properties(magnetic)
            .build();

        let desc = describe_tbl("sensors", "readings", Some(&table));
        assert_eq!(desc.name, "other");
        assert_eq!(desc.database_name, "db2");
        assert_eq!(desc.status.as_deref(), Some("ACTIVE"));
        assert_eq!(
            desc.retention,
            Some(Retention {
                memory_hours: 8766,
                magnetic_days: 73000,
            })
        );
        assert!(desc.magnetic_store_writes);
    }

    #[test]
    fn test_describe_db_falls_back_to_request_name() {
        let missing = describe_db("sensors", None);
        assert_eq!(missing.name, "sensors");
        assert_eq!(missing.table_count, 0);

        let partial = tsw::types::Database::builder().arn("arn:db").build();
        let desc = describe_db("sensors", Some(&partial));
        assert_eq!(desc.name, "sensors");
        assert_eq!(desc.arn.as_deref(), Some("arn:db"));
    }
}
