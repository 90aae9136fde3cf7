//! Core types shared by records, query results and administrative calls.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::Error;

/// Measure value types understood by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasureValueType {
    /// 64-bit floating point.
    Double,
    /// Signed 64-bit integer.
    Bigint,
    /// UTF-8 string.
    Varchar,
    /// Boolean value.
    Boolean,
    /// Several named measures in one record.
    Multi,
}

impl MeasureValueType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureValueType::Double => "DOUBLE",
            MeasureValueType::Bigint => "BIGINT",
            MeasureValueType::Varchar => "VARCHAR",
            MeasureValueType::Boolean => "BOOLEAN",
            MeasureValueType::Multi => "MULTI",
        }
    }
}

impl FromStr for MeasureValueType {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "DOUBLE" => Ok(Self::Double),
            "BIGINT" => Ok(Self::Bigint),
            "VARCHAR" => Ok(Self::Varchar),
            "BOOLEAN" => Ok(Self::Boolean),
            "MULTI" => Ok(Self::Multi),
            _ => Err(Error::InvalidValue(format!("unknown measure type '{}'", input))),
        }
    }
}

impl std::fmt::Display for MeasureValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of a record's `Time` field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeUnit {
    /// Seconds since the epoch.
    #[default]
    Seconds,
    /// Milliseconds since the epoch.
    Milliseconds,
    /// Microseconds since the epoch.
    Microseconds,
    /// Nanoseconds since the epoch.
    Nanoseconds,
}

impl TimeUnit {
    /// Wire name of the unit.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "SECONDS",
            TimeUnit::Milliseconds => "MILLISECONDS",
            TimeUnit::Microseconds => "MICROSECONDS",
            TimeUnit::Nanoseconds => "NANOSECONDS",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "SECONDS" => Ok(Self::Seconds),
            "MILLISECONDS" => Ok(Self::Milliseconds),
            "MICROSECONDS" => Ok(Self::Microseconds),
            "NANOSECONDS" => Ok(Self::Nanoseconds),
            _ => Err(Error::InvalidValue(format!("unknown time unit '{}'", input))),
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named tag attached to a measurement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    /// Dimension name.
    pub name: String,
    /// Dimension value.
    pub value: String,
}

impl Dimension {
    /// Create a new dimension.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Format of the `time` column returned by queries.
const QUERY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A single row of a query result, keyed by column name in column order.
///
/// Null scalars are stored as `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Option<String>)>,
}

impl Row {
    /// Create a new empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value. A repeated column name replaces the earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((name, value)),
        }
    }

    /// Get the raw scalar of a column. `None` when absent or null.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Returns true if the row has a column with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Get value as f64.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    /// Get value as i64.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    /// Get value as bool.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    /// Get the timestamp (`time` column).
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.get("time")
            .and_then(|v| NaiveDateTime::parse_from_str(v, QUERY_TIME_FORMAT).ok())
            .map(|t| t.and_utc())
    }

    /// Column names in result order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate over `(column, value)` pairs in result order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One page of a query response: column names plus positional row data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryPage {
    /// Column names, in result order.
    pub columns: Vec<String>,
    /// Row scalars, positionally aligned with `columns`.
    pub rows: Vec<Vec<Option<String>>>,
    /// Token for the next page, if any.
    pub next_token: Option<String>,
}

impl QueryPage {
    /// Map positional rows to named rows using the column metadata.
    ///
    /// Data beyond the last known column is dropped; missing data maps to null.
    pub fn into_rows(self) -> Vec<Row> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|data| {
                let mut row = Row::new();
                let mut data = data.into_iter();
                for name in &columns {
                    row.insert(name.clone(), data.next().flatten());
                }
                row
            })
            .collect()
    }
}

/// Ingestion counts reported by a write call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Total records ingested.
    pub records_ingested: i32,
    /// Records ingested into the memory store.
    pub memory_store: i32,
    /// Records ingested into the magnetic store.
    pub magnetic_store: i32,
}

/// Retention of a table's memory and magnetic stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Retention {
    /// Memory store retention, in hours.
    pub memory_hours: i64,
    /// Magnetic store retention, in days.
    pub magnetic_days: i64,
}

/// Description of a database.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatabaseDescription {
    pub name: String,
    pub arn: Option<String>,
    pub table_count: i64,
    pub kms_key_id: Option<String>,
}

/// Description of a table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableDescription {
    pub name: String,
    pub database_name: String,
    pub arn: Option<String>,
    /// Service status string (`ACTIVE`, `DELETING`, `RESTORING`).
    pub status: Option<String>,
    pub retention: Option<Retention>,
    pub magnetic_store_writes: bool,
}
