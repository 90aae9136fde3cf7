//! Record building and serialization into the write-record wire shape.
//!
//! A [`Record`] carries either one named value (single-measure) or a set of
//! named, typed measures (multi-measure). [`Record::to_write_record`] turns it
//! into a [`WriteRecord`], the shape `WriteRecords` expects:
//!
//! ```ignore
//! use timestream_connector::{MultiMeasureInput, Record};
//!
//! let input = MultiMeasureInput::new()
//!     .time(1_700_000_000)
//!     .dimension("sensor", "a")
//!     .measure("x", 1)
//!     .measure("ok", true);
//!
//! let wire = Record::multi("0", input).to_write_record();
//! assert_eq!(wire.measure_name, "0-sensor-a");
//! ```

use chrono::Utc;
use serde::Serialize;

use crate::error::Result;
use crate::types::{Dimension, MeasureValueType, TimeUnit};
use crate::value::MeasureValue;

/// Separator used when synthesizing a measure name from dimensions.
const KEY_SEPARATOR: &str = "-";

/// Input for a single-measure record.
#[derive(Clone, Debug, PartialEq)]
pub struct SingleMeasureInput {
    pub name: String,
    pub value: String,
    /// Timestamp in the record's time unit.
    pub time: i64,
    pub dimensions: Vec<Dimension>,
}

impl SingleMeasureInput {
    /// Create an input with no dimensions.
    pub fn new(name: impl Into<String>, value: impl Into<String>, time: i64) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            time,
            dimensions: Vec::new(),
        }
    }

    /// Append a dimension.
    pub fn dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.push(Dimension::new(name, value));
        self
    }
}

/// Input for a multi-measure record.
///
/// The timestamp override and dimensions live in their own fields; every
/// entry of `measures` is written as a named measure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiMeasureInput {
    /// Explicit measure name. When absent a name is synthesized from the
    /// record key and its dimensions.
    pub name: Option<String>,
    /// Timestamp override. Defaults to the current time in seconds.
    pub time: Option<i64>,
    pub dimensions: Vec<Dimension>,
    pub measures: Vec<(String, MeasureValue)>,
}

impl MultiMeasureInput {
/// Create an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit measure name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override the timestamp.
    pub fn time(mut self, time: i64) -> Self {
        self.time = Some(time);
        self
    }

    /// Append a dimension. Duplicates collapse when the record is built.
    pub fn dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.push(Dimension::new(name, value));
        self
    }

    /// Add a measure. A repeated name replaces the earlier value in place.
    pub fn measure(mut self, name: impl Into<String>, value: impl Into<MeasureValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.measures.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.measures.push((name, value)),
        }
        self
    }

    /// Add every entry of a JSON object as a measure, in map iteration order.
    pub fn measures_from_json(
        mut self,
        object: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self> {
        for (name, value) in object {
            self = self.measure(name, MeasureValue::try_from(value)?);
        }
        Ok(self)
    }
}

/// One input row for batch conversion; the variant selects the record mode.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordInput {
    Single(SingleMeasureInput),
    Multi(MultiMeasureInput),
}

/// Record payload: one value, or several named values.
#[derive(Clone, Debug, PartialEq)]
enum Measures {
    Single(String),
    Multi(Vec<(String, MeasureValue)>),
}

/// An observation ready to be serialized for writing.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    name: String,
    use_name: bool,
    dimensions: Vec<Dimension>,
    measures: Measures,
    time: String,
    time_unit: TimeUnit,
}

impl Record {
    /// Create a single-measure record. The name is kept as given.
    pub fn single(name: impl Into<String>, value: impl Into<String>, time: i64) -> Self {
        Self {
            name: name.into(),
            use_name: true,
            dimensions: Vec::new(),
            measures: Measures::Single(value.into()),
            time: time.to_string(),
            time_unit: TimeUnit::default(),
        }
    }

    /// Create a multi-measure record.
    ///
    /// `key` seeds the synthesized measure name used when `input.name` is
    /// absent; batch conversion passes the row position.
    pub fn multi(key: impl Into<String>, input: MultiMeasureInput) -> Self {
        let (name, use_name) = match input.name {
            Some(name) => (name.trim().to_string(), true),
            None => (key.into(), false),
        };
        let time = input.time.unwrap_or_else(|| Utc::now().timestamp());

        let mut record = Self {
            name,
            use_name,
            dimensions: Vec::new(),
            measures: Measures::Multi(input.measures),
            time: time.to_string(),
            time_unit: TimeUnit::default(),
        };
        for dim in input.dimensions {
            record.set_dimension(dim.name, dim.value);
        }
        record
    }

    /// Set a dimension. A repeated name replaces the earlier value in place.
    pub fn set_dimension(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.dimensions.iter_mut().find(|d| d.name == name) {
            Some(dim) => dim.value = value,
            None => self.dimensions.push(Dimension { name, value }),
        }
        self
    }

    /// Builder form of [`Record::set_dimension`].
    pub fn with_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_dimension(name, value);
        self
    }

    /// Set the unit of the timestamp.
    pub fn set_time_unit(&mut self, unit: TimeUnit) -> &mut Self {
        self.time_unit = unit;
        self
    }

    /// Builder form of [`Record::set_time_unit`].
    pub fn with_time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = unit;
        self
    }

    /// Dimensions in insertion order.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Timestamp as written.
    pub fn time(&self) -> &str {
        &self.time
    }

    /// Unit of the timestamp.
    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    /// Whether this is a multi-measure record.
    pub fn is_multi(&self) -> bool {
        matches!(self.measures, Measures::Multi(_))
    }

    /// Record key followed by every dimension name and value.
    fn identity_key(&self) -> String {
        let mut parts = Vec::with_capacity(1 + self.dimensions.len() * 2);
        parts.push(self.name.as_str());
        for dim in &self.dimensions {
            parts.push(dim.name.as_str());
            parts.push(dim.value.as_str());
        }
        parts.join(KEY_SEPARATOR)
    }

    /// Measure name as written.
    pub fn measure_name(&self) -> String {
        match (&self.measures, self.use_name) {
            (Measures::Multi(_), false) => self.identity_key(),
            _ => self.name.clone(),
        }
    }

    /// Serialize with the current time, in seconds, as the write version.
    pub fn to_write_record(&self) -> WriteRecord {
        self.to_write_record_with_version(Utc::now().timestamp())
    }

    /// Serialize with an explicit write version.
    pub fn to_write_record_with_version(&self, version: i64) -> WriteRecord {
        let mut out = WriteRecord {
            dimensions: self.dimensions.clone(),
            measure_name: self.measure_name(),
            measure_value: None,
            measure_value_type: None,
            measure_values: None,
            time: self.time.clone(),
            time_unit: self.time_unit,
            version,
        };

        match &self.measures {
            Measures::Single(value) => out.measure_value = Some(value.clone()),
            Measures::Multi(values) => {
                out.measure_value_type = Some(MeasureValueType::Multi);
                out.measure_values = Some(
                    values
                        .iter()
                        .map(|(name, value)| MeasureEntry {
                            name: name.clone(),
                            value_type: value.inferred_type(),
                            value: value.to_string(),
                        })
                        .collect(),
                );
            }
        }
        out
    }
}

/// Batch rows go through here; the measure name is trimmed.
impl From<SingleMeasureInput> for Record {
    fn from(input: SingleMeasureInput) -> Self {
        let mut record = Record::single(input.name.trim(), input.value, input.time);
        for dim in input.dimensions {
            record.set_dimension(dim.name, dim.value);
        }
        record
    }
}

/// Build records from input rows, preserving order.
///
/// Unnamed multi-measure rows use their position as the record key.
pub fn records_from_inputs(inputs: impl IntoIterator<Item = RecordInput>) -> Vec<Record> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| match input {
            RecordInput::Single(single) => Record::from(single),
            RecordInput::Multi(multi) => Record::multi(i.to_string(), multi),
        })
        .collect()
}

/// Serialize a batch of records with a shared write version.
pub fn to_write_records(records: &[Record]) -> Vec<WriteRecord> {
    let version = Utc::now().timestamp();
    records
        .iter()
        .map(|r| r.to_write_record_with_version(version))
        .collect()
}

/// Convert input rows straight into write records.
pub fn serialize_inputs(inputs: impl IntoIterator<Item = RecordInput>) -> Vec<WriteRecord> {
    to_write_records(&records_from_inputs(inputs))
}

/// A named, typed value inside a multi-measure write record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeasureEntry {
    pub name: String,
    #[serde(rename = "Type")]
    pub value_type: MeasureValueType,
    pub value: String,
}

/// Record in the shape accepted by `WriteRecords`.
///
/// Exactly one of `measure_value` or (`measure_value_type` = `MULTI`,
/// `measure_values`) is set.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteRecord {
    pub dimensions: Vec<Dimension>,
    pub measure_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure_value_type: Option<MeasureValueType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure_values: Option<Vec<MeasureEntry>>,
    pub time: String,
    pub time_unit: TimeUnit,
    /// Last-write-wins version.
    pub version: i64,
}

impl WriteRecord {
    /// Render the record as service-shaped JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Single-measure records
    // =========================================================================

    #[test]
    fn test_single_record_shape() {
        let wire = Record::single("temp", "21.5", 1_700_000_000).to_write_record_with_version(7);

        assert_eq!(wire.measure_name, "temp");
        assert_eq!(wire.measure_value.as_deref(), Some("21.5"));
        assert!(wire.measure_values.is_none());
        assert!(wire.measure_value_type.is_none());
        assert_eq!(wire.time, "1700000000");
        assert_eq!(wire.time_unit, TimeUnit::Seconds);
        assert_eq!(wire.version, 7);
        assert!(wire.dimensions.is_empty());
    }

    #[test]
    fn test_single_record_keeps_dimension_order() {
        let record = Record::single("temp", "1", 0)
            .with_dimension("site", "x")
            .with_dimension("sensor", "a")
            .with_dimension("site", "y");

        let wire = record.to_write_record();
        assert_eq!(wire.measure_name, "temp");
        assert_eq!(
            wire.dimensions,
            vec![Dimension::new("site", "y"), Dimension::new("sensor", "a")]
        );
    }

    #[test]
    fn test_single_name_trimmed_only_from_input() {
        let direct = Record::single("  temp ", "1", 0).to_write_record();
        assert_eq!(direct.measure_name, "  temp ");

        let input = SingleMeasureInput::new("  temp ", "1", 0).dimension("sensor", "a");
        let converted = Record::from(input).to_write_record();
        assert_eq!(converted.measure_name, "temp");
        assert_eq!(converted.dimensions, vec![Dimension::new("sensor", "a")]);
    }

    #[test]
    fn test_time_unit_is_carried() {
        let wire = Record::single("t", "1", 5)
            .with_time_unit(TimeUnit::Milliseconds)
            .to_write_record();
        assert_eq!(wire.time_unit, TimeUnit::Milliseconds);
    }

    #[test]
    fn test_version_is_current_time() {
        let before = Utc::now().timestamp();
        let wire = Record::single("t", "1", 5).to_write_record();
        let after = Utc::now().timestamp();
        assert!(wire.version >= before && wire.version <= after);
    }

    // =========================================================================
    // Multi-measure records
    // =========================================================================

    fn sample_multi() -> MultiMeasureInput {
        MultiMeasureInput::new()
            .time(1_700_000_000)
            .dimension("sensor", "a")
            .measure("x", 1)
            .measure("y", true)
            .measure("z", "ok")
    }

    #[test]
    fn test_multi_record_types() {
        let wire = Record::multi("0", sample_multi()).to_write_record_with_version(1);

        assert_eq!(wire.measure_value_type, Some(MeasureValueType::Multi));
        assert!(wire.measure_value.is_none());

        let values = wire.measure_values.unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(
            values[0],
            MeasureEntry {
                name: "x".into(),
                value_type: MeasureValueType::Double,
                value: "1".into()
            }
        );
        assert_eq!(values[1].value_type, MeasureValueType::Boolean);
        assert_eq!(values[1].value, "true");
        assert_eq!(values[2].value_type, MeasureValueType::Varchar);
        assert_eq!(values[2].value, "ok");

        assert_eq!(wire.time, "1700000000");
        assert_eq!(wire.dimensions, vec![Dimension::new("sensor", "a")]);
    }

    #[test]
    fn test_multi_record_synthesizes_name_from_dimensions() {
        let input = sample_multi().dimension("site", "north");
        let record = Record::multi("3", input);
        assert_eq!(record.measure_name(), "3-sensor-a-site-north");
    }

    #[test]
    fn test_multi_record_explicit_name_is_trimmed() {
        let record = Record::multi("3", sample_multi().name(" reading "));
        assert_eq!(record.measure_name(), "reading");
    }

    #[test]
    fn test_multi_record_defaults_time_to_now() {
        let before = Utc::now().timestamp();
        let record = Record::multi("0", MultiMeasureInput::new().measure("x", 1.5));
        let t: i64 = record.time().parse().unwrap();
        assert!(t >= before && t <= Utc::now().timestamp());
    }

    #[test]
    fn test_repeated_measure_replaces_value() {
        let input = MultiMeasureInput::new().measure("x", 1).measure("x", 2);
        assert_eq!(input.measures, vec![("x".to_string(), MeasureValue::Long(2))]);
    }

    #[test]
    fn test_measures_from_json() {
        let object = serde_json::json!({"x": 1, "y": true, "z": "ok"});
        let serde_json::Value::Object(map) = object else {
            unreachable!()
        };
        let input = MultiMeasureInput::new().measures_from_json(map).unwrap();
        assert_eq!(input.measures.len(), 3);

        let bad = serde_json::json!({"x": null});
        let serde_json::Value::Object(map) = bad else {
            unreachable!()
        };
        assert!(MultiMeasureInput::new().measures_from_json(map).is_err());
    }

    // =========================================================================
    // Wire JSON
    // =========================================================================

    #[test]
    fn test_wire_json_field_names() {
        let single = Record::single("temp", "21.5", 10)
            .with_dimension("sensor", "a")
            .to_write_record_with_version(3)
            .to_json()
            .unwrap();
        assert_eq!(
            single,
            serde_json::json!({
                "Dimensions": [{"Name": "sensor", "Value": "a"}],
                "MeasureName": "temp",
                "MeasureValue": "21.5",
                "Time": "10",
                "TimeUnit": "SECONDS",
                "Version": 3
            })
        );

        let multi = Record::multi("0", sample_multi().name("m"))
            .to_write_record_with_version(3)
            .to_json()
            .unwrap();
        assert_eq!(multi["MeasureValueType"], "MULTI");
        assert_eq!(multi["MeasureValues"][0]["Type"], "DOUBLE");
        assert!(multi.get("MeasureValue").is_none());
    }

    // =========================================================================
    // Batch conversion
    // =========================================================================

    #[test]
    fn test_batch_conversion_preserves_order_and_mode() {
        let inputs = vec![
            RecordInput::Single(SingleMeasureInput::new("temp", "1", 1).dimension("s", "a")),
            RecordInput::Multi(MultiMeasureInput::new().time(2).dimension("s", "b").measure("x", 1)),
            RecordInput::Single(SingleMeasureInput::new("temp", "3", 3)),
        ];

        let wire = serialize_inputs(inputs);
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[0].measure_value.as_deref(), Some("1"));
        assert_eq!(wire[0].dimensions, vec![Dimension::new("s", "a")]);
        assert_eq!(wire[1].measure_name, "1-s-b");
        assert_eq!(wire[1].measure_value_type, Some(MeasureValueType::Multi));
        assert_eq!(wire[2].time, "3");

        // One version for the whole batch.
        assert!(wire.iter().all(|w| w.version == wire[0].version));
    }
}
