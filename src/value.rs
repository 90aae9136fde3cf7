//! Measure values accepted by multi-measure records.

use ordered_float::OrderedFloat;

use crate::error::Error;
use crate::types::MeasureValueType;

/// A single named measure's value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MeasureValue {
    /// Boolean value.
    Bool(bool),

    /// 64-bit floating point value.
    Double(OrderedFloat<f64>),

    /// Signed 64-bit integer.
    Long(i64),

    /// String value.
    String(String),
}

impl MeasureValue {
    /// Returns the value as a string reference if it is a `String` variant.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            MeasureValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a f64 if it is a `Double` variant.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            MeasureValue::Double(f) => Some(f.into_inner()),
            _ => None,
        }
    }

    /// Returns the value as a bool if it is a `Bool` variant.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MeasureValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an i64 if it is a `Long` variant.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            MeasureValue::Long(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns true for numbers and for strings that read as a decimal number.
    pub fn is_numeric(&self) -> bool {
        match self {
            MeasureValue::Double(_) | MeasureValue::Long(_) => true,
            MeasureValue::String(s) => is_numeric_str(s),
            MeasureValue::Bool(_) => false,
        }
    }

    /// Service type this value is written as.
    ///
    /// Rules are checked in order and the first match wins: boolean, numeric
    /// (as DOUBLE), integer (as BIGINT), string. Integers are numeric, so they
    /// are written as DOUBLE and the BIGINT rule never fires. Downstream
    /// tables rely on DOUBLE-only typing for numbers.
    pub fn inferred_type(&self) -> MeasureValueType {
        if let MeasureValue::Bool(_) = self {
            return MeasureValueType::Boolean;
        }
        if self.is_numeric() {
            return MeasureValueType::Double;
        }
        if let MeasureValue::Long(_) = self {
            return MeasureValueType::Bigint;
        }
        MeasureValueType::Varchar
    }
}

/// Decimal or exponent notation with optional surrounding whitespace.
/// Rejects `inf`, `NaN` and hex literals, which `f64::from_str` would accept
/// in part.
fn is_numeric_str(s: &str) -> bool {
    let t = s.trim();
    !t.is_empty()
        && t.bytes().any(|b| b.is_ascii_digit())
        && t.bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        && t.parse::<f64>().is_ok()
}

impl std::fmt::Display for MeasureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasureValue::Bool(b) => write!(f, "{}", b),
            MeasureValue::Double(d) => write!(f, "{}", d),
            MeasureValue::Long(i) => write!(f, "{}", i),
            MeasureValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for MeasureValue {
    fn from(v: bool) -> Self {
        MeasureValue::Bool(v)
    }
}

impl From<f64> for MeasureValue {
    fn from(v: f64) -> Self {
        MeasureValue::Double(OrderedFloat(v))
    }
}

impl From<i64> for MeasureValue {
    fn from(v: i64) -> Self {
        MeasureValue::Long(v)
    }
}

impl From<i32> for MeasureValue {
    fn from(v: i32) -> Self {
        MeasureValue::Long(v.into())
    }
}

impl From<String> for MeasureValue {
    fn from(v: String) -> Self {
        MeasureValue::String(v)
    }
}

impl From<&str> for MeasureValue {
    fn from(v: &str) -> Self {
        MeasureValue::String(v.to_string())
    }
}

impl TryFrom<serde_json::Value> for MeasureValue {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Bool(b) => Ok(MeasureValue::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(MeasureValue::Long(i)),
                None => n
                    .as_f64()
                    .map(MeasureValue::from)
                    .ok_or_else(|| Error::InvalidValue(n.to_string())),
            },
            serde_json::Value::String(s) => Ok(MeasureValue::String(s)),
            other => Err(Error::InvalidValue(other.to_string())),
        }
    }
}
