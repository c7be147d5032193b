//! Record types shared by the store and its callers
//!
//! A [`DecodedRecord`] is produced by an external MAVLink decoder. The store
//! only looks at the four identifying fields; the payload is kept as an
//! opaque map of named [`FieldValue`]s.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// MAVLink system id
pub type SysId = u8;
/// MAVLink component id
pub type CompId = u8;
/// MAVLink message id (24 bits on MAVLink 2)
pub type MsgId = u32;
/// Milliseconds timestamp
pub type TimestampMs = u64;

/// Named fields of a decoded message
pub type Payload = BTreeMap<String, FieldValue>;

/// Value of one payload field.
///
/// Covers the scalar and array kinds a MAVLink decoder produces. Variant
/// order matters for untagged deserialization: integers are tried before
/// floats, integer arrays before float arrays.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
}

impl FieldValue {
    /// Numeric view of a scalar field
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::UInt(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Text view of a string field
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::UInt(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{:?}", v),
            FieldValue::IntArray(v) => write!(f, "{:?}", v),
            FieldValue::FloatArray(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::UInt(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<Vec<i64>> for FieldValue {
    fn from(v: Vec<i64>) -> Self {
        FieldValue::IntArray(v)
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(v: Vec<f64>) -> Self {
        FieldValue::FloatArray(v)
    }
}

/// One decoded message as handed over by the decoder
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DecodedRecord {
    /// Receive time in milliseconds
    pub t: TimestampMs,
    pub sysid: SysId,
    pub compid: CompId,
    pub msg_id: MsgId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub payload: Payload,
}

impl DecodedRecord {
    /// Create a record with an empty payload
    pub fn new(t: TimestampMs, sysid: SysId, compid: CompId, msg_id: MsgId) -> Self {
        Self {
            t,
            sysid,
            compid,
            msg_id,
            payload: Payload::new(),
        }
    }

    /// Add a payload field (builder style)
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.payload.insert(name.into(), value.into());
        self
    }
}

/// A timestamped payload, as kept in history.
///
/// The payload is shared between the history and the last value; it is never
/// mutated after insertion, so cloning a `Sample` yields a stable snapshot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    pub t: TimestampMs,
    pub payload: Arc<Payload>,
}

/// Last value of a known message stream.
///
/// Both fields are empty when the stream has not been observed since the
/// last stats reset.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawValue {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub t: Option<TimestampMs>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub payload: Option<Arc<Payload>>,
}
