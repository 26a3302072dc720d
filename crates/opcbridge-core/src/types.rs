// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types for opcbridge.
//!
//! This module provides the session-agnostic data types shared by the
//! command actor, the subscription manager, and the telemetry pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// =============================================================================
// Identifiers
// =============================================================================

/// A unique identifier for a tag within the session.
///
/// Tags address individual data points (sensors, setpoints, counters) on the
/// remote session resource. The bridge holds no local representation of a tag
/// beyond its identifier.
///
/// # Examples
///
/// ```
/// use opcbridge_core::types::TagId;
///
/// let id = TagId::new("Line1/Temperature");
/// assert_eq!(id.as_str(), "Line1/Temperature");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    /// Creates a new tag ID.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID and returns the inner string.
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TagId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TagId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TagId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Value Types
// =============================================================================

/// A dynamically typed value read from or written to the session.
///
/// # Examples
///
/// ```
/// use opcbridge_core::types::Value;
///
/// let temp = Value::Float64(25.5);
/// assert_eq!(temp.as_f64(), Some(25.5));
///
/// let status = Value::Bool(true);
/// assert_eq!(status.as_bool(), Some(true));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Boolean value
    Bool(bool),

    /// Signed 16-bit integer
    Int16(i16),

    /// Signed 32-bit integer
    Int32(i32),

    /// Signed 64-bit integer
    Int64(i64),

    /// Unsigned 16-bit integer
    UInt16(u16),

    /// Unsigned 32-bit integer
    UInt32(u32),

    /// Unsigned 64-bit integer
    UInt64(u64),

    /// 32-bit floating point
    Float32(f32),

    /// 64-bit floating point
    Float64(f64),

    /// UTF-8 string
    String(String),

    /// Array of values
    Array(Vec<Value>),

    /// Date and time with timezone
    DateTime(DateTime<Utc>),

    /// Null/undefined value
    Null,
}

impl Value {
    /// Returns the type name of this value.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::UInt16(_) => "uint16",
            Value::UInt32(_) => "uint32",
            Value::UInt64(_) => "uint64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::DateTime(_) => "datetime",
            Value::Null => "null",
        }
    }

    /// Returns `true` if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if this is a numeric value (integer or float).
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Int16(_)
                | Value::Int32(_)
                | Value::Int64(_)
                | Value::UInt16(_)
                | Value::UInt32(_)
                | Value::UInt64(_)
                | Value::Float32(_)
                | Value::Float64(_)
        )
    }

    /// Attempts to convert this value to a boolean.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to convert this value to an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(v) => Some(if *v { 1 } else { 0 }),
            Value::Int16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            Value::UInt16(v) => Some(*v as i64),
            Value::UInt32(v) => Some(*v as i64),
            Value::UInt64(v) => i64::try_from(*v).ok(),
            Value::Float32(v) => Some(*v as i64),
            Value::Float64(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Attempts to convert this value to an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Int16(v) => Some(*v as f64),
            Value::Int32(v) => Some(*v as f64),
            Value::Int64(v) => Some(*v as f64),
            Value::UInt16(v) => Some(*v as f64),
            Value::UInt32(v) => Some(*v as f64),
            Value::UInt64(v) => Some(*v as f64),
            Value::Float32(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to get this value as a string reference.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Attempts to get this value as an array reference.
    #[inline]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Converts this value to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Int16(v) => serde_json::json!(*v),
            Value::Int32(v) => serde_json::json!(*v),
            Value::Int64(v) => serde_json::json!(*v),
            Value::UInt16(v) => serde_json::json!(*v),
            Value::UInt32(v) => serde_json::json!(*v),
            Value::UInt64(v) => serde_json::json!(*v),
            Value::Float32(v) => serde_json::json!(*v),
            Value::Float64(v) => serde_json::json!(*v),
            Value::String(v) => serde_json::Value::String(v.clone()),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(|v| v.to_json()).collect())
            }
            Value::DateTime(dt) => serde_json::json!(dt.to_rfc3339()),
            Value::Null => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Array(v) => write!(f, "[{} elements]", v.len()),
            Value::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Null => write!(f, "null"),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

macro_rules! impl_from_for_value {
    ($variant:ident, $type:ty) => {
        impl From<$type> for Value {
            fn from(v: $type) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_from_for_value!(Bool, bool);
impl_from_for_value!(Int16, i16);
impl_from_for_value!(Int32, i32);
impl_from_for_value!(Int64, i64);
impl_from_for_value!(UInt16, u16);
impl_from_for_value!(UInt32, u32);
impl_from_for_value!(UInt64, u64);
impl_from_for_value!(Float32, f32);
impl_from_for_value!(Float64, f64);
impl_from_for_value!(String, String);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

// =============================================================================
// Data Quality
// =============================================================================

/// The quality status of a data value, following OPC quality concepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "status", content = "reason")]
pub enum DataQuality {
    /// The value is good and reliable.
    #[default]
    Good,

    /// The value is uncertain but may be usable.
    Uncertain(UncertainReason),

    /// The value is bad and should not be used.
    Bad(BadReason),
}

impl DataQuality {
    /// Returns `true` if the quality is good.
    #[inline]
    pub fn is_good(&self) -> bool {
        matches!(self, DataQuality::Good)
    }

    /// Returns `true` if the quality is usable (good or uncertain).
    #[inline]
    pub fn is_usable(&self) -> bool {
        matches!(self, DataQuality::Good | DataQuality::Uncertain(_))
    }

    /// Returns `true` if the quality is bad.
    #[inline]
    pub fn is_bad(&self) -> bool {
        matches!(self, DataQuality::Bad(_))
    }

    /// Creates a bad quality with an unknown reason.
    #[inline]
    pub fn bad() -> Self {
        DataQuality::Bad(BadReason::Unknown)
    }

    /// Creates an uncertain quality with an unknown reason.
    #[inline]
    pub fn uncertain() -> Self {
        DataQuality::Uncertain(UncertainReason::Unknown)
    }
}

impl fmt::Display for DataQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQuality::Good => write!(f, "Good"),
            DataQuality::Uncertain(reason) => write!(f, "Uncertain: {}", reason),
            DataQuality::Bad(reason) => write!(f, "Bad: {}", reason),
        }
    }
}

/// Reasons for uncertain data quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UncertainReason {
    /// Using last known value due to communication issues.
    LastKnownValue,

    /// Initial value before first read.
    InitialValue,

    /// Unknown reason.
    #[default]
    Unknown,
}

impl fmt::Display for UncertainReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UncertainReason::LastKnownValue => write!(f, "LastKnownValue"),
            UncertainReason::InitialValue => write!(f, "InitialValue"),
            UncertainReason::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Reasons for bad data quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BadReason {
    /// The session is not connected.
    NotConnected,

    /// Communication failure with the session resource.
    CommunicationFailure,

    /// The tag does not exist on the session resource.
    TagNotFound,

    /// Value out of range.
    OutOfRange,

    /// Unknown reason.
    #[default]
    Unknown,
}

impl fmt::Display for BadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BadReason::NotConnected => write!(f, "NotConnected"),
            BadReason::CommunicationFailure => write!(f, "CommunicationFailure"),
            BadReason::TagNotFound => write!(f, "TagNotFound"),
            BadReason::OutOfRange => write!(f, "OutOfRange"),
            BadReason::Unknown => write!(f, "Unknown"),
        }
    }
}

// =============================================================================
// TagValue
// =============================================================================

/// A timestamped tag reading.
///
/// Produced by the session resource for reads and data-change notifications;
/// immutable once produced.
///
/// # Examples
///
/// ```
/// use opcbridge_core::types::{DataQuality, TagId, TagValue, Value};
///
/// let value = TagValue::new(TagId::new("temperature"), Value::Float64(25.5), DataQuality::Good);
/// assert!(value.is_good());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagValue {
    /// The tag this value belongs to.
    pub tag_id: TagId,

    /// The data value.
    pub value: Value,

    /// The quality of the data.
    pub quality: DataQuality,

    /// Source timestamp (when the session resource produced the value).
    pub source_timestamp: DateTime<Utc>,
}

impl TagValue {
    /// Creates a new tag value with the current source timestamp.
    pub fn new(tag_id: TagId, value: Value, quality: DataQuality) -> Self {
        Self {
            tag_id,
            value,
            quality,
            source_timestamp: Utc::now(),
        }
    }

    /// Creates a new tag value with a specific source timestamp.
    pub fn with_timestamp(
        tag_id: TagId,
        value: Value,
        quality: DataQuality,
        source_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            tag_id,
            value,
            quality,
            source_timestamp,
        }
    }

    /// Returns `true` if the data quality is good.
    #[inline]
    pub fn is_good(&self) -> bool {
        self.quality.is_good()
    }

    /// Returns `true` if the data is usable (good or uncertain).
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.quality.is_usable()
    }

    /// Returns the delivery latency of this value relative to a receipt time.
    ///
    /// A source timestamp in the future (clock skew) yields a zero latency.
    pub fn latency_at(&self, received_at: DateTime<Utc>) -> Duration {
        (received_at - self.source_timestamp)
            .to_std()
            .unwrap_or_default()
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} [{}] @ {}",
            self.tag_id,
            self.value,
            self.quality,
            self.source_timestamp.format("%Y-%m-%d %H:%M:%S%.3f")
        )
    }
}

// =============================================================================
// NotificationBatch
// =============================================================================

/// A batch of tag values delivered by one data-change notification.
///
/// The session resource delivers batches from its own callback context; the
/// telemetry pipeline consumes them without re-entering the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationBatch {
    /// Sequence number assigned by the subscription group.
    pub sequence: u64,

    /// The changed values.
    pub values: Vec<TagValue>,
}

impl NotificationBatch {
    /// Creates a new notification batch.
    pub fn new(sequence: u64, values: Vec<TagValue>) -> Self {
        Self { sequence, values }
    }

    /// Returns the number of values in this batch.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the batch carries no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =============================================================================
// GroupConfig
// =============================================================================

/// Configuration for the single subscription group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Human-readable group name.
    pub name: String,

    /// Whether the group publishes data changes.
    pub active: bool,

    /// Requested update rate.
    #[serde(with = "duration_millis")]
    pub update_rate: Duration,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            name: "MainSubscription".to_string(),
            active: true,
            update_rate: Duration::from_millis(100),
        }
    }
}

/// Serialization helper for Duration as milliseconds.
pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// =============================================================================
// Tests
// =============================================================================
