//! Trace events as seen by the engine
//!
//! The engine never decodes trace records itself. Collaborators hand it
//! anything implementing [`Event`]; [`TraceEvent`] is a ready-made record for
//! callers that already hold decoded fields (tests, JSON-lines input).

use crate::error::{AnalysisError, Result};
use crate::time_range::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A decoded event field value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    UInt(u64),
    Str(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::UInt(v) => write!(f, "{}", v),
            Self::Str(v) => f.write_str(v),
        }
    }
}

impl FieldValue {
    /// Numeric view of the value, if it has one
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(v) => u64::try_from(*v).ok(),
            Self::UInt(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Correlation key of a keyed period: the values of the configured key fields, in order
pub type PeriodKey = Vec<FieldValue>;

/// What the engine needs from a trace event
pub trait Event {
    /// Timestamp in nanoseconds; non-decreasing across the stream
    fn timestamp(&self) -> Timestamp;

    fn name(&self) -> &str;

    /// Look up a payload field, failing with [`AnalysisError::MissingField`]
    fn field(&self, field: &str) -> Result<FieldValue>;
}

/// Owned, already-decoded trace event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub name: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl TraceEvent {
    pub fn new(name: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            name: name.into(),
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    /// Attach a field (builder style)
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

impl Event for TraceEvent {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn field(&self, field: &str) -> Result<FieldValue> {
        self.fields
            .get(field)
            .cloned()
            .ok_or_else(|| AnalysisError::MissingField {
                event: self.name.clone(),
                field: field.to_string(),
            })
    }
}

/// Extract a period key from `ev`
///
/// Returns `None` when no key fields are configured or any of them is
/// missing on the event.
pub fn period_key<E: Event + ?Sized>(ev: &E, key_fields: &[String]) -> Option<PeriodKey> {
    if key_fields.is_empty() {
        return None;
    }

    let mut key = Vec::with_capacity(key_fields.len());
    for field in key_fields {
        match ev.field(field) {
            Ok(value) => key.push(value),
            Err(e) => {
                tracing::trace!(error = %e, "ignoring period event");
                return None;
            }
        }
    }
    Some(key)
}
