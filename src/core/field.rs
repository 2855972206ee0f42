//! Field value types used to evaluate queries outside of SQL

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Compare against a raw filter value, read with this value's type
    ///
    /// Returns `None` when the raw value cannot be read as that type, or
    /// when this value is null (SQL comparisons with NULL are never true).
    pub fn compare_raw(&self, raw: &str) -> Option<Ordering> {
        match self {
            FieldValue::String(s) => Some(s.as_str().cmp(raw)),
            FieldValue::Integer(i) => raw.parse::<i64>().ok().map(|r| i.cmp(&r)),
            FieldValue::Float(f) => raw.parse::<f64>().ok().and_then(|r| f.partial_cmp(&r)),
            FieldValue::Boolean(b) => raw.parse::<bool>().ok().map(|r| b.cmp(&r)),
            FieldValue::Uuid(u) => Uuid::parse_str(raw).ok().map(|r| u.cmp(&r)),
            FieldValue::Null => None,
        }
    }

    /// Total order used for sorting; nulls sort last as in PostgreSQL
    pub fn sort_cmp(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Null, _) => Ordering::Greater,
            (_, FieldValue::Null) => Ordering::Less,
            (FieldValue::String(a), FieldValue::String(b)) => a.cmp(b),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.total_cmp(b),
            (FieldValue::Integer(a), FieldValue::Float(b)) => (*a as f64).total_cmp(b),
            (FieldValue::Float(a), FieldValue::Integer(b)) => a.total_cmp(&(*b as f64)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Boolean(_) => 0,
            FieldValue::Integer(_) | FieldValue::Float(_) => 1,
            FieldValue::String(_) => 2,
            FieldValue::Uuid(_) => 3,
            FieldValue::Null => 4,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}
