use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Values carried through statements: bind parameters going in, row cells
/// coming back.
///
/// One enum for both directions keeps callers free of backend value types:
/// ```rust
/// use sql_bridge::prelude::*;
///
/// let params = vec![
///     SqlValue::Int(1),
///     SqlValue::Text("alice".into()),
///     SqlValue::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    Json(JsonValue),
    /// Binary data
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let SqlValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let SqlValue::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let SqlValue::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S.%3f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let SqlValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let SqlValue::Bytes(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

impl From<SqlValue> for JsonValue {
    fn from(value: SqlValue) -> Self {
        match value {
            SqlValue::Int(i) => JsonValue::from(i),
            SqlValue::Float(f) => JsonValue::from(f),
            SqlValue::Text(s) => JsonValue::String(s),
            SqlValue::Bool(b) => JsonValue::Bool(b),
            SqlValue::Timestamp(dt) => JsonValue::String(dt.format("%F %T%.f").to_string()),
            SqlValue::Null => JsonValue::Null,
            SqlValue::Json(j) => j,
            SqlValue::Bytes(bytes) => {
                JsonValue::Array(bytes.into_iter().map(JsonValue::from).collect())
            }
        }
    }
}

/// Caller-declared parameter types, in the classic driver convention.
///
/// Declared per bind call; purely advisory until execution, when declared
/// types are mapped onto [`BackendType`]s for the mutation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Null,
    Bool,
    Int,
    Float,
    String,
    Binary,
}

impl ParamType {
    /// Infer a declared type from a value, the way the classic drivers sniff
    /// untyped parameters. Anything without a dedicated backend type reads as
    /// `String`.
    #[must_use]
    pub fn of(value: &SqlValue) -> Self {
        match value {
            SqlValue::Null => ParamType::Null,
            SqlValue::Bool(_) => ParamType::Bool,
            SqlValue::Int(_) => ParamType::Int,
            _ => ParamType::String,
        }
    }
}

/// Backend-native parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    Bool,
    Int64,
    String,
}

/// Total lookup from caller-declared to backend-native types. Unrecognized
/// declared types fall back to `String`; this never fails.
impl From<ParamType> for BackendType {
    fn from(ty: ParamType) -> Self {
        match ty {
            ParamType::Bool => BackendType::Bool,
            ParamType::Int => BackendType::Int64,
            _ => BackendType::String,
        }
    }
}

/// Parameter values keyed by backend name, ready for dispatch.
pub type NamedValues = BTreeMap<String, SqlValue>;

/// Backend-native types keyed by backend name, parallel to [`NamedValues`].
pub type NamedTypes = BTreeMap<String, BackendType>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_type_lookup_is_total() {
        assert_eq!(BackendType::from(ParamType::Bool), BackendType::Bool);
        assert_eq!(BackendType::from(ParamType::Int), BackendType::Int64);
        assert_eq!(BackendType::from(ParamType::String), BackendType::String);
        assert_eq!(BackendType::from(ParamType::Null), BackendType::String);
        assert_eq!(BackendType::from(ParamType::Float), BackendType::String);
        assert_eq!(BackendType::from(ParamType::Binary), BackendType::String);
    }

    #[test]
    fn param_type_sniffing() {
        assert_eq!(ParamType::of(&SqlValue::Null), ParamType::Null);
        assert_eq!(ParamType::of(&SqlValue::Bool(true)), ParamType::Bool);
        assert_eq!(ParamType::of(&SqlValue::Int(7)), ParamType::Int);
        assert_eq!(ParamType::of(&SqlValue::Float(1.5)), ParamType::String);
        assert_eq!(ParamType::of(&SqlValue::Text("x".into())), ParamType::String);
    }

    #[test]
    fn bool_accessor_reads_zero_one_ints() {
        assert_eq!(SqlValue::Int(1).as_bool(), Some(&true));
        assert_eq!(SqlValue::Int(0).as_bool(), Some(&false));
        assert_eq!(SqlValue::Int(2).as_bool(), None);
    }

    #[test]
    fn timestamp_accessor_parses_text() {
        let v = SqlValue::Text("2024-03-01 12:30:00".into());
        assert!(v.as_timestamp().is_some());
        let v = SqlValue::Text("2024-03-01 12:30:00.250".into());
        assert!(v.as_timestamp().is_some());
        assert!(SqlValue::Text("not a date".into()).as_timestamp().is_none());
    }
}
