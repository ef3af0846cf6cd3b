//! Typed Firestore document and value representations shared by the maintenance tools.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single Firestore field value in its REST wire encoding.
///
/// The wire format tags each value with exactly one type key
/// (`{"stringValue": "x"}`), which the externally-tagged enum reproduces.
/// Integers travel as decimal strings; use [`Value::integer`] and
/// [`Value::as_integer`] instead of touching the raw encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    /// UTF-8 string payload.
    StringValue(String),
    /// 64-bit integer, wire-encoded as a decimal string.
    IntegerValue(String),
    /// Boolean payload.
    BooleanValue(bool),
    /// RFC 3339 timestamp.
    TimestampValue(DateTime<Utc>),
    /// Ordered list of nested values.
    ArrayValue(ArrayValue),
}

impl Value {
    /// Wraps a string payload.
    pub fn string<S: Into<String>>(value: S) -> Self {
        Value::StringValue(value.into())
    }

    /// Wraps an integer in its decimal-string wire encoding.
    pub fn integer(value: i64) -> Self {
        Value::IntegerValue(value.to_string())
    }

    /// Wraps a timestamp.
    pub fn timestamp(value: DateTime<Utc>) -> Self {
        Value::TimestampValue(value)
    }

    /// Builds an array of string values, preserving order.
    pub fn string_array<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::ArrayValue(ArrayValue {
            values: values.into_iter().map(Value::string).collect(),
        })
    }

    /// Returns the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::StringValue(value) => Some(value),
            _ => None,
        }
    }

    /// Decodes the integer payload, if this is a well-formed integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::IntegerValue(raw) => raw.parse().ok(),
            _ => None,
        }
    }

    /// Returns the timestamp payload, if this is a timestamp value.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::TimestampValue(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the nested values, if this is an array value.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::ArrayValue(array) => Some(&array.values),
            _ => None,
        }
    }
}

/// Nested value list inside an `arrayValue` field.
///
/// The API omits `values` entirely for empty arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    /// Array elements in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

/// One Firestore document as returned by the REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name
    /// (`projects/{p}/databases/{d}/documents/{collection}/{id}`).
    pub name: String,
    /// Field map; absent on the wire when the document has no fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
    /// Server-assigned creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    /// Server-assigned last-update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// The identifier segment of the resource name.
    pub fn doc_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Looks up a field value by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn values_serialize_to_tagged_wire_form() {
        assert_eq!(
            serde_json::to_value(Value::string("hello")).unwrap(),
            json!({"stringValue": "hello"})
        );
        assert_eq!(
            serde_json::to_value(Value::integer(42)).unwrap(),
            json!({"integerValue": "42"})
        );
        let stamp = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        assert_eq!(
            serde_json::to_value(Value::timestamp(stamp)).unwrap(),
            json!({"timestampValue": "2026-08-06T12:00:00Z"})
        );
        assert_eq!(
            serde_json::to_value(Value::string_array(["a", "b"])).unwrap(),
            json!({"arrayValue": {"values": [
                {"stringValue": "a"},
                {"stringValue": "b"}
            ]}})
        );
    }

    #[test]
    fn integer_round_trips_through_decimal_string() {
        let value = Value::integer(-7);
        assert_eq!(value, Value::IntegerValue("-7".to_string()));
        assert_eq!(value.as_integer(), Some(-7));
        assert_eq!(Value::IntegerValue("not a number".into()).as_integer(), None);
        assert_eq!(Value::string("7").as_integer(), None);
    }

    #[test]
    fn document_parses_from_rest_payload() {
        let payload = json!({
            "name": "projects/demo/databases/(default)/documents/snippets/abc123",
            "fields": {
                "text": {"stringValue": "Always include a .gitignore file."},
                "labels": {"arrayValue": {"values": [{"stringValue": "git"}]}},
                "thumbs_up": {"integerValue": "0"},
                "thumbs_down": {"integerValue": "0"},
                "created_at": {"timestampValue": "2026-08-06T12:00:00Z"}
            },
            "createTime": "2026-08-06T12:00:01Z",
            "updateTime": "2026-08-06T12:00:01Z"
        });

        let document: Document = serde_json::from_value(payload).unwrap();
        assert_eq!(document.doc_id(), "abc123");
        assert_eq!(
            document.field("text").and_then(Value::as_str),
            Some("Always include a .gitignore file.")
        );
        assert_eq!(
            document.field("thumbs_up").and_then(Value::as_integer),
            Some(0)
        );
        assert_eq!(
            document.field("labels").and_then(Value::as_array).map(<[Value]>::len),
            Some(1)
        );
        assert!(document.create_time.is_some());
    }

    #[test]
    fn empty_array_omits_values_key() {
        let empty = Value::ArrayValue(ArrayValue::default());
        assert_eq!(serde_json::to_value(&empty).unwrap(), json!({"arrayValue": {}}));
        let parsed: Value = serde_json::from_value(json!({"arrayValue": {}})).unwrap();
        assert_eq!(parsed, empty);
    }
}
