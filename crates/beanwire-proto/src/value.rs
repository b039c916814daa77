//! Opaque argument and result values.
//!
//! Parameters and results are arbitrary data on the wire. [`Value`] is the tagged union
//! that carries them: primitives, sequences, ordered maps and named records. Every value
//! serializes with its type discriminant so nesting and field names survive a round trip.

use serde::{Deserialize, Serialize};

/// A tagged, self-describing value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// Ordered key/value pairs.
    Map(Vec<(String, Value)>),
    /// A structured record: type name plus ordered named fields.
    Object {
        class: String,
        fields: Vec<(String, Value)>,
    },
}

impl Value {
    /// Build a structured record.
    pub fn object<I, K>(class: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Object {
            class: class.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Name of the variant, for diagnostics and argument errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object { .. } => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// False if any nested float is NaN or infinite. Those have no JSON encoding.
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Float(f) => f.is_finite(),
            Self::List(items) => items.iter().all(Value::is_finite),
            Self::Map(entries) | Self::Object { fields: entries, .. } => {
                entries.iter().all(|(_, value)| value.is_finite())
            }
            _ => true,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Floats, and integers widened to float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Field lookup on maps and records.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(entries) | Self::Object { fields: entries, .. } => entries
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Natural JSON rendering, without type tags. Used for display only.
    ///
    /// Records render as `{"class": ..., "fields": {...}}`; bytes as an array of numbers.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        fn fields_to_json(fields: &[(String, Value)]) -> Json {
            Json::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            )
        }

        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(n) => Json::from(*n),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Self::String(s) => Json::String(s.clone()),
            Self::Bytes(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
            Self::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Self::Map(entries) => fields_to_json(entries),
            Self::Object { class, fields } => serde_json::json!({
                "class": class,
                "fields": fields_to_json(fields),
            }),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Self::String(s),
            Json::Array(items) => Self::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Self::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(Value::Int(42)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "int", "value": 42 }));

        let json = serde_json::to_value(Value::Null).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "null" }));
    }

    #[test]
    fn nested_record_roundtrips() {
        let value = Value::object(
            "Address",
            [
                ("street", Value::from("Main St")),
                ("number", Value::from(7)),
                (
                    "tags",
                    Value::List(vec![Value::from(true), Value::Float(2.5), Value::Null]),
                ),
                ("raw", Value::Bytes(vec![0, 255, 7])),
            ],
        );

        let encoded = serde_json::to_string(&value).unwrap();
        let decoded: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn map_preserves_order() {
        let value = Value::Map(vec![
            ("z".to_string(), Value::from(1)),
            ("a".to_string(), Value::from(2)),
        ]);
        let decoded: Value = serde_json::from_slice(&serde_json::to_vec(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn from_plain_json() {
        let value = Value::from(serde_json::json!({
            "qty": 3,
            "price": 9.5,
            "name": "pen",
            "tags": ["a", null],
        }));

        assert_eq!(value.get("qty").and_then(Value::as_i64), Some(3));
        assert_eq!(value.get("price").and_then(Value::as_f64), Some(9.5));
        assert_eq!(value.get("name").and_then(Value::as_str), Some("pen"));
        assert_eq!(
            value.get("tags").and_then(Value::as_list).map(<[Value]>::len),
            Some(2)
        );
    }

    #[test]
    fn to_json_renders_naturally() {
        let value = Value::object("Money", [("cents", Value::from(120))]);
        assert_eq!(
            value.to_json(),
            serde_json::json!({ "class": "Money", "fields": { "cents": 120 } })
        );
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn finiteness_checks_nested_floats() {
        assert!(Value::Float(1.5).is_finite());
        assert!(Value::from("nan").is_finite());
        assert!(!Value::Float(f64::INFINITY).is_finite());

        let nested = Value::object(
            "Stats",
            [("mean", Value::List(vec![Value::Int(1), Value::Float(f64::NAN)]))],
        );
        assert!(!nested.is_finite());
    }

    #[test]
    fn accessors_reject_other_types() {
        let value = Value::from("text");
        assert_eq!(value.as_i64(), None);
        assert_eq!(value.as_bool(), None);
        assert_eq!(value.type_name(), "string");
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
        assert!(Value::from(None::<i64>).is_null());
    }
}
