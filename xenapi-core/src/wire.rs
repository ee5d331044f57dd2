// Tokenised wire values.
//
// Transports decode their envelope framing into this shape before the core
// sees it: scalars, arrays and structs of named members. Nothing here knows
// about descriptors; shape checking happens in `descriptor`.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value as JsonValue};

#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Nil,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    /// ISO-8601 timestamp, kept as text until a descriptor asks for it.
    DateTime(String),
    Array(Vec<WireValue>),
    Struct(IndexMap<String, WireValue>),
}

impl WireValue {
    /// Short name of the token kind, used in type mismatch reports.
    pub fn type_name(&self) -> &'static str {
        match self {
            WireValue::Nil => "nil",
            WireValue::Bool(_) => "boolean",
            WireValue::Int(_) => "int",
            WireValue::Double(_) => "double",
            WireValue::String(_) => "string",
            WireValue::DateTime(_) => "dateTime",
            WireValue::Array(_) => "array",
            WireValue::Struct(_) => "struct",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&IndexMap<String, WireValue>> {
        match self {
            WireValue::Struct(members) => Some(members),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Member lookup on a struct token; `None` for any other token.
    pub fn get(&self, name: &str) -> Option<&WireValue> {
        self.as_struct().and_then(|members| members.get(name))
    }

    /// Build a struct token from `(name, value)` pairs, keeping their order.
    pub fn structure<K, I>(members: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, WireValue)>,
    {
        WireValue::Struct(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => WireValue::Nil,
            JsonValue::Bool(b) => WireValue::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => WireValue::Int(i),
                None => WireValue::Double(n.as_f64().unwrap_or(0.0)),
            },
            JsonValue::String(s) => WireValue::String(s.clone()),
            JsonValue::Array(items) => WireValue::Array(items.iter().map(WireValue::from_json).collect()),
            JsonValue::Object(members) => WireValue::Struct(
                members
                    .iter()
                    .map(|(k, v)| (k.clone(), WireValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            WireValue::Nil => JsonValue::Null,
            WireValue::Bool(b) => JsonValue::Bool(*b),
            WireValue::Int(i) => JsonValue::Number(Number::from(*i)),
            // JSON has no representation for NaN or infinities.
            WireValue::Double(d) => Number::from_f64(*d).map_or(JsonValue::Null, JsonValue::Number),
            WireValue::String(s) | WireValue::DateTime(s) => JsonValue::String(s.clone()),
            WireValue::Array(items) => JsonValue::Array(items.iter().map(WireValue::to_json).collect()),
            WireValue::Struct(members) => {
                let mut map = Map::with_capacity(members.len());
                for (k, v) in members {
                    map.insert(k.clone(), v.to_json());
                }
                JsonValue::Object(map)
            }
        }
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::String(value.to_string())
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        WireValue::String(value)
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        WireValue::Int(value)
    }
}

impl From<f64> for WireValue {
    fn from(value: f64) -> Self {
        WireValue::Double(value)
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        WireValue::Bool(value)
    }
}

impl From<Vec<WireValue>> for WireValue {
    fn from(value: Vec<WireValue>) -> Self {
        WireValue::Array(value)
    }
}
