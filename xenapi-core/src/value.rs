use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::descriptor::TypeDescriptor;
use crate::error::Fault;
use crate::types::XenType;
use crate::wire::WireValue;

/// Decoded payload, shaped by the descriptor it was decoded against.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
    /// Index into an enum table; the table length is the `Undefined` sentinel.
    Enum(usize),
    Ref(String),
    Struct(StructValue),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Enum(_) => "enum",
            Value::Ref(_) => "ref",
            Value::Struct(_) => "struct",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Ref(s) => Some(s),
            _ => None,
        }
    }
}

/// Struct payload keyed by wire name, in field-table order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructValue {
    fields: IndexMap<String, Value>,
}

impl StructValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Take a field out, leaving the remaining order intact.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for StructValue {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A value paired with the descriptor that says how to put it on the wire.
///
/// Parameters are built by copying out of the caller's value, so the caller
/// keeps ownership of whatever it passed in.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    pub descriptor: TypeDescriptor,
    pub value: Value,
}

impl TypedValue {
    pub fn new(descriptor: TypeDescriptor, value: Value) -> Self {
        Self { descriptor, value }
    }

    pub fn of<T: XenType>(value: &T) -> Self {
        Self::new(T::descriptor(), value.to_value())
    }

    pub fn string(value: &str) -> Self {
        Self::new(TypeDescriptor::string(), Value::String(value.to_string()))
    }

    pub fn encode(&self) -> Result<WireValue, Fault> {
        self.descriptor.encode(&self.value)
    }
}
