use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::descriptor::TypeDescriptor;
use crate::error::Fault;
use crate::record::{record_from_value, Record};
use crate::types::XenType;
use crate::value::Value;

/// Handle the server uses for "no object".
pub const NULL_REF: &str = "OpaqueRef:NULL";

/// Opaque handle to a remote object of class `T`. It has no meaning on the
/// client beyond identity.
pub struct Ref<T> {
    opaque: String,
    _class: PhantomData<fn() -> T>,
}

impl<T> Ref<T> {
    pub fn new(opaque: impl Into<String>) -> Self {
        Self {
            opaque: opaque.into(),
            _class: PhantomData,
        }
    }

    pub fn null() -> Self {
        Self::new(NULL_REF)
    }

    pub fn is_null(&self) -> bool {
        self.opaque == NULL_REF
    }

    pub fn as_str(&self) -> &str {
        &self.opaque
    }

    pub fn into_string(self) -> String {
        self.opaque
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self::new(self.opaque.clone())
    }
}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.opaque == other.opaque
    }
}

impl<T> Eq for Ref<T> {}

impl<T> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.opaque.hash(state);
    }
}

impl<T> Default for Ref<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.opaque).finish()
    }
}

impl<T> fmt::Display for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.opaque)
    }
}

impl<T> From<&str> for Ref<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: Record> XenType for Ref<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Reference(T::CLASS)
    }

    fn from_value(value: Value) -> Result<Self, Fault> {
        match value {
            Value::Ref(opaque) => Ok(Self::new(opaque)),
            other => Err(Fault::type_mismatch(format!("{} ref", T::CLASS), other.kind_name())),
        }
    }

    fn to_value(&self) -> Value {
        Value::Ref(self.opaque.clone())
    }
}

/// A field the server may send either as a bare reference or expanded into
/// the full record, depending on its expansion policy for that call.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOpt<T> {
    Handle(Ref<T>),
    Record(Box<T>),
}

impl<T> RecordOpt<T> {
    pub fn is_record(&self) -> bool {
        matches!(self, RecordOpt::Record(_))
    }

    pub fn handle(&self) -> Option<&Ref<T>> {
        match self {
            RecordOpt::Handle(handle) => Some(handle),
            RecordOpt::Record(_) => None,
        }
    }

    pub fn record(&self) -> Option<&T> {
        match self {
            RecordOpt::Record(record) => Some(record),
            RecordOpt::Handle(_) => None,
        }
    }

    pub fn into_record(self) -> Option<T> {
        match self {
            RecordOpt::Record(record) => Some(*record),
            RecordOpt::Handle(_) => None,
        }
    }
}

impl<T: Record> RecordOpt<T> {
    /// The handle of whichever arm is populated.
    pub fn reference(&self) -> Ref<T> {
        match self {
            RecordOpt::Handle(handle) => handle.clone(),
            RecordOpt::Record(record) => record.handle().clone(),
        }
    }
}

impl<T> Default for RecordOpt<T> {
    fn default() -> Self {
        RecordOpt::Handle(Ref::null())
    }
}

impl<T> From<Ref<T>> for RecordOpt<T> {
    fn from(handle: Ref<T>) -> Self {
        RecordOpt::Handle(handle)
    }
}

impl<T: Record> XenType for RecordOpt<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::RecordOpt(T::struct_descriptor())
    }

    fn from_value(value: Value) -> Result<Self, Fault> {
        match value {
            Value::Ref(opaque) => Ok(RecordOpt::Handle(Ref::new(opaque))),
            record @ Value::Struct(_) => record_from_value(record).map(|r| RecordOpt::Record(Box::new(r))),
            other => Err(Fault::type_mismatch(
                format!("{} record_opt", T::CLASS),
                other.kind_name(),
            )),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            RecordOpt::Handle(handle) => Value::Ref(handle.as_str().to_string()),
            RecordOpt::Record(record) => Value::Struct(record.to_struct_value()),
        }
    }
}
