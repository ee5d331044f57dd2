use chrono::{DateTime, Utc};

use crate::descriptor::{DecodeContext, TypeDescriptor};
use crate::error::Fault;
use crate::value::Value;
use crate::wire::WireValue;

/// A Rust type with a fixed wire shape.
pub trait XenType: Sized {
    fn descriptor() -> TypeDescriptor;

    fn from_value(value: Value) -> Result<Self, Fault>;

    fn to_value(&self) -> Value;

    /// Decode straight from a wire token.
    fn from_wire(wire: &WireValue, ctx: &mut DecodeContext) -> Result<Self, Fault> {
        Self::from_value(Self::descriptor().decode(wire, ctx)?)
    }

    fn to_wire(&self) -> Result<WireValue, Fault> {
        Self::descriptor().encode(&self.to_value())
    }
}

macro_rules! primitive_xen_type {
    ($ty:ty, $ctor:ident, $variant:ident) => {
        impl XenType for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::$ctor()
            }

            fn from_value(value: Value) -> Result<Self, Fault> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(Fault::type_mismatch(stringify!($ctor), other.kind_name())),
                }
            }

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }
        }
    };
}

primitive_xen_type!(String, string, String);
primitive_xen_type!(i64, int, Int);
primitive_xen_type!(f64, float, Float);
primitive_xen_type!(bool, bool, Bool);
primitive_xen_type!(DateTime<Utc>, datetime, DateTime);
