//! Typed marshalling core for XenAPI-style clients.
//!
//! Every generated accessor describes its parameters and its expected result
//! with [`TypeDescriptor`]s; this crate walks those descriptors to move
//! values between Rust types and the tokenised [`WireValue`] form the
//! transport speaks.

pub mod containers;
pub mod descriptor;
pub mod enums;
pub mod envelope;
pub mod error;
pub mod ids;
#[macro_use]
pub mod macros;
pub mod record;
pub mod reference;
pub mod types;
pub mod value;
pub mod wire;

pub use containers::{XenMap, XenSet};
pub use descriptor::{DecodeContext, PrimitiveKind, TypeDescriptor};
pub use enums::{EnumTable, XenEnum};
pub use envelope::Envelope;
pub use error::{codes, ErrorKind, Fault};
pub use ids::{CallId, CallIdAllocator};
pub use record::{FieldDescriptor, FieldEntry, Record, StructDescriptor};
pub use reference::{RecordOpt, Ref, NULL_REF};
pub use types::XenType;
pub use value::{StructValue, TypedValue, Value};
pub use wire::WireValue;
