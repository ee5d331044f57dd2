// Struct/member tables.
//
// A record class is described twice by the `xen_record!` macro: once as an
// untyped `StructDescriptor` (wire name + descriptor per field) that the
// generic decoder walks, and once as a typed `FieldEntry` table whose
// accessors move values in and out of the Rust struct.

use indexmap::IndexMap;
use tracing::trace;

use crate::descriptor::{DecodeContext, TypeDescriptor};
use crate::error::Fault;
use crate::reference::Ref;
use crate::types::XenType;
use crate::value::{StructValue, Value};
use crate::wire::WireValue;

#[derive(Debug)]
pub struct FieldDescriptor {
    pub wire_name: &'static str,
    /// Resolved lazily so classes can refer to each other.
    pub ty: fn() -> TypeDescriptor,
}

#[derive(Debug)]
pub struct StructDescriptor {
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl StructDescriptor {
    pub fn field(&self, wire_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.wire_name == wire_name)
    }

    /// Decode every known field. Missing fields take their descriptor's
    /// default; members the table does not know are skipped.
    pub fn decode_fields(
        &self,
        members: &IndexMap<String, WireValue>,
        ctx: &mut DecodeContext,
    ) -> Result<StructValue, Fault> {
        let mut out = StructValue::with_capacity(self.fields.len());
        for field in self.fields {
            let ty = (field.ty)();
            let value = match members.get(field.wire_name) {
                Some(wire) => ty
                    .decode(wire, ctx)
                    .map_err(|e| Fault::field_decode(field.wire_name, e))?,
                None => ty.default_value(),
            };
            out.insert(field.wire_name, value);
        }

        for name in members.keys() {
            if self.field(name).is_none() {
                trace!(record = self.name, field = %name, "ignoring unknown field");
            }
        }

        Ok(out)
    }

    /// Encode every field in table order; absent fields are sent as defaults.
    pub fn encode_fields(&self, value: &StructValue) -> Result<WireValue, Fault> {
        let mut members = IndexMap::with_capacity(self.fields.len());
        for field in self.fields {
            let ty = (field.ty)();
            let wire = match value.get(field.wire_name) {
                Some(v) => ty.encode(v),
                None => ty.encode(&ty.default_value()),
            }
            .map_err(|e| field_encode(field.wire_name, e))?;
            members.insert(field.wire_name.to_string(), wire);
        }
        Ok(WireValue::Struct(members))
    }

    pub fn default_fields(&self) -> StructValue {
        self.fields
            .iter()
            .map(|f| (f.wire_name, (f.ty)().default_value()))
            .collect()
    }
}

// Encode failures are client-side; keep them out of the decode taxonomy.
fn field_encode(field: &str, fault: Fault) -> Fault {
    let detail = match fault {
        Fault::Encode(message) => message,
        other => other.to_string(),
    };
    Fault::encode(format!("field '{}': {}", field, detail))
}

/// Typed accessor pair binding one wire field to one struct member.
#[derive(Debug)]
pub struct FieldEntry<R> {
    pub wire_name: &'static str,
    pub ty: fn() -> TypeDescriptor,
    pub get: fn(&R) -> Value,
    pub set: fn(&mut R, Value) -> Result<(), Fault>,
}

/// Full local snapshot of a remote object.
///
/// Records are never refreshed behind the caller's back; fetch again to see
/// server-side changes.
pub trait Record: XenType + Default + 'static {
    /// Class name as used in method names (`VM`, `host`, ...).
    const CLASS: &'static str;

    fn struct_descriptor() -> &'static StructDescriptor;

    fn field_entries() -> &'static [FieldEntry<Self>];

    fn uuid(&self) -> &str;

    fn handle(&self) -> &Ref<Self>;

    fn set_handle(&mut self, handle: Ref<Self>);

    /// Build a record from decoded fields, then point its handle at its uuid.
    fn from_struct_value(mut fields: StructValue) -> Result<Self, Fault> {
        let mut record = Self::default();
        for entry in Self::field_entries() {
            if let Some(value) = fields.take(entry.wire_name) {
                (entry.set)(&mut record, value).map_err(|e| Fault::field_decode(entry.wire_name, e))?;
            }
        }
        let handle = Ref::new(record.uuid().to_string());
        record.set_handle(handle);
        Ok(record)
    }

    fn to_struct_value(&self) -> StructValue {
        Self::field_entries()
            .iter()
            .map(|entry| (entry.wire_name, (entry.get)(self)))
            .collect()
    }
}

/// `XenType::from_value` body shared by every generated record.
pub fn record_from_value<R: Record>(value: Value) -> Result<R, Fault> {
    match value {
        Value::Struct(fields) => R::from_struct_value(fields),
        other => Err(Fault::type_mismatch(format!("{} record", R::CLASS), other.kind_name())),
    }
}
