// Runtime type descriptors.
//
// One closed enum describes every shape that can cross the session boundary.
// A single recursive decode/encode pair walks it, so generated accessors
// only have to say which descriptor they expect.

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use std::fmt;
use tracing::warn;

use crate::enums::EnumTable;
use crate::error::Fault;
use crate::record::StructDescriptor;
use crate::reference::NULL_REF;
use crate::value::Value;
use crate::wire::WireValue;

/// Basic (compact) ISO-8601 form used by the XML-RPC `dateTime.iso8601` type.
pub const DATETIME_WIRE_FORMAT: &str = "%Y%m%dT%H:%M:%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Int,
    Float,
    Bool,
    DateTime,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::DateTime => "datetime",
        }
    }
}

#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    Enum(&'static EnumTable),
    Struct(&'static StructDescriptor),
    Set(Box<TypeDescriptor>),
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
    /// Opaque handle to an object of the named class.
    Reference(&'static str),
    /// Either a bare reference or an inlined record of the given class.
    RecordOpt(&'static StructDescriptor),
}

// Static tables are compared by name; fn pointers inside them are not comparable.
impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        use TypeDescriptor::*;
        match (self, other) {
            (Primitive(a), Primitive(b)) => a == b,
            (Enum(a), Enum(b)) => a.name == b.name,
            (Struct(a), Struct(b)) | (RecordOpt(a), RecordOpt(b)) => a.name == b.name,
            (Set(a), Set(b)) => a == b,
            (Map(ka, va), Map(kb, vb)) => ka == kb && va == vb,
            (Reference(a), Reference(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(kind) => write!(f, "{}", kind.name()),
            TypeDescriptor::Enum(table) => write!(f, "enum {}", table.name),
            TypeDescriptor::Struct(desc) => write!(f, "{} record", desc.name),
            TypeDescriptor::Set(elem) => write!(f, "{} set", elem),
            TypeDescriptor::Map(k, v) => write!(f, "({} -> {}) map", k, v),
            TypeDescriptor::Reference(class) => write!(f, "{} ref", class),
            TypeDescriptor::RecordOpt(desc) => write!(f, "{} record_opt", desc.name),
        }
    }
}

/// Soft faults raised while decoding one response.
///
/// Unknown enumerants do not abort a decode: the value degrades to the
/// `Undefined` sentinel and the fault is parked here for the caller.
#[derive(Debug, Default)]
pub struct DecodeContext {
    soft_faults: Vec<Fault>,
}

impl DecodeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_soft_fault(&mut self, fault: Fault) {
        self.soft_faults.push(fault);
    }

    pub fn soft_faults(&self) -> &[Fault] {
        &self.soft_faults
    }

    pub fn is_clean(&self) -> bool {
        self.soft_faults.is_empty()
    }

    pub fn into_soft_faults(self) -> Vec<Fault> {
        self.soft_faults
    }
}

impl TypeDescriptor {
    pub fn string() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::String)
    }

    pub fn int() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::Int)
    }

    pub fn float() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::Float)
    }

    pub fn bool() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::Bool)
    }

    pub fn datetime() -> Self {
        TypeDescriptor::Primitive(PrimitiveKind::DateTime)
    }

    pub fn set_of(element: TypeDescriptor) -> Self {
        TypeDescriptor::Set(Box::new(element))
    }

    pub fn map_of(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Map(Box::new(key), Box::new(value))
    }

    /// Decode a wire token into a value of this shape.
    pub fn decode(&self, wire: &WireValue, ctx: &mut DecodeContext) -> Result<Value, Fault> {
        match (self, wire) {
            (TypeDescriptor::Primitive(kind), _) => decode_primitive(*kind, wire),

            (TypeDescriptor::Enum(table), WireValue::String(text)) => {
                Ok(Value::Enum(table.from_string(ctx, text)))
            }

            (TypeDescriptor::Struct(desc), WireValue::Struct(members)) => {
                desc.decode_fields(members, ctx).map(Value::Struct)
            }

            (TypeDescriptor::Set(element), WireValue::Array(items)) => items
                .iter()
                .map(|item| element.decode(item, ctx))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Set),

            (TypeDescriptor::Map(key, value), WireValue::Struct(members)) => {
                let mut pairs = Vec::with_capacity(members.len());
                for (wire_key, wire_value) in members {
                    let k = key.decode(&WireValue::String(wire_key.clone()), ctx)?;
                    let v = value.decode(wire_value, ctx)?;
                    pairs.push((k, v));
                }
                Ok(Value::Map(pairs))
            }

            (TypeDescriptor::Reference(_), WireValue::String(opaque)) => Ok(Value::Ref(opaque.clone())),

            // The server decides per call whether to expand a reference.
            (TypeDescriptor::RecordOpt(_), WireValue::String(opaque)) => Ok(Value::Ref(opaque.clone())),
            (TypeDescriptor::RecordOpt(desc), WireValue::Struct(members)) => {
                desc.decode_fields(members, ctx).map(Value::Struct)
            }

            (expected, found) => Err(Fault::type_mismatch(expected.to_string(), found.type_name())),
        }
    }

    /// Encode a value of this shape into a wire token.
    pub fn encode(&self, value: &Value) -> Result<WireValue, Fault> {
        match (self, value) {
            (TypeDescriptor::Primitive(PrimitiveKind::String), Value::String(s)) => Ok(WireValue::String(s.clone())),
            (TypeDescriptor::Primitive(PrimitiveKind::Int), Value::Int(i)) => Ok(WireValue::Int(*i)),
            (TypeDescriptor::Primitive(PrimitiveKind::Float), Value::Float(x)) => Ok(WireValue::Double(*x)),
            (TypeDescriptor::Primitive(PrimitiveKind::Bool), Value::Bool(b)) => Ok(WireValue::Bool(*b)),
            (TypeDescriptor::Primitive(PrimitiveKind::DateTime), Value::DateTime(dt)) => {
                // The wire form has whole-second resolution.
                if dt.timestamp_subsec_nanos() != 0 {
                    return Err(Fault::encode(format!("datetime {} has sub-second precision", dt)));
                }
                Ok(WireValue::DateTime(dt.format(DATETIME_WIRE_FORMAT).to_string()))
            }

            (TypeDescriptor::Enum(table), Value::Enum(index)) => {
                if table.is_undefined(*index) {
                    return Err(Fault::encode(format!(
                        "cannot send the undefined enumerant of {}",
                        table.name
                    )));
                }
                Ok(WireValue::String(table.to_string(*index).to_string()))
            }

            (TypeDescriptor::Struct(desc), Value::Struct(fields))
            | (TypeDescriptor::RecordOpt(desc), Value::Struct(fields)) => desc.encode_fields(fields),

            (TypeDescriptor::Set(element), Value::Set(items)) => items
                .iter()
                .map(|item| element.encode(item))
                .collect::<Result<Vec<_>, _>>()
                .map(WireValue::Array),

            (TypeDescriptor::Map(key, val), Value::Map(pairs)) => {
                let mut members = IndexMap::with_capacity(pairs.len());
                for (k, v) in pairs {
                    let wire_key = map_key_text(key.encode(k)?)?;
                    if members.insert(wire_key.clone(), val.encode(v)?).is_some() {
                        return Err(Fault::encode(format!("duplicate map key '{}'", wire_key)));
                    }
                }
                Ok(WireValue::Struct(members))
            }

            (TypeDescriptor::Reference(_), Value::Ref(opaque))
            | (TypeDescriptor::RecordOpt(_), Value::Ref(opaque)) => Ok(WireValue::String(opaque.clone())),

            (expected, found) => Err(Fault::type_mismatch(expected.to_string(), found.kind_name())),
        }
    }

    /// Value used for a record field the server left out.
    pub fn default_value(&self) -> Value {
        match self {
            TypeDescriptor::Primitive(PrimitiveKind::String) => Value::String(String::new()),
            TypeDescriptor::Primitive(PrimitiveKind::Int) => Value::Int(0),
            TypeDescriptor::Primitive(PrimitiveKind::Float) => Value::Float(0.0),
            TypeDescriptor::Primitive(PrimitiveKind::Bool) => Value::Bool(false),
            TypeDescriptor::Primitive(PrimitiveKind::DateTime) => Value::DateTime(DateTime::<Utc>::default()),
            TypeDescriptor::Enum(table) => Value::Enum(table.undefined_index()),
            TypeDescriptor::Struct(desc) => Value::Struct(desc.default_fields()),
            TypeDescriptor::Set(_) => Value::Set(Vec::new()),
            TypeDescriptor::Map(_, _) => Value::Map(Vec::new()),
            TypeDescriptor::Reference(_) | TypeDescriptor::RecordOpt(_) => Value::Ref(NULL_REF.to_string()),
        }
    }
}

fn decode_primitive(kind: PrimitiveKind, wire: &WireValue) -> Result<Value, Fault> {
    let mismatch = || Fault::type_mismatch(kind.name(), wire.type_name());
    match (kind, wire) {
        (PrimitiveKind::String, WireValue::String(s)) => Ok(Value::String(s.clone())),

        (PrimitiveKind::Int, WireValue::Int(i)) => Ok(Value::Int(*i)),
        // 64-bit integers travel as decimal strings over XML-RPC.
        (PrimitiveKind::Int, WireValue::String(s)) => s.trim().parse().map(Value::Int).map_err(|_| mismatch()),

        (PrimitiveKind::Float, WireValue::Double(x)) => Ok(Value::Float(*x)),
        (PrimitiveKind::Float, WireValue::Int(i)) => Ok(Value::Float(*i as f64)),
        (PrimitiveKind::Float, WireValue::String(s)) => s.trim().parse().map(Value::Float).map_err(|_| mismatch()),

        (PrimitiveKind::Bool, WireValue::Bool(b)) => Ok(Value::Bool(*b)),
        // Map keys carry booleans as their text form.
        (PrimitiveKind::Bool, WireValue::String(s)) => match s.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(mismatch()),
        },

        (PrimitiveKind::DateTime, WireValue::DateTime(s)) | (PrimitiveKind::DateTime, WireValue::String(s)) => {
            parse_datetime(s).map(Value::DateTime).ok_or_else(|| {
                warn!(text = %s, "unparseable datetime on the wire");
                mismatch()
            })
        }

        _ => Err(mismatch()),
    }
}

/// Accepts both the basic (`20240102T03:04:05Z`) and extended RFC 3339 forms.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y%m%dT%H:%M:%SZ", "%Y%m%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

// Map keys are struct member names on the wire, so they must render as text.
fn map_key_text(wire: WireValue) -> Result<String, Fault> {
    match wire {
        WireValue::String(s) | WireValue::DateTime(s) => Ok(s),
        WireValue::Int(i) => Ok(i.to_string()),
        WireValue::Double(x) => Ok(x.to_string()),
        WireValue::Bool(b) => Ok(b.to_string()),
        other => Err(Fault::encode(format!("{} cannot be used as a map key", other.type_name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::EnumTable;
    use crate::record::FieldDescriptor;
    use chrono::TimeZone;

    static COLOUR: EnumTable = EnumTable {
        name: "colour",
        variants: &["red", "green"],
    };

    static POINT: StructDescriptor = StructDescriptor {
        name: "point",
        fields: &[
            FieldDescriptor { wire_name: "x", ty: TypeDescriptor::int },
            FieldDescriptor { wire_name: "label", ty: TypeDescriptor::string },
        ],
    };

    fn ctx() -> DecodeContext {
        DecodeContext::new()
    }

    #[test]
    fn test_int_accepts_decimal_string() {
        let d = TypeDescriptor::int();
        assert_eq!(d.decode(&WireValue::from("1073741824"), &mut ctx()).unwrap(), Value::Int(1 << 30));
        assert_eq!(d.decode(&WireValue::Int(-3), &mut ctx()).unwrap(), Value::Int(-3));
        let err = d.decode(&WireValue::from("lots"), &mut ctx()).unwrap_err();
        assert_eq!(err, Fault::type_mismatch("int", "string"));
    }

    #[test]
    fn test_float_accepts_int() {
        let d = TypeDescriptor::float();
        assert_eq!(d.decode(&WireValue::Int(2), &mut ctx()).unwrap(), Value::Float(2.0));
    }

    #[test]
    fn test_bool_rejects_string() {
        let err = TypeDescriptor::bool().decode(&WireValue::from("true"), &mut ctx()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_datetime_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let d = TypeDescriptor::datetime();
        for text in ["20240102T03:04:05Z", "2024-01-02T03:04:05Z", "2024-01-02T03:04:05+00:00"] {
            assert_eq!(
                d.decode(&WireValue::DateTime(text.into()), &mut ctx()).unwrap(),
                Value::DateTime(expected),
                "form {}",
                text
            );
        }
        assert_eq!(
            d.encode(&Value::DateTime(expected)).unwrap(),
            WireValue::DateTime("20240102T03:04:05Z".into())
        );
    }

    #[test]
    fn test_set_of_refs() {
        let d = TypeDescriptor::set_of(TypeDescriptor::Reference("VM"));
        let wire = WireValue::Array(vec![WireValue::from("OpaqueRef:a"), WireValue::from("OpaqueRef:b")]);
        assert_eq!(
            d.decode(&wire, &mut ctx()).unwrap(),
            Value::Set(vec![Value::Ref("OpaqueRef:a".into()), Value::Ref("OpaqueRef:b".into())])
        );
        let err = d.decode(&WireValue::from("OpaqueRef:a"), &mut ctx()).unwrap_err();
        assert_eq!(err, Fault::type_mismatch("VM ref set", "string"));
    }

    #[test]
    fn test_map_keys_are_decoded_through_key_descriptor() {
        let d = TypeDescriptor::map_of(TypeDescriptor::int(), TypeDescriptor::string());
        let wire = WireValue::structure([("1", WireValue::from("one")), ("2", WireValue::from("two"))]);
        let value = d.decode(&wire, &mut ctx()).unwrap();
        assert_eq!(
            value,
            Value::Map(vec![
                (Value::Int(1), Value::String("one".into())),
                (Value::Int(2), Value::String("two".into())),
            ])
        );
        assert_eq!(d.encode(&value).unwrap(), wire);

        let flags = TypeDescriptor::map_of(TypeDescriptor::bool(), TypeDescriptor::string());
        let value = Value::Map(vec![
            (Value::Bool(true), Value::String("on".into())),
            (Value::Bool(false), Value::String("off".into())),
        ]);
        let wire = flags.encode(&value).unwrap();
        assert_eq!(wire.get("true"), Some(&WireValue::from("on")));
        assert_eq!(flags.decode(&wire, &mut ctx()).unwrap(), value);
    }

    #[test]
    fn test_bool_rejects_other_text() {
        let err = TypeDescriptor::bool().decode(&WireValue::from("yes"), &mut ctx()).unwrap_err();
        assert_eq!(err, Fault::type_mismatch("bool", "string"));
    }

    #[test]
    fn test_datetime_encode_rejects_sub_second_precision() {
        let d = TypeDescriptor::datetime();
        let whole = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            d.encode(&Value::DateTime(whole)).unwrap(),
            WireValue::DateTime("20240102T03:04:05Z".into())
        );

        let fractional = whole + chrono::Duration::milliseconds(500);
        let err = d.encode(&Value::DateTime(fractional)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Encode);
    }

    #[test]
    fn test_map_encode_rejects_duplicate_keys() {
        let d = TypeDescriptor::map_of(TypeDescriptor::string(), TypeDescriptor::int());
        let value = Value::Map(vec![
            (Value::String("k".into()), Value::Int(1)),
            (Value::String("k".into()), Value::Int(2)),
        ]);
        assert_eq!(d.encode(&value).unwrap_err().kind(), crate::ErrorKind::Encode);
    }

    #[test]
    fn test_enum_soft_fault() {
        let d = TypeDescriptor::Enum(&COLOUR);
        let mut context = ctx();
        assert_eq!(d.decode(&WireValue::from("green"), &mut context).unwrap(), Value::Enum(1));
        assert!(context.is_clean());
        assert_eq!(d.decode(&WireValue::from("mauve"), &mut context).unwrap(), Value::Enum(2));
        assert_eq!(context.soft_faults(), &[Fault::unknown_enumerant("colour", "mauve")]);
    }

    #[test]
    fn test_undefined_enumerant_is_not_encodable() {
        let d = TypeDescriptor::Enum(&COLOUR);
        assert_eq!(d.encode(&Value::Enum(0)).unwrap(), WireValue::from("red"));
        assert_eq!(d.encode(&Value::Enum(2)).unwrap_err().kind(), crate::ErrorKind::Encode);
    }

    #[test]
    fn test_record_opt_discrimination() {
        let d = TypeDescriptor::RecordOpt(&POINT);
        let bare = d.decode(&WireValue::from("OpaqueRef:p"), &mut ctx()).unwrap();
        assert_eq!(bare, Value::Ref("OpaqueRef:p".into()));

        let inline = d
            .decode(&WireValue::structure([("x", WireValue::Int(4))]), &mut ctx())
            .unwrap();
        match inline {
            Value::Struct(fields) => {
                assert_eq!(fields.get("x"), Some(&Value::Int(4)));
                assert_eq!(fields.get("label"), Some(&Value::String(String::new())));
            }
            other => panic!("expected struct, got {:?}", other),
        }

        assert!(d.decode(&WireValue::Int(1), &mut ctx()).is_err());
    }

    #[test]
    fn test_struct_field_failure_names_field() {
        let d = TypeDescriptor::Struct(&POINT);
        let wire = WireValue::structure([("x", WireValue::Bool(true))]);
        let err = d.decode(&wire, &mut ctx()).unwrap_err();
        assert_eq!(err, Fault::field_decode("x", Fault::type_mismatch("int", "boolean")));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TypeDescriptor::string().default_value(), Value::String(String::new()));
        assert_eq!(TypeDescriptor::Enum(&COLOUR).default_value(), Value::Enum(2));
        assert_eq!(
            TypeDescriptor::Reference("VM").default_value(),
            Value::Ref(NULL_REF.to_string())
        );
        assert_eq!(TypeDescriptor::set_of(TypeDescriptor::int()).default_value(), Value::Set(vec![]));
    }

    #[test]
    fn test_descriptor_display_and_eq() {
        let d = TypeDescriptor::map_of(TypeDescriptor::string(), TypeDescriptor::set_of(TypeDescriptor::Reference("VM")));
        assert_eq!(d.to_string(), "(string -> VM ref set) map");
        assert_eq!(TypeDescriptor::Struct(&POINT), TypeDescriptor::Struct(&POINT));
        assert_ne!(TypeDescriptor::Struct(&POINT), TypeDescriptor::RecordOpt(&POINT));
    }
}
