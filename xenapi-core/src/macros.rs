//! Declarative macros used by generated class bindings.

/// Declare an enum class with its lookup table.
///
/// An `Undefined` variant is appended; it stands for enumerants the server
/// knows and this client does not.
///
/// # Example
///
/// ```rust
/// use xenapi_core::{xen_enum, DecodeContext, XenEnum};
///
/// xen_enum! {
///     pub enum OnBoot : "on_boot" {
///         Reset => "reset",
///         Persist => "persist",
///     }
/// }
///
/// assert_eq!(OnBoot::Persist.as_str(), "persist");
/// assert_eq!(OnBoot::parse("reset").unwrap(), OnBoot::Reset);
///
/// let mut ctx = DecodeContext::new();
/// assert_eq!(OnBoot::from_string(&mut ctx, "shred"), OnBoot::Undefined);
/// assert_eq!(ctx.soft_faults().len(), 1);
/// ```
#[macro_export]
macro_rules! xen_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $wire_name:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// Enumerant unknown to this client.
            #[default]
            Undefined,
        }

        impl $name {
            /// Every known variant, in table order.
            pub const VARIANTS: &'static [$name] = &[ $( $name::$variant ),+ ];
        }

        impl $crate::XenEnum for $name {
            const TABLE: &'static $crate::EnumTable = &$crate::EnumTable {
                name: $wire_name,
                variants: &[ $( $text ),+ ],
            };
            const UNDEFINED: Self = $name::Undefined;

            fn index(self) -> usize {
                self as usize
            }

            fn from_index(index: usize) -> Self {
                Self::VARIANTS.get(index).copied().unwrap_or($name::Undefined)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(<$name as $crate::XenEnum>::as_str(*self))
            }
        }

        impl $crate::XenType for $name {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::Enum(<$name as $crate::XenEnum>::TABLE)
            }

            fn from_value(value: $crate::Value) -> ::std::result::Result<Self, $crate::Fault> {
                match value {
                    $crate::Value::Enum(index) => Ok(<$name as $crate::XenEnum>::from_index(index)),
                    other => Err($crate::Fault::type_mismatch($wire_name, other.kind_name())),
                }
            }

            fn to_value(&self) -> $crate::Value {
                $crate::Value::Enum(<$name as $crate::XenEnum>::index(*self))
            }
        }
    };
}

/// Declare a record class: the struct, its static field tables and its
/// `Record`/`XenType` implementations.
///
/// A `uuid: String` field is required; the generated `handle` member is
/// filled from it after every decode and is never sent on the wire.
///
/// # Example
///
/// ```rust
/// use xenapi_core::{xen_record, Record, XenSet, XenType};
///
/// xen_record! {
///     pub struct Pool : "pool" {
///         uuid: String => "uuid",
///         name_label: String => "name_label",
///         tags: XenSet<String> => "tags",
///     }
/// }
///
/// let pool = Pool { uuid: "p-1".into(), name_label: "lab".into(), ..Default::default() };
/// let back = Pool::from_value(pool.to_value()).unwrap();
/// assert_eq!(back.name_label, "lab");
/// assert_eq!(back.handle().as_str(), "p-1");
/// ```
#[macro_export]
macro_rules! xen_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $class:literal {
            $( $(#[$fmeta:meta])* $field:ident : $fty:ty => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default)]
        $vis struct $name {
            /// Client-side handle, copied from `uuid` after decoding.
            pub handle: $crate::Ref<$name>,
            $( $(#[$fmeta])* pub $field: $fty, )+
        }

        impl $crate::Record for $name {
            const CLASS: &'static str = $class;

            fn struct_descriptor() -> &'static $crate::StructDescriptor {
                static FIELDS: &[$crate::FieldDescriptor] = &[
                    $( $crate::FieldDescriptor {
                        wire_name: $wire,
                        ty: <$fty as $crate::XenType>::descriptor,
                    }, )+
                ];
                static DESCRIPTOR: $crate::StructDescriptor = $crate::StructDescriptor {
                    name: $class,
                    fields: FIELDS,
                };
                &DESCRIPTOR
            }

            fn field_entries() -> &'static [$crate::FieldEntry<Self>] {
                static ENTRIES: &[$crate::FieldEntry<$name>] = &[
                    $( $crate::FieldEntry {
                        wire_name: $wire,
                        ty: <$fty as $crate::XenType>::descriptor,
                        get: |r: &$name| $crate::XenType::to_value(&r.$field),
                        set: |r: &mut $name, v: $crate::Value| {
                            r.$field = <$fty as $crate::XenType>::from_value(v)?;
                            Ok(())
                        },
                    }, )+
                ];
                ENTRIES
            }

            fn uuid(&self) -> &str {
                &self.uuid
            }

            fn handle(&self) -> &$crate::Ref<Self> {
                &self.handle
            }

            fn set_handle(&mut self, handle: $crate::Ref<Self>) {
                self.handle = handle;
            }
        }

        impl $crate::XenType for $name {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::Struct(<$name as $crate::Record>::struct_descriptor())
            }

            fn from_value(value: $crate::Value) -> ::std::result::Result<Self, $crate::Fault> {
                $crate::record::record_from_value(value)
            }

            fn to_value(&self) -> $crate::Value {
                $crate::Value::Struct(<$name as $crate::Record>::to_struct_value(self))
            }
        }
    };
}
