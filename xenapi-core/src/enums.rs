use tracing::warn;

use crate::descriptor::DecodeContext;
use crate::error::Fault;

/// Text used for the sentinel when an enum has to be shown to a human.
pub const UNDEFINED: &str = "undefined";

/// Lookup table for one enum class. Index `variants.len()` is the
/// `Undefined` sentinel, kept for enumerants newer than this client.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumTable {
    pub name: &'static str,
    pub variants: &'static [&'static str],
}

impl EnumTable {
    pub const fn new(name: &'static str, variants: &'static [&'static str]) -> Self {
        Self { name, variants }
    }

    pub fn undefined_index(&self) -> usize {
        self.variants.len()
    }

    pub fn is_undefined(&self, index: usize) -> bool {
        index >= self.variants.len()
    }

    /// Wire text for `index`. Out-of-range indices render as `undefined`.
    pub fn to_string(&self, index: usize) -> &'static str {
        self.variants.get(index).copied().unwrap_or(UNDEFINED)
    }

    /// Strict lookup.
    pub fn parse(&self, text: &str) -> Result<usize, Fault> {
        self.variants
            .iter()
            .position(|v| *v == text)
            .ok_or_else(|| Fault::unknown_enumerant(self.name, text))
    }

    /// Lenient lookup: an unknown enumerant yields the sentinel and leaves
    /// an `UnknownEnumerant` fault in `ctx`.
    pub fn from_string(&self, ctx: &mut DecodeContext, text: &str) -> usize {
        match self.parse(text) {
            Ok(index) => index,
            Err(fault) => {
                warn!(enum_name = self.name, value = %text, "unknown enumerant, using undefined");
                ctx.record_soft_fault(fault);
                self.undefined_index()
            }
        }
    }
}

/// Implemented by every enum declared with `xen_enum!`.
pub trait XenEnum: Copy + Eq + 'static {
    const TABLE: &'static EnumTable;
    const UNDEFINED: Self;

    fn index(self) -> usize;

    /// Out-of-range indices map to `UNDEFINED`.
    fn from_index(index: usize) -> Self;

    fn as_str(self) -> &'static str {
        Self::TABLE.to_string(self.index())
    }

    fn is_undefined(self) -> bool {
        self == Self::UNDEFINED
    }

    fn from_string(ctx: &mut DecodeContext, text: &str) -> Self {
        Self::from_index(Self::TABLE.from_string(ctx, text))
    }

    fn parse(text: &str) -> Result<Self, Fault> {
        Self::TABLE.parse(text).map(Self::from_index)
    }
}
