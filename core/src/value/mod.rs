//! The in-memory value model: primitive scalars/arrays and the composite
//! value wrapper used by data elements (primitive, sequence, encapsulated
//! pixel fragments).

use smallvec::SmallVec;
use std::fmt;

use crate::header::{Length, Tag};

/// A primitive DICOM value: the payload decoded from a single data
/// element's bytes, before any sequence nesting is considered.
///
/// Multi-valued primitives use [`SmallVec`] so that the common case of a
/// handful of values (or a single one) avoids a heap allocation. Per the
/// "singleton collapse" rule, a one-element array decodes to its scalar
/// variant rather than a one-element list.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    /// No value (zero-length element).
    Empty,
    /// A single text value (e.g. after singleton collapse of a `\`-list).
    Str(String),
    /// A list of `\`-separated text values.
    Strs(SmallVec<[String; 2]>),
    /// A run of bytes, for `OB`/`UN` and similar untyped payloads.
    U8(SmallVec<[u8; 8]>),
    /// Signed 16-bit integers (`SS`).
    I16(SmallVec<[i16; 4]>),
    /// Unsigned 16-bit integers (`US`), and the default element type for
    /// native pixel data with `bits_allocated <= 16`.
    U16(SmallVec<[u16; 4]>),
    /// Signed 32-bit integers (`SL`).
    I32(SmallVec<[i32; 2]>),
    /// Unsigned 32-bit integers (`UL`).
    U32(SmallVec<[u32; 2]>),
    /// Single-precision floats (`FL`).
    F32(SmallVec<[f32; 2]>),
    /// Double-precision floats (`FD`).
    F64(SmallVec<[f64; 2]>),
    /// Attribute tags (`AT`).
    Tags(SmallVec<[Tag; 2]>),
}

impl PrimitiveValue {
    /// The number of individual values held (not bytes).
    pub fn multiplicity(&self) -> u32 {
        match self {
            PrimitiveValue::Empty => 0,
            PrimitiveValue::Str(_) => 1,
            PrimitiveValue::Strs(v) => v.len() as u32,
            PrimitiveValue::U8(v) => v.len() as u32,
            PrimitiveValue::I16(v) => v.len() as u32,
            PrimitiveValue::U16(v) => v.len() as u32,
            PrimitiveValue::I32(v) => v.len() as u32,
            PrimitiveValue::U32(v) => v.len() as u32,
            PrimitiveValue::F32(v) => v.len() as u32,
            PrimitiveValue::F64(v) => v.len() as u32,
            PrimitiveValue::Tags(v) => v.len() as u32,
        }
    }

    /// Whether this value holds nothing.
    pub fn is_empty(&self) -> bool {
        self.multiplicity() == 0
    }

    /// View this value as a single text string, joining a multi-valued
    /// list with the DICOM backslash separator. Returns `None` for
    /// non-textual variants.
    pub fn to_str(&self) -> Option<String> {
        match self {
            PrimitiveValue::Str(s) => Some(s.clone()),
            PrimitiveValue::Strs(v) => Some(v.join("\\")),
            _ => None,
        }
    }

    /// Collapse a one-element multi-valued variant into its scalar form.
    /// Applied once after decoding, and once more if the result is again
    /// a singleton container, per the documented "singleton collapse".
    pub fn collapse(self) -> Self {
        let once = collapse_once(self);
        collapse_once(once)
    }
}

fn collapse_once(v: PrimitiveValue) -> PrimitiveValue {
    match v {
        PrimitiveValue::Strs(ref v2) if v2.len() == 1 => {
            PrimitiveValue::Str(v2[0].clone())
        }
        other => other,
    }
}

/// An ordered list of opaque encapsulated pixel data fragments, alongside
/// the leading Basic Offset Table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PixelFragmentSequence {
    /// The raw bytes of the Basic Offset Table (the sequence's first item).
    pub offset_table: Vec<u8>,
    /// The compressed fragments, in encoded order.
    pub fragments: Vec<Vec<u8>>,
}

/// The value of a data element: either a primitive value, a nested
/// sequence of items of type `I` (typically a full data set), or an
/// encapsulated pixel data fragment sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<I> {
    /// A primitive (non-nested) value.
    Primitive(PrimitiveValue),
    /// A sequence of items (`VR = SQ`).
    Sequence {
        /// The contained items, in encoded order.
        items: Vec<I>,
        /// The original declared length, kept for round-trip fidelity
        /// (may be [`Length::UNDEFINED`]).
        size: Length,
    },
    /// An encapsulated pixel data fragment sequence.
    PixelSequence(PixelFragmentSequence),
}

impl<I> Value<I> {
    /// Build a primitive value.
    pub fn new_primitive(value: impl Into<PrimitiveValue>) -> Self {
        Value::Primitive(value.into())
    }

    /// Build a sequence value of undefined length.
    pub fn new_sequence(items: Vec<I>) -> Self {
        Value::Sequence {
            items,
            size: Length::UNDEFINED,
        }
    }

    /// View this value as a primitive, if it is one.
    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Value::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// View this value's items, if it is a sequence.
    pub fn items(&self) -> Option<&[I]> {
        match self {
            Value::Sequence { items, .. } => Some(items),
            _ => None,
        }
    }
}

impl<I> From<PrimitiveValue> for Value<I> {
    fn from(p: PrimitiveValue) -> Self {
        Value::Primitive(p)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(s: &str) -> Self {
        PrimitiveValue::Str(s.to_string())
    }
}

impl From<String> for PrimitiveValue {
    fn from(s: String) -> Self {
        PrimitiveValue::Str(s)
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrimitiveValue::Empty => write!(f, ""),
            PrimitiveValue::Str(s) => write!(f, "{}", s),
            PrimitiveValue::Strs(v) => write!(f, "{}", v.join("\\")),
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_collapse_unwraps_one_element_list() {
        let mut v: SmallVec<[String; 2]> = SmallVec::new();
        v.push("MR".to_string());
        let collapsed = PrimitiveValue::Strs(v).collapse();
        assert_eq!(collapsed, PrimitiveValue::Str("MR".to_string()));
    }

    #[test]
    fn multi_value_is_not_collapsed() {
        let mut v: SmallVec<[String; 2]> = SmallVec::new();
        v.push("A".to_string());
        v.push("B".to_string());
        let value = PrimitiveValue::Strs(v.clone());
        assert_eq!(value.collapse(), PrimitiveValue::Strs(v));
    }
}
