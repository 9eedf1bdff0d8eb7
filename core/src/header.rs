//! The DICOM attribute tag, value representation, element length and
//! data element header types.

use std::cmp::Ordering;
use std::fmt;
use std::str::{from_utf8, FromStr};

use crate::value::Value;

/// Idiomatic alias for a tag's group number.
pub type GroupNumber = u16;
/// Idiomatic alias for a tag's element number.
pub type ElementNumber = u16;

/// A trait for data types that carry a DICOM element header.
pub trait Header {
    /// The element's tag as a `(group, element)` pair.
    fn tag(&self) -> Tag;

    /// The declared length of the element's value, in bytes. May be
    /// [`Length::UNDEFINED`] for sequences and encapsulated pixel data.
    fn len(&self) -> Length;

    /// Whether the header is empty, by declared length.
    fn is_empty(&self) -> bool {
        self.len() == Length(0)
    }

    /// Whether this is the header of a sequence/fragment item.
    fn is_item(&self) -> bool {
        self.tag() == Tag(0xFFFE, 0xE000)
    }

    /// Whether this is the header of an item delimiter.
    fn is_item_delimiter(&self) -> bool {
        self.tag() == Tag(0xFFFE, 0xE00D)
    }

    /// Whether this is the header of a sequence delimiter.
    fn is_sequence_delimiter(&self) -> bool {
        self.tag() == Tag(0xFFFE, 0xE0DD)
    }
}

/// A DICOM attribute tag: a pair of 16-bit group and element numbers.
/// Tags order and compare lexicographically on `(group, element)`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub GroupNumber, pub ElementNumber);

impl Tag {
    /// The item tag used to delimit sequence/fragment items.
    pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
    /// The tag used to delimit an item of undefined length.
    pub const ITEM_DELIMITER: Tag = Tag(0xFFFE, 0xE00D);
    /// The tag used to delimit a sequence of undefined length.
    pub const SEQUENCE_DELIMITER: Tag = Tag(0xFFFE, 0xE0DD);

    /// This tag's group.
    #[inline]
    pub fn group(self) -> GroupNumber {
        self.0
    }

    /// This tag's element.
    #[inline]
    pub fn element(self) -> ElementNumber {
        self.1
    }

    /// Whether this tag is one of the three item/sequence delimiters,
    /// which are always implicitly encoded regardless of transfer syntax.
    pub fn is_delimiter(self) -> bool {
        matches!(
            self,
            Tag::ITEM | Tag::ITEM_DELIMITER | Tag::SEQUENCE_DELIMITER
        )
    }

    /// Whether this tag is the item delimiter.
    pub fn is_item_delimiter(self) -> bool {
        self == Tag::ITEM_DELIMITER
    }

    /// Whether this tag is the sequence delimiter.
    pub fn is_sequence_delimiter(self) -> bool {
        self == Tag::SEQUENCE_DELIMITER
    }

    /// Whether this tag belongs to the file meta group (`0002,xxxx`),
    /// which is always little-endian and explicit VR.
    pub fn is_meta(self) -> bool {
        self.0 <= 0x0002
    }

    /// Whether this tag is a private attribute: an odd group number
    /// above the meta group.
    pub fn is_private(self) -> bool {
        self.0 % 2 == 1 && self.0 > 0x0008
    }

    /// Whether this tag is a private creator slot: odd private group,
    /// element in `0x0010..=0x00FF`.
    ///
    /// The standard's own wording for this range check is often
    /// mistyped as `<+`; the intended comparison is an inclusive range.
    pub fn is_private_creator(self) -> bool {
        self.is_private() && (0x0010..=0x00FF).contains(&self.1)
    }

    /// Whether this tag's element is the group-length placeholder.
    pub fn is_group_length(self) -> bool {
        self.1 == 0x0000
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({:#06X}, {:#06X})", self.0, self.1)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

impl From<(u16, u16)> for Tag {
    fn from((g, e): (u16, u16)) -> Self {
        Tag(g, e)
    }
}

impl From<Tag> for (u16, u16) {
    fn from(t: Tag) -> Self {
        (t.0, t.1)
    }
}

/// The value representation of a data element: a closed set of two-letter
/// codes defining the payload's type and wire layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum VR {
    AE,
    AS,
    AT,
    CS,
    DA,
    DS,
    DT,
    FL,
    FD,
    IS,
    LO,
    LT,
    OB,
    OF,
    OW,
    PN,
    SH,
    SL,
    SQ,
    SS,
    ST,
    TM,
    UI,
    UL,
    UN,
    US,
    UT,
}

impl VR {
    /// Parse a VR from its two-character ASCII wire representation.
    pub fn from_binary(chars: [u8; 2]) -> Option<Self> {
        from_utf8(&chars).ok().and_then(|s| VR::from_str(s).ok())
    }

    /// This VR's two-character string form.
    pub fn to_str(self) -> &'static str {
        use VR::*;
        match self {
            AE => "AE",
            AS => "AS",
            AT => "AT",
            CS => "CS",
            DA => "DA",
            DS => "DS",
            DT => "DT",
            FL => "FL",
            FD => "FD",
            IS => "IS",
            LO => "LO",
            LT => "LT",
            OB => "OB",
            OF => "OF",
            OW => "OW",
            PN => "PN",
            SH => "SH",
            SL => "SL",
            SQ => "SQ",
            SS => "SS",
            ST => "ST",
            TM => "TM",
            UI => "UI",
            UL => "UL",
            UN => "UN",
            US => "US",
            UT => "UT",
        }
    }

    /// This VR's two-byte wire representation.
    pub fn to_bytes(self) -> [u8; 2] {
        let b = self.to_str().as_bytes();
        [b[0], b[1]]
    }

    /// Whether the explicit-VR header for this VR uses the "long" layout:
    /// two reserved bytes followed by a 4-byte length, rather than a plain
    /// 2-byte length.
    pub fn has_explicit_long_length(self) -> bool {
        matches!(self, VR::OB | VR::OW | VR::OF | VR::SQ | VR::UT | VR::UN)
    }
}

impl FromStr for VR {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use VR::*;
        Ok(match s {
            "AE" => AE,
            "AS" => AS,
            "AT" => AT,
            "CS" => CS,
            "DA" => DA,
            "DS" => DS,
            "DT" => DT,
            "FL" => FL,
            "FD" => FD,
            "IS" => IS,
            "LO" => LO,
            "LT" => LT,
            "OB" => OB,
            "OF" => OF,
            "OW" => OW,
            "PN" => PN,
            "SH" => SH,
            "SL" => SL,
            "SQ" => SQ,
            "SS" => SS,
            "ST" => ST,
            "TM" => TM,
            "UI" => UI,
            "UL" => UL,
            "UN" => UN,
            "US" => US,
            "UT" => UT,
            _ => return Err("not a recognised value representation"),
        })
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// The length of a data element's value, in bytes. The reserved value
/// `0xFFFF_FFFF` denotes an undefined length (sequences, encapsulated
/// pixel data).
#[derive(Debug, Clone, Copy, Eq, Hash)]
pub struct Length(pub u32);

const UNDEFINED_LEN: u32 = 0xFFFF_FFFF;

impl Length {
    /// The reserved undefined-length sentinel.
    pub const UNDEFINED: Self = Length(UNDEFINED_LEN);

    /// Whether this length is the undefined-length sentinel.
    #[inline]
    pub fn is_undefined(self) -> bool {
        self.0 == UNDEFINED_LEN
    }

    /// This length rounded up to the next even value, unless undefined.
    pub fn padded_even(self) -> Self {
        if self.is_undefined() || self.0 % 2 == 0 {
            self
        } else {
            Length(self.0 + 1)
        }
    }
}

impl PartialEq for Length {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Length {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.0.cmp(&other.0))
    }
}

impl From<u32> for Length {
    fn from(v: u32) -> Self {
        Length(v)
    }
}

impl From<Length> for u32 {
    fn from(l: Length) -> Self {
        l.0
    }
}

/// The header of a data element: its tag, value representation and
/// declared length. Does not include the value payload itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataElementHeader {
    /// The element's tag.
    pub tag: Tag,
    /// The element's value representation.
    pub vr: VR,
    /// The element's declared value length.
    pub len: Length,
}

impl DataElementHeader {
    /// Build a new header from its parts.
    pub fn new(tag: Tag, vr: VR, len: Length) -> Self {
        DataElementHeader { tag, vr, len }
    }
}

impl Header for DataElementHeader {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn len(&self) -> Length {
        self.len
    }
}

/// An owned data element: a header plus its value, which may be a
/// primitive value or a nested sequence of items (`I`).
#[derive(Debug, Clone, PartialEq)]
pub struct DataElement<I> {
    header: DataElementHeader,
    value: Value<I>,
}

impl<I> DataElement<I> {
    /// Build a data element from its header and value.
    pub fn new(tag: Tag, vr: VR, value: impl Into<Value<I>>) -> Self {
        DataElement {
            header: DataElementHeader::new(tag, vr, Length(0)),
            value: value.into(),
        }
    }

    /// This element's value representation.
    pub fn vr(&self) -> VR {
        self.header.vr
    }

    /// This element's value.
    pub fn value(&self) -> &Value<I> {
        &self.value
    }

    /// Consume the element, returning its value.
    pub fn into_value(self) -> Value<I> {
        self.value
    }
}

impl<I> Header for DataElement<I> {
    fn tag(&self) -> Tag {
        self.header.tag
    }

    fn len(&self) -> Length {
        self.header.len
    }
}

