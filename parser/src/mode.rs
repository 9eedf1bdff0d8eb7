//! The active encoding mode (endianness + VR explicitness), and the
//! per-tag VR override map used by the "headless"/user-overridden-VR
//! escape hatches.

use byteordered::Endianness;
use dicom_core::{Tag, VR};
use std::collections::HashMap;

/// The tag used as the wildcard key of a [`VrOverrideMap`]: supplies a
/// fallback VR for otherwise-unknown tags.
pub const WILDCARD_TAG: Tag = Tag(0x0000, 0x0000);

/// A per-tag value representation override.
///
/// Mapping a tag to `None` means "skip this element": the element's
/// declared bytes are consumed but no value is produced. The
/// [`WILDCARD_TAG`] entry, if present, supplies a fallback VR for tags
/// that would otherwise be unresolvable.
pub type VrOverrideMap = HashMap<Tag, Option<VR>>;

/// The active endianness and VR explicitness. Distinct element reads can
/// temporarily use a different mode than the data set's overall mode: the
/// meta group is always read as `Mode { endianness: Little, explicit_vr:
/// true }` regardless of the body's mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    /// The active endianness.
    pub endianness: Endianness,
    /// Whether the value representation is explicit on the wire.
    pub explicit_vr: bool,
}

impl Mode {
    /// The file meta group's fixed mode: always little-endian, explicit.
    pub const META: Mode = Mode {
        endianness: Endianness::Little,
        explicit_vr: true,
    };

    /// Build a mode from its parts.
    pub fn new(endianness: Endianness, explicit_vr: bool) -> Self {
        Mode {
            endianness,
            explicit_vr,
        }
    }

    /// The mode to actually use for a given tag: the meta group forces
    /// its own fixed mode regardless of what `self` is.
    pub fn effective_for(self, tag: Tag) -> Mode {
        if tag.is_meta() {
            Mode::META
        } else {
            self
        }
    }
}
