#![deny(unsafe_code)]

//! The small, closed table of transfer syntaxes this reader/writer
//! understands: the endianness and VR explicitness each UID implies.
//!
//! Unlike a full DICOM toolkit's registry (which must also carry a pixel
//! data codec per compressed transfer syntax), this registry only ever
//! needs to answer "how is the body of this file encoded" — compressed
//! transfer syntaxes still resolve to an endianness/explicitness pair
//! here, since their *pixel data* fragments are opaque bytes to us (see
//! the Pixel-Data Engine), but everything else in the stream still has a
//! regular element encoding that must be parsed.

use byteordered::Endianness;
use tracing::debug;

/// The encoding mode implied by a transfer syntax: its endianness and
/// whether the VR is explicit on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSyntax {
    /// The transfer syntax UID.
    pub uid: &'static str,
    /// A human-readable name, for diagnostics.
    pub name: &'static str,
    /// The endianness of the body.
    pub endianness: Endianness,
    /// Whether value representations are explicit on the wire.
    pub explicit_vr: bool,
}

macro_rules! ts {
    ($uid:expr, $name:expr, $endian:expr, $explicit:expr) => {
        TransferSyntax {
            uid: $uid,
            name: $name,
            endianness: $endian,
            explicit_vr: $explicit,
        }
    };
}

/// Implicit VR Little Endian.
pub const IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = ts!(
    "1.2.840.10008.1.2",
    "Implicit VR Little Endian",
    Endianness::Little,
    false
);

/// Explicit VR Little Endian.
pub const EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = ts!(
    "1.2.840.10008.1.2.1",
    "Explicit VR Little Endian",
    Endianness::Little,
    true
);

/// Deflated Explicit VR Little Endian. The deflate framing itself is out
/// of scope (an external collaborator would wrap the stream before it
/// reaches this crate); the body's element encoding is identical to
/// plain Explicit VR Little Endian.
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = ts!(
    "1.2.840.10008.1.2.1.99",
    "Deflated Explicit VR Little Endian",
    Endianness::Little,
    true
);

/// Explicit VR Big Endian (retired).
pub const EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = ts!(
    "1.2.840.10008.1.2.2",
    "Explicit VR Big Endian",
    Endianness::Big,
    true
);

const TABLE: &[TransferSyntax] = &[
    IMPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_LITTLE_ENDIAN,
    DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_BIG_ENDIAN,
];

/// The encoding mode assumed when no Transfer Syntax UID is present in
/// the file meta group at all.
pub const DEFAULT_WHEN_ABSENT: TransferSyntax = ts!("", "(absent)", Endianness::Little, false);

/// The encoding mode assumed for a Transfer Syntax UID that is present
/// but not recognised by this registry.
pub const DEFAULT_WHEN_UNKNOWN: TransferSyntax = ts!("", "(unknown)", Endianness::Little, true);

/// Look up a transfer syntax by UID, trimming any trailing padding NUL or
/// space the way UI-VR values commonly carry. Returns `None` for UIDs not
/// in the closed table; callers should fall back to
/// [`DEFAULT_WHEN_UNKNOWN`] in that case, per the documented
/// `TransferSyntaxUnknown` recovery policy.
pub fn lookup(uid: &str) -> Option<TransferSyntax> {
    let trimmed = uid.trim_end_matches(['\0', ' ']);
    let found = TABLE.iter().copied().find(|ts| ts.uid == trimmed);
    if found.is_none() {
        debug!(uid = trimmed, "transfer syntax UID not recognised");
    }
    found
}

/// Resolve the encoding mode for an optional Transfer Syntax UID,
/// applying the documented defaulting rules: absent UID defaults to
/// (little, implicit); an unrecognised UID defaults to (little, explicit).
pub fn resolve(uid: Option<&str>) -> TransferSyntax {
    match uid {
        None => DEFAULT_WHEN_ABSENT,
        Some(uid) => lookup(uid).unwrap_or(DEFAULT_WHEN_UNKNOWN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_uids() {
        assert_eq!(
            lookup("1.2.840.10008.1.2.1").unwrap().uid,
            EXPLICIT_VR_LITTLE_ENDIAN.uid
        );
        assert_eq!(lookup("1.2.840.10008.1.2.2").unwrap().endianness, Endianness::Big);
    }

    #[test]
    fn absent_uid_defaults_to_implicit_little() {
        let ts = resolve(None);
        assert_eq!(ts.endianness, Endianness::Little);
        assert!(!ts.explicit_vr);
    }

    #[test]
    fn unknown_uid_defaults_to_explicit_little() {
        let ts = resolve(Some("1.2.3.4.5.6.7.8.9"));
        assert_eq!(ts.endianness, Endianness::Little);
        assert!(ts.explicit_vr);
    }

    #[test]
    fn trims_padding_byte_before_lookup() {
        assert!(lookup("1.2.840.10008.1.2.1\0").is_some());
    }
}
