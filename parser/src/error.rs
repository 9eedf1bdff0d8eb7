//! Error types for the element codec and sequence/item engine.

use dicom_core::{Tag, VR};
use snafu::Snafu;
use std::io;

/// Result alias for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can arise while decoding or encoding a data set body.
///
/// `UnexpectedEndOfStream` at the very start of an element is *not*
/// represented here: it is the graceful parse terminator and is surfaced
/// to callers as a normal (non-error) stop condition. This variant only
/// covers end-of-stream in the middle of an element, which is fatal.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The stream ended partway through an element; a complete tag,
    /// length, or value payload could not be read.
    #[snafu(display("unexpected end of stream while reading an element"))]
    UnexpectedEndOfStream,

    /// I/O failure not related to end-of-stream.
    #[snafu(display("I/O error while parsing a data element: {source}"))]
    Io {
        /// The underlying I/O failure.
        source: io::Error,
    },

    /// No VR could be determined for a tag: not in the dictionary, not in
    /// the override map, and not covered by the private-group fallback.
    #[snafu(display("no value representation available for tag {tag}"))]
    UnknownTag {
        /// The tag with no resolvable VR.
        tag: Tag,
    },

    /// An item tag (`FFFE,E000`) was expected at this position in a
    /// sequence or in encapsulated pixel data, but something else was
    /// found.
    #[snafu(display("expected item tag in sequence, found {found}"))]
    BadSequenceFraming {
        /// The tag actually encountered.
        found: Tag,
    },

    /// A failure from the VR codec (numeric text, pixel format, etc).
    #[snafu(display("{source}"))]
    Encoding {
        /// The underlying VR codec failure.
        source: dicom_encoding::Error,
    },

    /// Pixel Data was about to be written with a VR other than `OW` while
    /// the active mode is implicit VR, which has no way to carry any VR
    /// but the dictionary default for the tag.
    #[snafu(display("cannot write pixel data as {vr} under implicit VR (must be OW)"))]
    ImplicitVrPixelSizeMismatch {
        /// The VR that was about to be written.
        vr: VR,
    },
}

impl From<dicom_encoding::Error> for Error {
    fn from(source: dicom_encoding::Error) -> Self {
        Error::Encoding { source }
    }
}
