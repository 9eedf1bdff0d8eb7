//! Error types for byte I/O and VR codec failures.

use snafu::Snafu;
use std::io;

/// Result alias for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while decoding or encoding a data element's value payload.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The underlying stream failed while reading a value.
    #[snafu(display("failed to read value payload: {source}"))]
    ReadValue {
        /// The underlying I/O failure.
        source: io::Error,
    },

    /// The underlying stream failed while writing a value.
    #[snafu(display("failed to write value payload: {source}"))]
    WriteValue {
        /// The underlying I/O failure.
        source: io::Error,
    },

    /// A `DS`/`IS` numeric text token could not be parsed. Per policy,
    /// empty tokens are not an error (they become `0`); this variant is
    /// only raised for genuinely malformed, non-empty tokens.
    #[snafu(display("malformed numeric text token {token:?}"))]
    MalformedNumericText {
        /// The offending token.
        token: String,
    },

    /// The pixel element type is not one supported for writing.
    #[snafu(display("unsupported pixel data element type"))]
    UnsupportedPixelFormat,

    /// The VR codec was invoked for `SQ`; sequences are handled by the
    /// sequence/item engine, never by the scalar VR codec.
    #[snafu(display("SQ values are not handled by the scalar VR codec"))]
    UnexpectedSequenceVr,
}
