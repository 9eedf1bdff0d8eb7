//! Top-level error types: file I/O and meta-group construction failures,
//! and attribute access failures on the in-memory data-set model.

use dicom_core::Tag;
use snafu::Snafu;
use std::io;

/// Result alias for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can arise while opening, parsing, or writing a DICOM
/// object, or while accessing its attributes.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Failure while reading or validating the preamble and file meta group.
    #[snafu(display("{source}"))]
    Meta {
        /// The underlying meta-group failure.
        source: crate::meta::Error,
    },

    /// Failure from the element codec / sequence engine.
    #[snafu(display("{source}"))]
    Parse {
        /// The underlying parse failure.
        source: dicom_parser::Error,
    },

    /// Failure performing file I/O.
    #[snafu(display("I/O error: {source}"))]
    Io {
        /// The underlying I/O failure.
        source: io::Error,
    },

    /// A required element was missing from the data set.
    #[snafu(display("missing required element {tag}"))]
    MissingElement {
        /// The tag that was required but absent.
        tag: Tag,
    },

    /// An element's value could not be interpreted in the way requested.
    #[snafu(display("could not interpret value of {tag} as {expected}"))]
    CastValue {
        /// The tag whose value failed to cast.
        tag: Tag,
        /// A description of the expected shape.
        expected: &'static str,
    },
}

impl From<dicom_parser::Error> for Error {
    fn from(source: dicom_parser::Error) -> Self {
        Error::Parse { source }
    }
}

impl From<crate::meta::Error> for Error {
    fn from(source: crate::meta::Error) -> Self {
        Error::Meta { source }
    }
}
