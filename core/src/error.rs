//! Error types shared by the core value model.

use snafu::Snafu;

/// Result alias for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can arise while constructing or casting a core value.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// A value was read in an unexpected shape (e.g. primitive vs. sequence).
    #[snafu(display("unexpected value representation for tag"))]
    UnexpectedValueRepresentation,

    /// A value could not be cast to the requested type.
    #[snafu(display("failed to cast value: {reason}"))]
    CastValue {
        /// Why the cast failed.
        reason: String,
    },

    /// A numeric text token (`DS`/`IS`) could not be parsed.
    #[snafu(display("malformed numeric text token: {token:?}"))]
    MalformedNumericText {
        /// The offending token.
        token: String,
    },
}
