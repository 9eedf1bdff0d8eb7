#![deny(unsafe_code)]
#![warn(missing_debug_implementations, unused_qualifications)]

//! Core types shared across the DICOM reader/writer pipeline: the attribute
//! tag, the value representation, the data element header, the primitive
//! value model, and the error types that the higher crates build upon.

pub mod dictionary;
pub mod error;
pub mod header;
pub mod value;

pub use dictionary::DataDictionary;
pub use error::{Error, Result};
pub use header::{DataElementHeader, Header, Length, Tag, VR};
pub use value::{PrimitiveValue, Value};
