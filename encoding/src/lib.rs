#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

//! Positioned byte I/O with an endianness adapter, and the per-VR codec
//! that turns a declared-length byte run into a [`PrimitiveValue`] and
//! back.
//!
//! [`PrimitiveValue`]: dicom_core::PrimitiveValue

pub mod endian;
pub mod error;
pub mod text;
pub mod vr;

pub use endian::{Endianness, TransferSyntaxIo};
pub use error::{Error, Result};
