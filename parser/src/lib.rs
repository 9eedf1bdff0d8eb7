#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

//! The element codec and the sequence/item engine: the part of the
//! pipeline that turns a byte stream into a recursive tree of tagged
//! values (or back), given an already-chosen encoding mode.
//!
//! This crate does not know about any concrete data-set container type;
//! callers plug one in by implementing [`DataSetSink`]. `dicom-object`'s
//! in-memory data set is the sink used by the rest of this workspace.

pub mod error;
pub mod mode;
pub mod read;
pub mod sink;
pub mod write;

pub use error::{Error, Result};
pub use mode::{Mode, VrOverrideMap};
pub use sink::DataSetSink;
