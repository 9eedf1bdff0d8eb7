//! A high-level abstraction for reading and manipulating DICOM objects.
//!
//! At this level, an object is a tag-ordered dictionary of elements, some
//! of which may themselves nest further objects. Most interaction happens
//! through [`InMemDicomObject`], which can be built from scratch or parsed
//! from a file or stream; see the [`mem`] module for its full API.
//!
//! Whole-file concerns - the 128-byte preamble, the file meta group, and
//! directory traversal - live in the [`file`] module, reachable through
//! the [`open_file`] and [`save_file`] shortcuts. Pixel Data decoding and
//! rescaling live in [`pixeldata`].

pub mod error;
pub mod file;
pub mod mem;
pub mod meta;
pub mod pixeldata;

pub use error::{Error, Result};
pub use file::{
    from_reader, from_reader_with_options, open_file, open_file_with_options, parse_directory,
    save_file, to_writer, DirWalkOptions, FileDicomObject, OpenFileOptions, WriteOptions,
};
pub use mem::{InMemDicomObject, RescaleDirection};
pub use meta::{FileMetaTable, FileMetaTableBuilder};
pub use pixeldata::{
    decode_pixel_data, encapsulated_fragments, rescale_backward, rescale_forward,
    DecodedPixelData, PixelBuffer, SampleFormat,
};

/// The implementation class UID this crate reports when writing a file
/// meta group and no other UID was supplied.
pub const IMPLEMENTATION_CLASS_UID: &str = "2.25.96070374161880830712831243360334214331";

/// The implementation version name this crate reports alongside
/// [`IMPLEMENTATION_CLASS_UID`].
pub const IMPLEMENTATION_VERSION_NAME: &str = "DICOM-RS-OBJECT-0.1";

/// A convenient alias for the object type produced by this crate's
/// parsing entry points.
pub type DefaultDicomObject = FileDicomObject;
