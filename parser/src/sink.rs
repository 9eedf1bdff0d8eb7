//! The interface the sequence/item engine uses to build whatever concrete
//! data-set container a caller has (so that this crate never needs to
//! know about `dicom-object`).

use dicom_core::header::{Length, Tag};
use dicom_core::value::{PixelFragmentSequence, PrimitiveValue};
use dicom_core::VR;

/// A builder for one level of a DICOM data set (the top-level body, or a
/// single sequence item), fed incrementally by the sequence/item engine
/// as it decodes elements in tag order.
pub trait DataSetSink: Sized {
    /// Start an empty builder, used both for the top-level data set and
    /// for each item of a sequence.
    fn new() -> Self;

    /// Record a decoded primitive-valued element.
    fn insert_primitive(&mut self, tag: Tag, vr: VR, value: PrimitiveValue);

    /// Record a decoded sequence element and its already-built items.
    fn insert_sequence(&mut self, tag: Tag, items: Vec<Self>, declared_len: Length);

    /// Record a decoded encapsulated pixel data element.
    fn insert_pixel_sequence(&mut self, tag: Tag, fragments: PixelFragmentSequence);
}
