//! The in-memory DICOM object: a tag-ordered tree of data elements built
//! by the sequence/item engine, and the type most callers interact with.

use std::collections::BTreeMap;

use dicom_core::dictionary::DataDictionary;
use dicom_core::header::{DataElement, Header, Length, Tag};
use dicom_core::value::{PixelFragmentSequence, PrimitiveValue, Value};
use dicom_core::VR;
use dicom_dictionary_std::StandardDataDictionary;
use dicom_parser::DataSetSink;
use snafu::OptionExt;

use crate::error::{MissingElementSnafu, Result};

/// A DICOM data set held fully in memory: a tag-ordered map of data
/// elements, each of which may itself nest further objects (sequences)
/// or carry opaque compressed fragments (encapsulated pixel data).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemDicomObject {
    entries: BTreeMap<Tag, DataElement<InMemDicomObject>>,
}

impl InMemDicomObject {
    /// An empty object.
    pub fn empty() -> Self {
        InMemDicomObject::default()
    }

    /// The number of elements directly held (not recursively).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this object holds no elements.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an element with this tag is present.
    pub fn contains(&self, tag: Tag) -> bool {
        self.entries.contains_key(&tag)
    }

    /// The tags held, in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = Tag> + '_ {
        self.entries.keys().copied()
    }

    /// Look up an element by tag.
    pub fn get(&self, tag: Tag) -> Option<&DataElement<InMemDicomObject>> {
        self.entries.get(&tag)
    }

    /// Look up an element by tag, falling back to `default` if absent.
    pub fn get_or<'a>(
        &'a self,
        tag: Tag,
        default: &'a PrimitiveValue,
    ) -> &'a PrimitiveValue {
        self.value(tag).unwrap_or(default)
    }

    /// Look up an element by its dictionary keyword, whitespace-insensitive.
    pub fn get_by_name(&self, name: &str) -> Option<&DataElement<InMemDicomObject>> {
        let tag = StandardDataDictionary.tag_of(name)?;
        self.get(tag)
    }

    /// Look up a primitive value by tag, if present and primitive-valued.
    pub fn value(&self, tag: Tag) -> Option<&PrimitiveValue> {
        self.get(tag)?.value().as_primitive()
    }

    /// Look up a primitive value by keyword.
    pub fn value_by_name(&self, name: &str) -> Option<&PrimitiveValue> {
        self.get_by_name(name)?.value().as_primitive()
    }

    /// A required primitive value by tag, per the `lookup` operation.
    pub fn require_value(&self, tag: Tag) -> Result<&PrimitiveValue> {
        self.value(tag).context(MissingElementSnafu { tag })
    }

    /// Insert an already-built element, replacing any previous one with
    /// the same tag.
    pub fn put(&mut self, element: DataElement<InMemDicomObject>) {
        self.entries.insert(element.tag(), element);
    }

    /// Insert a primitive value under a tag, resolving its VR from the
    /// standard dictionary (falling back to `UN` for unknown tags).
    pub fn put_value(&mut self, tag: Tag, value: impl Into<PrimitiveValue>) {
        let vr = StandardDataDictionary.vr_of(tag).unwrap_or(VR::UN);
        self.put(DataElement::new(tag, vr, value.into()));
    }

    /// Insert a primitive value under a keyword, resolved via the
    /// standard dictionary. Does nothing if the keyword is unknown.
    pub fn put_value_by_name(&mut self, name: &str, value: impl Into<PrimitiveValue>) {
        if let Some(entry) = StandardDataDictionary.by_name(name) {
            self.put(DataElement::new(entry.tag, entry.vr, value.into()));
        }
    }

    /// Remove an element by tag, returning it if present.
    pub fn remove(&mut self, tag: Tag) -> Option<DataElement<InMemDicomObject>> {
        self.entries.remove(&tag)
    }

    /// Iterate over all elements, in tag order.
    pub fn iter(&self) -> impl Iterator<Item = &DataElement<InMemDicomObject>> {
        self.entries.values()
    }

    /// Apply a pixel intensity rescale in place, per (0028,1052)/(0028,1053).
    /// `forward` replaces stored samples with `v*slope + intercept`
    /// (widened to `f64`, then narrowed back to the element's own
    /// integer type by rounding); `backward` is its inverse. Returns an
    /// error if either rescale attribute is missing.
    pub fn rescale(&mut self, direction: RescaleDirection) -> Result<()> {
        let slope = self.require_f64(Tag(0x0028, 0x1053))?;
        let intercept = self.require_f64(Tag(0x0028, 0x1052))?;
        let tag = Tag(0x7FE0, 0x0010);
        let computed = self.entries.get(&tag).and_then(|element| {
            element
                .value()
                .as_primitive()
                .map(|primitive| (element.vr(), rescale_primitive(primitive, direction, slope, intercept)))
        });
        if let Some((vr, rescaled)) = computed {
            self.put(DataElement::new(tag, vr, rescaled));
        }
        Ok(())
    }

    fn require_f64(&self, tag: Tag) -> Result<f64> {
        let v = self.require_value(tag)?;
        Ok(match v {
            PrimitiveValue::F64(v) => v.first().copied().unwrap_or(0.0),
            PrimitiveValue::F32(v) => v.first().map(|&x| x as f64).unwrap_or(0.0),
            PrimitiveValue::Str(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        })
    }
}

/// The direction of a pixel intensity rescale, per §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescaleDirection {
    /// `v * slope + intercept`.
    Forward,
    /// `round((v - intercept) / slope)`, cast back to the original type.
    Backward,
}

fn rescale_primitive(
    value: &PrimitiveValue,
    direction: RescaleDirection,
    slope: f64,
    intercept: f64,
) -> PrimitiveValue {
    match direction {
        RescaleDirection::Forward => {
            let out: smallvec::SmallVec<[f64; 2]> = as_f64_iter(value)
                .map(|v| v * slope + intercept)
                .collect();
            PrimitiveValue::F64(out)
        }
        RescaleDirection::Backward => match value {
            PrimitiveValue::U16(v) => PrimitiveValue::U16(
                v.iter()
                    .map(|&x| ((x as f64 - intercept) / slope).round() as u16)
                    .collect(),
            ),
            PrimitiveValue::I16(v) => PrimitiveValue::I16(
                v.iter()
                    .map(|&x| ((x as f64 - intercept) / slope).round() as i16)
                    .collect(),
            ),
            PrimitiveValue::U8(v) => PrimitiveValue::U8(
                v.iter()
                    .map(|&x| ((x as f64 - intercept) / slope).round() as u8)
                    .collect(),
            ),
            PrimitiveValue::F64(v) => PrimitiveValue::F64(
                v.iter()
                    .map(|&x| ((x - intercept) / slope).round())
                    .collect(),
            ),
            other => other.clone(),
        },
    }
}

fn as_f64_iter(value: &PrimitiveValue) -> Box<dyn Iterator<Item = f64> + '_> {
    match value {
        PrimitiveValue::U8(v) => Box::new(v.iter().map(|&x| x as f64)),
        PrimitiveValue::I16(v) => Box::new(v.iter().map(|&x| x as f64)),
        PrimitiveValue::U16(v) => Box::new(v.iter().map(|&x| x as f64)),
        PrimitiveValue::I32(v) => Box::new(v.iter().map(|&x| x as f64)),
        PrimitiveValue::U32(v) => Box::new(v.iter().map(|&x| x as f64)),
        PrimitiveValue::F32(v) => Box::new(v.iter().map(|&x| x as f64)),
        PrimitiveValue::F64(v) => Box::new(v.iter().copied()),
        _ => Box::new(std::iter::empty()),
    }
}

impl DataSetSink for InMemDicomObject {
    fn new() -> Self {
        InMemDicomObject::empty()
    }

    fn insert_primitive(&mut self, tag: Tag, vr: VR, value: PrimitiveValue) {
        self.put(DataElement::new(tag, vr, value));
    }

    fn insert_sequence(&mut self, tag: Tag, items: Vec<Self>, declared_len: Length) {
        let value = Value::Sequence {
            items,
            size: declared_len,
        };
        self.put(DataElement::new(tag, VR::SQ, value));
    }

    fn insert_pixel_sequence(&mut self, tag: Tag, fragments: PixelFragmentSequence) {
        self.put(DataElement::new(tag, VR::OB, Value::PixelSequence(fragments)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get_round_trip() {
        let mut obj = InMemDicomObject::empty();
        obj.put_value(Tag(0x0008, 0x0060), "CT");
        assert_eq!(obj.value(Tag(0x0008, 0x0060)), Some(&PrimitiveValue::Str("CT".to_string())));
        assert!(obj.contains(Tag(0x0008, 0x0060)));
    }

    #[test]
    fn get_by_name_matches_get_by_tag() {
        let mut obj = InMemDicomObject::empty();
        obj.put_value_by_name("Modality", "MR");
        assert_eq!(
            obj.get_by_name("Modality").map(|e| e.tag()),
            Some(Tag(0x0008, 0x0060))
        );
        assert_eq!(obj.get(Tag(0x0008, 0x0060)).map(|e| e.tag()), Some(Tag(0x0008, 0x0060)));
    }

    #[test]
    fn rescale_forward_then_backward_restores_values() {
        let mut obj = InMemDicomObject::empty();
        obj.put(DataElement::new(
            Tag(0x0028, 0x1052),
            VR::DS,
            PrimitiveValue::F64(smallvec::SmallVec::from_slice(&[-1024.0])),
        ));
        obj.put(DataElement::new(
            Tag(0x0028, 0x1053),
            VR::DS,
            PrimitiveValue::F64(smallvec::SmallVec::from_slice(&[1.0])),
        ));
        obj.put(DataElement::new(
            Tag(0x7FE0, 0x0010),
            VR::OW,
            PrimitiveValue::U16(smallvec::SmallVec::from_slice(&[0, 100, 2000])),
        ));

        obj.rescale(RescaleDirection::Forward).unwrap();
        let forward = obj.value(Tag(0x7FE0, 0x0010)).unwrap().clone();
        assert_eq!(
            forward,
            PrimitiveValue::F64(smallvec::SmallVec::from_slice(&[-1024.0, -924.0, 976.0]))
        );

        obj.rescale(RescaleDirection::Backward).unwrap();
        let back = obj.value(Tag(0x7FE0, 0x0010)).unwrap();
        assert_eq!(*back, PrimitiveValue::F64(smallvec::SmallVec::from_slice(&[0.0, 100.0, 2000.0])));
    }
}
