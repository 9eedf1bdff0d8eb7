//! The element codec and the recursive sequence/item engine, decode side.

use std::io::Read;

use dicom_core::dictionary::DataDictionary;
use dicom_core::header::{Length, Tag};
use dicom_core::value::{PixelFragmentSequence, PrimitiveValue};
use dicom_core::VR;
use dicom_encoding::endian::TransferSyntaxIo;
use dicom_encoding::vr::decode_value;
use tracing::{trace, warn};

use crate::error::{BadSequenceFramingSnafu, IoSnafu, Result, UnexpectedEndOfStreamSnafu, UnknownTagSnafu};
use crate::mode::{Mode, VrOverrideMap, WILDCARD_TAG};
use crate::sink::DataSetSink;
use snafu::{ensure, ResultExt};

/// The tag of the Pixel Data element, handled specially because its
/// encoding (native vs. encapsulated) is driven by the declared length
/// rather than by its VR.
pub const PIXEL_DATA_TAG: Tag = Tag(0x7FE0, 0x0010);

/// Outcome of attempting to read one element header.
enum HeaderOutcome {
    /// The graceful end-of-stream terminator: no element follows.
    Eof,
    /// A well-formed element header.
    Header(Tag, VR, Length),
}

/// Read one byte run of exactly `buf.len()` bytes, distinguishing a clean
/// end-of-stream (zero bytes available) from a partial read (fatal).
fn read_or_eof<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut read = 0;
    while read < buf.len() {
        let n = src.read(&mut buf[read..]).context(IoSnafu)?;
        if n == 0 {
            ensure!(read == 0, UnexpectedEndOfStreamSnafu);
            return Ok(false);
        }
        read += n;
    }
    Ok(true)
}

fn read_exact<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<()> {
    if !read_or_eof(src, buf)? {
        return UnexpectedEndOfStreamSnafu.fail();
    }
    Ok(())
}

/// Decode one data element header, applying the meta-group mode
/// override, the private-group VR fallbacks, and the per-tag VR override
/// map, per the element codec's decode algorithm.
fn decode_header<R, D>(
    src: &mut R,
    mode: Mode,
    dict: &D,
    aux_vr: &VrOverrideMap,
) -> Result<HeaderOutcome>
where
    R: Read,
    D: DataDictionary,
{
    let mut head = [0u8; 4];
    if !read_or_eof(src, &mut head[0..2])? {
        return Ok(HeaderOutcome::Eof);
    }
    // group is read in the *caller's* mode, since we don't yet know the
    // tag; the meta-group override only changes endianness for group
    // <= 0x0002, which is what `effective` resolves below once we have
    // the full tag. To keep the two-byte group read consistent we must
    // assume the final mode up front; DICOM guarantees meta-group files
    // begin with group 0x0002, so guess `mode` first, then re-derive.
    let io = TransferSyntaxIo::new(mode.endianness);
    let group = io.read_u16(&head[0..2])?;
    read_exact(src, &mut head[2..4])?;
    let io = TransferSyntaxIo::new(mode.endianness);
    let element = io.read_u16(&head[2..4])?;
    let tag = Tag(group, element);

    let effective = mode.effective_for(tag);
    let io = TransferSyntaxIo::new(effective.endianness);

    if tag.is_delimiter() {
        let len = io.read_u32(&mut *src)?;
        return Ok(HeaderOutcome::Header(tag, VR::UN, Length(len)));
    }

    let natural_vr = if effective.explicit_vr {
        let mut vr_buf = [0u8; 2];
        read_exact(src, &mut vr_buf)?;
        Some(VR::from_binary(vr_buf).unwrap_or(VR::UN))
    } else {
        dict.vr_of(tag)
    };

    let vr = resolve_vr(tag, natural_vr, aux_vr)?;

    // The length field's width was already fixed by the two VR bytes just
    // read off the wire, before any aux_vr override is applied below; an
    // override (including a "skip", which resolves to UN) must not change
    // how many length bytes we consume, or the stream desyncs.
    let len = if effective.explicit_vr {
        if natural_vr.unwrap_or(VR::UN).has_explicit_long_length() {
            let mut reserved = [0u8; 2];
            read_exact(src, &mut reserved)?;
            io.read_u32(&mut *src)?
        } else {
            u32::from(io.read_u16(&mut *src)?)
        }
    } else if tag.is_group_length() {
        io.read_u32(&mut *src)?
    } else {
        io.read_u32(&mut *src)?
    };

    Ok(HeaderOutcome::Header(tag, vr, Length(len)))
}

/// Apply the override map and the private-group fallback to determine
/// the final VR for a tag, per step 5–6 of the element codec.
fn resolve_vr(tag: Tag, natural: Option<VR>, aux_vr: &VrOverrideMap) -> Result<VR> {
    if let Some(over) = aux_vr.get(&tag) {
        return match over {
            Some(vr) => Ok(*vr),
            None => Ok(VR::UN), // "skip" is handled by the caller via the map lookup, not here
        };
    }
    if let Some(vr) = natural {
        return Ok(vr);
    }
    if tag.is_private_creator() {
        return Ok(VR::LO);
    }
    if tag.is_private() {
        return Ok(VR::UN);
    }
    if let Some(Some(vr)) = aux_vr.get(&WILDCARD_TAG) {
        return Ok(*vr);
    }
    UnknownTagSnafu { tag }.fail()
}

/// Whether the override map says to skip this tag entirely.
fn is_skipped(tag: Tag, aux_vr: &VrOverrideMap) -> bool {
    matches!(aux_vr.get(&tag), Some(None))
}

fn consume_padding<R: Read>(src: &mut R, len: Length) -> Result<()> {
    if !len.is_undefined() && len.0 % 2 == 1 {
        let mut pad = [0u8; 1];
        read_exact(src, &mut pad)?;
    }
    Ok(())
}

/// Read one full data set body (the top level, or the contents of one
/// sequence item) into a freshly built `S`.
///
/// Stops at the first graceful end-of-stream, at a tag whose group
/// exceeds `max_group` (the tag is *not* consumed: callers at the top
/// level simply stop; this function does not support mid-item
/// max-group truncation since items are always read to completion), or
/// when `stop_len` bytes have been consumed (for a defined-length item).
#[allow(clippy::too_many_arguments)]
pub fn read_dataset<R, D, S>(
    src: &mut R,
    mode: Mode,
    dict: &D,
    aux_vr: &VrOverrideMap,
    max_group: Option<u16>,
    stop_len: Option<u32>,
) -> Result<S>
where
    R: Read,
    D: DataDictionary,
    S: DataSetSink,
{
    let mut sink = S::new();
    let mut consumed: u32 = 0;

    loop {
        if let Some(stop) = stop_len {
            if consumed >= stop {
                break;
            }
        }

        let outcome = decode_header(src, mode, dict, aux_vr)?;
        let (tag, vr, len) = match outcome {
            HeaderOutcome::Eof => break,
            HeaderOutcome::Header(t, v, l) => (t, v, l),
        };

        if tag.is_item_delimiter() || tag.is_sequence_delimiter() {
            // an item/sequence body read to its declared length should
            // not see its own delimiter; a caller driven by a delimiter
            // loop handles this tag itself. Seeing it here means the
            // body was entered without a stop length (top-level stream)
            // and the delimiter belongs to an enclosing construct that
            // has already been left; nothing more to do.
            break;
        }

        if let Some(m) = max_group {
            if tag.group() > m {
                break;
            }
        }

        let effective = mode.effective_for(tag);

        if is_skipped(tag, aux_vr) {
            skip_value(src, len)?;
            consumed = consumed.saturating_add(header_len_estimate(effective, vr, len));
            continue;
        }

        trace!(%tag, ?vr, ?len, "decoding element");

        let header_bytes = header_len_estimate(effective, vr, len);

        if tag == PIXEL_DATA_TAG && len.is_undefined() {
            let frags = read_pixel_fragments(src, effective)?;
            sink.insert_pixel_sequence(tag, frags);
            consumed = consumed.saturating_add(header_bytes);
            continue;
        }

        if vr == VR::SQ {
            let items = read_sequence_items(src, effective, dict, aux_vr, len)?;
            sink.insert_sequence(tag, items, len);
            consumed = consumed.saturating_add(header_bytes);
            if !len.is_undefined() {
                consumed = consumed.saturating_add(len.0);
            } else {
                // undefined length sequences are measured by their
                // framing, not by a known payload size; the outer loop
                // only needs `consumed` for defined-length items, where
                // undefined-length children cannot occur without their
                // own delimiter already having been consumed above.
            }
            continue;
        }

        let mut buf = vec![0u8; len.0 as usize];
        read_exact(src, &mut buf)?;
        consume_padding(src, len)?;
        let io = TransferSyntaxIo::new(effective.endianness);
        let value = decode_value(vr, &buf, &io)?;
        sink.insert_primitive(tag, vr, value);

        let padded = len.padded_even().0;
        consumed = consumed.saturating_add(header_bytes + padded);
    }

    Ok(sink)
}

/// A conservative estimate of the header's own byte length, used only to
/// track how many bytes of a defined-length item have been consumed.
fn header_len_estimate(mode: Mode, vr: VR, _len: Length) -> u32 {
    if mode.explicit_vr {
        if vr.has_explicit_long_length() {
            12
        } else {
            8
        }
    } else {
        8
    }
}

fn skip_value<R: Read>(src: &mut R, len: Length) -> Result<()> {
    if len.is_undefined() {
        return Ok(());
    }
    let mut remaining = len.0 as u64;
    let mut buf = [0u8; 4096];
    while remaining > 0 {
        let chunk = remaining.min(buf.len() as u64) as usize;
        read_exact(src, &mut buf[..chunk])?;
        remaining -= chunk as u64;
    }
    consume_padding(src, len)
}

/// Decode the items of a sequence (`VR = SQ`), for either a defined or an
/// undefined declared length.
fn read_sequence_items<R, D, S>(
    src: &mut R,
    mode: Mode,
    dict: &D,
    aux_vr: &VrOverrideMap,
    len: Length,
) -> Result<Vec<S>>
where
    R: Read,
    D: DataDictionary,
    S: DataSetSink,
{
    let mut items = Vec::new();
    if len.is_undefined() {
        loop {
            let (tag, item_len) = read_item_header(src, mode)?;
            if tag == Tag::SEQUENCE_DELIMITER {
                break;
            }
            ensure!(tag == Tag::ITEM, BadSequenceFramingSnafu { found: tag });
            items.push(read_item_body(src, mode, dict, aux_vr, item_len)?);
        }
    } else {
        let mut remaining = len.0;
        while remaining > 0 {
            let (tag, item_len) = read_item_header(src, mode)?;
            remaining = remaining.saturating_sub(8);
            ensure!(tag == Tag::ITEM, BadSequenceFramingSnafu { found: tag });
            items.push(read_item_body(src, mode, dict, aux_vr, item_len)?);
            if !item_len.is_undefined() {
                remaining = remaining.saturating_sub(item_len.0);
            }
        }
    }
    Ok(items)
}

fn read_item_header<R: Read>(src: &mut R, mode: Mode) -> Result<(Tag, Length)> {
    let io = TransferSyntaxIo::new(mode.endianness);
    let mut buf = [0u8; 8];
    read_exact(src, &mut buf)?;
    let group = io.read_u16(&buf[0..2])?;
    let element = io.read_u16(&buf[2..4])?;
    let len = io.read_u32(&buf[4..8])?;
    Ok((Tag(group, element), Length(len)))
}

fn read_item_body<R, D, S>(
    src: &mut R,
    mode: Mode,
    dict: &D,
    aux_vr: &VrOverrideMap,
    item_len: Length,
) -> Result<S>
where
    R: Read,
    D: DataDictionary,
    S: DataSetSink,
{
    if item_len.is_undefined() {
        read_item_until_delimiter(src, mode, dict, aux_vr)
    } else {
        read_dataset(src, mode, dict, aux_vr, None, Some(item_len.0))
    }
}

/// Read an item's elements until its own `(FFFE,E00D)` item delimiter,
/// for the undefined-length item case.
fn read_item_until_delimiter<R, D, S>(
    src: &mut R,
    mode: Mode,
    dict: &D,
    aux_vr: &VrOverrideMap,
) -> Result<S>
where
    R: Read,
    D: DataDictionary,
    S: DataSetSink,
{
    let mut sink = S::new();
    loop {
        let outcome = decode_header(src, mode, dict, aux_vr)?;
        let (tag, vr, len) = match outcome {
            HeaderOutcome::Eof => return UnexpectedEndOfStreamSnafu.fail(),
            HeaderOutcome::Header(t, v, l) => (t, v, l),
        };
        if tag.is_item_delimiter() {
            break;
        }
        if is_skipped(tag, aux_vr) {
            skip_value(src, len)?;
            continue;
        }
        if tag == PIXEL_DATA_TAG && len.is_undefined() {
            let frags = read_pixel_fragments(src, mode)?;
            sink.insert_pixel_sequence(tag, frags);
            continue;
        }
        if vr == VR::SQ {
            let items = read_sequence_items(src, mode, dict, aux_vr, len)?;
            sink.insert_sequence(tag, items, len);
            continue;
        }
        let mut buf = vec![0u8; len.0 as usize];
        read_exact(src, &mut buf)?;
        consume_padding(src, len)?;
        let io = TransferSyntaxIo::new(mode.endianness);
        let value = decode_value(vr, &buf, &io)?;
        sink.insert_primitive(tag, vr, value);
    }
    Ok(sink)
}

/// Read the items of an encapsulated pixel data element: the first item
/// is the Basic Offset Table, subsequent items are opaque fragments,
/// terminated by the sequence delimiter.
fn read_pixel_fragments<R: Read>(src: &mut R, mode: Mode) -> Result<PixelFragmentSequence> {
    let mut seq = PixelFragmentSequence::default();
    let mut first = true;
    loop {
        let (tag, len) = read_item_header(src, mode)?;
        if tag == Tag::SEQUENCE_DELIMITER {
            break;
        }
        ensure!(tag == Tag::ITEM, BadSequenceFramingSnafu { found: tag });
        ensure!(!len.is_undefined(), BadSequenceFramingSnafu { found: tag });
        let mut buf = vec![0u8; len.0 as usize];
        read_exact(src, &mut buf)?;
        consume_padding(src, len)?;
        if first {
            seq.offset_table = buf;
            first = false;
        } else {
            seq.fragments.push(buf);
        }
    }
    if seq.fragments.is_empty() && !seq.offset_table.is_empty() {
        warn!("encapsulated pixel data had only a basic offset table and no fragments");
    }
    Ok(seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteordered::Endianness;
    use dicom_dictionary_std::StandardDataDictionary;

    #[derive(Debug, Default)]
    struct TestSink {
        primitives: Vec<(Tag, VR, PrimitiveValue)>,
        sequences: Vec<(Tag, usize)>,
        pixel_fragments: Option<PixelFragmentSequence>,
    }

    impl DataSetSink for TestSink {
        fn new() -> Self {
            TestSink::default()
        }

        fn insert_primitive(&mut self, tag: Tag, vr: VR, value: PrimitiveValue) {
            self.primitives.push((tag, vr, value));
        }

        fn insert_sequence(&mut self, tag: Tag, items: Vec<Self>, _declared_len: Length) {
            self.sequences.push((tag, items.len()));
        }

        fn insert_pixel_sequence(&mut self, tag: Tag, fragments: PixelFragmentSequence) {
            let _ = tag;
            self.pixel_fragments = Some(fragments);
        }
    }

    fn implicit_le() -> Mode {
        Mode::new(Endianness::Little, false)
    }

    fn explicit_le() -> Mode {
        Mode::new(Endianness::Little, true)
    }

    #[test]
    fn decodes_one_implicit_vr_element() {
        // (0008,0060) Modality, implicit VR LE, length 2, "MR"
        let mut bytes = vec![0x08, 0x00, 0x60, 0x00];
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(b"MR");
        let mut cursor = &bytes[..];
        let sink: TestSink = read_dataset(
            &mut cursor,
            implicit_le(),
            &StandardDataDictionary,
            &VrOverrideMap::new(),
            None,
            None,
        )
        .unwrap();
        assert_eq!(sink.primitives.len(), 1);
        let (tag, vr, value) = &sink.primitives[0];
        assert_eq!(*tag, Tag(0x0008, 0x0060));
        assert_eq!(*vr, VR::CS);
        assert_eq!(*value, PrimitiveValue::Str("MR".to_string()));
    }

    #[test]
    fn decodes_explicit_vr_short_length_element() {
        // (0028,0010) Rows, explicit VR LE, US, length 2, value 512
        let mut bytes = vec![0x28, 0x00, 0x10, 0x00];
        bytes.extend_from_slice(b"US");
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&512u16.to_le_bytes());
        let mut cursor = &bytes[..];
        let sink: TestSink = read_dataset(
            &mut cursor,
            explicit_le(),
            &StandardDataDictionary,
            &VrOverrideMap::new(),
            None,
            None,
        )
        .unwrap();
        let (tag, vr, value) = &sink.primitives[0];
        assert_eq!(*tag, Tag(0x0028, 0x0010));
        assert_eq!(*vr, VR::US);
        assert_eq!(*value, PrimitiveValue::U16(smallvec_u16(512)));
    }

    fn smallvec_u16(v: u16) -> smallvec::SmallVec<[u16; 4]> {
        smallvec::SmallVec::from_slice(&[v])
    }

    #[test]
    fn decodes_undefined_length_sequence_with_one_item() {
        // (0008,1140) Referenced Image Sequence, explicit VR LE, SQ,
        // undefined length, one item with an undefined-length body
        // terminated by its own item delimiter, then the sequence
        // delimiter.
        let mut bytes = vec![0x08, 0x00, 0x40, 0x11];
        bytes.extend_from_slice(b"SQ");
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(&Length::UNDEFINED.0.to_le_bytes());
        // item header, undefined length
        bytes.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0]);
        bytes.extend_from_slice(&Length::UNDEFINED.0.to_le_bytes());
        // one element inside the item: (0008,1150) SOP Class UID, UI, "1.2\0"
        bytes.extend_from_slice(&[0x08, 0x00, 0x50, 0x11]);
        bytes.extend_from_slice(b"UI");
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(b"1.2\0");
        // item delimiter
        bytes.extend_from_slice(&[0xFE, 0xFF, 0x0D, 0xE0]);
        bytes.extend_from_slice(&0u32.to_le_bytes());
        // sequence delimiter
        bytes.extend_from_slice(&[0xFE, 0xFF, 0xDD, 0xE0]);
        bytes.extend_from_slice(&0u32.to_le_bytes());

        let mut cursor = &bytes[..];
        let sink: TestSink = read_dataset(
            &mut cursor,
            explicit_le(),
            &StandardDataDictionary,
            &VrOverrideMap::new(),
            None,
            None,
        )
        .unwrap();
        assert_eq!(sink.sequences, vec![(Tag(0x0008, 0x1140), 1)]);
    }

    #[test]
    fn applies_vr_override_and_skip() {
        let mut aux_vr = VrOverrideMap::new();
        aux_vr.insert(Tag(0x0009, 0x1001), None); // skip this private tag
        let mut bytes = vec![0x09, 0x00, 0x01, 0x10];
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(b"ABCD");
        // followed by a normal element that must still decode
        bytes.extend_from_slice(&[0x08, 0x00, 0x60, 0x00]);
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(b"CT");
        let mut cursor = &bytes[..];
        let sink: TestSink = read_dataset(
            &mut cursor,
            implicit_le(),
            &StandardDataDictionary,
            &aux_vr,
            None,
            None,
        )
        .unwrap();
        assert_eq!(sink.primitives.len(), 1);
        assert_eq!(sink.primitives[0].0, Tag(0x0008, 0x0060));
    }

    #[test]
    fn vr_override_does_not_change_length_field_width() {
        // wire VR is US (short-length, 2-byte length field); the override
        // below maps it to OB (long-length, 4-byte length field with a
        // 2-byte reserved gap). The length field width must follow the
        // VR actually on the wire, not the override, or the next
        // element's tag bytes get consumed as length/reserved bytes.
        let mut aux_vr = VrOverrideMap::new();
        aux_vr.insert(Tag(0x0028, 0x0010), Some(VR::OB));
        let mut bytes = vec![0x28, 0x00, 0x10, 0x00];
        bytes.extend_from_slice(b"US");
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&512u16.to_le_bytes());
        // followed by a normal element that must still decode correctly
        bytes.extend_from_slice(&[0x08, 0x00, 0x60, 0x00]);
        bytes.extend_from_slice(b"CS");
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(b"CT");
        let mut cursor = &bytes[..];
        let sink: TestSink = read_dataset(
            &mut cursor,
            explicit_le(),
            &StandardDataDictionary,
            &aux_vr,
            None,
            None,
        )
        .unwrap();
        assert_eq!(sink.primitives.len(), 2);
        assert_eq!(sink.primitives[0].0, Tag(0x0028, 0x0010));
        assert_eq!(sink.primitives[0].1, VR::OB);
        assert_eq!(sink.primitives[1].0, Tag(0x0008, 0x0060));
        assert_eq!(
            sink.primitives[1].2,
            PrimitiveValue::Str("CT".to_string())
        );
    }
}
