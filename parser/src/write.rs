//! The element codec and sequence/item engine, encode side: the mirror of
//! [`crate::read`].

use std::io::Write;

use dicom_core::header::{Length, Tag};
use dicom_core::value::{PixelFragmentSequence, PrimitiveValue};
use dicom_core::VR;
use dicom_encoding::endian::TransferSyntaxIo;
use dicom_encoding::error::UnsupportedPixelFormatSnafu;
use dicom_encoding::vr::encode_value;

use crate::error::{ImplicitVrPixelSizeMismatchSnafu, IoSnafu, Result};
use crate::mode::Mode;
use crate::read::PIXEL_DATA_TAG;
use snafu::{ensure, ResultExt};

/// One data element to be written, abstracted over the shape of its
/// value so that the same writer handles primitives, sequences (already
/// flattened into their encoded items by the caller) and encapsulated
/// pixel fragments.
#[derive(Debug, Clone)]
pub enum OutElement<'a> {
    /// A primitive-valued element.
    Primitive(Tag, VR, &'a PrimitiveValue),
    /// A sequence element, given its already-built item bodies (each
    /// item body is a fully encoded byte run for one item's data set).
    Sequence(Tag, &'a [Vec<u8>], Length),
    /// An encapsulated pixel data element.
    PixelSequence(Tag, &'a PixelFragmentSequence),
}

fn write_tag<W: Write>(dst: &mut W, io: &TransferSyntaxIo, tag: Tag) -> Result<()> {
    io.write_u16(&mut *dst, tag.group())?;
    io.write_u16(&mut *dst, tag.element())?;
    Ok(())
}

fn write_item_header<W: Write>(dst: &mut W, io: &TransferSyntaxIo, tag: Tag, len: Length) -> Result<()> {
    write_tag(dst, io, tag)?;
    io.write_u32(dst, len.0)?;
    Ok(())
}

fn pad_if_odd<W: Write>(dst: &mut W, len: usize, pad_byte: u8) -> Result<()> {
    if len % 2 == 1 {
        dst.write_all(&[pad_byte]).context(IoSnafu)?;
    }
    Ok(())
}

/// The padding byte used for an odd-length value of the given VR: most
/// VRs pad with `0x00`, but the text VRs pad with an ASCII space.
fn pad_byte_for(vr: VR) -> u8 {
    match vr {
        VR::AE | VR::AS | VR::CS | VR::DA | VR::DS | VR::DT | VR::IS | VR::LO | VR::LT
        | VR::PN | VR::SH | VR::ST | VR::TM | VR::UI | VR::UT => b' ',
        _ => 0,
    }
}

/// Write one element header (tag, VR if explicit, length field), in the
/// mode appropriate to the element's tag (the meta group always uses its
/// own fixed mode).
fn write_header<W: Write>(
    dst: &mut W,
    mode: Mode,
    tag: Tag,
    vr: VR,
    len: Length,
) -> Result<()> {
    let effective = mode.effective_for(tag);
    let io = TransferSyntaxIo::new(effective.endianness);
    write_tag(dst, &io, tag)?;
    if effective.explicit_vr {
        dst.write_all(&vr.to_bytes()).context(IoSnafu)?;
        if vr.has_explicit_long_length() {
            dst.write_all(&[0, 0]).context(IoSnafu)?;
            io.write_u32(dst, len.0)?;
        } else {
            io.write_u16(dst, len.0 as u16)?;
        }
    } else {
        io.write_u32(dst, len.0)?;
    }
    Ok(())
}

/// Native pixel data must already be stored as one of the wire-representable
/// sample formats (`u8`/`i8` as `U8`, `u16`/`i16` as `U16`, or `F32`);
/// anything else cannot be written back out as Pixel Data.
fn validate_pixel_format(value: &PrimitiveValue) -> Result<()> {
    if matches!(
        value,
        PrimitiveValue::U8(_) | PrimitiveValue::U16(_) | PrimitiveValue::F32(_)
    ) {
        Ok(())
    } else {
        Err(UnsupportedPixelFormatSnafu.build().into())
    }
}

/// Write one data element (of any shape) to `dst`, using `mode` to
/// determine endianness and VR explicitness (subject to the meta-group
/// override).
pub fn write_element<W: Write>(dst: &mut W, mode: Mode, element: OutElement<'_>) -> Result<()> {
    let effective_endianness = |tag: Tag| mode.effective_for(tag).endianness;

    match element {
        OutElement::Primitive(tag, vr, value) => {
            if tag == PIXEL_DATA_TAG {
                validate_pixel_format(value)?;
                ensure!(
                    mode.effective_for(tag).explicit_vr || vr == VR::OW,
                    ImplicitVrPixelSizeMismatchSnafu { vr }
                );
            }
            let io = TransferSyntaxIo::new(effective_endianness(tag));
            let bytes = encode_value(vr, value, &io)?;
            let declared = Length(bytes.len() as u32);
            write_header(dst, mode, tag, vr, declared.padded_even())?;
            dst.write_all(&bytes).context(IoSnafu)?;
            pad_if_odd(dst, bytes.len(), pad_byte_for(vr))?;
        }
        OutElement::Sequence(tag, item_bodies, declared_len) => {
            let effective = mode.effective_for(tag);
            let io = TransferSyntaxIo::new(effective.endianness);
            let undefined = declared_len.is_undefined();
            let total: u32 = item_bodies.iter().map(|b| 8 + b.len() as u32).sum();
            write_header(
                dst,
                mode,
                tag,
                VR::SQ,
                if undefined { Length::UNDEFINED } else { Length(total) },
            )?;
            for body in item_bodies {
                let len = if undefined {
                    Length::UNDEFINED
                } else {
                    Length(body.len() as u32)
                };
                write_item_header(dst, &io, Tag::ITEM, len)?;
                dst.write_all(body).context(IoSnafu)?;
                if undefined {
                    write_item_header(dst, &io, Tag::ITEM_DELIMITER, Length(0))?;
                }
            }
            if undefined {
                write_item_header(dst, &io, Tag::SEQUENCE_DELIMITER, Length(0))?;
            }
        }
        OutElement::PixelSequence(tag, frags) => {
            let effective = mode.effective_for(tag);
            let io = TransferSyntaxIo::new(effective.endianness);
            write_header(dst, mode, tag, VR::OB, Length::UNDEFINED)?;
            write_item_header(dst, &io, Tag::ITEM, Length(frags.offset_table.len() as u32))?;
            dst.write_all(&frags.offset_table).context(IoSnafu)?;
            for frag in &frags.fragments {
                write_item_header(dst, &io, Tag::ITEM, Length(frag.len() as u32))?;
                dst.write_all(frag).context(IoSnafu)?;
            }
            write_item_header(dst, &io, Tag::SEQUENCE_DELIMITER, Length(0))?;
        }
    }
    Ok(())
}

/// Encode a full sequence item's data set body (the elements of one item,
/// in tag order) into an owned buffer, for use as an [`OutElement::Sequence`]
/// item body.
pub fn encode_item_body<'a>(
    mode: Mode,
    elements: impl IntoIterator<Item = OutElement<'a>>,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for element in elements {
        write_element(&mut buf, mode, element)?;
    }
    Ok(buf)
}
