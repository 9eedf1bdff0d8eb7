//! Per-VR decode and encode of a data element's value payload, given the
//! already-read (and length-validated) bytes and the active endianness.

use dicom_core::value::PrimitiveValue;
use dicom_core::Tag;
use dicom_core::VR;
use itertools::Itertools;
use smallvec::SmallVec;
use tracing::trace;

use crate::endian::TransferSyntaxIo;
use crate::error::{Result, UnexpectedSequenceVrSnafu};
use crate::text::{join_list, parse_ds_list, parse_is_list, split_list, trim_short, trim_trailing};

/// Decode the value payload of a non-sequence, non-pixel-data element.
///
/// `bytes` must be exactly the element's declared length (padding already
/// stripped by the caller). Decoding never fails for text/binary VRs other
/// than `DS`/`IS`, per the documented error policy (malformed numeric text
/// is the only hard failure at this layer).
pub fn decode_value(vr: VR, bytes: &[u8], io: &TransferSyntaxIo) -> Result<PrimitiveValue> {
    trace!(?vr, len = bytes.len(), "decoding primitive value");
    let value = match vr {
        VR::AE | VR::CS | VR::SH => {
            let text = latin1_to_string(bytes);
            strs_from(split_list(&text).iter().map(|s| trim_short(s).to_string()))
        }
        VR::LO | VR::UI | VR::PN => {
            let text = latin1_to_string(bytes);
            strs_from(
                split_list(&text)
                    .iter()
                    .map(|s| trim_trailing(s).to_string()),
            )
        }
        VR::ST | VR::LT | VR::UT => {
            let text = latin1_to_string(bytes);
            PrimitiveValue::Str(trim_trailing(&text).to_string())
        }
        VR::DA | VR::DT | VR::TM | VR::AS => {
            let text = latin1_to_string(bytes);
            strs_from(split_list(&text).iter().map(|s| trim_short(s).to_string()))
        }
        VR::DS => {
            let text = latin1_to_string(bytes);
            PrimitiveValue::F64(parse_ds_list(&text)?)
        }
        VR::IS => {
            let text = latin1_to_string(bytes);
            PrimitiveValue::I32(parse_is_list(&text)?)
        }
        VR::SS => PrimitiveValue::I16(decode_i16_array(bytes, io)?),
        VR::US => PrimitiveValue::U16(decode_u16_array(bytes, io)?),
        VR::SL => PrimitiveValue::I32(decode_i32_array(bytes, io)?),
        VR::UL => PrimitiveValue::U32(decode_u32_array(bytes, io)?),
        VR::FL => PrimitiveValue::F32(decode_f32_array(bytes, io)?),
        VR::FD => PrimitiveValue::F64(decode_f64_array(bytes, io)?),
        VR::OB | VR::UN => PrimitiveValue::U8(SmallVec::from_slice(bytes)),
        VR::OW => PrimitiveValue::U16(decode_u16_array(bytes, io)?),
        VR::OF => PrimitiveValue::F32(decode_f32_array(bytes, io)?),
        VR::AT => {
            let mut tags = SmallVec::new();
            for chunk in bytes.chunks_exact(4) {
                let g = io.read_u16(&chunk[0..2])?;
                let e = io.read_u16(&chunk[2..4])?;
                tags.push(Tag(g, e));
            }
            PrimitiveValue::Tags(tags)
        }
        VR::SQ => return UnexpectedSequenceVrSnafu.fail(),
    };
    Ok(value.collapse())
}

/// Encode a primitive value back to its wire bytes for the given VR.
/// Values that were collapsed to a scalar on decode are re-wrapped as a
/// single-element list before serialisation where the wire format is
/// inherently list-shaped (text VRs).
pub fn encode_value(vr: VR, value: &PrimitiveValue, io: &TransferSyntaxIo) -> Result<Vec<u8>> {
    match vr {
        VR::AE | VR::CS | VR::SH | VR::LO | VR::UI | VR::PN | VR::DA | VR::DT | VR::TM | VR::AS => {
            let joined = as_text_list(value);
            Ok(joined.into_bytes())
        }
        VR::ST | VR::LT | VR::UT => Ok(as_single_text(value).into_bytes()),
        VR::DS => {
            let text = match value {
                PrimitiveValue::F64(v) => v.iter().map(|f| f.to_string()).join("\\"),
                other => as_text_list(other),
            };
            Ok(text.into_bytes())
        }
        VR::IS => {
            let text = match value {
                PrimitiveValue::I32(v) => v.iter().map(|i| i.to_string()).join("\\"),
                other => as_text_list(other),
            };
            Ok(text.into_bytes())
        }
        VR::SS => encode_i16_array(as_i16_slice(value), io),
        VR::US | VR::OW => encode_u16_array(as_u16_slice(value), io),
        VR::SL => encode_i32_array(as_i32_slice(value), io),
        VR::UL => encode_u32_array(as_u32_slice(value), io),
        VR::FL | VR::OF => encode_f32_array(as_f32_slice(value), io),
        VR::FD => encode_f64_array(as_f64_slice(value), io),
        VR::OB | VR::UN => Ok(as_u8_slice(value).to_vec()),
        VR::AT => {
            let mut out = Vec::new();
            if let PrimitiveValue::Tags(tags) = value {
                for t in tags {
                    io.write_u16(&mut out, t.group())?;
                    io.write_u16(&mut out, t.element())?;
                }
            }
            Ok(out)
        }
        VR::SQ => UnexpectedSequenceVrSnafu.fail(),
    }
}

fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn strs_from(iter: impl Iterator<Item = String>) -> PrimitiveValue {
    let v: SmallVec<[String; 2]> = iter.collect();
    PrimitiveValue::Strs(v)
}

fn as_text_list(value: &PrimitiveValue) -> String {
    match value {
        PrimitiveValue::Str(s) => s.clone(),
        PrimitiveValue::Strs(v) => join_list(v.iter().map(|s| s.as_str())),
        PrimitiveValue::Empty => String::new(),
        other => other.to_string(),
    }
}

fn as_single_text(value: &PrimitiveValue) -> String {
    match value {
        PrimitiveValue::Str(s) => s.clone(),
        PrimitiveValue::Empty => String::new(),
        other => other.to_string(),
    }
}

macro_rules! scalar_array_codec {
    ($decode_name:ident, $encode_name:ident, $as_slice_name:ident, $read:ident, $write:ident, $ty:ty, $variant:ident, $cap:literal) => {
        fn $decode_name(bytes: &[u8], io: &TransferSyntaxIo) -> Result<SmallVec<[$ty; $cap]>> {
            let width = std::mem::size_of::<$ty>();
            let mut out = SmallVec::with_capacity(bytes.len() / width.max(1));
            for chunk in bytes.chunks_exact(width) {
                out.push(io.$read(chunk)?);
            }
            Ok(out)
        }

        fn $encode_name(values: &[$ty], io: &TransferSyntaxIo) -> Result<Vec<u8>> {
            let mut out = Vec::with_capacity(values.len() * std::mem::size_of::<$ty>());
            for v in values {
                io.$write(&mut out, *v)?;
            }
            Ok(out)
        }

        fn $as_slice_name(value: &PrimitiveValue) -> &[$ty] {
            match value {
                PrimitiveValue::$variant(v) => v.as_slice(),
                _ => &[],
            }
        }
    };
}

scalar_array_codec!(decode_i16_array, encode_i16_array, as_i16_slice, read_i16, write_i16, i16, I16, 4);
scalar_array_codec!(decode_i32_array, encode_i32_array, as_i32_slice, read_i32, write_i32, i32, I32, 2);
scalar_array_codec!(decode_f32_array, encode_f32_array, as_f32_slice, read_f32, write_f32, f32, F32, 2);
scalar_array_codec!(decode_f64_array, encode_f64_array, as_f64_slice, read_f64, write_f64, f64, F64, 2);

fn decode_u16_array(bytes: &[u8], io: &TransferSyntaxIo) -> Result<SmallVec<[u16; 4]>> {
    let mut out = SmallVec::with_capacity(bytes.len() / 2);
    for chunk in bytes.chunks_exact(2) {
        out.push(io.read_u16(chunk)?);
    }
    Ok(out)
}

fn encode_u16_array(values: &[u16], io: &TransferSyntaxIo) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(values.len() * 2);
    for v in values {
        io.write_u16(&mut out, *v)?;
    }
    Ok(out)
}

fn as_u16_slice(value: &PrimitiveValue) -> &[u16] {
    match value {
        PrimitiveValue::U16(v) => v.as_slice(),
        _ => &[],
    }
}

fn decode_u32_array(bytes: &[u8], io: &TransferSyntaxIo) -> Result<SmallVec<[u32; 2]>> {
    let mut out = SmallVec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        out.push(io.read_u32(chunk)?);
    }
    Ok(out)
}

fn encode_u32_array(values: &[u32], io: &TransferSyntaxIo) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for v in values {
        io.write_u32(&mut out, *v)?;
    }
    Ok(out)
}

fn as_u32_slice(value: &PrimitiveValue) -> &[u32] {
    match value {
        PrimitiveValue::U32(v) => v.as_slice(),
        _ => &[],
    }
}

fn as_u8_slice(value: &PrimitiveValue) -> &[u8] {
    match value {
        PrimitiveValue::U8(v) => v.as_slice(),
        _ => &[],
    }
}
