//! The pixel-data engine: reshaping a decoded Pixel Data element into a
//! `[column, row, frame, sample]`-ordered buffer, and the rescale helpers
//! that operate on it.

use dicom_core::header::Tag;
use dicom_core::value::{PixelFragmentSequence, PrimitiveValue};
use ndarray::{Array, IxDyn};
use snafu::OptionExt;

use crate::error::{CastValueSnafu, MissingElementSnafu, Result};
use crate::mem::InMemDicomObject;

const TAG_SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);
const TAG_PLANAR_CONFIGURATION: Tag = Tag(0x0028, 0x0006);
const TAG_ROWS: Tag = Tag(0x0028, 0x0010);
const TAG_COLUMNS: Tag = Tag(0x0028, 0x0011);
const TAG_NUMBER_OF_FRAMES: Tag = Tag(0x0028, 0x0008);
const TAG_BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
const TAG_PIXEL_REPRESENTATION: Tag = Tag(0x0028, 0x0103);
const TAG_PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);
const TAG_RESCALE_INTERCEPT: Tag = Tag(0x0028, 0x1052);
const TAG_RESCALE_SLOPE: Tag = Tag(0x0028, 0x1053);

/// The element type of a decoded pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 8-bit unsigned samples.
    U8,
    /// 8-bit signed samples.
    I8,
    /// 16-bit unsigned samples.
    U16,
    /// 16-bit signed samples.
    I16,
}

/// A decoded, type-homogeneous pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    /// 8-bit unsigned samples.
    U8(Vec<u8>),
    /// 8-bit signed samples.
    I8(Vec<i8>),
    /// 16-bit unsigned samples.
    U16(Vec<u16>),
    /// 16-bit signed samples.
    I16(Vec<i16>),
}

impl PixelBuffer {
    /// Widen every sample to `f64`, in storage order.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            PixelBuffer::U8(v) => v.iter().map(|&x| x as f64).collect(),
            PixelBuffer::I8(v) => v.iter().map(|&x| x as f64).collect(),
            PixelBuffer::U16(v) => v.iter().map(|&x| x as f64).collect(),
            PixelBuffer::I16(v) => v.iter().map(|&x| x as f64).collect(),
        }
    }
}

/// A decoded Pixel Data element, reshaped to `[column, row, frame,
/// sample]` order with unit axes dropped from the reported shape.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPixelData {
    /// The sample element type.
    pub format: SampleFormat,
    /// The reported shape, in `[column, row, frame, sample]` order with
    /// any size-1 axes omitted.
    pub shape: Vec<usize>,
    /// The sample data, laid out in row-major order over `shape` before
    /// unit-axis removal.
    pub data: PixelBuffer,
}

fn u32_attr(obj: &InMemDicomObject, tag: Tag) -> Result<u32> {
    let v = obj.require_value(tag)?;
    match v {
        PrimitiveValue::U16(v) => v.first().map(|&x| x as u32).context(CastValueSnafu {
            tag,
            expected: "an integer",
        }),
        PrimitiveValue::U32(v) => v.first().copied().context(CastValueSnafu {
            tag,
            expected: "an integer",
        }),
        PrimitiveValue::I32(v) => v.first().map(|&x| x as u32).context(CastValueSnafu {
            tag,
            expected: "an integer",
        }),
        PrimitiveValue::Str(s) => s.trim().parse().ok().context(CastValueSnafu {
            tag,
            expected: "an integer",
        }),
        _ => CastValueSnafu {
            tag,
            expected: "an integer",
        }
        .fail(),
    }
}

fn u32_attr_or(obj: &InMemDicomObject, tag: Tag, default: u32) -> u32 {
    u32_attr(obj, tag).unwrap_or(default)
}

fn f64_attr(obj: &InMemDicomObject, tag: Tag) -> Result<f64> {
    let v = obj.require_value(tag)?;
    match v {
        PrimitiveValue::F64(v) => v.first().copied().context(CastValueSnafu {
            tag,
            expected: "a real number",
        }),
        PrimitiveValue::F32(v) => v.first().map(|&x| x as f64).context(CastValueSnafu {
            tag,
            expected: "a real number",
        }),
        PrimitiveValue::Str(s) => s.trim().parse().ok().context(CastValueSnafu {
            tag,
            expected: "a real number",
        }),
        _ => CastValueSnafu {
            tag,
            expected: "a real number",
        }
        .fail(),
    }
}

/// Reshape a flat run of raw pixel bytes into `[column, row, frame,
/// sample]` order, given the declared wire shape.
///
/// The wire shape is `[samples, columns, rows, frames]` when
/// interleaved (planar configuration 0) or `[columns, rows, frames,
/// samples]` when planar (planar configuration 1). The full
/// 4-dimensional array is always built and permuted before any unit
/// axis is dropped, so a fixed permutation can be used regardless of
/// which axes happen to be size 1.
fn reshape_permute<T: Clone>(
    data: Vec<T>,
    samples: usize,
    columns: usize,
    rows: usize,
    frames: usize,
    planar: bool,
) -> (Vec<T>, Vec<usize>) {
    let (wire_shape, permutation): ([usize; 4], [usize; 4]) = if planar {
        ([columns, rows, frames, samples], [0, 1, 2, 3])
    } else {
        ([samples, columns, rows, frames], [1, 2, 3, 0])
    };

    let array = Array::from_shape_vec(IxDyn(&wire_shape), data)
        .expect("pixel data length matches declared dimensions");
    let permuted = array.permuted_axes(IxDyn(&permutation));
    let standard = permuted.as_standard_layout().to_owned();
    let full_shape = standard.shape().to_vec();
    let flat = standard.into_raw_vec();

    let reported_shape: Vec<usize> = full_shape.into_iter().filter(|&d| d != 1).collect();
    (flat, reported_shape)
}

/// Decode the Pixel Data element into a reshaped, typed pixel buffer.
///
/// Returns an error if any of the required image description attributes
/// (Rows, Columns, Bits Allocated, Pixel Representation) or the Pixel
/// Data element itself are missing, or if Pixel Data is encapsulated
/// (use [`encapsulated_fragments`] instead).
pub fn decode_pixel_data(obj: &InMemDicomObject) -> Result<DecodedPixelData> {
    let rows = u32_attr(obj, TAG_ROWS)? as usize;
    let columns = u32_attr(obj, TAG_COLUMNS)? as usize;
    let frames = u32_attr_or(obj, TAG_NUMBER_OF_FRAMES, 1) as usize;
    let samples = u32_attr_or(obj, TAG_SAMPLES_PER_PIXEL, 1) as usize;
    let planar = u32_attr_or(obj, TAG_PLANAR_CONFIGURATION, 0) == 1;
    let bits_allocated = u32_attr(obj, TAG_BITS_ALLOCATED)?;
    let signed = u32_attr_or(obj, TAG_PIXEL_REPRESENTATION, 0) == 1;

    let pixel_value = obj
        .get(TAG_PIXEL_DATA)
        .context(MissingElementSnafu {
            tag: TAG_PIXEL_DATA,
        })?
        .value()
        .as_primitive()
        .context(CastValueSnafu {
            tag: TAG_PIXEL_DATA,
            expected: "a native (non-encapsulated) pixel buffer",
        })?;

    let expected_samples = rows * columns * frames * samples;

    // Bits Allocated/Pixel Representation pick the sample width, but the
    // wire bytes are already unpacked into typed arrays by the VR codec
    // (OB -> U8, OW -> U16); signed buffers are bit-cast from there.
    let (format, data) = match (bits_allocated, signed, pixel_value) {
        (8, false, PrimitiveValue::U8(v)) => (SampleFormat::U8, PixelBuffer::U8(v.to_vec())),
        (8, true, PrimitiveValue::U8(v)) => {
            (SampleFormat::I8, PixelBuffer::I8(v.iter().map(|&x| x as i8).collect()))
        }
        (16, false, PrimitiveValue::U16(v)) => (SampleFormat::U16, PixelBuffer::U16(v.to_vec())),
        (16, true, PrimitiveValue::U16(v)) => {
            (SampleFormat::I16, PixelBuffer::I16(v.iter().map(|&x| x as i16).collect()))
        }
        _ => {
            return CastValueSnafu {
                tag: TAG_PIXEL_DATA,
                expected: "8 or 16 bits allocated matching the decoded sample width",
            }
            .fail()
        }
    };

    let (data, shape) = match data {
        PixelBuffer::U8(v) => {
            debug_assert_eq!(v.len(), expected_samples);
            let (flat, shape) = reshape_permute(v, samples, columns, rows, frames, planar);
            (PixelBuffer::U8(flat), shape)
        }
        PixelBuffer::I8(v) => {
            let (flat, shape) = reshape_permute(v, samples, columns, rows, frames, planar);
            (PixelBuffer::I8(flat), shape)
        }
        PixelBuffer::U16(v) => {
            let (flat, shape) = reshape_permute(v, samples, columns, rows, frames, planar);
            (PixelBuffer::U16(flat), shape)
        }
        PixelBuffer::I16(v) => {
            let (flat, shape) = reshape_permute(v, samples, columns, rows, frames, planar);
            (PixelBuffer::I16(flat), shape)
        }
    };

    Ok(DecodedPixelData { format, shape, data })
}

/// Borrow the encapsulated fragment sequence of Pixel Data, for
/// compressed transfer syntaxes.
pub fn encapsulated_fragments(obj: &InMemDicomObject) -> Result<&PixelFragmentSequence> {
    let value = obj
        .get(TAG_PIXEL_DATA)
        .context(MissingElementSnafu { tag: TAG_PIXEL_DATA })?
        .value();
    match value {
        dicom_core::value::Value::PixelSequence(seq) => Ok(seq),
        _ => CastValueSnafu {
            tag: TAG_PIXEL_DATA,
            expected: "an encapsulated pixel fragment sequence",
        }
        .fail(),
    }
}

/// Apply the forward rescale (`v * slope + intercept`) to a decoded
/// pixel buffer, widening to `f64`.
pub fn rescale_forward(obj: &InMemDicomObject, pixels: &DecodedPixelData) -> Result<Vec<f64>> {
    let slope = f64_attr(obj, TAG_RESCALE_SLOPE)?;
    let intercept = f64_attr(obj, TAG_RESCALE_INTERCEPT)?;
    Ok(pixels
        .data
        .to_f64_vec()
        .into_iter()
        .map(|v| v * slope + intercept)
        .collect())
}

/// Apply the backward rescale (`round((v - intercept) / slope)`) and
/// narrow back to `format`.
pub fn rescale_backward(format: SampleFormat, intercept: f64, slope: f64, values: &[f64]) -> PixelBuffer {
    let narrow = |v: &f64| ((v - intercept) / slope).round();
    match format {
        SampleFormat::U8 => PixelBuffer::U8(values.iter().map(|v| narrow(v) as u8).collect()),
        SampleFormat::I8 => PixelBuffer::I8(values.iter().map(|v| narrow(v) as i8).collect()),
        SampleFormat::U16 => PixelBuffer::U16(values.iter().map(|v| narrow(v) as u16).collect()),
        SampleFormat::I16 => PixelBuffer::I16(values.iter().map(|v| narrow(v) as i16).collect()),
    }
}
