//! Positioned scalar/array reads and writes, with byte-swapping driven by
//! the active transfer syntax rather than host byte order.

use byteordered::ByteOrdered;
pub use byteordered::Endianness;
use std::io::{Read, Write};

use crate::error::{ReadValueSnafu, Result, WriteValueSnafu};
use snafu::ResultExt;

/// A thin positioned-I/O adapter that reads and writes DICOM scalar and
/// array types, swapping bytes according to an [`Endianness`] chosen by
/// the active transfer syntax. A native-endian host is not special-cased:
/// the swap direction is always derived from `self.endianness`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSyntaxIo {
    endianness: Endianness,
}

impl TransferSyntaxIo {
    /// Build an adapter for the given endianness.
    pub fn new(endianness: Endianness) -> Self {
        TransferSyntaxIo { endianness }
    }

    /// The endianness this adapter swaps for.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Read a `u16`.
    pub fn read_u16<R: Read>(&self, src: R) -> Result<u16> {
        ByteOrdered::runtime(src, self.endianness)
            .read_u16()
            .context(ReadValueSnafu)
    }

    /// Read a `u32`.
    pub fn read_u32<R: Read>(&self, src: R) -> Result<u32> {
        ByteOrdered::runtime(src, self.endianness)
            .read_u32()
            .context(ReadValueSnafu)
    }

    /// Read an `i16`.
    pub fn read_i16<R: Read>(&self, src: R) -> Result<i16> {
        ByteOrdered::runtime(src, self.endianness)
            .read_i16()
            .context(ReadValueSnafu)
    }

    /// Read an `i32`.
    pub fn read_i32<R: Read>(&self, src: R) -> Result<i32> {
        ByteOrdered::runtime(src, self.endianness)
            .read_i32()
            .context(ReadValueSnafu)
    }

    /// Read an `f32`.
    pub fn read_f32<R: Read>(&self, src: R) -> Result<f32> {
        ByteOrdered::runtime(src, self.endianness)
            .read_f32()
            .context(ReadValueSnafu)
    }

    /// Read an `f64`.
    pub fn read_f64<R: Read>(&self, src: R) -> Result<f64> {
        ByteOrdered::runtime(src, self.endianness)
            .read_f64()
            .context(ReadValueSnafu)
    }

    /// Read `n` `u16`s into a freshly allocated vector.
    pub fn read_u16_into<R: Read>(&self, mut src: R, out: &mut [u16]) -> Result<()> {
        ByteOrdered::runtime(&mut src, self.endianness)
            .read_u16_into(out)
            .context(ReadValueSnafu)
    }

    /// Read a run of raw bytes (endianness does not apply byte-for-byte).
    pub fn read_bytes<R: Read>(&self, mut src: R, out: &mut [u8]) -> Result<()> {
        src.read_exact(out).context(ReadValueSnafu)
    }

    /// Write a `u16`.
    pub fn write_u16<W: Write>(&self, dst: W, value: u16) -> Result<()> {
        ByteOrdered::runtime(dst, self.endianness)
            .write_u16(value)
            .context(WriteValueSnafu)
    }

    /// Write a `u32`.
    pub fn write_u32<W: Write>(&self, dst: W, value: u32) -> Result<()> {
        ByteOrdered::runtime(dst, self.endianness)
            .write_u32(value)
            .context(WriteValueSnafu)
    }

    /// Write an `i16`.
    pub fn write_i16<W: Write>(&self, dst: W, value: i16) -> Result<()> {
        ByteOrdered::runtime(dst, self.endianness)
            .write_i16(value)
            .context(WriteValueSnafu)
    }

    /// Write an `i32`.
    pub fn write_i32<W: Write>(&self, dst: W, value: i32) -> Result<()> {
        ByteOrdered::runtime(dst, self.endianness)
            .write_i32(value)
            .context(WriteValueSnafu)
    }

    /// Write an `f32`.
    pub fn write_f32<W: Write>(&self, dst: W, value: f32) -> Result<()> {
        ByteOrdered::runtime(dst, self.endianness)
            .write_f32(value)
            .context(WriteValueSnafu)
    }

    /// Write an `f64`.
    pub fn write_f64<W: Write>(&self, dst: W, value: f64) -> Result<()> {
        ByteOrdered::runtime(dst, self.endianness)
            .write_f64(value)
            .context(WriteValueSnafu)
    }

    /// Write a raw byte run unchanged.
    pub fn write_bytes<W: Write>(&self, mut dst: W, bytes: &[u8]) -> Result<()> {
        dst.write_all(bytes).context(WriteValueSnafu)
    }
}

/// Encode a length-prefixed payload using the "write placeholder, fill,
/// rewind, write length" idiom, realised over a plain [`Write`] sink (not
/// necessarily [`std::io::Seek`]-able) by building the payload in memory
/// first and then emitting the now-known length followed by the bytes.
///
/// This is the idiom used for sequence items with a defined length: the
/// item's element stream is encoded into a buffer, its size becomes the
/// item header's length field, and only then is anything written to the
/// real sink.
pub fn encode_with_known_length<W: Write>(
    dst: &mut W,
    io: &TransferSyntaxIo,
    build: impl FnOnce(&mut Vec<u8>) -> Result<()>,
) -> Result<u32> {
    let mut buf = Vec::new();
    build(&mut buf)?;
    let len = buf.len() as u32;
    io.write_u32(&mut *dst, len)?;
    io.write_bytes(dst, &buf)?;
    Ok(len)
}
