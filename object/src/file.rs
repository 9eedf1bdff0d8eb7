//! The File Orchestrator: preamble handling, transfer-syntax inference,
//! and the parse/write entry points for whole DICOM Part 10 files and
//! directories of them.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use dicom_core::header::{Header, Tag, VR};
use dicom_core::value::{PrimitiveValue, Value};
use dicom_dictionary_std::StandardDataDictionary;
use dicom_parser::mode::{Mode, VrOverrideMap};
use dicom_parser::read::read_dataset;
use dicom_parser::write::{write_element, OutElement};
use smallvec::SmallVec;
use snafu::ResultExt;
use tracing::warn;

use crate::error::{IoSnafu, Result};
use crate::mem::InMemDicomObject;
use crate::meta::{self, FileMetaTable};

/// A fully parsed DICOM Part 10 object: the file meta group plus the
/// in-memory data set it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDicomObject {
    /// The file meta group.
    pub meta: FileMetaTable,
    /// The data set, in the encoding named by `meta.transfer_syntax`.
    pub data: InMemDicomObject,
}

impl std::ops::Deref for FileDicomObject {
    type Target = InMemDicomObject;

    fn deref(&self) -> &InMemDicomObject {
        &self.data
    }
}

/// Options controlling how a DICOM stream or file is parsed.
#[derive(Debug, Clone)]
pub struct OpenFileOptions {
    /// Whether to expect and skip the 128-byte preamble and `DICM` magic
    /// code. Set to `false` for "headless" streams.
    pub preamble: bool,
    /// Stop parsing the body as soon as a tag's group exceeds this value.
    pub max_group: Option<u16>,
    /// Per-tag value representation overrides, applied to body elements.
    pub aux_vr: VrOverrideMap,
}

impl Default for OpenFileOptions {
    fn default() -> Self {
        OpenFileOptions {
            preamble: true,
            max_group: None,
            aux_vr: VrOverrideMap::new(),
        }
    }
}

/// Parse a DICOM object from any [`Read`] source, using the default
/// options (preamble required, no group limit, no VR overrides).
pub fn from_reader<R: Read>(src: R) -> Result<FileDicomObject> {
    from_reader_with_options(src, OpenFileOptions::default())
}

/// Parse a DICOM object from any [`Read`] source, with explicit options.
pub fn from_reader_with_options<R: Read>(
    mut src: R,
    opts: OpenFileOptions,
) -> Result<FileDicomObject> {
    if opts.preamble {
        meta::skip_preamble(&mut src)?;
        meta::read_dicm_magic(&mut src)?;
    }
    let (table, mut body) = meta::read_meta_table(src)?;

    let ts = dicom_transfer_syntax_registry::resolve(Some(&table.transfer_syntax));
    let mode = Mode::new(ts.endianness, ts.explicit_vr);
    let dict = StandardDataDictionary;

    let data: InMemDicomObject = read_dataset(
        &mut body,
        mode,
        &dict,
        &opts.aux_vr,
        opts.max_group,
        None,
    )?;

    Ok(FileDicomObject { meta: table, data })
}

/// Open and parse a DICOM file from a filesystem path, using the default
/// options.
pub fn open_file<P: AsRef<Path>>(path: P) -> Result<FileDicomObject> {
    open_file_with_options(path, OpenFileOptions::default())
}

/// Open and parse a DICOM file from a filesystem path, with explicit
/// options.
pub fn open_file_with_options<P: AsRef<Path>>(
    path: P,
    opts: OpenFileOptions,
) -> Result<FileDicomObject> {
    let f = File::open(path).context(IoSnafu)?;
    from_reader_with_options(BufReader::new(f), opts)
}

/// Options controlling how a DICOM object is serialised.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Whether to emit the 128-byte preamble and `DICM` magic code.
    pub preamble: bool,
    /// Per-tag value representation overrides, applied to body elements
    /// as they are written; a `None` entry omits that tag from the
    /// output entirely, mirroring [`OpenFileOptions::aux_vr`] on read.
    pub aux_vr: VrOverrideMap,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            preamble: true,
            aux_vr: VrOverrideMap::new(),
        }
    }
}

/// Write a DICOM object to any [`Write`] sink, using the given options.
pub fn to_writer<W: Write>(obj: &FileDicomObject, dst: W, opts: WriteOptions) -> Result<()> {
    write_with_options(obj, dst, opts)
}

fn write_with_options<W: Write>(
    obj: &FileDicomObject,
    mut dst: W,
    opts: WriteOptions,
) -> Result<()> {
    if opts.preamble {
        dst.write_all(&[0u8; 128]).context(IoSnafu)?;
        dst.write_all(b"DICM").context(IoSnafu)?;
    }
    write_meta_table(&mut dst, &obj.meta)?;

    let ts = dicom_transfer_syntax_registry::resolve(Some(&obj.meta.transfer_syntax));
    let mode = Mode::new(ts.endianness, ts.explicit_vr);
    encode_dataset(&mut dst, mode, &obj.data, &opts.aux_vr)?;
    Ok(())
}

/// Serialise a DICOM object to a filesystem path, using the default
/// options.
pub fn save_file<P: AsRef<Path>>(obj: &FileDicomObject, path: P) -> Result<()> {
    let f = File::create(path).context(IoSnafu)?;
    to_writer(obj, BufWriter::new(f), WriteOptions::default())
}

fn write_meta_text<W: Write>(dst: &mut W, mode: Mode, tag: Tag, vr: VR, text: &str) -> Result<()> {
    let value = PrimitiveValue::Str(text.to_string());
    write_element(dst, mode, OutElement::Primitive(tag, vr, &value))?;
    Ok(())
}

fn write_meta_table<W: Write>(dst: &mut W, table: &FileMetaTable) -> Result<()> {
    let mode = Mode::META;
    let mut body = Vec::new();

    let version = PrimitiveValue::U8(SmallVec::from_slice(&table.information_version));
    write_element(
        &mut body,
        mode,
        OutElement::Primitive(Tag(0x0002, 0x0001), VR::OB, &version),
    )?;
    write_meta_text(
        &mut body,
        mode,
        Tag(0x0002, 0x0002),
        VR::UI,
        &table.media_storage_sop_class_uid,
    )?;
    write_meta_text(
        &mut body,
        mode,
        Tag(0x0002, 0x0003),
        VR::UI,
        &table.media_storage_sop_instance_uid,
    )?;
    write_meta_text(&mut body, mode, Tag(0x0002, 0x0010), VR::UI, &table.transfer_syntax)?;
    write_meta_text(
        &mut body,
        mode,
        Tag(0x0002, 0x0012),
        VR::UI,
        &table.implementation_class_uid,
    )?;
    if let Some(name) = &table.implementation_version_name {
        write_meta_text(&mut body, mode, Tag(0x0002, 0x0013), VR::SH, name)?;
    }

    let group_len = PrimitiveValue::U32(SmallVec::from_slice(&[body.len() as u32]));
    write_element(
        dst,
        mode,
        OutElement::Primitive(Tag(0x0002, 0x0000), VR::UL, &group_len),
    )?;
    dst.write_all(&body).context(IoSnafu)
}

/// Encode a data set's elements, in tag order, recursing into sequence
/// items as needed. `aux_vr` mirrors [`OpenFileOptions::aux_vr`] on the
/// write side: a `None` entry for a tag omits it from the output, and a
/// `Some(vr)` entry overrides the VR a primitive element is written with.
fn encode_dataset<W: Write>(
    dst: &mut W,
    mode: Mode,
    obj: &InMemDicomObject,
    aux_vr: &VrOverrideMap,
) -> Result<()> {
    for element in obj.iter() {
        let tag = element.tag();
        let over = aux_vr.get(&tag).copied();
        if over == Some(None) {
            continue;
        }
        match element.value() {
            Value::Primitive(v) => {
                let vr = over.flatten().unwrap_or_else(|| element.vr());
                write_element(dst, mode, OutElement::Primitive(tag, vr, v))?
            }
            Value::Sequence { items, size } => {
                let mut bodies = Vec::with_capacity(items.len());
                for item in items {
                    let mut buf = Vec::new();
                    encode_dataset(&mut buf, mode, item, aux_vr)?;
                    bodies.push(buf);
                }
                write_element(dst, mode, OutElement::Sequence(tag, &bodies, *size))?;
            }
            Value::PixelSequence(frags) => {
                write_element(dst, mode, OutElement::PixelSequence(tag, frags))?;
            }
        }
    }
    Ok(())
}

/// Options controlling a directory walk.
#[derive(Debug, Clone)]
pub struct DirWalkOptions {
    /// Skip dot-prefixed (hidden) file names.
    pub skip_hidden: bool,
    /// Abort the whole walk on the first unreadable file, rather than
    /// logging and skipping it.
    pub abort_on_error: bool,
}

impl Default for DirWalkOptions {
    fn default() -> Self {
        DirWalkOptions {
            skip_hidden: true,
            abort_on_error: true,
        }
    }
}

/// Parse every file in a directory, returning them sorted by
/// (0020,0013) Instance Number (files lacking it sort last).
pub fn parse_directory<P: AsRef<Path>>(
    path: P,
    opts: DirWalkOptions,
) -> Result<Vec<FileDicomObject>> {
    let mut entries: Vec<_> = fs::read_dir(path)
        .context(IoSnafu)?
        .collect::<std::io::Result<Vec<_>>>()
        .context(IoSnafu)?;
    entries.sort_by_key(|e| e.file_name());

    let mut out = Vec::new();
    for entry in entries {
        let p = entry.path();
        if !p.is_file() {
            continue;
        }
        if opts.skip_hidden {
            if let Some(name) = p.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    continue;
                }
            }
        }
        match open_file(&p) {
            Ok(obj) => out.push(obj),
            Err(e) if !opts.abort_on_error => {
                warn!(path = %p.display(), error = %e, "skipping unreadable file in directory walk");
            }
            Err(e) => return Err(e),
        }
    }
    out.sort_by_key(instance_number);
    Ok(out)
}

fn instance_number(obj: &FileDicomObject) -> i32 {
    obj.data
        .value(Tag(0x0020, 0x0013))
        .and_then(|v| match v {
            PrimitiveValue::I32(v) => v.first().copied(),
            PrimitiveValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explicit_le_file_bytes() -> Vec<u8> {
        let mut bytes = vec![0u8; 128];
        bytes.extend_from_slice(b"DICM");
        // meta group: transfer syntax only (explicit VR LE UID)
        let ts_uid = b"1.2.840.10008.1.2.1\0";
        bytes.extend_from_slice(&0x0002u16.to_le_bytes());
        bytes.extend_from_slice(&0x0010u16.to_le_bytes());
        bytes.extend_from_slice(b"UI");
        bytes.extend_from_slice(&(ts_uid.len() as u16).to_le_bytes());
        bytes.extend_from_slice(ts_uid);
        // body: (0008,0060) Modality CS "CT"
        bytes.extend_from_slice(&0x0008u16.to_le_bytes());
        bytes.extend_from_slice(&0x0060u16.to_le_bytes());
        bytes.extend_from_slice(b"CS");
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(b"CT");
        bytes
    }

    #[test]
    fn parses_headered_explicit_le_file() {
        let bytes = explicit_le_file_bytes();
        let obj = from_reader(&bytes[..]).unwrap();
        assert_eq!(obj.meta.transfer_syntax, "1.2.840.10008.1.2.1");
        assert_eq!(
            obj.data.value(Tag(0x0008, 0x0060)),
            Some(&PrimitiveValue::Str("CT".to_string()))
        );
    }

    #[test]
    fn parses_headless_implicit_le_stream() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x0008u16.to_le_bytes());
        bytes.extend_from_slice(&0x0060u16.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(b"OT");
        let opts = OpenFileOptions {
            preamble: false,
            ..OpenFileOptions::default()
        };
        let obj = from_reader_with_options(&bytes[..], opts).unwrap();
        assert_eq!(
            obj.data.value(Tag(0x0008, 0x0060)),
            Some(&PrimitiveValue::Str("OT".to_string()))
        );
    }

    #[test]
    fn max_group_stops_before_pixel_data() {
        let mut bytes = vec![0u8; 128];
        bytes.extend_from_slice(b"DICM");
        bytes.extend_from_slice(&0x0008u16.to_le_bytes());
        bytes.extend_from_slice(&0x0060u16.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(b"CT");
        bytes.extend_from_slice(&0x7FE0u16.to_le_bytes());
        bytes.extend_from_slice(&0x0010u16.to_le_bytes());
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 0]);

        let opts = OpenFileOptions {
            max_group: Some(0x0008),
            ..OpenFileOptions::default()
        };
        let obj = from_reader_with_options(&bytes[..], opts).unwrap();
        assert!(obj.data.contains(Tag(0x0008, 0x0060)));
        assert!(!obj.data.contains(Tag(0x7FE0, 0x0010)));
    }

    #[test]
    fn round_trip_write_then_read_is_stable() {
        let bytes = explicit_le_file_bytes();
        let obj = from_reader(&bytes[..]).unwrap();
        let mut out = Vec::new();
        to_writer(&obj, &mut out, WriteOptions::default()).unwrap();
        let reparsed = from_reader(&out[..]).unwrap();
        assert_eq!(reparsed.data, obj.data);
        assert_eq!(reparsed.meta.transfer_syntax, obj.meta.transfer_syntax);

        let mut out2 = Vec::new();
        to_writer(&reparsed, &mut out2, WriteOptions::default()).unwrap();
        assert_eq!(out, out2);
    }

    #[test]
    fn write_aux_vr_overrides_vr_and_skips_tags() {
        let bytes = explicit_le_file_bytes();
        let obj = from_reader(&bytes[..]).unwrap();

        let mut aux_vr = VrOverrideMap::new();
        aux_vr.insert(Tag(0x0008, 0x0060), Some(VR::LO));
        let mut out = Vec::new();
        to_writer(
            &obj,
            &mut out,
            WriteOptions {
                aux_vr,
                ..WriteOptions::default()
            },
        )
        .unwrap();
        let reparsed = from_reader(&out[..]).unwrap();
        assert_eq!(
            reparsed.data.value(Tag(0x0008, 0x0060)),
            Some(&PrimitiveValue::Str("CT".to_string()))
        );

        let mut skip_vr = VrOverrideMap::new();
        skip_vr.insert(Tag(0x0008, 0x0060), None);
        let mut skipped_out = Vec::new();
        to_writer(
            &obj,
            &mut skipped_out,
            WriteOptions {
                aux_vr: skip_vr,
                ..WriteOptions::default()
            },
        )
        .unwrap();
        let reparsed_skipped = from_reader(&skipped_out[..]).unwrap();
        assert!(!reparsed_skipped.data.contains(Tag(0x0008, 0x0060)));
    }
}
