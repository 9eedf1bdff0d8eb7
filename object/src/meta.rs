//! The file meta group (group `0x0002`), the mandatory prelude of a DICOM
//! Part 10 file: always explicit VR little endian regardless of the
//! body's own transfer syntax.

use std::io::{Chain, Cursor, Read};

use dicom_core::header::Tag;
use dicom_core::VR;
use dicom_encoding::text::trim_trailing;
use snafu::{ensure, ResultExt, Snafu};

/// Result alias for this module.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors specific to reading the preamble and file meta group.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The 128-byte preamble or the `DICM` magic code could not be read.
    #[snafu(display("could not read preamble or magic code: {source}"))]
    ReadMagicCode {
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    /// The magic code `DICM` was not found where expected.
    #[snafu(display("not a DICOM file (magic code check failed)"))]
    NotDicom,

    /// A file meta group element could not be read.
    #[snafu(display("could not read file meta group element: {source}"))]
    ReadValueData {
        /// The underlying I/O failure.
        source: std::io::Error,
    },
}

/// The file meta group, the mandatory prelude of a DICOM Part 10 file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetaTable {
    /// (0002,0001) File Meta Information Version.
    pub information_version: Vec<u8>,
    /// (0002,0002) Media Storage SOP Class UID.
    pub media_storage_sop_class_uid: String,
    /// (0002,0003) Media Storage SOP Instance UID.
    pub media_storage_sop_instance_uid: String,
    /// (0002,0010) Transfer Syntax UID.
    pub transfer_syntax: String,
    /// (0002,0012) Implementation Class UID.
    pub implementation_class_uid: String,
    /// (0002,0013) Implementation Version Name.
    pub implementation_version_name: Option<String>,
}

/// Incrementally fills in a [`FileMetaTable`], defaulting the
/// implementation class UID and version name to this crate's own
/// constants when the caller (or the file being parsed) does not supply
/// them.
#[derive(Debug, Clone, Default)]
pub struct FileMetaTableBuilder {
    information_version: Option<Vec<u8>>,
    media_storage_sop_class_uid: Option<String>,
    media_storage_sop_instance_uid: Option<String>,
    transfer_syntax: Option<String>,
    implementation_class_uid: Option<String>,
    implementation_version_name: Option<String>,
}

impl FileMetaTableBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        FileMetaTableBuilder::default()
    }

    /// Set the File Meta Information Version.
    pub fn information_version(mut self, v: Vec<u8>) -> Self {
        self.information_version = Some(v);
        self
    }

    /// Set the Media Storage SOP Class UID.
    pub fn media_storage_sop_class_uid(mut self, v: impl Into<String>) -> Self {
        self.media_storage_sop_class_uid = Some(v.into());
        self
    }

    /// Set the Media Storage SOP Instance UID.
    pub fn media_storage_sop_instance_uid(mut self, v: impl Into<String>) -> Self {
        self.media_storage_sop_instance_uid = Some(v.into());
        self
    }

    /// Set the Transfer Syntax UID.
    pub fn transfer_syntax(mut self, v: impl Into<String>) -> Self {
        self.transfer_syntax = Some(v.into());
        self
    }

    /// Set the Implementation Class UID.
    pub fn implementation_class_uid(mut self, v: impl Into<String>) -> Self {
        self.implementation_class_uid = Some(v.into());
        self
    }

    /// Set the Implementation Version Name.
    pub fn implementation_version_name(mut self, v: impl Into<String>) -> Self {
        self.implementation_version_name = Some(v.into());
        self
    }

    /// Build the table, defaulting the implementation UID/version and the
    /// File Meta Information Version when not supplied.
    pub fn build(self) -> FileMetaTable {
        FileMetaTable {
            information_version: self.information_version.unwrap_or_else(|| vec![0, 1]),
            media_storage_sop_class_uid: self.media_storage_sop_class_uid.unwrap_or_default(),
            media_storage_sop_instance_uid: self
                .media_storage_sop_instance_uid
                .unwrap_or_default(),
            transfer_syntax: self
                .transfer_syntax
                .unwrap_or_else(|| dicom_transfer_syntax_registry::IMPLICIT_VR_LITTLE_ENDIAN.uid.to_string()),
            implementation_class_uid: self
                .implementation_class_uid
                .unwrap_or_else(|| crate::IMPLEMENTATION_CLASS_UID.to_string()),
            implementation_version_name: self
                .implementation_version_name
                .or_else(|| Some(crate::IMPLEMENTATION_VERSION_NAME.to_string())),
        }
    }
}

/// Read a run of exactly `buf.len()` bytes, returning `0` if the stream
/// was already at a clean end (no bytes read at all), or an error for a
/// partial read.
fn read_or_eof<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        let n = src.read(&mut buf[read..]).context(ReadValueDataSnafu)?;
        if n == 0 {
            break;
        }
        read += n;
    }
    Ok(read)
}

fn latin1_trim(bytes: &[u8]) -> String {
    let text: String = bytes.iter().map(|&b| b as char).collect();
    trim_trailing(&text).to_string()
}

/// Skip the 128-byte preamble.
pub fn skip_preamble<R: Read>(mut src: R) -> Result<()> {
    let mut preamble = [0u8; 128];
    src.read_exact(&mut preamble).context(ReadMagicCodeSnafu)
}

/// Read and validate the 4-byte `DICM` magic code.
pub fn read_dicm_magic<R: Read>(mut src: R) -> Result<()> {
    let mut magic = [0u8; 4];
    src.read_exact(&mut magic).context(ReadMagicCodeSnafu)?;
    ensure!(&magic == b"DICM", NotDicomSnafu);
    Ok(())
}

/// Read the file meta group (always explicit VR little endian) until a
/// tag with group greater than `0x0002` appears, then hand back a reader
/// that replays the already-consumed bytes of that first body tag ahead
/// of whatever remains of `src`, so the body parser can start from
/// exactly where the meta group left off without requiring `Seek`.
pub fn read_meta_table<R: Read>(
    mut src: R,
) -> Result<(FileMetaTable, Chain<Cursor<Vec<u8>>, R>)> {
    let mut builder = FileMetaTableBuilder::new();
    let mut pending = Vec::new();

    loop {
        let mut tag_buf = [0u8; 4];
        let n = read_or_eof(&mut src, &mut tag_buf)?;
        if n == 0 {
            break;
        }
        if n < 4 {
            // unreachable in practice; malformed truncated tag
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "truncated tag",
            ))
            .context(ReadMagicCodeSnafu);
        }
        let group = u16::from_le_bytes([tag_buf[0], tag_buf[1]]);
        let element = u16::from_le_bytes([tag_buf[2], tag_buf[3]]);
        if group != 0x0002 {
            pending.extend_from_slice(&tag_buf);
            break;
        }

        let mut vr_buf = [0u8; 2];
        src.read_exact(&mut vr_buf).context(ReadValueDataSnafu)?;
        let vr = VR::from_binary(vr_buf).unwrap_or(VR::UN);

        let len: u32 = if vr.has_explicit_long_length() {
            let mut reserved = [0u8; 2];
            src.read_exact(&mut reserved).context(ReadValueDataSnafu)?;
            let mut len_buf = [0u8; 4];
            src.read_exact(&mut len_buf).context(ReadValueDataSnafu)?;
            u32::from_le_bytes(len_buf)
        } else {
            let mut len_buf = [0u8; 2];
            src.read_exact(&mut len_buf).context(ReadValueDataSnafu)?;
            u32::from(u16::from_le_bytes(len_buf))
        };

        let mut value = vec![0u8; len as usize];
        src.read_exact(&mut value).context(ReadValueDataSnafu)?;
        if len % 2 == 1 {
            let mut pad = [0u8; 1];
            src.read_exact(&mut pad).context(ReadValueDataSnafu)?;
        }

        match (group, element) {
            (0x0002, 0x0001) => builder = builder.information_version(value),
            (0x0002, 0x0002) => builder = builder.media_storage_sop_class_uid(latin1_trim(&value)),
            (0x0002, 0x0003) => {
                builder = builder.media_storage_sop_instance_uid(latin1_trim(&value))
            }
            (0x0002, 0x0010) => builder = builder.transfer_syntax(latin1_trim(&value)),
            (0x0002, 0x0012) => builder = builder.implementation_class_uid(latin1_trim(&value)),
            (0x0002, 0x0013) => {
                builder = builder.implementation_version_name(latin1_trim(&value))
            }
            _ => {
                // group length and any other group-0002 element carry no
                // information this table models.
                let _ = Tag(group, element);
            }
        }
    }

    Ok((builder.build(), Cursor::new(pending).chain(src)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_element(buf: &mut Vec<u8>, group: u16, element: u16, vr: &[u8; 2], value: &[u8]) {
        buf.extend_from_slice(&group.to_le_bytes());
        buf.extend_from_slice(&element.to_le_bytes());
        buf.extend_from_slice(vr);
        buf.extend_from_slice(&(value.len() as u16).to_le_bytes());
        buf.extend_from_slice(value);
    }

    #[test]
    fn reads_meta_table_and_preserves_body_prefix() {
        let mut bytes = Vec::new();
        push_element(&mut bytes, 0x0002, 0x0002, b"UI", b"1.2.840.10008.5.1.4.1.1.7\0");
        push_element(&mut bytes, 0x0002, 0x0010, b"UI", b"1.2.840.10008.1.2.1\0");
        // first body element
        push_element(&mut bytes, 0x0008, 0x0060, b"CS", b"CT");

        let (table, mut rest) = read_meta_table(&bytes[..]).unwrap();
        assert_eq!(table.transfer_syntax, "1.2.840.10008.1.2.1");
        assert_eq!(table.media_storage_sop_class_uid, "1.2.840.10008.5.1.4.1.1.7");
        assert_eq!(table.implementation_class_uid, crate::IMPLEMENTATION_CLASS_UID);

        let mut remaining = Vec::new();
        rest.read_to_end(&mut remaining).unwrap();
        let mut expected = Vec::new();
        push_element(&mut expected, 0x0008, 0x0060, b"CS", b"CT");
        assert_eq!(remaining, expected);
    }

    #[test]
    fn builder_defaults_implementation_fields() {
        let table = FileMetaTableBuilder::new().build();
        assert_eq!(table.implementation_class_uid, crate::IMPLEMENTATION_CLASS_UID);
        assert_eq!(
            table.implementation_version_name.as_deref(),
            Some(crate::IMPLEMENTATION_VERSION_NAME)
        );
        assert_eq!(
            table.transfer_syntax,
            dicom_transfer_syntax_registry::IMPLICIT_VR_LITTLE_ENDIAN.uid
        );
    }
}
