//! Static table of standard DICOM data element dictionary entries.
//!
//! This is a representative subset of the PS3.6 data element dictionary:
//! the attributes exercised by the documented test scenarios plus the
//! commonly-used attributes of the patient/study/series/image/pixel-data
//! modules. The full ~3000-entry standard dictionary is treated as
//! compile-time data generated by an external tool and is out of scope
//! for this crate; callers needing full coverage would plug in a
//! generated table behind the same [`DataDictionary`](dicom_core::DataDictionary)
//! trait.

use dicom_core::header::Tag;
use dicom_core::VR;

/// One entry of the static table: tag, canonical alias, default VR.
pub struct Entry(pub Tag, pub &'static str, pub VR);

/// The standard dictionary entries, sorted by tag for readability (lookup
/// itself is done through a hash index built once at first use).
pub static ENTRIES: &[Entry] = &[
    // File Meta Information (group 0002, always explicit VR little endian)
    Entry(Tag(0x0002, 0x0000), "FileMetaInformationGroupLength", VR::UL),
    Entry(Tag(0x0002, 0x0001), "FileMetaInformationVersion", VR::OB),
    Entry(Tag(0x0002, 0x0002), "MediaStorageSOPClassUID", VR::UI),
    Entry(Tag(0x0002, 0x0003), "MediaStorageSOPInstanceUID", VR::UI),
    Entry(Tag(0x0002, 0x0010), "TransferSyntaxUID", VR::UI),
    Entry(Tag(0x0002, 0x0012), "ImplementationClassUID", VR::UI),
    Entry(Tag(0x0002, 0x0013), "ImplementationVersionName", VR::SH),
    Entry(Tag(0x0002, 0x0016), "SourceApplicationEntityTitle", VR::AE),
    // Identification
    Entry(Tag(0x0008, 0x0005), "SpecificCharacterSet", VR::CS),
    Entry(Tag(0x0008, 0x0008), "ImageType", VR::CS),
    Entry(Tag(0x0008, 0x0012), "InstanceCreationDate", VR::DA),
    Entry(Tag(0x0008, 0x0013), "InstanceCreationTime", VR::TM),
    Entry(Tag(0x0008, 0x0016), "SOPClassUID", VR::UI),
    Entry(Tag(0x0008, 0x0018), "SOPInstanceUID", VR::UI),
    Entry(Tag(0x0008, 0x0020), "StudyDate", VR::DA),
    Entry(Tag(0x0008, 0x0021), "SeriesDate", VR::DA),
    Entry(Tag(0x0008, 0x0030), "StudyTime", VR::TM),
    Entry(Tag(0x0008, 0x0031), "SeriesTime", VR::TM),
    Entry(Tag(0x0008, 0x0050), "AccessionNumber", VR::SH),
    Entry(Tag(0x0008, 0x0060), "Modality", VR::CS),
    Entry(Tag(0x0008, 0x0070), "Manufacturer", VR::LO),
    Entry(Tag(0x0008, 0x0080), "InstitutionName", VR::LO),
    Entry(Tag(0x0008, 0x0090), "ReferringPhysicianName", VR::PN),
    Entry(Tag(0x0008, 0x1030), "StudyDescription", VR::LO),
    Entry(Tag(0x0008, 0x103E), "SeriesDescription", VR::LO),
    Entry(Tag(0x0008, 0x1090), "ManufacturerModelName", VR::LO),
    // Patient module
    Entry(Tag(0x0010, 0x0010), "PatientName", VR::PN),
    Entry(Tag(0x0010, 0x0020), "PatientID", VR::LO),
    Entry(Tag(0x0010, 0x0030), "PatientBirthDate", VR::DA),
    Entry(Tag(0x0010, 0x0040), "PatientSex", VR::CS),
    Entry(Tag(0x0010, 0x1010), "PatientAge", VR::AS),
    Entry(Tag(0x0010, 0x1030), "PatientWeight", VR::DS),
    // Study/Series/Equipment
    Entry(Tag(0x0018, 0x0050), "SliceThickness", VR::DS),
    Entry(Tag(0x0018, 0x0060), "KVP", VR::DS),
    Entry(Tag(0x0018, 0x1151), "XRayTubeCurrent", VR::IS),
    Entry(Tag(0x0018, 0x1152), "Exposure", VR::IS),
    // (0018,1170) GeneratorPower is deliberately absent: it is only
    // resolvable through a caller-supplied aux_vr override, the way a
    // retired/ambiguous attribute from an older transfer syntax would be.
    Entry(Tag(0x0020, 0x000D), "StudyInstanceUID", VR::UI),
    Entry(Tag(0x0020, 0x000E), "SeriesInstanceUID", VR::UI),
    Entry(Tag(0x0020, 0x0010), "StudyID", VR::SH),
    Entry(Tag(0x0020, 0x0011), "SeriesNumber", VR::IS),
    Entry(Tag(0x0020, 0x0013), "InstanceNumber", VR::IS),
    Entry(Tag(0x0020, 0x0032), "ImagePositionPatient", VR::DS),
    Entry(Tag(0x0020, 0x0037), "ImageOrientationPatient", VR::DS),
    Entry(Tag(0x0020, 0x0052), "FrameOfReferenceUID", VR::UI),
    // Image pixel module
    Entry(Tag(0x0028, 0x0002), "SamplesPerPixel", VR::US),
    Entry(Tag(0x0028, 0x0004), "PhotometricInterpretation", VR::CS),
    Entry(Tag(0x0028, 0x0006), "PlanarConfiguration", VR::US),
    Entry(Tag(0x0028, 0x0008), "NumberOfFrames", VR::IS),
    Entry(Tag(0x0028, 0x0010), "Rows", VR::US),
    Entry(Tag(0x0028, 0x0011), "Columns", VR::US),
    Entry(Tag(0x0028, 0x0012), "Planes", VR::US),
    Entry(Tag(0x0028, 0x0030), "PixelSpacing", VR::DS),
    Entry(Tag(0x0028, 0x0100), "BitsAllocated", VR::US),
    Entry(Tag(0x0028, 0x0101), "BitsStored", VR::US),
    Entry(Tag(0x0028, 0x0102), "HighBit", VR::US),
    Entry(Tag(0x0028, 0x0103), "PixelRepresentation", VR::US),
    Entry(Tag(0x0028, 0x0120), "PixelPaddingValue", VR::US),
    Entry(Tag(0x0028, 0x1050), "WindowCenter", VR::DS),
    Entry(Tag(0x0028, 0x1051), "WindowWidth", VR::DS),
    Entry(Tag(0x0028, 0x1052), "RescaleIntercept", VR::DS),
    Entry(Tag(0x0028, 0x1053), "RescaleSlope", VR::DS),
    Entry(Tag(0x0028, 0x1054), "RescaleType", VR::LO),
    // Sequences
    Entry(Tag(0x0008, 0x1110), "ReferencedStudySequence", VR::SQ),
    Entry(Tag(0x0008, 0x1140), "ReferencedImageSequence", VR::SQ),
    Entry(Tag(0x0040, 0x0275), "RequestAttributesSequence", VR::SQ),
    Entry(Tag(0x3006, 0x0039), "ROIContourSequence", VR::SQ),
    // Pixel data itself; VR here is the common default (OW), but the
    // element codec always consults the header's explicit VR (if any)
    // or this default, never assumes OB/OW from the tag alone.
    Entry(Tag(0x7FE0, 0x0000), "GroupLength", VR::UL),
    Entry(Tag(0x7FE0, 0x0010), "PixelData", VR::OW),
    // Canonical (zeroed) repeating-group entries: 50xx (curve data,
    // retired) and 60xx (overlay data).
    Entry(Tag(0x5000, 0x0010), "CurveDimensions", VR::US),
    Entry(Tag(0x5000, 0x0020), "NumberOfPoints", VR::US),
    Entry(Tag(0x5000, 0x0030), "CurveData", VR::OW),
    Entry(Tag(0x6000, 0x0010), "OverlayRows", VR::US),
    Entry(Tag(0x6000, 0x0011), "OverlayColumns", VR::US),
    Entry(Tag(0x6000, 0x0040), "OverlayType", VR::CS),
    Entry(Tag(0x6000, 0x3000), "OverlayData", VR::OW),
];

const fn str_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Resolves a keyword against [`ENTRIES`] in a `const` context, so that
/// [`tag_for_keyword!`](crate::tag_for_keyword) can fail to compile on an
/// unknown keyword rather than returning `None` at run time.
///
/// Not part of the [`DataDictionary`](dicom_core::dictionary::DataDictionary)
/// trait: that trait's `by_name` does the same scan at run time, against a
/// `&str` built from caller input, which cannot be a `const fn`.
pub const fn resolve_tag_for_keyword(name: &str) -> Tag {
    let mut i = 0;
    while i < ENTRIES.len() {
        if str_eq(ENTRIES[i].1, name) {
            return ENTRIES[i].0;
        }
        i += 1;
    }
    panic!("tag_for_keyword!: keyword not found in the standard dictionary")
}
