//! Traits for querying a DICOM data element dictionary: `(group, element)
//! → (keyword, default VR)` and its inverse.

use crate::header::{Tag, VR};

/// One entry of a data element dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictionaryEntry {
    /// The entry's tag, or the canonical (zeroed) form of a repeating tag.
    pub tag: Tag,
    /// The keyword/alias used for symbolic access.
    pub alias: &'static str,
    /// The default value representation.
    pub vr: VR,
}

/// A read-only DICOM data element dictionary.
///
/// Implementors provide lookups in both directions: tag to keyword/VR,
/// and keyword to tag. The standard dictionary additionally canonicalises
/// repeating group tags (`50xx`, `60xx`) before lookup.
pub trait DataDictionary {
    /// Look up an entry by tag, applying any repeating-group
    /// canonicalisation and private-tag heuristics the dictionary defines.
    fn by_tag(&self, tag: Tag) -> Option<DictionaryEntry>;

    /// Look up an entry by keyword. Matching is whitespace-insensitive.
    fn by_name(&self, name: &str) -> Option<DictionaryEntry>;

    /// Convenience: the default VR for a tag, if known.
    fn vr_of(&self, tag: Tag) -> Option<VR> {
        self.by_tag(tag).map(|e| e.vr)
    }

    /// Convenience: the tag for a keyword, if known.
    fn tag_of(&self, name: &str) -> Option<Tag> {
        self.by_name(name).map(|e| e.tag)
    }
}

/// Normalise a keyword for whitespace-insensitive matching: strip all
/// whitespace and compare case-sensitively against the canonical
/// identifier form used by the dictionary (e.g. `"Patient Name"` and
/// `"PatientName"` both resolve to `PatientName`).
pub fn normalize_keyword(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}
