#![deny(unsafe_code)]

//! The standard DICOM data element dictionary.
//!
//! The dictionary index is built once, lazily, behind [`StandardDataDictionary`],
//! a zero-sized handle that implements [`DataDictionary`]. Repeating-group
//! tags (`50xx`, `60xx`) and the private-creator/group-length heuristics
//! are applied at lookup time, before consulting the hash index.

pub mod entries;

use dicom_core::dictionary::{normalize_keyword, DataDictionary, DictionaryEntry};
use dicom_core::header::Tag;
use dicom_core::VR;
use std::collections::HashMap;
use std::sync::OnceLock;

/// A zero-sized handle to the process-wide standard dictionary. All
/// instances are equivalent; the underlying index is built at most once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StandardDataDictionary;

struct Index {
    by_tag: HashMap<Tag, DictionaryEntry>,
    by_name: HashMap<String, DictionaryEntry>,
}

static INDEX: OnceLock<Index> = OnceLock::new();

fn index() -> &'static Index {
    INDEX.get_or_init(|| {
        let mut by_tag = HashMap::with_capacity(entries::ENTRIES.len());
        let mut by_name = HashMap::with_capacity(entries::ENTRIES.len());
        for e in entries::ENTRIES {
            let entry = DictionaryEntry {
                tag: e.0,
                alias: e.1,
                vr: e.2,
            };
            by_tag.insert(e.0, entry);
            by_name.insert(normalize_keyword(e.1), entry);
        }
        Index { by_tag, by_name }
    })
}

/// Canonicalise a tag that may belong to a repeating group: `50xx` group
/// tags fold their group's low byte to zero, and likewise for `60xx`.
fn canonicalize_repeating(tag: Tag) -> Tag {
    match tag.group() >> 8 {
        0x50 => Tag(0x5000, tag.element()),
        0x60 => Tag(0x6000, tag.element()),
        _ => tag,
    }
}

impl DataDictionary for StandardDataDictionary {
    fn by_tag(&self, tag: Tag) -> Option<DictionaryEntry> {
        let canon = canonicalize_repeating(tag);
        if let Some(e) = index().by_tag.get(&canon) {
            return Some(*e);
        }
        if tag.is_group_length() {
            return Some(DictionaryEntry {
                tag,
                alias: "GenericGroupLength",
                vr: VR::UL,
            });
        }
        if tag.is_private_creator() {
            return Some(DictionaryEntry {
                tag,
                alias: "PrivateCreator",
                vr: VR::LO,
            });
        }
        if tag.is_private() {
            return Some(DictionaryEntry {
                tag,
                alias: "PrivateTag",
                vr: VR::UN,
            });
        }
        None
    }

    fn by_name(&self, name: &str) -> Option<DictionaryEntry> {
        index().by_name.get(&normalize_keyword(name)).copied()
    }
}

pub mod uids;

/// Resolves a keyword string literal to its [`Tag`] at compile time,
/// against the static entries in [`entries::ENTRIES`].
///
/// ```
/// use dicom_core::header::Tag;
/// use dicom_dictionary_std::tag_for_keyword;
///
/// const MODALITY: Tag = tag_for_keyword!("Modality");
/// assert_eq!(MODALITY, Tag(0x0008, 0x0060));
/// ```
///
/// Unlike [`DataDictionary::by_name`], which looks a keyword up at run
/// time and returns `Option<Tag>`, this macro fails the build if the
/// keyword is not in the standard dictionary.
#[macro_export]
macro_rules! tag_for_keyword {
    ($keyword:expr) => {
        $crate::entries::resolve_tag_for_keyword($keyword)
    };
}
