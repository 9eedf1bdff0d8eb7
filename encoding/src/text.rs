//! Text payload helpers: whitespace trimming rules per VR family, the
//! backslash-separated list convention, and `DS`/`IS` numeric text parsing.

use chrono::NaiveDate;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::{MalformedNumericTextSnafu, Result};

/// Split a raw text payload on the DICOM list separator (`\`).
pub fn split_list(s: &str) -> SmallVec<[String; 2]> {
    s.split('\\').map(|p| p.to_string()).collect()
}

/// Join a list of text values with the DICOM list separator.
pub fn join_list<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values.into_iter().collect::<Vec<_>>().join("\\")
}

/// Right-trim trailing whitespace and padding, used for the short-text
/// VRs (`AE`, `CS`, `SH`) and long-text VRs (`LO`, `UI`) where leading
/// spaces are also insignificant.
pub fn trim_short(s: &str) -> &str {
    s.trim_end_matches(['\0', ' ']).trim_start_matches(' ')
}

/// Right-trim trailing padding only, preserving any significant leading
/// or internal whitespace. Used for `PN` and the unbounded text VRs
/// (`ST`, `LT`, `UT`).
pub fn trim_trailing(s: &str) -> &str {
    s.trim_end_matches(['\0', ' '])
}

/// Parse a `\`-separated list of `DS` tokens into `f64`s. An empty token
/// becomes `0.0` by policy; any other unparsable token is a hard error.
pub fn parse_ds_list(s: &str) -> Result<SmallVec<[f64; 2]>> {
    s.split('\\')
        .map(|tok| {
            let tok = tok.trim();
            if tok.is_empty() {
                Ok(0.0)
            } else {
                tok.parse::<f64>().map_err(|_| {
                    MalformedNumericTextSnafu {
                        token: tok.to_string(),
                    }
                    .build()
                })
            }
        })
        .collect()
}

/// Parse a `\`-separated list of `IS` tokens into `i32`s. An empty token
/// becomes `0` by policy; any other unparsable token is a hard error.
pub fn parse_is_list(s: &str) -> Result<SmallVec<[i32; 2]>> {
    s.split('\\')
        .map(|tok| {
            let tok = tok.trim();
            if tok.is_empty() {
                Ok(0)
            } else {
                tok.parse::<i32>().map_err(|_| {
                    MalformedNumericTextSnafu {
                        token: tok.to_string(),
                    }
                    .build()
                })
            }
        })
        .collect()
}

/// Best-effort sanity check of a DA (`YYYYMMDD`) value, used only to emit
/// a diagnostic when writing; the value is always stored and round-tripped
/// as plain text regardless of the outcome.
pub fn warn_if_invalid_date(value: &str) {
    if value.len() == 8 && NaiveDate::parse_from_str(value, "%Y%m%d").is_err() {
        debug!(value, "value does not parse as a valid DA calendar date");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_short_text_padding() {
        assert_eq!(trim_short("MR  "), "MR");
        assert_eq!(trim_short("  MR"), "MR");
    }

    #[test]
    fn keeps_internal_whitespace_for_pn() {
        assert_eq!(trim_trailing("Doe^John  "), "Doe^John");
    }

    #[test]
    fn empty_ds_token_becomes_zero() {
        let parsed = parse_ds_list("1.5\\\\2.5").unwrap();
        assert_eq!(&parsed[..], &[1.5, 0.0, 2.5]);
    }

    #[test]
    fn malformed_ds_token_is_an_error() {
        assert!(parse_ds_list("not-a-number").is_err());
    }
}
