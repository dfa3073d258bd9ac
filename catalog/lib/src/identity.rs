//! Identity resolution for catalog titles.
//!
//! Every row of a committee catalogue carries a raw title such as
//! `ISO/IEC 21000-22:2016` or `ISO/IEC 21000-22:2016/Amd 1:2018`. This module
//! turns that title into the identifiers the rest of the pipeline keys on:
//!
//! - the **base id**: the numeric core shared by every version of a document
//!   (`21000-22`)
//! - the **cross-reference id**: the stable output key (`iso21000-22`)
//! - the **ISO number**: the dated form (`ISO 21000-22:2016`), only for
//!   versioned base documents
//!
//! Base documents drop the year from their cross-reference id so that every
//! version collapses onto one key. Addons (amendments, corrigenda) keep the
//! year, so `Amd 1:2018` and `Amd 1:2020` stay distinct.
//!
//! ## Examples
//!
//! ```
//! use catalog_lib::identity::Identity;
//!
//! let identity = Identity::resolve("ISO/IEC 21000-22:2016/Amd 1:2018").unwrap();
//! assert!(identity.is_addon);
//! assert_eq!(identity.base_id, "21000-22");
//! assert_eq!(identity.cross_ref_id, "iso21000-22-2016-amd1-2018");
//! assert_eq!(identity.iso_number, None);
//! ```

use crate::types::CatalogError;
use lazy_static::lazy_static;
use regex::{Match, Regex};

/// Registering-body tag that prefixes most catalogue titles.
pub const PUBLISHER_PREFIX: &str = "ISO/IEC ";

/// Prefix of every cross-reference id.
pub const CROSS_REF_PREFIX: &str = "iso";

lazy_static! {
    /// A run of digits, optionally joined by hyphens: `21000-22`.
    static ref BASE_ID_PATTERN: Regex = Regex::new(r"\d+(?:-\d+)*").unwrap();

    /// A base id followed by its year suffix: `21000-22:2016`.
    static ref DATED_ID_PATTERN: Regex = Regex::new(r"\d+(?:-\d+)*:\d+(?:-\d+)*").unwrap();

    /// A publication date as shown on detail pages: `2016-08`.
    static ref RAW_DATE_PATTERN: Regex = Regex::new(r"^\d{4}-\d{2}$").unwrap();
}

/// Finds the first base-id run in `text`.
pub fn find_base_id(text: &str) -> Option<Match<'_>> {
    BASE_ID_PATTERN.find(text)
}

/// Finds the first `<id>:<year>` substring in `text`.
pub fn find_dated_id(text: &str) -> Option<&str> {
    DATED_ID_PATTERN.find(text).map(|m| m.as_str())
}

/// Returns `true` when `text` is exactly a `YYYY-MM` date.
pub fn is_raw_date(text: &str) -> bool {
    RAW_DATE_PATTERN.is_match(text)
}

/// Removes [`PUBLISHER_PREFIX`] from the start of a title, if present.
pub fn strip_publisher_prefix(title: &str) -> &str {
    title.strip_prefix(PUBLISHER_PREFIX).unwrap_or(title)
}

/// Returns `true` when the title names a supplement to a base document.
///
/// The publisher prefix is stripped first, since `ISO/IEC` itself contains a slash.
pub fn is_addon(title: &str) -> bool {
    strip_publisher_prefix(title).contains('/')
}

/// Extracts the base id of a title.
///
/// For addons this is the parent document's numeric core.
///
/// ## Errors
///
/// Returns [`CatalogError::Parse`] when the title contains no digits.
pub fn extract_base_id(title: &str) -> Result<String, CatalogError> {
    find_base_id(strip_publisher_prefix(title))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| CatalogError::parse(format!("title '{title}'"), "no base id found"))
}

/// Builds the cross-reference id used as the output key.
///
/// Base documents map to `iso<base id>`. Addons keep everything from the base id
/// onwards, lower-cased, with spaces removed and `:`/`/` turned into hyphens.
///
/// ## Errors
///
/// Returns [`CatalogError::Parse`] when the title contains no base id.
pub fn build_cross_ref_id(title: &str, is_addon: bool) -> Result<String, CatalogError> {
    let stripped = strip_publisher_prefix(title);
    let base = find_base_id(stripped)
        .ok_or_else(|| CatalogError::parse(format!("title '{title}'"), "no base id found"))?;

    if !is_addon {
        return Ok(format!("{CROSS_REF_PREFIX}{}", base.as_str()));
    }

    let suffix: String = stripped[base.start()..]
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ':' || c == '/' { '-' } else { c })
        .collect();

    Ok(format!("{CROSS_REF_PREFIX}{suffix}"))
}

/// Builds the `ISO <id>:<year>` number of a versioned base document.
///
/// Returns `None` for addons and for undated titles (documents still under
/// development carry no year suffix).
///
/// ## Errors
///
/// Returns [`CatalogError::Parse`] when the title has a colon but no
/// `<id>:<year>` substring.
pub fn build_iso_number(title: &str, is_addon: bool) -> Result<Option<String>, CatalogError> {
    if is_addon {
        return Ok(None);
    }

    let stripped = strip_publisher_prefix(title);
    if !stripped.contains(':') {
        return Ok(None);
    }

    find_dated_id(stripped)
        .map(|dated| Some(format!("ISO {dated}")))
        .ok_or_else(|| {
            CatalogError::parse(format!("title '{title}'"), "colon present but no dated id")
        })
}

/// Every identifier derived from one raw title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub is_addon: bool,
    pub base_id: String,
    pub cross_ref_id: String,
    pub iso_number: Option<String>,
}

impl Identity {
    /// Resolves all identifiers of a raw catalogue title.
    pub fn resolve(title: &str) -> Result<Self, CatalogError> {
        let is_addon = is_addon(title);
        Ok(Self {
            is_addon,
            base_id: extract_base_id(title)?,
            cross_ref_id: build_cross_ref_id(title, is_addon)?,
            iso_number: build_iso_number(title, is_addon)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dated_base_document() {
        let identity = Identity::resolve("ISO/IEC 21000-22:2016").unwrap();
        assert!(!identity.is_addon);
        assert_eq!(identity.base_id, "21000-22");
        assert_eq!(identity.cross_ref_id, "iso21000-22");
        assert_eq!(identity.iso_number.as_deref(), Some("ISO 21000-22:2016"));
    }

    #[test]
    fn test_amendment() {
        let identity = Identity::resolve("ISO/IEC 21000-22:2016/Amd 1:2018").unwrap();
        assert!(identity.is_addon);
        assert_eq!(identity.base_id, "21000-22");
        assert_eq!(identity.cross_ref_id, "iso21000-22-2016-amd1-2018");
        assert_eq!(identity.iso_number, None);
    }

    #[test]
    fn test_undated_document_under_development() {
        let identity = Identity::resolve("ISO/IEC FDIS 21000-22").unwrap();
        assert!(!identity.is_addon);
        assert_eq!(identity.base_id, "21000-22");
        assert_eq!(identity.cross_ref_id, "iso21000-22");
        assert_eq!(identity.iso_number, None);
    }

    #[test]
    fn test_amendments_with_different_years_stay_distinct() {
        let first = build_cross_ref_id("ISO/IEC 23008-2:2013/Amd 1:2015", true).unwrap();
        let second = build_cross_ref_id("ISO/IEC 23008-2:2013/Amd 1:2016", true).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_versions_of_a_base_document_collapse() {
        let old = build_cross_ref_id("ISO/IEC 14496-10:2014", false).unwrap();
        let new = build_cross_ref_id("ISO/IEC 14496-10:2022", false).unwrap();
        assert_eq!(old, new);
        assert_eq!(old, "iso14496-10");
    }

    #[test]
    fn test_prefix_only_stripped_at_start() {
        assert_eq!(strip_publisher_prefix("ISO/IEC 9000"), "9000");
        assert_eq!(strip_publisher_prefix("ISO 9000"), "ISO 9000");
        assert_eq!(strip_publisher_prefix("Draft ISO/IEC 9000"), "Draft ISO/IEC 9000");
    }

    #[test]
    fn test_title_without_prefix_and_with_slash_is_addon() {
        assert!(is_addon("ISO 12345:2010/Cor 1:2011"));
        assert!(!is_addon("ISO/IEC 12345:2010"));
    }

    #[test]
    fn test_missing_base_id_is_error() {
        let err = extract_base_id("ISO/IEC TR draft").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
        assert!(err.to_string().contains("ISO/IEC TR draft"));
    }

    #[test]
    fn test_colon_without_dated_id_is_error() {
        let err = build_iso_number("ISO/IEC 12345: draft", false).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn test_raw_date_shape() {
        assert!(is_raw_date("2016-08"));
        assert!(!is_raw_date("2016-8"));
        assert!(!is_raw_date("2016-08-01"));
        assert!(!is_raw_date(" 2016-08"));
    }

    #[test]
    fn test_find_dated_id() {
        assert_eq!(find_dated_id("21000-22:2016"), Some("21000-22:2016"));
        assert_eq!(find_dated_id("21000-22"), None);
    }
}
