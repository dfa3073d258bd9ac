//! Core types for the catalog harvest.
//!
//! [`Entry`] is the in-memory working shape that flows between pipeline phases.
//! [`CatalogRecord`] is the serialized shape written to the snapshot file.

use crate::fetch::FetchError;
use crate::identity::Identity;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Publisher name stamped on every record.
pub const PUBLISHER: &str = "ISO/IEC";

/// Error types for catalog harvesting.
///
/// Every variant is fatal for the catalog page being harvested.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Markup or text did not have the expected shape
    #[error("Failed to parse {context}: {detail}")]
    Parse { context: String, detail: String },

    /// A status icon outside the known vocabulary
    #[error("Unknown status icon class '{class}' for '{title}'")]
    UnknownStatus { title: String, class: String },

    /// More than one published document could replace an obsolete one
    #[error("Ambiguous supersession for {id} (base id {base_id}): candidates {candidates:?}")]
    AmbiguousSupersession {
        id: String,
        base_id: String,
        candidates: Vec<String>,
    },

    /// Two published rows resolved to the same cross-reference id
    #[error("Duplicate published entries for {id}: {existing} and {incoming}")]
    DuplicateIdentity {
        id: String,
        existing: String,
        incoming: String,
    },

    /// Network fetch failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to write the snapshot
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode or decode the snapshot
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    pub(crate) fn parse(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            detail: detail.into(),
        }
    }
}

/// Lifecycle status as signalled by the catalogue's status icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Published,
    Withdrawn,
    Deleted,
    #[serde(rename = "Under development")]
    UnderDevelopment,
}

impl Status {
    /// Maps a status icon class (without the `bi-` prefix) to a status.
    ///
    /// ## Examples
    ///
    /// ```
    /// use catalog_lib::types::Status;
    ///
    /// assert_eq!(Status::from_icon_class("check-circle"), Some(Status::Published));
    /// assert_eq!(Status::from_icon_class("question-circle"), None);
    /// ```
    pub fn from_icon_class(class: &str) -> Option<Self> {
        match class {
            "check-circle" => Some(Self::Published),
            "slash-circle" => Some(Self::Withdrawn),
            "x-circle" => Some(Self::Deleted),
            "record-circle" => Some(Self::UnderDevelopment),
            _ => None,
        }
    }
}

/// One logical document version found on a catalogue page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub cross_ref_id: String,
    /// For addons, the parent document's base id.
    pub base_id: String,
    pub is_addon: bool,
    /// Row position in the catalogue listing.
    pub sort_index: usize,
    pub url: String,
    pub title: String,
    pub status: Status,
    pub is_superseded: bool,
    pub is_retired: bool,
    pub is_under_development: bool,
    /// The upstream "under review" signal (stage 90.xx).
    pub is_potentially_implicitly_superseded: bool,
    pub iso_number: Option<String>,
    pub raw_date: Option<String>,
    pub obsoleted_by: Option<String>,
}

impl Entry {
    /// Creates an entry with lifecycle flags derived from `status`.
    pub fn new(
        identity: Identity,
        status: Status,
        sort_index: usize,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            cross_ref_id: identity.cross_ref_id,
            base_id: identity.base_id,
            is_addon: identity.is_addon,
            sort_index,
            url: url.into(),
            title: title.into(),
            status,
            is_superseded: status == Status::Withdrawn,
            is_retired: status == Status::Deleted,
            is_under_development: status == Status::UnderDevelopment,
            is_potentially_implicitly_superseded: false,
            iso_number: identity.iso_number,
            raw_date: None,
            obsoleted_by: None,
        }
    }

    /// Authoritative and current: not superseded, retired or under development.
    pub fn is_published(&self) -> bool {
        !(self.is_superseded || self.is_retired || self.is_under_development)
    }

    /// Whether a later row with the same id may replace this one.
    pub fn is_replaceable(&self) -> bool {
        self.is_under_development
            || self.is_retired
            || self.is_superseded
            || self.is_potentially_implicitly_superseded
    }

    /// Whether a detail page may legitimately lack a publication date.
    pub fn may_lack_date(&self) -> bool {
        self.is_under_development || self.is_retired
    }
}

/// Working set of entries keyed by cross-reference id.
pub type EntrySet = IndexMap<String, Entry>;

/// Serialized form of one entry. Default-valued fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub href: String,
    pub title: String,
    pub status: Status,
    pub publisher: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso_number: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_superseded: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_retired: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obsoleted_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_date: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A complete snapshot, in catalogue order.
pub type Catalog = IndexMap<String, CatalogRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(title: &str) -> Identity {
        Identity::resolve(title).unwrap()
    }

    #[test]
    fn test_status_flags() {
        let withdrawn = Entry::new(identity("ISO/IEC 1000:2001"), Status::Withdrawn, 0, "u", "t");
        assert!(withdrawn.is_superseded);
        assert!(!withdrawn.is_published());

        let deleted = Entry::new(identity("ISO/IEC 1000:2001"), Status::Deleted, 0, "u", "t");
        assert!(deleted.is_retired);
        assert!(deleted.may_lack_date());

        let draft = Entry::new(identity("ISO/IEC DIS 1000"), Status::UnderDevelopment, 0, "u", "t");
        assert!(draft.is_under_development);
        assert!(draft.is_replaceable());

        let published = Entry::new(identity("ISO/IEC 1000:2020"), Status::Published, 0, "u", "t");
        assert!(published.is_published());
        assert!(!published.is_replaceable());
        assert!(!published.may_lack_date());
    }

    #[test]
    fn test_under_review_is_replaceable_but_published() {
        let mut entry = Entry::new(identity("ISO/IEC 1000:2020"), Status::Published, 0, "u", "t");
        entry.is_potentially_implicitly_superseded = true;
        assert!(entry.is_published());
        assert!(entry.is_replaceable());
    }

    #[test]
    fn test_status_serializes_with_display_names() {
        assert_eq!(
            serde_json::to_string(&Status::UnderDevelopment).unwrap(),
            "\"Under development\""
        );
        assert_eq!(serde_json::to_string(&Status::Withdrawn).unwrap(), "\"Withdrawn\"");
    }

    #[test]
    fn test_record_omits_defaults() {
        let record = CatalogRecord {
            href: "https://www.iso.org/standard/1.html".to_string(),
            title: "Title".to_string(),
            status: Status::Published,
            publisher: PUBLISHER.to_string(),
            iso_number: None,
            is_superseded: false,
            is_retired: false,
            obsoleted_by: vec![],
            raw_date: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert!(!object.contains_key("isSuperseded"));
        assert!(!object.contains_key("obsoletedBy"));
    }
}
