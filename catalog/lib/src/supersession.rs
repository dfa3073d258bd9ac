//! Links obsolete entries to the published documents that replaced them.
//!
//! Matching is by base id only: a withdrawn or deleted entry is obsoleted by
//! the single published, non-addon entry sharing its base id. Entries under
//! development are never obsoleted.

use crate::types::{CatalogError, EntrySet};
use std::collections::HashMap;
use tracing::info;

/// Sets `obsoleted_by` on every withdrawn or deleted entry with a unique replacement.
///
/// ## Errors
///
/// Returns [`CatalogError::AmbiguousSupersession`] when more than one
/// published base document shares the obsolete entry's base id.
pub fn resolve_supersession(mut entries: EntrySet) -> Result<EntrySet, CatalogError> {
    let mut replacements: HashMap<String, Vec<String>> = HashMap::new();
    for entry in entries.values() {
        if entry.is_published() && !entry.is_addon {
            replacements
                .entry(entry.base_id.clone())
                .or_default()
                .push(entry.cross_ref_id.clone());
        }
    }

    let mut linked = 0;
    for entry in entries.values_mut() {
        if entry.is_published() || entry.is_under_development {
            continue;
        }

        match replacements.get(&entry.base_id).map(Vec::as_slice) {
            None | Some([]) => {}
            Some([replacement]) => {
                entry.obsoleted_by = Some(replacement.clone());
                linked += 1;
            }
            Some(candidates) => {
                let mut candidates = candidates.to_vec();
                candidates.sort();
                return Err(CatalogError::AmbiguousSupersession {
                    id: entry.cross_ref_id.clone(),
                    base_id: entry.base_id.clone(),
                    candidates,
                });
            }
        }
    }

    info!(linked, "Resolved supersession links");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::types::{Entry, Status};

    fn entry(title: &str, status: Status, index: usize) -> Entry {
        let identity = Identity::resolve(title).unwrap();
        Entry::new(identity, status, index, format!("https://example.org/{index}"), title)
    }

    fn set(entries: Vec<Entry>) -> EntrySet {
        entries
            .into_iter()
            .map(|e| (e.cross_ref_id.clone(), e))
            .collect()
    }

    #[test]
    fn test_withdrawn_addon_obsoleted_by_published_base() {
        let entries = set(vec![
            entry("ISO/IEC 21000-22:2016/Amd 1:2018", Status::Withdrawn, 0),
            entry("ISO/IEC 21000-22:2019", Status::Published, 1),
        ]);

        let resolved = resolve_supersession(entries).unwrap();
        assert_eq!(
            resolved["iso21000-22-2016-amd1-2018"].obsoleted_by.as_deref(),
            Some("iso21000-22")
        );
        assert_eq!(resolved["iso21000-22"].obsoleted_by, None);
    }

    #[test]
    fn test_no_replacement_leaves_unresolved() {
        let entries = set(vec![entry("ISO/IEC 9999:2001", Status::Deleted, 0)]);
        let resolved = resolve_supersession(entries).unwrap();
        assert_eq!(resolved["iso9999"].obsoleted_by, None);
    }

    #[test]
    fn test_published_addons_are_not_candidates() {
        let entries = set(vec![
            entry("ISO/IEC 5000:2010/Cor 1:2011", Status::Withdrawn, 0),
            entry("ISO/IEC 5000:2010/Amd 1:2012", Status::Published, 1),
        ]);
        let resolved = resolve_supersession(entries).unwrap();
        assert_eq!(resolved["iso5000-2010-cor1-2011"].obsoleted_by, None);
    }

    #[test]
    fn test_under_development_is_never_obsoleted() {
        let entries = set(vec![
            entry("ISO/IEC AWI 7000-1/Amd 1", Status::UnderDevelopment, 0),
            entry("ISO/IEC 7000-1:2020", Status::Published, 1),
        ]);
        let resolved = resolve_supersession(entries).unwrap();
        assert_eq!(resolved["iso7000-1-amd1"].obsoleted_by, None);
    }

    #[test]
    fn test_under_review_published_is_a_candidate() {
        let mut published = entry("ISO/IEC 8000:2020", Status::Published, 1);
        published.is_potentially_implicitly_superseded = true;
        let entries = set(vec![
            entry("ISO/IEC 8000:2010/Amd 2:2012", Status::Deleted, 0),
            published,
        ]);
        let resolved = resolve_supersession(entries).unwrap();
        assert_eq!(
            resolved["iso8000-2010-amd2-2012"].obsoleted_by.as_deref(),
            Some("iso8000")
        );
    }

    #[test]
    fn test_two_candidates_is_ambiguous() {
        // Two distinct published ids sharing one base id can only arise from
        // hand-built sets; the parser collapses same-title base documents.
        let mut second = entry("ISO/IEC 23000-1:2021", Status::Published, 2);
        second.cross_ref_id = "iso23000-1-bis".to_string();
        let entries = set(vec![
            entry("ISO/IEC 23000-1:2010/Amd 1:2011", Status::Withdrawn, 0),
            entry("ISO/IEC 23000-1:2020", Status::Published, 1),
            second,
        ]);

        let err = resolve_supersession(entries).unwrap_err();
        match err {
            CatalogError::AmbiguousSupersession { id, base_id, candidates } => {
                assert_eq!(id, "iso23000-1-2010-amd1-2011");
                assert_eq!(base_id, "23000-1");
                assert_eq!(candidates, vec!["iso23000-1", "iso23000-1-bis"]);
            }
            other => panic!("Expected AmbiguousSupersession, got {other:?}"),
        }
    }
}
