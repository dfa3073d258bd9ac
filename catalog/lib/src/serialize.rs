//! Snapshot rendering.
//!
//! Entries are ordered by their catalogue position, converted to
//! [`CatalogRecord`]s and rendered as pretty-printed JSON. Rendering the
//! result of [`decode_catalog`] reproduces the original text byte for byte.

use crate::types::{Catalog, CatalogError, CatalogRecord, Entry, EntrySet, PUBLISHER};

/// Converts an entry to its serialized form.
pub fn to_record(entry: &Entry) -> CatalogRecord {
    CatalogRecord {
        href: entry.url.clone(),
        title: entry.title.clone(),
        status: entry.status,
        publisher: PUBLISHER.to_string(),
        iso_number: entry.iso_number.clone(),
        is_superseded: entry.is_superseded,
        is_retired: entry.is_retired,
        obsoleted_by: entry.obsoleted_by.iter().cloned().collect(),
        raw_date: entry.raw_date.clone(),
    }
}

/// Builds the snapshot map in ascending `sort_index` order.
pub fn build_catalog(entries: EntrySet) -> Catalog {
    let mut entries: Vec<Entry> = entries.into_values().collect();
    entries.sort_by_key(|e| e.sort_index);

    entries
        .iter()
        .map(|entry| (entry.cross_ref_id.clone(), to_record(entry)))
        .collect()
}

/// Renders a snapshot as pretty JSON with a trailing newline.
pub fn render_catalog(catalog: &Catalog) -> Result<String, CatalogError> {
    let mut json = serde_json::to_string_pretty(catalog)?;
    json.push('\n');
    Ok(json)
}

/// Parses a rendered snapshot, preserving key order.
pub fn decode_catalog(json: &str) -> Result<Catalog, CatalogError> {
    Ok(serde_json::from_str(json)?)
}
