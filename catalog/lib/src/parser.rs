//! Catalogue listing page parsing.
//!
//! Walks every row of the listing table, builds one [`Entry`] per row and
//! resolves rows that collapse onto the same cross-reference id.
//!
//! ## Duplicate resolution
//!
//! Rows are admitted in catalogue order. When an incoming row's id is already
//! taken:
//!
//! - an existing entry that is under development, retired, superseded or under
//!   review is overwritten by the incoming row
//! - otherwise an incoming row that is under development, withdrawn or deleted
//!   is skipped
//! - otherwise both are published and the page fails with
//!   [`CatalogError::DuplicateIdentity`]
//!
//! This relies on the catalogue never listing a worse version of an id after
//! a better one has already replaced an earlier worse one.

use crate::identity::Identity;
use crate::markup::{
    self, CATALOG_ROW, ICON_CLASS_PREFIX, STAGE_LINK, STATUS_ICON, SUMMARY, TITLE_LINK,
};
use crate::types::{CatalogError, Entry, EntrySet, Status};
use scraper::{ElementRef, Html};
use tracing::{debug, info};
use url::Url;

/// Summaries this short are layout artifacts, not descriptions.
const MIN_SUMMARY_LEN: usize = 4;

/// Stage codes starting with this prefix mark a document under review.
const UNDER_REVIEW_STAGE_PREFIX: &str = "90.";

/// Parses a catalogue listing page into an entry set.
///
/// Relative detail links are resolved against `page_url` and stripped of their
/// query string.
///
/// ## Errors
///
/// - `CatalogError::Parse`: a row lacks its title, link, icon or stage code,
///   or its title yields no id
/// - `CatalogError::UnknownStatus`: a row carries an unrecognized status icon
/// - `CatalogError::DuplicateIdentity`: two published rows share an id
pub fn parse_catalog(html: &str, page_url: &Url) -> Result<EntrySet, CatalogError> {
    let document = Html::parse_document(html);
    let mut entries = EntrySet::new();
    let mut rows = 0;

    for (sort_index, row) in document.select(&CATALOG_ROW).enumerate() {
        let entry = parse_row(row, sort_index, page_url)?;
        admit(&mut entries, entry)?;
        rows += 1;
    }

    info!(rows, kept = entries.len(), url = %page_url, "Parsed catalogue page");
    Ok(entries)
}

fn parse_row(row: ElementRef<'_>, sort_index: usize, page_url: &Url) -> Result<Entry, CatalogError> {
    let link = row
        .select(&TITLE_LINK)
        .next()
        .ok_or_else(|| CatalogError::parse(format!("row {sort_index}"), "no title link"))?;

    let raw_title = markup::element_text(link);
    if raw_title.is_empty() {
        return Err(CatalogError::parse(format!("row {sort_index}"), "empty title"));
    }

    let href = link.value().attr("href").ok_or_else(|| {
        CatalogError::parse(format!("title '{raw_title}'"), "title link has no href")
    })?;
    let url = resolve_detail_url(page_url, href)
        .map_err(|e| CatalogError::parse(format!("link '{href}' of '{raw_title}'"), e.to_string()))?;

    let summary = markup::first_text(row, &SUMMARY)
        .filter(|s| s.trim().chars().count() >= MIN_SUMMARY_LEN);

    let status = parse_status(row, &raw_title)?;

    let stage = markup::first_text(row, &STAGE_LINK)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| CatalogError::parse(format!("title '{raw_title}'"), "missing stage code"))?;

    let identity = Identity::resolve(&raw_title)?;
    let title = summary.unwrap_or_else(|| raw_title.clone());

    let mut entry = Entry::new(identity, status, sort_index, url, title);
    entry.is_potentially_implicitly_superseded = is_under_review(&stage);
    Ok(entry)
}

fn parse_status(row: ElementRef<'_>, title: &str) -> Result<Status, CatalogError> {
    let icon = row
        .select(&STATUS_ICON)
        .next()
        .ok_or_else(|| CatalogError::parse(format!("title '{title}'"), "missing status icon"))?;

    let class = icon
        .value()
        .classes()
        .find_map(|c| c.strip_prefix(ICON_CLASS_PREFIX))
        .unwrap_or_default();

    Status::from_icon_class(class).ok_or_else(|| CatalogError::UnknownStatus {
        title: title.to_string(),
        class: icon.value().attr("class").unwrap_or_default().to_string(),
    })
}

/// Whether a stage code's leading component marks the document as under review.
fn is_under_review(stage: &str) -> bool {
    stage
        .split_whitespace()
        .next()
        .is_some_and(|code| code.starts_with(UNDER_REVIEW_STAGE_PREFIX))
}

/// Resolves a detail-page link against the catalogue URL and drops the query.
pub fn resolve_detail_url(page_url: &Url, href: &str) -> Result<String, url::ParseError> {
    let mut url = page_url.join(href)?;
    url.set_query(None);
    Ok(url.to_string())
}

/// Adds an entry to the set, applying the duplicate-resolution policy.
pub fn admit(entries: &mut EntrySet, entry: Entry) -> Result<(), CatalogError> {
    let Some(existing) = entries.get(&entry.cross_ref_id) else {
        entries.insert(entry.cross_ref_id.clone(), entry);
        return Ok(());
    };

    if existing.is_replaceable() {
        debug!(
            id = %entry.cross_ref_id,
            replaced = %existing.url,
            by = %entry.url,
            "Replacing inferior version"
        );
        entries.insert(entry.cross_ref_id.clone(), entry);
        return Ok(());
    }

    if matches!(
        entry.status,
        Status::UnderDevelopment | Status::Withdrawn | Status::Deleted
    ) {
        debug!(
            id = %entry.cross_ref_id,
            kept = %existing.url,
            skipped = %entry.url,
            "Skipping inferior version"
        );
        return Ok(());
    }

    Err(CatalogError::DuplicateIdentity {
        id: entry.cross_ref_id.clone(),
        existing: existing.url.clone(),
        incoming: entry.url,
    })
}
