//! CSS selectors for the catalogue listing page and document detail pages.
//!
//! These track the markup version currently served upstream. When the site
//! changes its layout, this is the only file that should need editing.

use lazy_static::lazy_static;
use scraper::{ElementRef, Selector};

/// Prefix of the Bootstrap icon class carrying the status.
pub const ICON_CLASS_PREFIX: &str = "bi-";

lazy_static! {
    /// One row per document version.
    pub static ref CATALOG_ROW: Selector =
        Selector::parse("table#datatable-tc-projects tbody tr").unwrap();

    /// Link whose text is the raw title and whose href is the detail page.
    pub static ref TITLE_LINK: Selector =
        Selector::parse(r#"td[data-title="Standard and/or project"] a"#).unwrap();

    pub static ref SUMMARY: Selector =
        Selector::parse(r#"td[data-title="Standard and/or project"] .entry-summary"#).unwrap();

    pub static ref STATUS_ICON: Selector =
        Selector::parse(r#"td[data-title="Standard and/or project"] i"#).unwrap();

    /// Stage code such as `60.60` or `90.93`.
    pub static ref STAGE_LINK: Selector =
        Selector::parse(r#"td[data-title="Stage"] a"#).unwrap();

    pub static ref RELEASE_DATE: Selector =
        Selector::parse(r#"[itemprop="releaseDate"]"#).unwrap();
}

/// Text content of an element with whitespace runs collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First element below `scope` matching `selector`, as collapsed text.
pub fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(element_text)
}
