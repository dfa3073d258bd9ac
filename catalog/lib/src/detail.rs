//! Publication-date enrichment from document detail pages.
//!
//! Every entry's detail page is fetched with at most
//! [`HarvestSettings::concurrency`] requests in flight. Each fetch owns its
//! entry for its whole duration and hands it back enriched, so no entry is
//! shared between fetches. The first fetch that fails after its retries fails
//! the whole set; the fetches still running are dropped.

use crate::config::HarvestSettings;
use crate::fetch::{PageSource, RetryPolicy};
use crate::identity::is_raw_date;
use crate::markup::{self, RELEASE_DATE};
use crate::types::{CatalogError, Entry, EntrySet};
use futures::stream::{self, StreamExt, TryStreamExt};
use scraper::Html;
use tracing::{debug, info, instrument};

/// Extracts the `YYYY-MM` release date from a detail page.
///
/// Returns `None` when the page has no release-date element or it is blank.
///
/// ## Errors
///
/// Returns `CatalogError::Parse` when the date is present but not `YYYY-MM`.
///
/// ## Examples
///
/// ```
/// use catalog_lib::detail::extract_release_date;
///
/// let html = r#"<span itemprop="releaseDate">2016-08</span>"#;
/// assert_eq!(extract_release_date(html, "doc").unwrap(), Some("2016-08".to_string()));
/// ```
pub fn extract_release_date(html: &str, context: &str) -> Result<Option<String>, CatalogError> {
    let document = Html::parse_document(html);
    let Some(date) = document
        .select(&RELEASE_DATE)
        .next()
        .map(markup::element_text)
        .filter(|d| !d.is_empty())
    else {
        return Ok(None);
    };

    if !is_raw_date(&date) {
        return Err(CatalogError::parse(
            context.to_string(),
            format!("release date '{date}' is not YYYY-MM"),
        ));
    }

    Ok(Some(date))
}

/// Fetches every entry's detail page and fills in `raw_date`.
///
/// ## Errors
///
/// - `CatalogError::Fetch`: a detail page could not be fetched after retries
/// - `CatalogError::Parse`: a date is malformed, or missing on an entry that
///   is neither under development nor retired
pub async fn fetch_details<S: PageSource>(
    entries: EntrySet,
    source: &S,
    settings: &HarvestSettings,
) -> Result<EntrySet, CatalogError> {
    let total = entries.len();
    let pool_size = settings.concurrency.max(1);
    let policy = &settings.detail_retry;

    let enriched: Vec<Entry> = stream::iter(entries.into_values())
        .map(|entry| enrich_entry(entry, source, policy))
        .buffer_unordered(pool_size)
        .try_collect()
        .await?;

    let dated = enriched.iter().filter(|e| e.raw_date.is_some()).count();
    info!(total, dated, pool_size, "Fetched detail pages");

    Ok(enriched
        .into_iter()
        .map(|entry| (entry.cross_ref_id.clone(), entry))
        .collect())
}

#[instrument(name = "fetch_detail", skip_all, fields(id = %entry.cross_ref_id, url = %entry.url))]
async fn enrich_entry<S: PageSource>(
    mut entry: Entry,
    source: &S,
    policy: &RetryPolicy,
) -> Result<Entry, CatalogError> {
    let html = policy.run(&entry.url, || source.fetch_page(&entry.url)).await?;
    let context = format!("detail page of {} ({})", entry.cross_ref_id, entry.url);

    match extract_release_date(&html, &context)? {
        Some(date) => entry.raw_date = Some(date),
        None if entry.may_lack_date() => debug!("No release date on detail page"),
        None => return Err(CatalogError::parse(context, "missing release date")),
    }

    Ok(entry)
}
