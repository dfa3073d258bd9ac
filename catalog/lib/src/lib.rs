//! Catalog Library - Harvests committee catalogues of standards documents
//!
//! Each configured catalogue page goes through four phases, each taking the
//! previous phase's output by value:
//!
//! 1. [`parser::parse_catalog`] turns listing rows into an [`EntrySet`],
//!    resolving identifiers through [`identity`] and collapsing duplicates
//! 2. [`supersession::resolve_supersession`] links obsolete entries to their
//!    published replacements
//! 3. [`detail::fetch_details`] fetches every detail page with bounded
//!    concurrency and fills in publication dates
//! 4. [`serialize::build_catalog`] orders the result for output
//!
//! Any error aborts the page it occurred on. No snapshot is written for a
//! page that did not complete.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use catalog_lib::config::{CatalogSource, HarvestSettings};
//! use catalog_lib::fetch::HttpPageSource;
//! use catalog_lib::harvest_catalog;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = HarvestSettings::default();
//! let pages = HttpPageSource::new(&settings)?;
//! let source = CatalogSource::new(
//!     "jtc1-sc29",
//!     "https://www.iso.org/committee/45316/x/catalogue/p/1/u/1/w/1/d/1",
//! );
//! let catalog = harvest_catalog(&source, &pages, &settings).await?;
//! println!("{} documents", catalog.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod detail;
pub mod fetch;
pub mod identity;
pub mod markup;
pub mod parser;
pub mod serialize;
pub mod supersession;
pub mod types;

pub use config::{CatalogSource, HarvestSettings};
pub use types::{Catalog, CatalogError, CatalogRecord, Entry, EntrySet, Status};

use crate::fetch::{FetchError, PageSource};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::{error, info, instrument};
use url::Url;

/// Harvests one catalogue page into an ordered snapshot.
///
/// ## Errors
///
/// Any [`CatalogError`]; see the individual phases for when each occurs.
#[instrument(skip_all, fields(catalog = %source.name, url = %source.url))]
pub async fn harvest_catalog<S: PageSource>(
    source: &CatalogSource,
    pages: &S,
    settings: &HarvestSettings,
) -> Result<Catalog, CatalogError> {
    let page_url = Url::parse(&source.url).map_err(|e| FetchError::InvalidUrl {
        url: source.url.clone(),
        reason: e.to_string(),
    })?;

    let html = settings
        .listing_retry
        .run(&source.url, || pages.fetch_page(&source.url))
        .await?;

    let entries = parser::parse_catalog(&html, &page_url)?;
    let entries = supersession::resolve_supersession(entries)?;
    let entries = detail::fetch_details(entries, pages, settings).await?;

    Ok(serialize::build_catalog(entries))
}

/// Writes a snapshot to `<dir>/<name>.json`, creating `dir` if needed.
///
/// The file is written under a temporary name first and renamed into place,
/// so an existing snapshot is never left half-written. The staging file is
/// removed if the rename fails.
pub async fn write_catalog(
    catalog: &Catalog,
    dir: &Path,
    source: &CatalogSource,
) -> Result<PathBuf, CatalogError> {
    let json = serialize::render_catalog(catalog)?;

    fs::create_dir_all(dir).await?;
    let path = dir.join(source.file_name());
    let staging = dir.join(format!(".{}.tmp", source.file_name()));

    fs::write(&staging, json).await?;
    if let Err(e) = fs::rename(&staging, &path).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }

    Ok(path)
}

/// Outcome of harvesting one catalogue.
#[derive(Debug)]
pub struct HarvestReport {
    pub source: CatalogSource,
    pub result: Result<HarvestSummary, CatalogError>,
}

/// Details of a successfully written snapshot.
#[derive(Debug, Clone)]
pub struct HarvestSummary {
    pub path: PathBuf,
    pub documents: usize,
    pub elapsed_secs: f32,
}

/// Harvests each source in turn and writes its snapshot into `output_dir`.
///
/// A failing source does not stop the others; each gets its own report.
pub async fn harvest<S: PageSource>(
    sources: &[CatalogSource],
    pages: &S,
    settings: &HarvestSettings,
    output_dir: &Path,
) -> Vec<HarvestReport> {
    let mut reports = Vec::with_capacity(sources.len());

    for source in sources {
        let start_time = Instant::now();
        let result = match harvest_catalog(source, pages, settings).await {
            Ok(catalog) => write_catalog(&catalog, output_dir, source)
                .await
                .map(|path| HarvestSummary {
                    path,
                    documents: catalog.len(),
                    elapsed_secs: start_time.elapsed().as_secs_f32(),
                }),
            Err(e) => Err(e),
        };

        match &result {
            Ok(summary) => info!(
                catalog = %source.name,
                documents = summary.documents,
                path = %summary.path.display(),
                "Catalogue snapshot written"
            ),
            Err(e) => error!(catalog = %source.name, error = %e, "Catalogue harvest failed"),
        }

        reports.push(HarvestReport {
            source: source.clone(),
            result,
        });
    }

    reports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_catalog_writes_snapshot() {
        let output = tempfile::tempdir().unwrap();
        let source = CatalogSource::new("jtc1-sc29", "https://www.iso.org/committee/45316/x/catalogue/");

        let path = write_catalog(&Catalog::new(), output.path(), &source).await.unwrap();

        assert_eq!(path, output.path().join("jtc1-sc29.json"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
        assert!(!output.path().join(".jtc1-sc29.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_staging_file() {
        let output = tempfile::tempdir().unwrap();
        let source = CatalogSource::new("jtc1-sc29", "https://www.iso.org/committee/45316/x/catalogue/");

        // A non-empty directory at the target path makes the rename fail.
        let blocker = output.path().join(source.file_name());
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), "x").unwrap();

        let err = write_catalog(&Catalog::new(), output.path(), &source)
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Io(_)));
        assert!(!output.path().join(".jtc1-sc29.json.tmp").exists());
        assert!(blocker.join("keep").exists());
    }
}
