//! Catalogue sources and run settings.
//!
//! The default source list covers the ISO/IEC JTC 1 sub-committees whose
//! catalogues are harvested. A YAML file can replace it:
//!
//! ```yaml
//! catalogs:
//!   - name: jtc1-sc29
//!     url: https://www.iso.org/committee/45316/x/catalogue/p/1/u/1/w/1/d/1
//! ```

use crate::fetch::RetryPolicy;
use crate::types::CatalogError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the default output directory.
pub const OUTPUT_DIR_ENV: &str = "CATALOG_OUTPUT_DIR";

/// Output directory used when neither the CLI nor the environment names one.
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Upper bound on simultaneous detail-page fetches.
pub const DEFAULT_CONCURRENCY: usize = 30;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = concat!("catalog-lib/", env!("CARGO_PKG_VERSION"));

const DEFAULT_SOURCES: &[(&str, &str)] = &[
    (
        "jtc1-sc27",
        "https://www.iso.org/committee/45306/x/catalogue/p/1/u/1/w/1/d/1",
    ),
    (
        "jtc1-sc29",
        "https://www.iso.org/committee/45316/x/catalogue/p/1/u/1/w/1/d/1",
    ),
    (
        "jtc1-sc32",
        "https://www.iso.org/committee/45342/x/catalogue/p/1/u/1/w/1/d/1",
    ),
];

/// One catalogue listing page to harvest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSource {
    /// Short name, also the output file stem.
    pub name: String,
    pub url: String,
}

impl CatalogSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// File name of this source's snapshot.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.name)
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    catalogs: Vec<CatalogSource>,
}

/// The built-in catalogue list.
pub fn default_sources() -> Vec<CatalogSource> {
    DEFAULT_SOURCES
        .iter()
        .map(|(name, url)| CatalogSource::new(*name, *url))
        .collect()
}

/// Loads a catalogue list from a YAML file.
///
/// ## Errors
///
/// - `CatalogError::Io`: the file cannot be read
/// - `CatalogError::Config`: invalid YAML, an empty list, or a repeated name
pub fn load_sources(path: &Path) -> Result<Vec<CatalogSource>, CatalogError> {
    let content = std::fs::read_to_string(path)?;
    parse_sources(&content)
        .map_err(|e| CatalogError::Config(format!("{}: {}", path.display(), e)))
}

fn parse_sources(content: &str) -> Result<Vec<CatalogSource>, String> {
    let file: ConfigFile = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    if file.catalogs.is_empty() {
        return Err("no catalogs configured".to_string());
    }

    let mut seen = std::collections::HashSet::new();
    for source in &file.catalogs {
        if !seen.insert(source.name.as_str()) {
            return Err(format!("catalog '{}' is listed twice", source.name));
        }
    }

    Ok(file.catalogs)
}

/// Picks the named sources, or all of them when `names` is empty.
///
/// ## Errors
///
/// Returns `CatalogError::Config` naming the first unknown catalogue.
pub fn select_sources(
    sources: Vec<CatalogSource>,
    names: &[String],
) -> Result<Vec<CatalogSource>, CatalogError> {
    if names.is_empty() {
        return Ok(sources);
    }

    names
        .iter()
        .map(|name| {
            sources
                .iter()
                .find(|s| &s.name == name)
                .cloned()
                .ok_or_else(|| CatalogError::Config(format!("unknown catalog '{name}'")))
        })
        .collect()
}

/// Output directory from `CATALOG_OUTPUT_DIR`, falling back to `./data`.
pub fn default_output_dir() -> PathBuf {
    std::env::var(OUTPUT_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

/// Tunables for one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// Maximum detail fetches in flight at once.
    pub concurrency: usize,
    pub detail_retry: RetryPolicy,
    pub listing_retry: RetryPolicy,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            detail_retry: RetryPolicy::detail_default(),
            listing_retry: RetryPolicy::listing_default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_sources_have_unique_names() {
        let sources = default_sources();
        let mut names: Vec<_> = sources.iter().map(|s| s.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), sources.len());
    }

    #[test]
    fn test_parse_sources() {
        let sources = parse_sources(
            "catalogs:\n  - name: sc29\n    url: https://www.iso.org/committee/45316/x/catalogue/\n",
        )
        .unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "sc29");
        assert_eq!(sources[0].file_name(), "sc29.json");
    }

    #[test]
    fn test_parse_sources_rejects_duplicates_and_empty() {
        let duplicated = "catalogs:\n  - name: a\n    url: u1\n  - name: a\n    url: u2\n";
        assert!(parse_sources(duplicated).unwrap_err().contains("listed twice"));
        assert!(parse_sources("catalogs: []\n").is_err());
    }

    #[test]
    fn test_load_sources_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "catalogs:\n  - name: local\n    url: http://localhost/list").unwrap();
        let sources = load_sources(file.path()).unwrap();
        assert_eq!(sources, vec![CatalogSource::new("local", "http://localhost/list")]);
    }

    #[test]
    fn test_select_sources() {
        let all = default_sources();
        assert_eq!(select_sources(all.clone(), &[]).unwrap(), all);

        let picked = select_sources(all.clone(), &["jtc1-sc29".to_string()]).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "jtc1-sc29");

        let err = select_sources(all, &["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("unknown catalog 'nope'"));
    }

    #[test]
    #[serial]
    fn test_default_output_dir_reads_env() {
        unsafe {
            std::env::set_var(OUTPUT_DIR_ENV, "/tmp/catalog-out");
        }
        assert_eq!(default_output_dir(), PathBuf::from("/tmp/catalog-out"));

        unsafe {
            std::env::remove_var(OUTPUT_DIR_ENV);
        }
        assert_eq!(default_output_dir(), PathBuf::from(DEFAULT_OUTPUT_DIR));
    }
}
