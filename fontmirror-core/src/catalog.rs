//! Font catalog accessor — cached copy of the provider's family list.
//!
//! ```text
//! entry(fetcher, "Roboto")
//!   ├── refresh_if_stale()  ── file absent / empty / older than max_age?
//!   │       └── GET catalog_url?key=…  ── parses? ── overwrite cache file
//!   └── lookup("Roboto")    ── read cache file ── Option<FontCatalogEntry>
//! ```
//!
//! Refresh is best effort: a failed or malformed fetch leaves whatever
//! cache is on disk in place.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use url::Url;

use crate::config::{family_slug, MirrorConfig};
use crate::dirs;
use crate::error::{MirrorError, Result};
use crate::fetch::FontFetcher;

// ── Catalog model ───────────────────────────────────────────────────

/// One family from the provider catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontCatalogEntry {
    pub family: String,
    #[serde(default)]
    pub version: String,
    /// Variant descriptors, e.g. `"regular"`, `"italic"`, `"700"`, `"700italic"`.
    #[serde(default)]
    pub variants: Vec<String>,
    /// Variant descriptor → remote font file URL, in provider order.
    #[serde(default)]
    pub files: IndexMap<String, String>,
}

impl FontCatalogEntry {
    /// Whether the family ships any italic face.
    pub fn has_italic(&self) -> bool {
        self.variants.iter().any(|v| v.contains("italic"))
    }

    pub fn slug(&self) -> String {
        family_slug(&self.family)
    }
}

/// The provider catalog document (`{"items": [...]}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontCatalog {
    #[serde(default)]
    pub items: Vec<FontCatalogEntry>,
}

impl FontCatalog {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Exact (case-sensitive) family lookup.
    pub fn get(&self, family: &str) -> Option<&FontCatalogEntry> {
        self.items.iter().find(|item| item.family == family)
    }

    /// Family names in catalog order.
    pub fn family_names(&self) -> Vec<String> {
        self.items.iter().map(|item| item.family.clone()).collect()
    }
}

// ── Cache file ──────────────────────────────────────────────────────

/// On-disk catalog cache with mtime-based freshness.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    path: PathBuf,
    max_age: Duration,
    endpoint: String,
    api_key: Option<String>,
}

impl CatalogCache {
    pub fn new(config: &MirrorConfig) -> Self {
        Self {
            path: config.catalog_path(),
            max_age: config.catalog_max_age,
            endpoint: config.catalog_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absent, empty, unreadable-mtime or older than `max_age`.
    pub fn is_stale(&self) -> bool {
        if !dirs::is_nonempty_file(&self.path) {
            return true;
        }
        match fs::metadata(&self.path).and_then(|m| m.modified()) {
            // mtime in the future counts as fresh
            Ok(mtime) => SystemTime::now()
                .duration_since(mtime)
                .map(|age| age > self.max_age)
                .unwrap_or(false),
            Err(_) => true,
        }
    }

    /// Catalog request URL with the API key as a query parameter.
    pub fn request_url(&self) -> Option<String> {
        let key = self.api_key.as_deref()?;
        Url::parse_with_params(&self.endpoint, &[("key", key)])
            .map(String::from)
            .ok()
    }

    /// Refetch the catalog when stale. Never fails; returns whether the
    /// cache file was rewritten.
    pub fn refresh_if_stale(&self, fetcher: &dyn FontFetcher) -> bool {
        if !self.is_stale() {
            return false;
        }
        match self.refresh(fetcher) {
            Ok(count) => {
                log::info!("catalog refreshed: {count} families → {}", self.path.display());
                true
            }
            Err(MirrorError::MissingApiKey) => {
                log::debug!("no catalog API key configured, skipping refresh");
                false
            }
            Err(e) => {
                log::warn!("catalog refresh failed, keeping cached copy: {e}");
                false
            }
        }
    }

    /// Unconditional refetch. Only a body that parses as a catalog with at
    /// least one family is written to disk.
    pub fn refresh(&self, fetcher: &dyn FontFetcher) -> Result<usize> {
        let url = self.request_url().ok_or(MirrorError::MissingApiKey)?;
        let body = fetcher.fetch(&url)?;
        let catalog = FontCatalog::from_slice(&body)?;
        // Provider error bodies (`{"error": {...}}`) are valid JSON too.
        if catalog.items.is_empty() {
            return Err(MirrorError::InvalidCatalog);
        }
        dirs::write_file(&self.path, &body)?;
        Ok(catalog.items.len())
    }

    /// Parse the cache file as it is on disk.
    pub fn load(&self) -> Result<FontCatalog> {
        let bytes = fs::read(&self.path)?;
        FontCatalog::from_slice(&bytes)
    }

    /// Look up a family in the cached catalog without refreshing.
    pub fn lookup(&self, family: &str) -> Option<FontCatalogEntry> {
        match self.load() {
            Ok(catalog) => catalog.get(family).cloned(),
            Err(MirrorError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("unreadable catalog cache {}: {e}", self.path.display());
                None
            }
        }
    }

    /// Refresh if stale, then look up `family`.
    pub fn entry(&self, fetcher: &dyn FontFetcher, family: &str) -> Option<FontCatalogEntry> {
        self.refresh_if_stale(fetcher);
        self.lookup(family)
    }

    /// Refresh if stale, then list every family name.
    pub fn family_names(&self, fetcher: &dyn FontFetcher) -> Vec<String> {
        self.refresh_if_stale(fetcher);
        self.load().map(|c| c.family_names()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;
    use tempfile::tempdir;

    const CATALOG_JSON: &str = r#"{
        "kind": "webfonts#webfontList",
        "items": [
            {
                "family": "Roboto",
                "version": "v30",
                "variants": ["regular", "italic", "700", "700italic"],
                "files": {
                    "regular": "http://fonts.gstatic.com/s/roboto/v30/KFOmCnqEu92Fr1Me5Q.ttf",
                    "italic": "http://fonts.gstatic.com/s/roboto/v30/KFOkCnqEu92Fr1Mu52xP.ttf",
                    "700": "http://fonts.gstatic.com/s/roboto/v30/KFOlCnqEu92Fr1MmWUlvAw.ttf",
                    "700italic": "http://fonts.gstatic.com/s/roboto/v30/KFOjCnqEu92Fr1Mu51TzBhc9.ttf"
                },
                "category": "sans-serif"
            },
            { "family": "Lato", "version": "v24", "variants": ["regular"], "files": {} }
        ]
    }"#;

    fn cache_in(dir: &Path) -> (MirrorConfig, CatalogCache) {
        let config = MirrorConfig::for_testing(dir);
        let cache = CatalogCache::new(&config);
        (config, cache)
    }

    #[test]
    fn test_parse_catalog_preserves_file_order() {
        let catalog = FontCatalog::from_slice(CATALOG_JSON.as_bytes()).unwrap();
        let roboto = catalog.get("Roboto").unwrap();
        let keys: Vec<&str> = roboto.files.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["regular", "italic", "700", "700italic"]);
        assert!(roboto.has_italic());
        assert!(!catalog.get("Lato").unwrap().has_italic());
        assert_eq!(catalog.family_names(), vec!["Roboto", "Lato"]);
    }

    #[test]
    fn test_request_url_carries_key() {
        let dir = tempdir().unwrap();
        let (_, cache) = cache_in(dir.path());
        let url = cache.request_url().unwrap();
        assert_eq!(url, "https://www.googleapis.com/webfonts/v1/webfonts?key=test-key");
    }

    #[test]
    fn test_missing_cache_is_stale_and_refreshes() {
        let dir = tempdir().unwrap();
        let (_, cache) = cache_in(dir.path());
        assert!(cache.is_stale());

        let fetcher = StaticFetcher::new().with(cache.request_url().unwrap(), CATALOG_JSON);
        assert!(cache.refresh_if_stale(&fetcher));
        assert!(!cache.is_stale());
        assert_eq!(cache.lookup("Roboto").unwrap().version, "v30");

        // Fresh now: no second request.
        assert!(!cache.refresh_if_stale(&fetcher));
        assert_eq!(fetcher.request_count(), 1);
    }

    #[test]
    fn test_unknown_family_is_none() {
        let dir = tempdir().unwrap();
        let (_, cache) = cache_in(dir.path());
        let fetcher = StaticFetcher::new().with(cache.request_url().unwrap(), CATALOG_JSON);
        assert!(cache.entry(&fetcher, "Comic Neue Nonexistent").is_none());
        assert!(cache.entry(&fetcher, "roboto").is_none());
    }

    #[test]
    fn test_failed_fetch_keeps_stale_cache() {
        let dir = tempdir().unwrap();
        let (_, mut cache) = cache_in(dir.path());
        fs::write(cache.path(), CATALOG_JSON).unwrap();
        cache.max_age = Duration::ZERO;
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.is_stale());

        let fetcher = StaticFetcher::new();
        assert!(!cache.refresh_if_stale(&fetcher));
        assert_eq!(fetcher.request_count(), 1);
        assert_eq!(cache.lookup("Roboto").unwrap().family, "Roboto");
    }

    #[test]
    fn test_malformed_response_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let (_, mut cache) = cache_in(dir.path());
        fs::write(cache.path(), CATALOG_JSON).unwrap();
        cache.max_age = Duration::ZERO;
        std::thread::sleep(Duration::from_millis(10));

        let fetcher = StaticFetcher::new()
            .with(cache.request_url().unwrap(), "<html>quota exceeded</html>");
        assert!(!cache.refresh_if_stale(&fetcher));
        assert_eq!(fs::read_to_string(cache.path()).unwrap(), CATALOG_JSON);
    }

    #[test]
    fn test_error_body_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let (_, mut cache) = cache_in(dir.path());
        fs::write(cache.path(), CATALOG_JSON).unwrap();
        cache.max_age = Duration::ZERO;
        std::thread::sleep(Duration::from_millis(10));

        let fetcher = StaticFetcher::new().with(
            cache.request_url().unwrap(),
            r#"{"error": {"code": 429, "message": "Quota exceeded"}}"#,
        );
        assert!(matches!(cache.refresh(&fetcher), Err(MirrorError::InvalidCatalog)));
        assert!(!cache.refresh_if_stale(&fetcher));
        assert_eq!(fs::read_to_string(cache.path()).unwrap(), CATALOG_JSON);
        assert_eq!(cache.lookup("Roboto").unwrap().version, "v30");
    }

    #[test]
    fn test_empty_items_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let (_, cache) = cache_in(dir.path());
        let fetcher = StaticFetcher::new().with(cache.request_url().unwrap(), r#"{"items": []}"#);
        assert!(matches!(cache.refresh(&fetcher), Err(MirrorError::InvalidCatalog)));
        assert!(!cache.path().exists());
    }

    #[test]
    fn test_empty_cache_file_is_stale() {
        let dir = tempdir().unwrap();
        let (_, cache) = cache_in(dir.path());
        fs::write(cache.path(), b"").unwrap();
        assert!(cache.is_stale());
        assert!(cache.lookup("Roboto").is_none());
    }

    #[test]
    fn test_no_api_key_skips_refresh() {
        let dir = tempdir().unwrap();
        let config = MirrorConfig {
            api_key: None,
            ..MirrorConfig::for_testing(dir.path())
        };
        let cache = CatalogCache::new(&config);
        let fetcher = StaticFetcher::new();
        assert!(!cache.refresh_if_stale(&fetcher));
        assert_eq!(fetcher.request_count(), 0);
        assert!(cache.family_names(&fetcher).is_empty());
    }
}
