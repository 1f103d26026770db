//! Local mirror writer — provider CSS + font binaries → `root_dir`.
//!
//! ```text
//! ensure_stylesheet("Roboto")      (try_stylesheet, errors logged)
//!   ├── catalog.entry()             ── None → UnknownFamily
//!   ├── font-styles/roboto-v30.css  ── exists → reuse (no network)
//!   └── mirror_entry()
//!         ├── fetch_stylesheet()    ── not font CSS → abort, nothing written
//!         ├── write CSS verbatim
//!         ├── per catalog file:  fonts/roboto/v30/<basename>  (download once)
//!         └── rewrite_stylesheet() ── overwrite CSS with local src lines
//! ```
//!
//! Cache entries are keyed by (family, version). A version bump yields a
//! new stylesheet name; the old one is left on disk.

use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::catalog::{CatalogCache, FontCatalogEntry};
use crate::config::{family_slug, MirrorConfig};
use crate::dirs;
use crate::error::{MirrorError, Result};
use crate::fetch::FontFetcher;
use crate::query::{fetch_stylesheet, FamilyQuery};
use crate::rewrite::{rewrite_stylesheet, LocalFontRef};

/// Outcome of one mirroring run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    pub family: String,
    pub version: String,
    pub stylesheet: PathBuf,
    /// Font files fetched during this run.
    pub downloaded: usize,
    /// Font files already on disk.
    pub reused: usize,
    /// Catalog URLs that could not be fetched (left remote in the CSS).
    pub failed: Vec<String>,
    pub lines_rewritten: usize,
}

/// `<slug>-<version>.css`, lowercased.
pub fn stylesheet_filename(family: &str, version: &str) -> String {
    format!("{}-{}.css", family_slug(family), version.to_lowercase())
}

/// Last path segment of a font URL, without query or fragment.
///
/// Returns `None` for URLs with no usable file name.
pub fn font_basename(url: &str) -> Option<String> {
    let name = match Url::parse(url) {
        Ok(parsed) => parsed.path_segments()?.last()?.to_string(),
        Err(_) => {
            let path = url.split(['?', '#']).next()?;
            path.rsplit('/').next()?.to_string()
        }
    };
    match name.as_str() {
        "" | "." | ".." => None,
        _ => Some(name),
    }
}

/// Font mirror bound to one configuration and fetcher.
pub struct FontMirror<F> {
    config: MirrorConfig,
    catalog: CatalogCache,
    fetcher: F,
}

impl<F: FontFetcher> FontMirror<F> {
    pub fn new(config: MirrorConfig, fetcher: F) -> Self {
        let catalog = CatalogCache::new(&config);
        Self {
            config,
            catalog,
            fetcher,
        }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Catalog entry for `family`, refreshing a stale catalog first.
    pub fn entry(&self, family: &str) -> Option<FontCatalogEntry> {
        self.catalog.entry(&self.fetcher, family)
    }

    /// Every family in the catalog.
    pub fn family_names(&self) -> Vec<String> {
        self.catalog.family_names(&self.fetcher)
    }

    pub fn stylesheet_path(&self, entry: &FontCatalogEntry) -> PathBuf {
        self.config
            .stylesheet_dir()
            .join(stylesheet_filename(&entry.family, &entry.version))
    }

    /// `fonts/<slug>/<version>/`, mirroring the provider's URL layout.
    pub fn font_dir(&self, entry: &FontCatalogEntry) -> PathBuf {
        self.config
            .font_dir()
            .join(entry.slug())
            .join(entry.version.to_lowercase())
    }

    /// Public URL of a file under `root_dir`.
    pub fn public_url(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.config.root_dir).unwrap_or(path);
        self.config.public_url(relative)
    }

    /// Path of the local stylesheet for `family`, mirroring it first if it
    /// is not on disk yet.
    ///
    /// Never fails: unknown families, network errors and bad provider
    /// responses are logged and yield `None`.
    pub fn ensure_stylesheet(&self, family: &str) -> Option<PathBuf> {
        match self.try_stylesheet(family) {
            Ok(path) => Some(path),
            Err(MirrorError::UnknownFamily(_)) => {
                log::debug!("'{family}' not in catalog, no local stylesheet");
                None
            }
            Err(e) => {
                log::warn!("mirroring '{family}' failed: {e}");
                None
            }
        }
    }

    /// Like [`ensure_stylesheet`](Self::ensure_stylesheet), but reports why
    /// no stylesheet could be produced.
    pub fn try_stylesheet(&self, family: &str) -> Result<PathBuf> {
        let entry = self
            .entry(family)
            .ok_or_else(|| MirrorError::UnknownFamily(family.to_string()))?;
        let path = self.stylesheet_path(&entry);
        if path.exists() {
            log::debug!("local stylesheet hit: {}", path.display());
            return Ok(path);
        }
        let report = self.mirror_entry(&entry)?;
        log::info!(
            "mirrored '{}' {}: {} downloaded, {} reused, {} failed, {} lines rewritten",
            report.family,
            report.version,
            report.downloaded,
            report.reused,
            report.failed.len(),
            report.lines_rewritten,
        );
        Ok(report.stylesheet)
    }

    /// Mirror `family` unconditionally, overwriting any existing stylesheet.
    pub fn mirror_family(&self, family: &str) -> Result<MirrorReport> {
        let entry = self
            .entry(family)
            .ok_or_else(|| MirrorError::UnknownFamily(family.to_string()))?;
        self.mirror_entry(&entry)
    }

    /// Fetch, store and rewrite the stylesheet for one catalog entry.
    ///
    /// The provider CSS is validated before anything touches the disk.
    pub fn mirror_entry(&self, entry: &FontCatalogEntry) -> Result<MirrorReport> {
        let query = FamilyQuery::for_entry(entry);
        let css = fetch_stylesheet(&self.fetcher, &query, &self.config.css2_url)?;

        let stylesheet = self.stylesheet_path(entry);
        dirs::ensure_dir(&self.config.stylesheet_dir())?;
        fs::write(&stylesheet, &css)?;

        let font_dir = self.font_dir(entry);
        dirs::ensure_dir(&font_dir)?;
        let href_base = format!("../fonts/{}/{}", entry.slug(), entry.version.to_lowercase());

        let mut report = MirrorReport {
            family: entry.family.clone(),
            version: entry.version.clone(),
            stylesheet: stylesheet.clone(),
            ..MirrorReport::default()
        };

        let mut fonts = Vec::with_capacity(entry.files.len());
        for (variant, url) in &entry.files {
            let Some(basename) = font_basename(url) else {
                log::warn!("'{}' {variant}: no file name in {url}", entry.family);
                report.failed.push(url.clone());
                continue;
            };
            let dest = font_dir.join(&basename);
            if dirs::is_nonempty_file(&dest) {
                report.reused += 1;
            } else {
                match self.fetcher.fetch(url) {
                    Ok(bytes) => {
                        fs::write(&dest, bytes)?;
                        report.downloaded += 1;
                    }
                    Err(e) => {
                        log::warn!("'{}' {variant}: font download failed: {e}", entry.family);
                        report.failed.push(url.clone());
                        fonts.push(LocalFontRef::unavailable(basename));
                        continue;
                    }
                }
            }
            fonts.push(LocalFontRef::new(basename.clone(), format!("{href_base}/{basename}")));
        }

        let rewrite = rewrite_stylesheet(&css, &fonts);
        fs::write(&stylesheet, &rewrite.css)?;
        report.lines_rewritten = rewrite.lines_rewritten;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stylesheet_filename() {
        assert_eq!(stylesheet_filename("Open Sans", "v34"), "opensans-v34.css");
        assert_eq!(stylesheet_filename("Roboto", "V30"), "roboto-v30.css");
    }

    #[test]
    fn test_font_basename() {
        assert_eq!(
            font_basename("http://fonts.gstatic.com/s/roboto/v30/KFOmCnqEu92Fr1Me5Q.ttf").as_deref(),
            Some("KFOmCnqEu92Fr1Me5Q.ttf")
        );
        assert_eq!(
            font_basename("https://h.test/a/b.woff2?v=3#x").as_deref(),
            Some("b.woff2")
        );
        assert_eq!(font_basename("relative/dir/c.svg").as_deref(), Some("c.svg"));
        assert_eq!(font_basename("https://h.test/dir/"), None);
    }
}
