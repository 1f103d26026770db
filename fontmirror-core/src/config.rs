//! Pipeline configuration.
//!
//! One [`MirrorConfig`] value is threaded through the catalog, the mirror
//! writer and the renderer. Nothing reads process-wide constants.
//!
//! ```text
//! <root_dir>/
//!   ├── google_fonts.json                 cached provider catalog
//!   ├── font-styles/<slug>-<version>.css  mirrored stylesheets
//!   └── fonts/<slug>/<version>/<file>     downloaded font binaries
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable names read by [`MirrorConfig::from_env`].
pub const ENV_ROOT: &str = "FONTMIRROR_ROOT";
pub const ENV_API_KEY: &str = "FONTMIRROR_API_KEY";
pub const ENV_SOURCE: &str = "FONTMIRROR_SOURCE";
pub const ENV_PUBLIC_URL: &str = "FONTMIRROR_PUBLIC_URL";

const CATALOG_FILE: &str = "google_fonts.json";
const STYLESHEET_DIR: &str = "font-styles";
const FONT_DIR: &str = "fonts";

/// Where rendered stylesheets point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    /// Link straight to the provider's CSS endpoint.
    #[default]
    Remote,
    /// Serve mirrored copies from `root_dir`.
    Local,
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(SourceMode::Local),
            "remote" | "" => Ok(SourceMode::Remote),
            other => Err(format!("unknown font source mode '{other}' (expected 'local' or 'remote')")),
        }
    }
}

/// Mirror configuration.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Directory holding the catalog cache, stylesheets and font files
    pub root_dir: PathBuf,
    /// Provider API key for the catalog endpoint (None = never refresh)
    pub api_key: Option<String>,
    /// Local mirror or remote passthrough
    pub source: SourceMode,
    /// Public URL under which `root_dir` is served
    pub public_base_url: String,
    /// Cache-busting `?ver=` value appended to local stylesheet links
    pub asset_version: String,
    /// Catalog cache older than this is refetched (default: 2 days)
    pub catalog_max_age: Duration,
    /// Provider catalog endpoint
    pub catalog_url: String,
    /// Provider CSS2 endpoint (used for mirroring)
    pub css2_url: String,
    /// Provider CSS v1 endpoint (used for remote passthrough)
    pub css_url: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("fontmirror_data"),
            api_key: None,
            source: SourceMode::Remote,
            public_base_url: "/fontmirror".to_string(),
            asset_version: env!("CARGO_PKG_VERSION").to_string(),
            catalog_max_age: Duration::from_secs(2 * 24 * 60 * 60),
            catalog_url: "https://www.googleapis.com/webfonts/v1/webfonts".to_string(),
            css2_url: "https://fonts.googleapis.com/css2".to_string(),
            css_url: "https://fonts.googleapis.com/css".to_string(),
        }
    }
}

impl MirrorConfig {
    /// Config for testing: local mode rooted at `root`, fake API key.
    pub fn for_testing(root: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root.into(),
            api_key: Some("test-key".to_string()),
            source: SourceMode::Local,
            public_base_url: "https://example.test/fontmirror".to_string(),
            asset_version: "test".to_string(),
            ..Self::default()
        }
    }

    /// Build a config from `FONTMIRROR_*` environment variables.
    ///
    /// Unset variables keep their defaults; an unrecognised source mode
    /// falls back to remote with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(root) = std::env::var(ENV_ROOT) {
            config.root_dir = PathBuf::from(root);
        }
        config.api_key = std::env::var(ENV_API_KEY).ok().filter(|k| !k.trim().is_empty());
        if let Ok(source) = std::env::var(ENV_SOURCE) {
            config.source = source.parse().unwrap_or_else(|e| {
                log::warn!("{e}; using remote");
                SourceMode::Remote
            });
        }
        if let Ok(url) = std::env::var(ENV_PUBLIC_URL) {
            config.public_base_url = url;
        }
        config
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root_dir.join(CATALOG_FILE)
    }

    pub fn stylesheet_dir(&self) -> PathBuf {
        self.root_dir.join(STYLESHEET_DIR)
    }

    pub fn font_dir(&self) -> PathBuf {
        self.root_dir.join(FONT_DIR)
    }

    /// Public URL of a file under `root_dir`.
    pub fn public_url(&self, relative: &Path) -> String {
        let rel: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), rel.join("/"))
    }
}

/// Directory slug for a family: spaces removed, lowercased.
///
/// `"Open Sans"` → `"opensans"`.
pub fn family_slug(family: &str) -> String {
    family.replace(' ', "").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_mode_parse() {
        assert_eq!("local".parse::<SourceMode>(), Ok(SourceMode::Local));
        assert_eq!("LOCAL".parse::<SourceMode>(), Ok(SourceMode::Local));
        assert_eq!("remote".parse::<SourceMode>(), Ok(SourceMode::Remote));
        assert!("cdn".parse::<SourceMode>().is_err());
    }

    #[test]
    fn test_default_layout() {
        let config = MirrorConfig::for_testing("/srv/fm");
        assert_eq!(config.catalog_path(), PathBuf::from("/srv/fm/google_fonts.json"));
        assert_eq!(config.stylesheet_dir(), PathBuf::from("/srv/fm/font-styles"));
        assert_eq!(config.font_dir(), PathBuf::from("/srv/fm/fonts"));
        assert_eq!(config.source, SourceMode::Local);
    }

    #[test]
    fn test_public_url_joins_components() {
        let config = MirrorConfig {
            public_base_url: "https://cdn.test/fm/".into(),
            ..MirrorConfig::default()
        };
        let url = config.public_url(Path::new("font-styles/roboto-v30.css"));
        assert_eq!(url, "https://cdn.test/fm/font-styles/roboto-v30.css");
    }

    #[test]
    fn test_family_slug() {
        assert_eq!(family_slug("Open Sans"), "opensans");
        assert_eq!(family_slug("Roboto"), "roboto");
        assert_eq!(family_slug("IBM Plex Mono"), "ibmplexmono");
    }
}
