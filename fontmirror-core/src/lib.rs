//! # fontmirror-core
//!
//! Local mirroring of web font stylesheets. Fetches a provider's CSS for a
//! family, downloads every font file it references into a local tree and
//! rewrites the CSS to point at the local copies.
//!
//! ## Architecture
//!
//! ```text
//! FontMirror::ensure_stylesheet(family)
//!     │
//!     ├── CatalogCache     google_fonts.json (refreshed when stale)
//!     │
//!     ├── FamilyQuery      css2?family=Name:ital,wght@0,400;1,700
//!     │        │
//!     │        ▼
//!     ├── FontFetcher ───► provider CSS + font binaries
//!     │
//!     └── rewrite          remote src: lines → ../fonts/<slug>/<ver>/<file>
//! ```
//!
//! - **`config`** — `MirrorConfig`, source mode, directory layout.
//! - **`fetch`** — `FontFetcher` trait, `ureq` HTTP fetcher, in-memory fetcher.
//! - **`dirs`** — directory provisioning.
//! - **`catalog`** — provider catalog model and cache file.
//! - **`query`** — CSS2 query synthesis and stylesheet validation.
//! - **`rewrite`** — longest-prefix `src:` line rewrite.
//! - **`mirror`** — the end-to-end mirror writer.

pub mod catalog;
pub mod config;
pub mod dirs;
pub mod error;
pub mod fetch;
pub mod mirror;
pub mod query;
pub mod rewrite;

// Re-exports for ergonomic use.
pub use catalog::{CatalogCache, FontCatalog, FontCatalogEntry};
pub use config::{family_slug, MirrorConfig, SourceMode};
pub use error::{MirrorError, Result};
pub use fetch::{FontFetcher, HttpFetcher, StaticFetcher};
pub use mirror::{FontMirror, MirrorReport};
pub use query::{AxisTuple, FamilyQuery};
pub use rewrite::{FontFormat, LocalFontRef, Rewrite};
