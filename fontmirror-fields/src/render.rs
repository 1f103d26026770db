//! Stylesheet renderer — font selection → `<link>` / `<style>` markup.
//!
//! ```text
//! FontSelection { families, weights }
//!     │
//!     ├── SourceMode::Local   one tag per family, served from the mirror
//!     │     ├── link   <link rel="stylesheet" id="fontmirror-local-roboto-css" href=".../roboto-v30.css?ver=..." />
//!     │     └── style  <style id="fontmirror-local-roboto-css">...</style>
//!     │
//!     └── SourceMode::Remote  one v1 URL for all families
//!           ├── link   <link rel="stylesheet" href="https://.../css?family=Roboto:400,700|Lato:400,700" />
//!           └── style  <style>...fetched css...</style>
//! ```

use std::fmt;
use std::fs;
use std::str::FromStr;

use fontmirror_core::{family_slug, FontFetcher, FontMirror, SourceMode};
use serde::Serialize;

use crate::aggregate::{aggregate_fields, FontSelection};
use crate::content::{collect_all_fields, ContentContext, ContentSource};
use crate::html::escape_html;

/// Weights requested for every remote family when no field names any.
pub const DEFAULT_WEIGHTS: &str = "400,700";

/// Handle prefix for local stylesheet assets and markup ids.
pub const LOCAL_HANDLE_PREFIX: &str = "fontmirror-local-";
/// Handle of the single combined remote stylesheet.
pub const REMOTE_HANDLE: &str = "fontmirror-remote";

/// How the stylesheet reaches the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkType {
    /// `<link rel="stylesheet">` pointing at the file.
    #[default]
    Link,
    /// CSS inlined in a `<style>` element.
    Style,
}

impl FromStr for LinkType {
    type Err = std::convert::Infallible;

    /// `"style"` selects inlining; anything else links.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "style" => LinkType::Style,
            _ => LinkType::Link,
        })
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::Link => write!(f, "link"),
            LinkType::Style => write!(f, "style"),
        }
    }
}

/// A stylesheet for the host to register with its asset pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleAsset {
    pub handle: String,
    pub href: String,
}

/// `<css_url>?family=A:w1,w2|B:w1,w2`, or `None` for an empty selection.
///
/// Every family carries the same weight list; spaces become `+`.
pub fn remote_stylesheet_url(css_url: &str, selection: &FontSelection) -> Option<String> {
    if selection.is_empty() {
        return None;
    }
    let weights = if selection.weights.is_empty() {
        DEFAULT_WEIGHTS.to_string()
    } else {
        selection.weights.join(",")
    };
    let families: Vec<String> = selection
        .families
        .iter()
        .map(|family| format!("{}:{weights}", family.replace(' ', "+")))
        .collect();
    Some(format!("{css_url}?family={}", families.join("|")))
}

fn local_id(family: &str) -> String {
    format!("{LOCAL_HANDLE_PREFIX}{}-css", family_slug(family))
}

// ── Renderer ────────────────────────────────────────────────────────

/// Renders stylesheet markup for a font selection using one mirror.
pub struct Renderer<'a, F> {
    mirror: &'a FontMirror<F>,
}

impl<'a, F: FontFetcher> Renderer<'a, F> {
    pub fn new(mirror: &'a FontMirror<F>) -> Self {
        Self { mirror }
    }

    /// Markup for every family in `selection`, or an empty string.
    ///
    /// Never fails: families that cannot be served are skipped.
    pub fn stylesheet_markup(&self, selection: &FontSelection, link_type: LinkType) -> String {
        if selection.is_empty() {
            return String::new();
        }
        match self.mirror.config().source {
            SourceMode::Local => self.local_markup(selection, link_type),
            SourceMode::Remote => self.remote_markup(selection, link_type),
        }
    }

    /// Stylesheet assets for `selection`, for hosts with an enqueue step.
    pub fn enqueue(&self, selection: &FontSelection) -> Vec<StyleAsset> {
        let config = self.mirror.config();
        match config.source {
            SourceMode::Local => selection
                .families
                .iter()
                .filter_map(|family| {
                    let path = self.mirror.ensure_stylesheet(family)?;
                    Some(StyleAsset {
                        handle: format!("{LOCAL_HANDLE_PREFIX}{}", family_slug(family)),
                        href: self.mirror.public_url(&path),
                    })
                })
                .collect(),
            SourceMode::Remote => remote_stylesheet_url(&config.css_url, selection)
                .map(|href| StyleAsset {
                    handle: REMOTE_HANDLE.to_string(),
                    href,
                })
                .into_iter()
                .collect(),
        }
    }

    /// Aggregate the fields visible in `ctx` and render their markup.
    pub fn stylesheet_for(
        &self,
        source: &dyn ContentSource,
        ctx: ContentContext,
        link_type: LinkType,
    ) -> String {
        let fields = collect_all_fields(source, ctx);
        self.stylesheet_markup(&aggregate_fields(&fields), link_type)
    }

    /// Aggregate the fields visible in `ctx` and list their assets.
    pub fn enqueue_for(&self, source: &dyn ContentSource, ctx: ContentContext) -> Vec<StyleAsset> {
        let fields = collect_all_fields(source, ctx);
        self.enqueue(&aggregate_fields(&fields))
    }

    fn local_markup(&self, selection: &FontSelection, link_type: LinkType) -> String {
        let mut out = String::new();
        for family in &selection.families {
            let Some(path) = self.mirror.ensure_stylesheet(family) else {
                continue;
            };
            let id = escape_html(&local_id(family));
            match link_type {
                LinkType::Link => {
                    let href = format!(
                        "{}?ver={}",
                        self.mirror.public_url(&path),
                        self.mirror.config().asset_version
                    );
                    out.push_str(&format!(
                        "<link rel=\"stylesheet\" id=\"{id}\" href=\"{}\" media=\"all\" />",
                        escape_html(&href)
                    ));
                }
                LinkType::Style => match fs::read_to_string(&path) {
                    Ok(css) => out.push_str(&format!("<style id=\"{id}\">{css}</style>")),
                    Err(e) => log::warn!("cannot inline {}: {e}", path.display()),
                },
            }
        }
        out
    }

    fn remote_markup(&self, selection: &FontSelection, link_type: LinkType) -> String {
        let Some(url) = remote_stylesheet_url(&self.mirror.config().css_url, selection) else {
            return String::new();
        };
        match link_type {
            // Emitted without probing the URL; the browser fetches it.
            LinkType::Link => format!(
                "<link rel=\"stylesheet\" href=\"{}\" media=\"all\" />",
                escape_html(&url)
            ),
            LinkType::Style => match self.mirror.fetcher().fetch_text(&url) {
                Ok(css) => format!("<style>{css}</style>"),
                Err(e) => {
                    log::warn!("remote stylesheet unavailable: {e}");
                    String::new()
                }
            },
        }
    }
}
