//! # fontmirror-fields
//!
//! Typography fields → stylesheet markup.
//!
//! ## Architecture
//!
//! ```text
//! ContentSource + ContentContext
//!     │
//!     ├── collect_all_fields   object fields, acf/ blocks, site options
//!     │
//!     ├── aggregate_fields     distinct font_family / font_weight values
//!     │
//!     └── Renderer             <link> / <style> / StyleAsset
//!              │
//!              └── FontMirror (fontmirror-core) in local mode
//! ```
//!
//! - **`content`** — content objects, the render context, a JSON store.
//! - **`aggregate`** — the field walk.
//! - **`render`** — markup and enqueue assets for local or remote fonts.
//! - **`template`** — template functions and shortcodes.
//! - **`html`** — escaping.

pub mod aggregate;
pub mod content;
pub mod html;
pub mod render;
pub mod template;

pub use aggregate::{aggregate_fields, FontSelection};
pub use content::{collect_all_fields, Block, ContentContext, ContentId, ContentObject, ContentSource, ContentStore};
pub use render::{remote_stylesheet_url, LinkType, Renderer, StyleAsset};
pub use template::{
    expand_shortcodes, get_typography_field, get_typography_sub_field, parse_shortcode_attrs,
    stylesheet_shortcode, the_typography_field, the_typography_sub_field, typography_shortcode,
    FieldResolver,
};
