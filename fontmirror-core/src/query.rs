//! Stylesheet synthesizer — CSS2 query building and CSS fetch.
//!
//! Maps catalog variant keys onto the provider's `ital,wght` axis tuples:
//!
//! | variant      | italic family | upright-only family |
//! |--------------|---------------|---------------------|
//! | `regular`    | `0,400`       | `400`               |
//! | `italic`     | `1,400`       | —                   |
//! | `700`        | `0,700`       | `700`               |
//! | `700italic`  | `1,700`       | —                   |
//!
//! Tuples are sorted ascending and joined with `;`, which is the only
//! order the provider accepts.

use std::fmt;

use crate::catalog::FontCatalogEntry;
use crate::error::{MirrorError, Result};
use crate::fetch::FontFetcher;

/// Marker every valid provider stylesheet starts with.
pub const FONT_CSS_MARKER: &str = "@font";

/// Weight assigned to the `regular` and `italic` variants.
const DEFAULT_WEIGHT: u16 = 400;

// ── Axis tuple ──────────────────────────────────────────────────────

/// One `(ital, wght)` point. Field order gives the provider's sort order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AxisTuple {
    pub italic: bool,
    pub weight: u16,
}

impl AxisTuple {
    /// Parse a catalog variant key. Unrecognised keys yield `None`.
    pub fn from_variant(key: &str) -> Option<Self> {
        match key {
            "regular" => Some(Self { italic: false, weight: DEFAULT_WEIGHT }),
            "italic" => Some(Self { italic: true, weight: DEFAULT_WEIGHT }),
            _ => {
                let (digits, italic) = match key.strip_suffix("italic") {
                    Some(weight) => (weight, true),
                    None => (key, false),
                };
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                digits.parse().ok().map(|weight| Self { italic, weight })
            }
        }
    }
}

// ── Family query ────────────────────────────────────────────────────

/// CSS2 query for one family across all of its catalog files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FamilyQuery {
    family: String,
    italic_axis: bool,
    tuples: Vec<AxisTuple>,
}

impl FamilyQuery {
    pub fn new(family: impl Into<String>, variants: &[&str], italic_axis: bool) -> Self {
        let mut tuples: Vec<AxisTuple> =
            variants.iter().filter_map(|v| AxisTuple::from_variant(v)).collect();
        tuples.sort();
        tuples.dedup();
        let italic_axis = italic_axis || tuples.iter().any(|t| t.italic);
        Self {
            family: family.into(),
            italic_axis,
            tuples,
        }
    }

    /// Query covering every file variant of a catalog entry.
    pub fn for_entry(entry: &FontCatalogEntry) -> Self {
        let keys: Vec<&str> = entry.files.keys().map(|k| k.as_str()).collect();
        Self::new(entry.family.clone(), &keys, entry.has_italic())
    }

    pub fn tuples(&self) -> &[AxisTuple] {
        &self.tuples
    }

    /// `ital,wght@0,400;1,700`, `wght@400;700`, or empty when no variant
    /// was recognised.
    pub fn axis_spec(&self) -> String {
        if self.tuples.is_empty() {
            return String::new();
        }
        let values: Vec<String> = self
            .tuples
            .iter()
            .map(|t| {
                if self.italic_axis {
                    format!("{},{}", u8::from(t.italic), t.weight)
                } else {
                    t.weight.to_string()
                }
            })
            .collect();
        let axes = if self.italic_axis { "ital,wght" } else { "wght" };
        format!("{axes}@{}", values.join(";"))
    }

    /// `family=` parameter value: `Open+Sans:wght@400;700`.
    pub fn family_param(&self) -> String {
        let name = self.family.replace(' ', "+");
        let spec = self.axis_spec();
        if spec.is_empty() {
            name
        } else {
            format!("{name}:{spec}")
        }
    }

    /// Full request URL against a CSS2 endpoint.
    pub fn url(&self, css2_endpoint: &str) -> String {
        format!("{css2_endpoint}?family={}", self.family_param())
    }
}

impl fmt::Display for FamilyQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.family_param())
    }
}

// ── CSS fetch ───────────────────────────────────────────────────────

/// Whether `css` looks like provider font CSS.
///
/// Leading whitespace and `/* subset */` comments are skipped before the
/// `@font` check.
pub fn is_font_css(css: &str) -> bool {
    let mut rest = css.trim_start();
    while let Some(after) = rest.strip_prefix("/*") {
        match after.find("*/") {
            Some(end) => rest = after[end + 2..].trim_start(),
            None => return false,
        }
    }
    rest.starts_with(FONT_CSS_MARKER)
}

/// Fetch the stylesheet for `query`, rejecting anything that is not font CSS.
pub fn fetch_stylesheet(
    fetcher: &dyn FontFetcher,
    query: &FamilyQuery,
    css2_endpoint: &str,
) -> Result<String> {
    let url = query.url(css2_endpoint);
    let css = fetcher.fetch_text(&url)?;
    if !is_font_css(&css) {
        return Err(MirrorError::InvalidStylesheet {
            family: query.family.clone(),
        });
    }
    Ok(css)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;

    const CSS2: &str = "https://fonts.googleapis.com/css2";

    #[test]
    fn test_parse_variants() {
        assert_eq!(
            AxisTuple::from_variant("regular"),
            Some(AxisTuple { italic: false, weight: 400 })
        );
        assert_eq!(
            AxisTuple::from_variant("italic"),
            Some(AxisTuple { italic: true, weight: 400 })
        );
        assert_eq!(
            AxisTuple::from_variant("300"),
            Some(AxisTuple { italic: false, weight: 300 })
        );
        assert_eq!(
            AxisTuple::from_variant("900italic"),
            Some(AxisTuple { italic: true, weight: 900 })
        );
        assert_eq!(AxisTuple::from_variant("bold"), None);
        assert_eq!(AxisTuple::from_variant(""), None);
        assert_eq!(AxisTuple::from_variant("70a0"), None);
    }

    #[test]
    fn test_roboto_scenario() {
        let query = FamilyQuery::new("Roboto", &["regular", "700", "italic", "700italic"], true);
        assert_eq!(query.axis_spec(), "ital,wght@0,400;0,700;1,400;1,700");
        assert_eq!(
            query.url(CSS2),
            "https://fonts.googleapis.com/css2?family=Roboto:ital,wght@0,400;0,700;1,400;1,700"
        );
    }

    #[test]
    fn test_regular_alone_without_italic() {
        let query = FamilyQuery::new("Lato", &["regular"], false);
        assert_eq!(query.axis_spec(), "wght@400");
        assert_eq!(query.family_param(), "Lato:wght@400");
    }

    #[test]
    fn test_regular_with_italic_sibling() {
        let query = FamilyQuery::new("Lato", &["regular"], true);
        assert_eq!(query.axis_spec(), "ital,wght@0,400");
    }

    #[test]
    fn test_numeric_sort_and_no_trailing_separator() {
        let query = FamilyQuery::new("Inter", &["900", "100", "regular", "300"], false);
        let spec = query.axis_spec();
        assert_eq!(spec, "wght@100;300;400;900");
        assert!(!spec.ends_with(';'));
    }

    #[test]
    fn test_query_is_idempotent() {
        let variants = ["700italic", "regular", "italic", "700"];
        let a = FamilyQuery::new("Roboto", &variants, true).axis_spec();
        let b = FamilyQuery::new("Roboto", &variants, true).axis_spec();
        let reversed: Vec<&str> = variants.iter().rev().copied().collect();
        let c = FamilyQuery::new("Roboto", &reversed, true).axis_spec();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_space_encoding() {
        let query = FamilyQuery::new("Open Sans", &["regular", "700"], false);
        assert_eq!(query.to_string(), "Open+Sans:wght@400;700");
    }

    #[test]
    fn test_no_recognised_variants() {
        let query = FamilyQuery::new("Odd Font", &["book"], false);
        assert_eq!(query.axis_spec(), "");
        assert_eq!(query.url(CSS2), "https://fonts.googleapis.com/css2?family=Odd+Font");
    }

    #[test]
    fn test_is_font_css() {
        assert!(is_font_css("@font-face {\n  font-family: 'Roboto';\n}"));
        assert!(is_font_css("\n/* latin-ext */\n@font-face {}"));
        assert!(is_font_css("/* cyrillic */ /* greek */ @font-face {}"));
        assert!(!is_font_css("<!DOCTYPE html><html>Error 400</html>"));
        assert!(!is_font_css(""));
        assert!(!is_font_css("/* unterminated @font-face"));
    }

    #[test]
    fn test_fetch_stylesheet_rejects_html() {
        let query = FamilyQuery::new("Roboto", &["regular"], false);
        let fetcher = StaticFetcher::new().with(query.url(CSS2), "<html>Error 400</html>");
        let err = fetch_stylesheet(&fetcher, &query, CSS2).unwrap_err();
        assert!(matches!(err, MirrorError::InvalidStylesheet { .. }));
    }

    #[test]
    fn test_fetch_stylesheet_ok() {
        let query = FamilyQuery::new("Roboto", &["regular"], false);
        let fetcher = StaticFetcher::new().with(query.url(CSS2), "@font-face { }");
        assert_eq!(fetch_stylesheet(&fetcher, &query, CSS2).unwrap(), "@font-face { }");
    }
}
