//! Template functions and shortcodes.
//!
//! The field-value resolution itself belongs to the host; it is reached
//! through [`FieldResolver`]. Everything here only picks a property out of
//! the resolved value and escapes it for markup.
//!
//! ```text
//! [acf_typography field="heading" property="font_family" post_id="7"]
//! [acf_typography_stylesheet link_type="style"]
//! ```

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::LazyLock;

use fontmirror_core::FontFetcher;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::content::{ContentContext, ContentId, ContentSource, ContentStore};
use crate::html::escape_html;
use crate::render::{LinkType, Renderer};

pub const TYPOGRAPHY_TAG: &str = "acf_typography";
pub const STYLESHEET_TAG: &str = "acf_typography_stylesheet";

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\w-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'\]]+))"#)
        .expect("shortcode attribute pattern is valid")
});

static SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(acf_typography_stylesheet|acf_typography)\b([^\]]*)\]")
        .expect("shortcode tag pattern is valid")
});

/// Host-side field value resolution.
pub trait FieldResolver {
    /// Whether a field definition exists for `selector`.
    fn field_exists(&self, selector: &str, object: Option<ContentId>) -> bool;

    /// The value of `selector` on `object` (site options when `None`).
    fn value(&self, selector: &str, object: Option<ContentId>, format: bool) -> Option<Value>;

    /// The current sub field inside a repeater/group loop.
    fn sub_field(&self, _selector: &str, _format: bool) -> Option<Value> {
        None
    }
}

impl FieldResolver for ContentStore {
    fn field_exists(&self, selector: &str, object: Option<ContentId>) -> bool {
        self.value(selector, object, false).is_some()
    }

    /// Top-level key of the object's fields, falling back to site options.
    fn value(&self, selector: &str, object: Option<ContentId>, _format: bool) -> Option<Value> {
        object
            .and_then(|id| self.object(id))
            .and_then(|o| o.fields.get(selector).cloned())
            .or_else(|| self.options.get(selector).cloned())
    }
}

/// Plain text of a property value; lists join with `", "`.
fn property_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Array(items) => items
            .iter()
            .map(property_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Bool(false) | Value::Null | Value::Object(_) => String::new(),
    }
}

fn pick_property(value: Option<&Value>, property: &str) -> String {
    value
        .and_then(|v| v.as_object())
        .and_then(|map| map.get(property))
        .map(|v| escape_html(&property_text(v)))
        .unwrap_or_default()
}

// ── Template functions ──────────────────────────────────────────────

/// One property of a typography field, escaped for markup; empty when the
/// field or property is missing.
pub fn get_typography_field(
    resolver: &dyn FieldResolver,
    selector: &str,
    property: &str,
    ctx: ContentContext,
    format_value: bool,
) -> String {
    // Values of unregistered fields are returned raw.
    let format = format_value && resolver.field_exists(selector, ctx.object_id);
    let value = resolver.value(selector, ctx.object_id, format);
    pick_property(value.as_ref(), property)
}

/// Write [`get_typography_field`] to `out`.
pub fn the_typography_field(
    out: &mut impl Write,
    resolver: &dyn FieldResolver,
    selector: &str,
    property: &str,
    ctx: ContentContext,
    format_value: bool,
) -> io::Result<()> {
    let value = get_typography_field(resolver, selector, property, ctx, format_value);
    out.write_all(value.as_bytes())
}

/// Property of the current sub field, `None` outside a sub field loop.
pub fn get_typography_sub_field(
    resolver: &dyn FieldResolver,
    selector: &str,
    property: &str,
    format_value: bool,
) -> Option<String> {
    let value = resolver.sub_field(selector, format_value)?;
    Some(pick_property(Some(&value), property))
}

/// Write [`get_typography_sub_field`] to `out`; nothing outside a loop.
pub fn the_typography_sub_field(
    out: &mut impl Write,
    resolver: &dyn FieldResolver,
    selector: &str,
    property: &str,
    format_value: bool,
) -> io::Result<()> {
    match get_typography_sub_field(resolver, selector, property, format_value) {
        Some(value) => out.write_all(value.as_bytes()),
        None => Ok(()),
    }
}

// ── Shortcodes ──────────────────────────────────────────────────────

/// Attributes of one shortcode tag. Keys are lowercased.
pub fn parse_shortcode_attrs(text: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for caps in ATTR_RE.captures_iter(text) {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        attrs.insert(caps[1].to_lowercase(), value.to_string());
    }
    attrs
}

fn attr_post_id(attrs: &HashMap<String, String>) -> Option<ContentId> {
    attrs.get("post_id").and_then(|id| id.trim().parse().ok())
}

fn attr_flag(attrs: &HashMap<String, String>, key: &str, default: bool) -> bool {
    match attrs.get(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => default,
        Some(v) => !matches!(v.as_str(), "" | "0" | "false" | "no"),
    }
}

/// `[acf_typography field="..." property="..." post_id="..." format_value="..."]`
pub fn typography_shortcode(
    resolver: &dyn FieldResolver,
    attrs: &HashMap<String, String>,
    ctx: ContentContext,
) -> String {
    let field = attrs.get("field").map_or("", String::as_str);
    let property = attrs.get("property").map_or("", String::as_str);
    let ctx = ctx.with_override(attr_post_id(attrs));
    get_typography_field(resolver, field, property, ctx, attr_flag(attrs, "format_value", true))
}

/// `[acf_typography_stylesheet link_type="link|style" post_id="..."]`
pub fn stylesheet_shortcode<F: FontFetcher>(
    renderer: &Renderer<'_, F>,
    source: &dyn ContentSource,
    attrs: &HashMap<String, String>,
    ctx: ContentContext,
) -> String {
    let link_type = attrs
        .get("link_type")
        .and_then(|v| v.parse().ok())
        .unwrap_or(LinkType::Link);
    renderer.stylesheet_for(source, ctx.with_override(attr_post_id(attrs)), link_type)
}

/// Replace every typography shortcode in `text` with its output.
pub fn expand_shortcodes<F: FontFetcher>(
    text: &str,
    resolver: &dyn FieldResolver,
    renderer: &Renderer<'_, F>,
    source: &dyn ContentSource,
    ctx: ContentContext,
) -> String {
    SHORTCODE_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let attrs = parse_shortcode_attrs(&caps[2]);
            match &caps[1] {
                STYLESHEET_TAG => stylesheet_shortcode(renderer, source, &attrs, ctx),
                _ => typography_shortcode(resolver, &attrs, ctx),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentObject;
    use serde_json::json;

    fn store() -> ContentStore {
        let mut store = ContentStore::new().with_options(json!({
            "site_heading": {"font_family": "Lato", "font_size": 18}
        }));
        store.insert(ContentObject {
            id: 7,
            fields: json!({
                "heading": {
                    "font_family": "Open \"Sans\"",
                    "font_weight": "700",
                    "text_transform": ["uppercase", "none"]
                }
            }),
            blocks: vec![],
        });
        store
    }

    struct LoopResolver;

    impl FieldResolver for LoopResolver {
        fn field_exists(&self, _: &str, _: Option<ContentId>) -> bool {
            false
        }
        fn value(&self, _: &str, _: Option<ContentId>, _: bool) -> Option<Value> {
            None
        }
        fn sub_field(&self, selector: &str, _: bool) -> Option<Value> {
            (selector == "row_font").then(|| json!({"font_family": "Inter"}))
        }
    }

    #[test]
    fn test_get_field_escapes() {
        let value = get_typography_field(&store(), "heading", "font_family", ContentContext::for_object(7), true);
        assert_eq!(value, "Open &quot;Sans&quot;");
    }

    #[test]
    fn test_get_field_missing_is_empty() {
        let ctx = ContentContext::for_object(7);
        assert_eq!(get_typography_field(&store(), "heading", "letter_spacing", ctx, true), "");
        assert_eq!(get_typography_field(&store(), "nope", "font_family", ctx, true), "");
    }

    #[test]
    fn test_get_field_falls_back_to_options() {
        let value = get_typography_field(&store(), "site_heading", "font_size", ContentContext::site(), false);
        assert_eq!(value, "18");
    }

    #[test]
    fn test_the_field_joins_arrays() {
        let mut out = Vec::new();
        the_typography_field(&mut out, &store(), "heading", "text_transform", ContentContext::for_object(7), true)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "uppercase, none");
    }

    #[test]
    fn test_sub_field() {
        assert_eq!(
            get_typography_sub_field(&LoopResolver, "row_font", "font_family", true).as_deref(),
            Some("Inter")
        );
        assert_eq!(get_typography_sub_field(&store(), "row_font", "font_family", true), None);

        let mut out = Vec::new();
        the_typography_sub_field(&mut out, &LoopResolver, "other", "font_family", true).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_parse_shortcode_attrs() {
        let attrs = parse_shortcode_attrs(r#"[acf_typography field="heading" Property='font_size' post_id=123]"#);
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs["field"], "heading");
        assert_eq!(attrs["property"], "font_size");
        assert_eq!(attrs["post_id"], "123");
    }

    #[test]
    fn test_typography_shortcode_post_id_override() {
        let mut attrs = HashMap::new();
        attrs.insert("field".to_string(), "heading".to_string());
        attrs.insert("property".to_string(), "font_weight".to_string());
        assert_eq!(typography_shortcode(&store(), &attrs, ContentContext::site()), "");
        attrs.insert("post_id".to_string(), "7".to_string());
        assert_eq!(typography_shortcode(&store(), &attrs, ContentContext::site()), "700");
    }

    #[test]
    fn test_shortcode_patterns() {
        assert!(ATTR_RE.is_match("field=\"heading\""));
        let caps = SHORTCODE_RE.captures("x [acf_typography_stylesheet link_type=style] y").unwrap();
        assert_eq!(&caps[1], "acf_typography_stylesheet");
        assert_eq!(parse_shortcode_attrs(&caps[2])["link_type"], "style");
        assert!(!SHORTCODE_RE.is_match("[acf_typographyx field=a]"));
    }

    #[test]
    fn test_attr_flag() {
        let attrs = parse_shortcode_attrs(r#"a="0" b="false" c="1" d="""#);
        assert!(!attr_flag(&attrs, "a", true));
        assert!(!attr_flag(&attrs, "b", true));
        assert!(attr_flag(&attrs, "c", false));
        assert!(!attr_flag(&attrs, "d", true));
        assert!(attr_flag(&attrs, "missing", true));
    }
}
