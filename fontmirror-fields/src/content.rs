//! Content objects and the explicit render context.
//!
//! The host platform owns posts, blocks and site options; this crate only
//! sees them through [`ContentSource`]. Which object is being rendered is
//! always passed in as a [`ContentContext`], never looked up globally.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Host content object identifier.
pub type ContentId = u64;

/// Block name prefix for blocks whose `data` holds custom field values.
pub const FIELD_BLOCK_PREFIX: &str = "acf/";

/// An embedded content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

/// A content object with its custom field values and embedded blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentObject {
    pub id: ContentId,
    #[serde(default)]
    pub fields: Value,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// Read access to the host's content store.
pub trait ContentSource {
    /// The object with `id`, if it exists.
    fn object(&self, id: ContentId) -> Option<ContentObject>;

    /// Site-wide option fields (applied to every page).
    fn option_fields(&self) -> Value;
}

/// Which object a render call is about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentContext {
    pub object_id: Option<ContentId>,
}

impl ContentContext {
    pub fn for_object(id: ContentId) -> Self {
        Self { object_id: Some(id) }
    }

    /// Context with no current object: only option fields apply.
    pub fn site() -> Self {
        Self { object_id: None }
    }

    /// An explicit id (e.g. a shortcode `post_id`) wins over the context.
    pub fn with_override(self, id: Option<ContentId>) -> Self {
        match id {
            Some(id) => Self::for_object(id),
            None => self,
        }
    }
}

/// Every field value tree that applies to `ctx`, in precedence order:
/// object fields, field-block data, option fields.
///
/// An id that does not resolve to an object is treated as no object.
pub fn collect_all_fields(source: &dyn ContentSource, ctx: ContentContext) -> Vec<Value> {
    let options = source.option_fields();
    let Some(object) = ctx.object_id.and_then(|id| source.object(id)) else {
        return vec![options];
    };

    let mut all = Vec::with_capacity(object.blocks.len() + 2);
    all.push(object.fields);
    all.extend(
        object
            .blocks
            .into_iter()
            .filter(|block| block.name.starts_with(FIELD_BLOCK_PREFIX))
            .map(|block| block.data),
    );
    all.push(options);
    all
}

// ── In-memory store ─────────────────────────────────────────────────

/// JSON-backed [`ContentSource`]:
///
/// ```json
/// { "objects": [{ "id": 1, "fields": {...}, "blocks": [...] }], "options": {...} }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentStore {
    #[serde(default)]
    pub objects: Vec<ContentObject>,
    #[serde(default)]
    pub options: Value,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Add or replace an object.
    pub fn insert(&mut self, object: ContentObject) {
        self.objects.retain(|o| o.id != object.id);
        self.objects.push(object);
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }
}

impl ContentSource for ContentStore {
    fn object(&self, id: ContentId) -> Option<ContentObject> {
        self.objects.iter().find(|o| o.id == id).cloned()
    }

    fn option_fields(&self) -> Value {
        self.options.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> ContentStore {
        let mut store = ContentStore::new().with_options(json!({"site_heading": {"font_family": "Lato"}}));
        store.insert(ContentObject {
            id: 7,
            fields: json!({"heading": {"font_family": "Roboto"}}),
            blocks: vec![
                Block { name: "acf/hero".into(), data: json!({"title": {"font_family": "Inter"}}) },
                Block { name: "core/paragraph".into(), data: json!({"font_family": "Ignored"}) },
            ],
        });
        store
    }

    #[test]
    fn test_collect_fields_for_object() {
        let all = collect_all_fields(&store(), ContentContext::for_object(7));
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], json!({"heading": {"font_family": "Roboto"}}));
        assert_eq!(all[1], json!({"title": {"font_family": "Inter"}}));
        assert_eq!(all[2], json!({"site_heading": {"font_family": "Lato"}}));
    }

    #[test]
    fn test_collect_fields_without_object() {
        let all = collect_all_fields(&store(), ContentContext::site());
        assert_eq!(all, vec![json!({"site_heading": {"font_family": "Lato"}})]);
    }

    #[test]
    fn test_unknown_object_falls_back_to_options() {
        let all = collect_all_fields(&store(), ContentContext::for_object(999));
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_context_override() {
        let ctx = ContentContext::for_object(1);
        assert_eq!(ctx.with_override(Some(2)).object_id, Some(2));
        assert_eq!(ctx.with_override(None).object_id, Some(1));
    }

    #[test]
    fn test_store_from_json_and_replace() {
        let mut store = ContentStore::from_json(r#"{"objects": [{"id": 3, "fields": {}}]}"#).unwrap();
        assert!(store.object(3).is_some());
        assert_eq!(store.option_fields(), Value::Null);
        store.insert(ContentObject { id: 3, fields: json!({"a": 1}), blocks: vec![] });
        assert_eq!(store.objects.len(), 1);
        assert_eq!(store.object(3).unwrap().fields, json!({"a": 1}));
    }
}
