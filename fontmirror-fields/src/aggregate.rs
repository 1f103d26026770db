//! Field aggregator — distinct font families and weights in use.

use serde::Serialize;
use serde_json::Value;

pub const FAMILY_KEY: &str = "font_family";
pub const WEIGHT_KEY: &str = "font_weight";

/// Families and weights referenced by a set of fields, deduplicated in
/// order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FontSelection {
    pub families: Vec<String>,
    pub weights: Vec<String>,
}

impl FontSelection {
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    fn add(list: &mut Vec<String>, value: &Value) {
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return,
        };
        if !text.is_empty() && !list.contains(&text) {
            list.push(text);
        }
    }
}

/// Walk every value tree and collect `font_family` / `font_weight` leaves.
pub fn aggregate_fields<'a>(values: impl IntoIterator<Item = &'a Value>) -> FontSelection {
    let mut selection = FontSelection::default();
    for value in values {
        walk(value, &mut selection);
    }
    selection
}

fn walk(value: &Value, selection: &mut FontSelection) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let target = match key.as_str() {
                    FAMILY_KEY => Some(&mut selection.families),
                    WEIGHT_KEY => Some(&mut selection.weights),
                    _ => None,
                };
                match target {
                    Some(list) if !child.is_object() && !child.is_array() => {
                        FontSelection::add(list, child)
                    }
                    _ => walk(child, selection),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| walk(item, selection)),
        _ => {}
    }
}
