//! Nested JSON object flattening.

use serde_json::{Map, Value};

use crate::polars_utils::LIST_SEPARATOR;

/// Single-level mapping of dotted paths to scalar values.
///
/// Keys keep the position of their first insertion; a later insert of the
/// same key replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRow {
    values: Map<String, Value>,
}

impl FlatRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a nested object.
    ///
    /// Nested objects contribute `prefix.key` paths, arrays become one
    /// `", "`-joined string, and scalars are kept as they are.
    pub fn flatten(object: &Map<String, Value>) -> Self {
        let mut row = Self::new();
        row.flatten_into(object, "");
        row
    }

    fn flatten_into(&mut self, object: &Map<String, Value>, prefix: &str) {
        for (key, value) in object {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            match value {
                Value::Object(nested) => self.flatten_into(nested, &path),
                Value::Array(elements) => {
                    self.insert(path, Value::String(join_elements(elements)));
                }
                scalar => self.insert(path, scalar.clone()),
            }
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Merge `other` into this row, last write wins.
    pub fn merge(&mut self, other: FlatRow) {
        for (key, value) in other.values {
            self.values.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn join_elements(elements: &[Value]) -> String {
    elements
        .iter()
        .map(element_text)
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// Text form of one list element: strings verbatim, null empty, everything
/// else as compact JSON.
pub(crate) fn element_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn nested_objects_use_dotted_keys() {
        let row = FlatRow::flatten(&object(json!({"a": {"b": 1, "c": {"d": "x"}}, "e": true})));
        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(keys, vec!["a.b", "a.c.d", "e"]);
        assert_eq!(row.get("a.c.d"), Some(&json!("x")));
        assert_eq!(row.get("e"), Some(&json!(true)));
    }

    #[test]
    fn arrays_are_joined() {
        let row = FlatRow::flatten(&object(json!({"l": ["a", 2, 1.5, null, false, {"k": 1}]})));
        assert_eq!(row.get("l"), Some(&json!(r#"a, 2, 1.5, , false, {"k":1}"#)));
    }

    #[test]
    fn merge_keeps_first_position() {
        let mut row = FlatRow::flatten(&object(json!({"x": 1, "y": 2})));
        row.merge(FlatRow::flatten(&object(json!({"z": 3, "x": 9}))));
        let pairs: Vec<(&str, &Value)> = row.iter().collect();
        assert_eq!(
            pairs,
            vec![("x", &json!(9)), ("y", &json!(2)), ("z", &json!(3))]
        );
    }
}
