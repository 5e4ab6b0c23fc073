//! Example-syntax normalization
//!
//! OpenAPI allows a singular `example` value or an `examples` object keyed
//! by name. Validators expect an `examples` array, so both forms are
//! rewritten into one.

use serde_json::{Map, Value};

/// Rewrite a schema tree in place.
///
/// Descends through `properties`, and through `items` of arrays whose
/// items are themselves objects or arrays. A scalar-item array is
/// rewritten at the array node only.
pub fn normalize_examples(node: &mut Value) {
    let Some(object) = node.as_object_mut() else {
        return;
    };

    rewrite_examples(object);

    if let Some(Value::Object(properties)) = object.get_mut("properties") {
        for property in properties.values_mut() {
            normalize_examples(property);
        }
    }

    if schema_type(object) == Some("array") {
        if let Some(items) = object.get_mut("items") {
            if items
                .as_object()
                .and_then(schema_type)
                .is_some_and(|kind| kind == "object" || kind == "array")
            {
                normalize_examples(items);
            }
        }
    }
}

fn schema_type(object: &Map<String, Value>) -> Option<&str> {
    object.get("type").and_then(Value::as_str)
}

fn rewrite_examples(object: &mut Map<String, Value>) {
    let has_example = object.contains_key("example");
    let keyed_examples = matches!(object.get("examples"), Some(Value::Object(_)));
    if !has_example && !keyed_examples {
        return;
    }

    // Rebuild so the rewritten key keeps the position of the original one.
    for (key, value) in std::mem::take(object) {
        match key.as_str() {
            "example" => {
                object.insert("examples".to_string(), Value::Array(vec![value]));
            }
            // a singular `example` takes precedence
            "examples" if has_example => {}
            "examples" => {
                let values = match value {
                    Value::Object(map) => Value::Array(map.into_iter().map(|(_, v)| v).collect()),
                    other => other,
                };
                object.insert(key, values);
            }
            _ => {
                object.insert(key, value);
            }
        }
    }
}
