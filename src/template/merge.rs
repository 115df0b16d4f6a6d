use serde_json::Value as JsonValue;
use serde_yaml::{Mapping, Value};

/// Deep-merge `source` into `destination`.
///
/// Nested mappings merge recursively. Any other value in `source` replaces the
/// destination entry wholesale, including a change of type. Existing keys keep
/// their position so output order follows first appearance.
pub fn deep_merge(source: Mapping, destination: &mut Mapping) {
    for (key, value) in source {
        match value {
            Value::Mapping(src) => {
                if let Some(Value::Mapping(dest)) = destination.get_mut(&key) {
                    deep_merge(src, dest);
                } else {
                    destination.insert(key, Value::Mapping(src));
                }
            }
            other => {
                destination.insert(key, other);
            }
        }
    }
}

/// JSON view of a merged config, used as the template data context.
/// Non-string keys are stringified.
pub fn to_template_context(config: &Mapping) -> JsonValue {
    JsonValue::Object(
        config
            .iter()
            .map(|(key, value)| (key_to_string(key), to_json(value)))
            .collect(),
    )
}

fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null)
            }
        }
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Sequence(items) => JsonValue::Array(items.iter().map(to_json).collect()),
        Value::Mapping(map) => to_template_context(map),
        Value::Tagged(tagged) => to_json(&tagged.value),
    }
}
