use serde_json::Value;

/// Render a claim value as text. Strings pass through unchanged, numbers and
/// booleans use their JSON spelling, arrays are comma-joined element by element
/// and objects render as `[object Object]`.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
