use serde_json::Value;

/// Best-effort extraction: first '{' to last '}'.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parses a model reply as JSON: the whole body first, then the brace-delimited
/// span. `None` means neither attempt produced a JSON value.
pub fn parse_model_json(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    let candidate = extract_json(text)?;
    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(error = %err, "brace-delimited span is not valid JSON");
            None
        }
    }
}
