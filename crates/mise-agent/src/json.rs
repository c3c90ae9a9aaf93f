use serde_json::Value;

/// Find a JSON object in free-form completion text.
///
/// Tries the whole text, then a fenced ```json block, then the span from the
/// first `{` to the last `}`. Returns `None` unless the result is an object.
pub fn extract_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    parse_object(trimmed)
        .or_else(|| fenced_block(trimmed).and_then(parse_object))
        .or_else(|| {
            let start = trimmed.find('{')?;
            let end = trimmed.rfind('}')?;
            (end > start)
                .then(|| &trimmed[start..=end])
                .and_then(parse_object)
        })
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}
