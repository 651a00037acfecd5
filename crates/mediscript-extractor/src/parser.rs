//! Parse model output into an extracted record

use crate::error::ExtractorError;
use mediscript_domain::ExtractedMedicalData;
use serde_json::Value;
use tracing::debug;

/// Keys a model sometimes wraps the record in
const WRAPPER_KEYS: &[&str] = &["data", "result", "extraction", "extractedData"];

/// Parse the model's response text into an extracted record
pub fn parse_extraction(response: &str) -> Result<ExtractedMedicalData, ExtractorError> {
    let json_str = extract_json(response)?;

    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractorError::InvalidFormat(format!("JSON parse error: {}", e)))?;

    let record = select_record(json, true)?;
    Ok(serde_json::from_value(record)?)
}

/// Locate the JSON payload inside a response
///
/// Tried in order: the whole trimmed text, the body of a markdown code fence
/// (an unclosed fence runs to the end of the text), then the first balanced
/// object in the text, then the first balanced array.
pub fn extract_json(response: &str) -> Result<&str, ExtractorError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(ExtractorError::NoData);
    }

    if is_json(trimmed) {
        return Ok(trimmed);
    }

    if let Some(body) = fenced_body(trimmed) {
        debug!("Found fenced code block in response");
        if is_json(body) {
            return Ok(body);
        }
        if let Some(found) = find_balanced(body) {
            return Ok(found);
        }
    }

    find_balanced(trimmed).ok_or_else(|| {
        ExtractorError::InvalidFormat("No JSON object found in model response".to_string())
    })
}

fn is_json(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

/// Body of the first ``` fence, without the language tag
fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];

    // Skip the info string ("json", "JSON", ...) up to the end of the line
    let body_start = match after.find('\n') {
        Some(newline) if after[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            newline + 1
        }
        _ => 0,
    };
    let body = &after[body_start..];

    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    Some(body.trim())
}

fn find_balanced(text: &str) -> Option<&str> {
    find_balanced_from(text, b'{').or_else(|| find_balanced_from(text, b'['))
}

/// First substring starting at `open` whose brackets balance and which parses
fn find_balanced_from(text: &str, open: u8) -> Option<&str> {
    let bytes = text.as_bytes();
    for (start, &b) in bytes.iter().enumerate() {
        if b != open {
            continue;
        }
        if let Some(len) = balanced_len(&bytes[start..]) {
            let candidate = &text[start..start + len];
            if is_json(candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Length of the bracketed span at the start of `bytes`, string-aware
fn balanced_len(bytes: &[u8]) -> Option<usize> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.pop() != Some(b) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Pick the record object out of the parsed payload
fn select_record(json: Value, allow_nested_string: bool) -> Result<Value, ExtractorError> {
    match json {
        Value::Object(mut map) => {
            if map.len() == 1 {
                let key = map.keys().next().cloned().unwrap_or_default();
                if WRAPPER_KEYS.contains(&key.as_str()) && map[&key].is_object() {
                    debug!(wrapper = %key, "Unwrapping record");
                    return Ok(map.remove(&key).unwrap_or_default());
                }
            }
            Ok(Value::Object(map))
        }
        Value::Array(items) => items
            .into_iter()
            .find(Value::is_object)
            .ok_or_else(|| ExtractorError::InvalidFormat("Expected JSON object".to_string())),
        // Double-encoded payload: a JSON string holding the JSON object
        Value::String(inner) if allow_nested_string => {
            let nested: Value = serde_json::from_str(extract_json(&inner)?)
                .map_err(|e| ExtractorError::InvalidFormat(format!("JSON parse error: {}", e)))?;
            select_record(nested, false)
        }
        _ => Err(ExtractorError::InvalidFormat("Expected JSON object".to_string())),
    }
}
