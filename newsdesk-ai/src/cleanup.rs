//! Post-processing of model output
//!
//! Models wrap JSON in markdown fences, surround it with prose, or emit
//! trailing commas and raw newlines inside strings. These helpers recover a
//! parseable document where possible.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::error::AiError;

static FENCE_JSON: Lazy<Regex> = Lazy::new(|| Regex::new(r"```json\n?").expect("valid regex"));
static FENCE_ANY: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\w*\n?").expect("valid regex"));
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));

/// Remove markdown code fences and stray backticks, then trim
pub fn strip_code_fences(text: &str) -> String {
    let text = FENCE_JSON.replace_all(text, "");
    let text = FENCE_ANY.replace_all(&text, "");
    text.replace('`', "").trim().to_string()
}

/// Slice from the first `{` to the last `}`
///
/// Returns the input unchanged when no ordered pair of braces exists.
pub fn extract_json_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

/// Fix common JSON defects: trailing commas and raw control whitespace
pub fn repair_json(text: &str) -> String {
    TRAILING_COMMA
        .replace_all(text, "$1")
        .replace('\n', " ")
        .replace('\r', "")
        .replace('\t', " ")
}

/// Turn a fact-check reply into compact, valid JSON
///
/// Every element of a `sources` array is coerced to a string.
pub fn clean_fact_check(raw: &str) -> Result<String, AiError> {
    let stripped = strip_code_fences(raw);
    let candidate = extract_json_object(&stripped);

    let mut parsed: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(first_error) => {
            warn!(error = %first_error, "Fact-check JSON parse failed, attempting repair");
            serde_json::from_str(&repair_json(candidate))
                .map_err(|e| AiError::InvalidJson(e.to_string()))?
        }
    };

    if let Some(Value::Array(sources)) = parsed.get_mut("sources") {
        for source in sources.iter_mut() {
            if !source.is_string() {
                *source = Value::String(source_to_string(source));
            }
        }
    }

    Ok(parsed.to_string())
}

/// Render a non-string source entry as text
fn source_to_string(value: &Value) -> String {
    match value {
        Value::Object(map) => ["url", "title", "name"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Compact JSON when the text from its first `{` onward parses, else the text itself
pub fn leading_json_or_text(text: &str) -> String {
    text.find('{')
        .and_then(|start| serde_json::from_str::<Value>(&text[start..]).ok())
        .map(|value| value.to_string())
        .unwrap_or_else(|| text.to_string())
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
