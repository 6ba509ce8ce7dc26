use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::NovelistError;

/// Strips a surrounding fenced code block (```` ``` ```` or ```` ```json ````).
/// Returns the trimmed input unchanged when there is no opening fence.
pub fn strip_code_fence(input: &str) -> &str {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `JSON`, ...) on the opening fence line.
    let body = match rest.find('\n') {
        Some(newline) if rest[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &rest[newline + 1..]
        }
        _ => rest
            .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
            .trim_start(),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Candidate JSON payloads inside free-form LLM text, most likely first.
///
/// Fenced blocks are unwrapped first. A candidate is the span from the first
/// `{` (or `[`) to the last `}` (or `]`). The object span comes first unless
/// the array span encloses it, so a bracketed token in the surrounding prose
/// never shadows the payload.
pub fn json_spans(input: &str) -> Vec<&str> {
    let cleaned = strip_code_fence(input);
    let span = move |open: char, close: char| {
        let start = cleaned.find(open)?;
        let end = cleaned.rfind(close)?;
        (end > start).then_some((start, end))
    };
    let slice = move |(start, end): (usize, usize)| &cleaned[start..=end];

    match (span('{', '}'), span('[', ']')) {
        (Some(object), Some(array)) if array.0 < object.0 && object.1 < array.1 => {
            vec![slice(array), slice(object)]
        }
        (Some(object), Some(array)) => vec![slice(object), slice(array)],
        (object, array) => object.into_iter().chain(array).map(slice).collect(),
    }
}

/// Extracts and parses the JSON payload embedded in `input`.
pub fn extract_json(input: &str) -> Result<Value, NovelistError> {
    let cleaned = strip_code_fence(input);
    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        if value.is_object() || value.is_array() {
            return Ok(value);
        }
    }
    first_parsed(input)
}

/// Typed variant of [`extract_json`]. Every candidate is tried and the first
/// one that deserializes as `T` wins.
pub fn extract_json_as<T: DeserializeOwned>(input: &str) -> Result<T, NovelistError> {
    if let Ok(value) = serde_json::from_str::<T>(strip_code_fence(input)) {
        return Ok(value);
    }
    first_parsed(input)
}

fn first_parsed<T: DeserializeOwned>(input: &str) -> Result<T, NovelistError> {
    let mut last_error = "no JSON object or array found".to_string();
    for span in json_spans(input) {
        match serde_json::from_str::<T>(span) {
            Ok(value) => return Ok(value),
            Err(err) => last_error = err.to_string(),
        }
    }
    Err(NovelistError::ParseFailed {
        output: truncate(input),
        reason: last_error,
    })
}

/// Never fails: on any extraction error logs a warning naming `context` and
/// returns `default`.
pub fn parse_json_or<T: DeserializeOwned>(input: &str, context: &str, default: T) -> T {
    match extract_json_as(input) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(context, error = %err, "malformed structured LLM response, using defaults");
            default
        }
    }
}

fn truncate(input: &str) -> String {
    const LIMIT: usize = 200;
    match input.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &input[..idx]),
        None => input.to_string(),
    }
}
