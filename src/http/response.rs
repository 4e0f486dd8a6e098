//! Response envelope and error-message extraction

use crate::error::{Error, Result};
use crate::types::JsonValue;
use reqwest::header::HeaderMap;

/// Keys searched for an error message, in priority order
const ERROR_KEYS: [&str; 7] = [
    "message", "messages", "error", "errors", "failures", "failure", "detail",
];

/// Nesting limit for the error-message search
const MAX_ERROR_DEPTH: usize = 32;

/// A received HTTP response with its body fully read
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl ResponseEnvelope {
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Response with no headers, mostly useful for scripted transports
    pub fn from_body(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, HeaderMap::new(), body)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// 2xx and 3xx count as success
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<JsonValue> {
        serde_json::from_str(&self.body)
            .map_err(|e| Error::malformed(format!("Failed to parse JSON: {e}")))
    }

    /// Best-effort human readable error message from the body
    pub fn error_message(&self) -> Option<String> {
        let body: JsonValue = serde_json::from_str(&self.body).ok()?;
        extract_error_message(&body)
    }
}

/// Search a JSON value for an error message.
///
/// Strings are returned as-is, arrays are searched element-wise and joined
/// with `", "`, objects are searched through the first truthy value among
/// [`ERROR_KEYS`].
pub fn extract_error_message(value: &JsonValue) -> Option<String> {
    search(value, 0)
}

fn search(value: &JsonValue, depth: usize) -> Option<String> {
    if depth > MAX_ERROR_DEPTH {
        return None;
    }
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(|v| search(v, depth + 1)).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        JsonValue::Object(map) => ERROR_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|v| is_truthy(v))
            .and_then(|v| search(v, depth + 1)),
        _ => None,
    }
}

fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(map) => !map.is_empty(),
    }
}
