//! Common types used throughout Datadis CDK
//!
//! This module contains shared type definitions, type aliases,
//! and the small data carriers threaded through a fetch cycle.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

/// A single record yielded to the caller
pub type Record = JsonObject;

/// Bookkeeping threaded through one fetch cycle. The engine never inspects it.
pub type StreamState = JsonObject;

/// Opaque continuation marker extracted from a response
pub type PageToken = JsonObject;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl Method {
    /// Methods for which request bodies are assembled and checked for conflicts
    pub fn is_body_bearing(self) -> bool {
        matches!(self, Method::GET | Method::POST | Method::PUT | Method::PATCH)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::PATCH => reqwest::Method::PATCH,
            Method::DELETE => reqwest::Method::DELETE,
        }
    }
}

// ============================================================================
// Stream Slice
// ============================================================================

/// Scoping context for one fetch cycle of a dependent stream.
///
/// Carries exactly one parent record under the well-known `parent` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSlice {
    pub parent: Record,
}

impl StreamSlice {
    /// Create a slice around a parent record
    pub fn from_parent(parent: Record) -> Self {
        Self { parent }
    }

    /// Get a field of the parent record
    pub fn parent_field(&self, key: &str) -> Option<&JsonValue> {
        self.parent.get(key)
    }
}

/// Borrowed view of everything a resource definition may look at when
/// building a request or parsing a response.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub state: &'a StreamState,
    pub slice: Option<&'a StreamSlice>,
    pub next_page_token: Option<&'a PageToken>,
}

impl<'a> RequestContext<'a> {
    pub fn new(
        state: &'a StreamState,
        slice: Option<&'a StreamSlice>,
        next_page_token: Option<&'a PageToken>,
    ) -> Self {
        Self {
            state,
            slice,
            next_page_token,
        }
    }
}

/// Render a scalar JSON value as a query parameter value
pub fn json_to_param(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_body_bearing() {
        assert!(Method::GET.is_body_bearing());
        assert!(Method::POST.is_body_bearing());
        assert!(Method::PUT.is_body_bearing());
        assert!(Method::PATCH.is_body_bearing());
        assert!(!Method::DELETE.is_body_bearing());
    }

    #[test]
    fn test_method_serde() {
        let method: Method = serde_json::from_str("\"PATCH\"").unwrap();
        assert_eq!(method, Method::PATCH);
        assert_eq!(Method::default().to_string(), "GET");
    }

    #[test]
    fn test_slice_parent_field() {
        let parent = json!({"cups": "X1", "pointType": 1});
        let slice = StreamSlice::from_parent(parent.as_object().unwrap().clone());
        assert_eq!(slice.parent_field("cups"), Some(&json!("X1")));
        assert!(slice.parent_field("missing").is_none());

        let serialized = serde_json::to_value(&slice).unwrap();
        assert_eq!(serialized["parent"]["pointType"], 1);
    }

    #[test]
    fn test_json_to_param() {
        assert_eq!(json_to_param(&json!("D1")), Some("D1".to_string()));
        assert_eq!(json_to_param(&json!(2)), Some("2".to_string()));
        assert_eq!(json_to_param(&json!(true)), Some("true".to_string()));
        assert_eq!(json_to_param(&json!(null)), None);
        assert_eq!(json_to_param(&json!({"a": 1})), None);
    }
}
