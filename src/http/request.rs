//! Request construction
//!
//! Turns a resource's per-call parameters plus the auth header into a fully
//! specified [`PreparedRequest`]. No network I/O happens here.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Method, StringMap};
use url::Url;

/// Non-JSON request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormBody {
    /// Sent as-is
    Raw(String),
    /// Sent as `application/x-www-form-urlencoded`
    Fields(StringMap),
}

impl FormBody {
    pub fn is_empty(&self) -> bool {
        match self {
            FormBody::Raw(s) => s.is_empty(),
            FormBody::Fields(fields) => fields.is_empty(),
        }
    }
}

/// Body actually transmitted with a prepared request
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(JsonValue),
    Form(String),
    Raw(String),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Body rendered for diagnostics
    pub fn describe(&self) -> String {
        match self {
            RequestBody::Empty => String::new(),
            RequestBody::Json(value) => value.to_string(),
            RequestBody::Form(s) | RequestBody::Raw(s) => s.clone(),
        }
    }
}

/// Per-call request parameters supplied by a resource definition
#[derive(Debug, Clone, Default)]
pub struct RequestSpec {
    pub method: Method,
    /// Path relative to the base URL
    pub path: String,
    pub query: StringMap,
    pub json: Option<JsonValue>,
    pub form: Option<FormBody>,
}

impl RequestSpec {
    /// Create a request for the given method and path
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Default::default()
        }
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.json = Some(body);
        self
    }

    /// Set form body
    #[must_use]
    pub fn form(mut self, body: FormBody) -> Self {
        self.form = Some(body);
        self
    }

    /// Resolve the body to transmit.
    ///
    /// Fails with [`Error::ConflictingBody`] when a body-bearing method carries
    /// both a non-empty JSON body and a non-empty form body. Other methods
    /// drop their bodies.
    pub fn body(&self) -> Result<RequestBody> {
        if !self.method.is_body_bearing() {
            return Ok(RequestBody::Empty);
        }

        let json = self.json.as_ref().filter(|v| !is_empty_json(v));
        let form = self.form.as_ref().filter(|f| !f.is_empty());

        match (json, form) {
            (Some(_), Some(_)) => Err(Error::ConflictingBody),
            (Some(json), None) => Ok(RequestBody::Json(json.clone())),
            (None, Some(FormBody::Fields(fields))) => Ok(RequestBody::Form(encode_form(fields))),
            (None, Some(FormBody::Raw(raw))) => Ok(RequestBody::Raw(raw.clone())),
            (None, None) => Ok(RequestBody::Empty),
        }
    }
}

fn is_empty_json(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Object(map) => map.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}

fn encode_form(fields: &StringMap) -> String {
    let mut pairs: Vec<_> = fields.iter().collect();
    pairs.sort();
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// A request ready to hand to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    /// Absolute URL including query string
    pub url: Url,
    pub headers: StringMap,
    pub body: RequestBody,
}

impl PreparedRequest {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Header map with credentials masked, for logging
    pub fn redacted_headers(&self) -> Vec<(String, String)> {
        let mut headers: Vec<_> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case("authorization") {
                    (k.clone(), "***".to_string())
                } else {
                    (k.clone(), v.clone())
                }
            })
            .collect();
        headers.sort();
        headers
    }
}

/// Assembles prepared requests against a fixed base URL
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: Url,
}

impl RequestBuilder {
    /// Create a builder for the given base URL
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a resource path with standard URL-join semantics: a leading `/`
    /// replaces the base path, anything else is relative to it.
    pub fn join(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Build a prepared request. Auth headers override resource headers.
    pub fn build(
        &self,
        spec: &RequestSpec,
        headers: &StringMap,
        auth_header: &StringMap,
    ) -> Result<PreparedRequest> {
        let body = spec.body()?;

        let mut url = self.join(&spec.path)?;
        if !spec.query.is_empty() {
            let mut pairs: Vec<_> = spec.query.iter().collect();
            pairs.sort();
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(PreparedRequest {
            method: spec.method,
            url,
            headers: merge_headers(headers, auth_header),
            body,
        })
    }
}

/// Merge `overrides` on top of `base`, matching header names case-insensitively
pub fn merge_headers(base: &StringMap, overrides: &StringMap) -> StringMap {
    let mut merged: StringMap = base
        .iter()
        .filter(|(k, _)| !overrides.keys().any(|o| o.eq_ignore_ascii_case(k)))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
