//! HTTP module
//!
//! Provides the request/response lifecycle shared by every stream.
//!
//! # Features
//!
//! - **Request Builder**: URL join, query parameters, header merge, body checks
//! - **Transport**: pluggable single round trip, `reqwest` by default
//! - **Retry/Backoff**: user-defined or exponential waits, bounded by attempt and time budgets
//! - **Error Messages**: best-effort extraction from JSON error bodies

mod client;
mod request;
mod response;
mod retry;
mod transport;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, DEFAULT_BASE_URL};
pub use request::{merge_headers, FormBody, PreparedRequest, RequestBody, RequestBuilder, RequestSpec};
pub use response::{extract_error_message, ResponseEnvelope};
pub use retry::{DefaultClassifier, ResponseClassifier, RetryDecision, RetryPolicy};
pub use transport::{ReqwestTransport, Transport};

#[cfg(test)]
pub(crate) mod testing;
