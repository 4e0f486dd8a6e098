//! HTTP client with retry and backoff
//!
//! Provides the request/response lifecycle used by every stream:
//! - Request assembly against a fixed base URL
//! - Automatic retries with a user-defined or exponential backoff
//! - Attempt and wall-clock budgets per logical request
//! - Error-message extraction for terminal HTTP errors

use super::request::{PreparedRequest, RequestBuilder, RequestSpec};
use super::response::ResponseEnvelope;
use super::retry::{ResponseClassifier, RetryDecision, RetryPolicy};
use super::transport::{ReqwestTransport, Transport};
use crate::error::{Error, Result};
use crate::types::StringMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// Base URL of the Datadis private API
pub const DEFAULT_BASE_URL: &str = "https://datadis.es/api-private/api/";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL every resource path is joined onto
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Retry budget and backoff
    pub retry: RetryPolicy,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            user_agent: format!("datadis-cdk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    /// Set the wall-clock budget across attempts
    pub fn max_time(mut self, max_time: Duration) -> Self {
        self.config.retry.max_time = max_time;
        self
    }

    /// Set the exponential backoff factor
    pub fn backoff_factor(mut self, factor: Duration) -> Self {
        self.config.retry.backoff_factor = factor;
        self
    }

    /// Replace the whole retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client with retry and backoff
#[derive(Clone)]
pub struct HttpClient {
    builder: RequestBuilder,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl HttpClient {
    /// Create a client backed by a fresh `reqwest` session
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout, &config.user_agent)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport
    pub fn with_transport(config: HttpClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self {
            builder: RequestBuilder::new(&config.base_url)?,
            transport,
            policy: config.retry,
        })
    }

    pub fn request_builder(&self) -> &RequestBuilder {
        &self.builder
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Assemble a prepared request. Auth headers win on collision.
    pub fn prepare(
        &self,
        spec: &RequestSpec,
        headers: &StringMap,
        auth_header: &StringMap,
    ) -> Result<PreparedRequest> {
        self.builder.build(spec, headers, auth_header)
    }

    /// Send a request, retrying per the classifier and the retry policy.
    ///
    /// Only a terminal success or a terminal failure is surfaced.
    pub async fn send<C>(&self, request: &PreparedRequest, classifier: &C) -> Result<ResponseEnvelope>
    where
        C: ResponseClassifier + ?Sized,
    {
        let started = Instant::now();
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;

            debug!(
                method = %request.method,
                url = %request.url,
                headers = ?request.redacted_headers(),
                body = %request.body.describe(),
                "Making outbound API request"
            );

            let (decision, failure) = match self.transport.send(request).await {
                Ok(response) => {
                    let decision = classifier.retry_decision(&response);
                    if !decision.is_retry() {
                        return check_status(response, classifier.raise_on_http_errors());
                    }
                    let message = response.error_message();
                    let failure = Error::http_status(response.status(), message, response.text());
                    (decision, failure)
                }
                Err(e) if e.is_retryable() => (RetryDecision::RetryDefault, e),
                Err(e) => return Err(e),
            };

            let delay = self.policy.delay_for(decision, attempt);
            let Some(wait) = self.policy.next_wait(attempt, started.elapsed(), delay) else {
                return Err(Error::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(failure),
                });
            };

            warn!(
                "Retrying {} {} after {failure}, attempt {attempt}/{max_attempts}, waiting {wait:?}",
                request.method, request.url
            );
            tokio::time::sleep(wait).await;
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.builder.base_url().as_str())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Turn a non-retried response into the terminal result
fn check_status(response: ResponseEnvelope, raise_on_http_errors: bool) -> Result<ResponseEnvelope> {
    if !raise_on_http_errors || response.is_success() {
        return Ok(response);
    }
    error!("{}", response.text());
    let message = response.error_message();
    Err(Error::http_status(response.status(), message, response.body))
}
