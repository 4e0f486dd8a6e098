//! Transport boundary
//!
//! A [`Transport`] performs exactly one network round trip per call. Retry
//! policy lives above it in [`HttpClient`](super::HttpClient).

use super::request::{PreparedRequest, RequestBody};
use super::response::ResponseEnvelope;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Sends a prepared request and reads the full response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> Result<ResponseEnvelope>;
}

/// Transport over a `reqwest` client session
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the given timeout and user agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<ResponseEnvelope> {
        let mut req = self
            .client
            .request(request.method.into(), request.url.clone());

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        req = match &request.body {
            RequestBody::Empty => req,
            RequestBody::Json(value) => req.json(value),
            RequestBody::Form(encoded) => req
                .header(
                    reqwest::header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(encoded.clone()),
            RequestBody::Raw(raw) => req.body(raw.clone()),
        };

        let response = req.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(Error::Http)?;

        Ok(ResponseEnvelope::new(status, headers, body))
    }
}
