//! Authenticator implementation
//!
//! Produces the auth header for every outbound request and manages the
//! optional token cache.

use super::types::{AuthConfig, CachedToken, Credentials, TokenCachePolicy};
use crate::error::{Error, Result};
use crate::types::StringMap;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Timeout for the credential exchange request
const LOGIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Capability to produce a valid auth header on demand.
///
/// Implementations may perform a network round trip on every call.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Headers to merge on top of the resource-declared headers
    async fn auth_header(&self) -> Result<StringMap>;
}

/// Authenticator backed by an [`AuthConfig`]
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
    /// Cached token for login auth
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// HTTP client for token requests
    http_client: Client,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(config: AuthConfig, http_client: Client) -> Self {
        Self {
            config,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Get a bearer token, honouring the cache policy
    pub async fn token(&self) -> Result<String> {
        match &self.config {
            AuthConfig::None => Err(Error::auth("No credentials configured")),
            AuthConfig::Bearer { token } => Ok(token.clone()),
            AuthConfig::Login {
                login_url,
                credentials,
                cache,
            } => self.get_or_refresh_token(login_url, credentials, *cache).await,
        }
    }

    async fn get_or_refresh_token(
        &self,
        login_url: &str,
        credentials: &Credentials,
        policy: TokenCachePolicy,
    ) -> Result<String> {
        if policy == TokenCachePolicy::Disabled {
            return self.fetch_login_token(login_url, credentials).await;
        }

        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Another caller may have refreshed while we waited for the write lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let token = self.fetch_login_token(login_url, credentials).await?;
        *cached = policy.cache(token.clone());
        Ok(token)
    }

    /// Exchange credentials for a token. The response body is the token.
    async fn fetch_login_token(&self, login_url: &str, credentials: &Credentials) -> Result<String> {
        debug!(url = login_url, username = %credentials.username, "Requesting auth token");

        let response = self
            .http_client
            .post(login_url)
            .query(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .timeout(LOGIN_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::auth(format!("Login request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::auth(format!("Error: {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::auth(format!("Failed to read token: {e}")))?;
        let token = body.trim();
        if token.is_empty() {
            return Err(Error::auth("Login endpoint returned an empty token"));
        }
        Ok(token.to_string())
    }

    /// Clear the cached token, forcing a login on the next request
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    /// Get the current auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

#[async_trait]
impl AuthProvider for Authenticator {
    async fn auth_header(&self) -> Result<StringMap> {
        if matches!(self.config, AuthConfig::None) {
            return Ok(StringMap::new());
        }
        let token = self.token().await?;
        Ok(StringMap::from([(
            "Authorization".to_string(),
            format!("Bearer {token}"),
        )]))
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
