//! Auth configuration types
//!
//! These types represent the runtime auth configuration after the
//! connector configuration and environment have been resolved.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Login URL of the Datadis credential exchange endpoint
pub const DEFAULT_LOGIN_URL: &str = "https://datadis.es/nikola-auth/tokens/login";

/// Username/password pair used for the credential exchange
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// How long a token obtained from the login endpoint may be reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenCachePolicy {
    /// Log in again for every request
    #[default]
    Disabled,
    /// Reuse a token for the given duration
    Ttl(Duration),
    /// Reuse a token until the cache is cleared
    Forever,
}

impl TokenCachePolicy {
    /// Build a policy from a TTL in seconds (0 disables caching)
    pub fn from_ttl_seconds(seconds: u64) -> Self {
        if seconds == 0 {
            Self::Disabled
        } else {
            Self::Ttl(Duration::from_secs(seconds))
        }
    }

    /// Wrap a freshly fetched token according to this policy
    pub fn cache(&self, token: String) -> Option<CachedToken> {
        match self {
            Self::Disabled => None,
            Self::Forever => Some(CachedToken::new(token, None)),
            Self::Ttl(ttl) => Some(CachedToken::new(token, expiry_after(*ttl))),
        }
    }

    /// Whether a TTL converts to a concrete expiry instant
    pub fn is_representable(&self) -> bool {
        match self {
            Self::Ttl(ttl) => expiry_after(*ttl).is_some(),
            Self::Disabled | Self::Forever => true,
        }
    }
}

/// `now + ttl`, or `None` when the instant is out of range
fn expiry_after(ttl: Duration) -> Option<DateTime<Utc>> {
    let ttl = chrono::Duration::from_std(ttl).ok()?;
    Utc::now().checked_add_signed(ttl)
}

/// Authentication configuration
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Fixed bearer token
    Bearer {
        /// The bearer token
        token: String,
    },

    /// Exchange credentials for a bearer token at a login endpoint
    Login {
        /// Login endpoint URL
        login_url: String,
        /// Username and password sent as query parameters
        credentials: Credentials,
        /// Token reuse policy
        cache: TokenCachePolicy,
    },
}

impl AuthConfig {
    /// Login against the Datadis endpoint
    pub fn datadis(credentials: Credentials, cache: TokenCachePolicy) -> Self {
        Self::Login {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            credentials,
            cache,
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now.
    ///
    /// Offsets past the representable range clamp to the earliest or latest instant.
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = chrono::Duration::try_seconds(seconds)
            .and_then(|offset| Utc::now().checked_add_signed(offset))
            .unwrap_or(if seconds < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            });
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false, // No expiration = never expires
        }
    }
}
