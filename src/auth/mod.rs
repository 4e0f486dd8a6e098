//! Authentication module
//!
//! Supports: no auth, a fixed bearer token, and credential exchange against
//! a login endpoint that returns a bearer token as plain text.
//!
//! The `Authenticator` produces the header map on demand and, depending on
//! its `TokenCachePolicy`, either logs in for every request or reuses tokens.

mod authenticator;
mod types;

pub use authenticator::{AuthProvider, Authenticator};
pub use types::{AuthConfig, CachedToken, Credentials, TokenCachePolicy, DEFAULT_LOGIN_URL};

#[cfg(test)]
mod tests;
