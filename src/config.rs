//! Connector configuration
//!
//! This module contains the configuration structures loaded from YAML, plus
//! the conversions into the HTTP, retry and auth settings used at runtime.
//!
//! Every field is optional in the file. Credentials may come from the
//! `DATADIS_USERNAME` and `DATADIS_PASSWORD` environment variables instead.

use crate::auth::{AuthConfig, Credentials, TokenCachePolicy, DEFAULT_LOGIN_URL};
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RetryPolicy, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment variable holding the login username
pub const USERNAME_ENV: &str = "DATADIS_USERNAME";

/// Environment variable holding the login password
pub const PASSWORD_ENV: &str = "DATADIS_PASSWORD";

// ============================================================================
// Top-Level Connector Config
// ============================================================================

/// Complete connector configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Base URL for API requests
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// NIF of the holder who authorized access, if any
    #[serde(default)]
    pub authorized_nif: Option<String>,

    /// Login configuration
    #[serde(default)]
    pub auth: AuthSettings,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Consumption query window
    #[serde(default)]
    pub consumption: ConsumptionConfig,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            authorized_nif: None,
            auth: AuthSettings::default(),
            http: HttpConfig::default(),
            consumption: ConsumptionConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

// ============================================================================
// Auth Config
// ============================================================================

/// Login endpoint and credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Login endpoint URL
    #[serde(default = "default_login_url")]
    pub login_url: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Token reuse window in seconds (0 = log in for every request)
    #[serde(default)]
    pub token_ttl_seconds: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            username: None,
            password: None,
            token_ttl_seconds: 0,
        }
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("login_url", &self.login_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

fn default_login_url() -> String {
    DEFAULT_LOGIN_URL.to_string()
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Wall-clock budget for one logical request, retries included
    #[serde(default = "default_max_time")]
    pub max_time_seconds: u64,

    /// Base of the exponential backoff (`factor * 2^(attempt-1)`)
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor_seconds: f64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            max_time_seconds: default_max_time(),
            backoff_factor_seconds: default_backoff_factor(),
        }
    }
}

fn default_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    5
}

fn default_max_time() -> u64 {
    600
}

fn default_backoff_factor() -> f64 {
    5.0
}

// ============================================================================
// Consumption Config
// ============================================================================

/// Date window for consumption queries (`YYYY/MM`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsumptionConfig {
    #[serde(default)]
    pub start_date: Option<String>,

    /// Defaults to `start_date`
    #[serde(default)]
    pub end_date: Option<String>,

    /// 0 = hourly, 1 = quarter-hourly
    #[serde(default)]
    pub measurement_type: u8,
}

// ============================================================================
// Loading and conversion
// ============================================================================

impl ConnectorConfig {
    /// Parse a config from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a config file and apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_yaml_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override credentials from `DATADIS_USERNAME` / `DATADIS_PASSWORD`
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Override credentials from an arbitrary variable lookup
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(username) = lookup(USERNAME_ENV).filter(|v| !v.is_empty()) {
            self.auth.username = Some(username);
        }
        if let Some(password) = lookup(PASSWORD_ENV).filter(|v| !v.is_empty()) {
            self.auth.password = Some(password);
        }
    }

    /// Check that everything needed to authenticate and build URLs is present
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)?;
        Url::parse(&self.auth.login_url)?;
        self.credentials()?;
        self.backoff_factor()?;
        if !self.token_cache().is_representable() {
            return Err(Error::config(format!(
                "auth.token_ttl_seconds is out of range, got {}",
                self.auth.token_ttl_seconds
            )));
        }
        Ok(())
    }

    /// Backoff factor as a duration, rejecting negative, NaN and oversized values
    fn backoff_factor(&self) -> Result<Duration> {
        let seconds = self.http.backoff_factor_seconds;
        if seconds < 0.0 {
            return Err(Error::config(format!(
                "http.backoff_factor_seconds must be a non-negative number, got {seconds}"
            )));
        }
        Duration::try_from_secs_f64(seconds).map_err(|e| {
            Error::config(format!(
                "http.backoff_factor_seconds is out of range, got {seconds}: {e}"
            ))
        })
    }

    /// Login credentials, or the first missing field
    pub fn credentials(&self) -> Result<Credentials> {
        let username = self
            .auth
            .username
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::missing_field("auth.username"))?;
        let password = self
            .auth
            .password
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::missing_field("auth.password"))?;
        Ok(Credentials::new(username, password))
    }

    pub fn token_cache(&self) -> TokenCachePolicy {
        TokenCachePolicy::from_ttl_seconds(self.auth.token_ttl_seconds)
    }

    /// Login-based auth config
    pub fn auth_config(&self) -> Result<AuthConfig> {
        Ok(AuthConfig::Login {
            login_url: self.auth.login_url.clone(),
            credentials: self.credentials()?,
            cache: self.token_cache(),
        })
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        Ok(RetryPolicy::new(
            self.http.max_retries,
            Duration::from_secs(self.http.max_time_seconds),
            self.backoff_factor()?,
        ))
    }

    pub fn http_client_config(&self) -> Result<HttpClientConfig> {
        Ok(HttpClientConfig::builder()
            .base_url(self.base_url.clone())
            .timeout(Duration::from_secs(self.http.timeout_seconds))
            .retry(self.retry_policy()?)
            .build())
    }

    /// Start and end date of the consumption window
    pub fn consumption_window(&self) -> Result<(String, String)> {
        let start = self
            .consumption
            .start_date
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::missing_field("consumption.start_date"))?;
        let end = self
            .consumption
            .end_date
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| start.clone());
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = ConnectorConfig::from_yaml_str("").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.auth.login_url, DEFAULT_LOGIN_URL);
        assert_eq!(config.http.timeout_seconds, 60);
        assert_eq!(config.http.max_retries, 5);
        assert_eq!(config.http.max_time_seconds, 600);
        assert_eq!(config.consumption.measurement_type, 0);
        assert!(config.authorized_nif.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
base_url: "https://api.example.com/api/"
authorized_nif: "12345678Z"
auth:
  login_url: "https://api.example.com/login"
  username: "user"
  password: "secret"
  token_ttl_seconds: 300
http:
  timeout_seconds: 10
  max_retries: 2
  max_time_seconds: 30
  backoff_factor_seconds: 0.5
consumption:
  start_date: "2023/10"
  end_date: "2023/12"
  measurement_type: 1
"#;

        let config = ConnectorConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.authorized_nif.as_deref(), Some("12345678Z"));
        assert_eq!(config.token_cache(), TokenCachePolicy::Ttl(Duration::from_secs(300)));
        assert_eq!(
            config.retry_policy().unwrap(),
            RetryPolicy::new(2, Duration::from_secs(30), Duration::from_millis(500))
        );
        assert_eq!(
            config.consumption_window().unwrap(),
            ("2023/10".to_string(), "2023/12".to_string())
        );

        let http = config.http_client_config().unwrap();
        assert_eq!(http.base_url, "https://api.example.com/api/");
        assert_eq!(http.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_end_date_defaults_to_start_date() {
        let config = ConnectorConfig::from_yaml_str("consumption:\n  start_date: 2023/10\n").unwrap();
        assert_eq!(
            config.consumption_window().unwrap(),
            ("2023/10".to_string(), "2023/10".to_string())
        );
    }

    #[test]
    fn test_missing_start_date() {
        let err = ConnectorConfig::default().consumption_window().unwrap_err();
        assert!(
            matches!(err, Error::MissingConfigField { ref field } if field == "consumption.start_date")
        );
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut config = ConnectorConfig::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "auth.username"));

        config.auth.username = Some("user".to_string());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "auth.password"));

        config.auth.password = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let mut config = ConnectorConfig::default();
        config.auth.username = Some("user".to_string());
        config.auth.password = Some("secret".to_string());
        config.base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_oversized_backoff_factor_is_a_config_error() {
        let mut config = ConnectorConfig::from_yaml_str(
            "auth:\n  username: user\n  password: secret\nhttp:\n  backoff_factor_seconds: 1e300\n",
        )
        .unwrap();

        assert!(matches!(config.validate(), Err(Error::Config { .. })));
        assert!(matches!(config.retry_policy(), Err(Error::Config { .. })));
        assert!(matches!(config.http_client_config(), Err(Error::Config { .. })));

        config.http.backoff_factor_seconds = f64::NAN;
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        config.http.backoff_factor_seconds = -1.0;
        assert!(matches!(config.retry_policy(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_oversized_token_ttl_is_a_config_error() {
        let config = ConnectorConfig::from_yaml_str(
            "auth:\n  username: user\n  password: secret\n  token_ttl_seconds: 100000000000000000\n",
        )
        .unwrap();

        assert!(matches!(config.validate(), Err(Error::Config { .. })));
        let cached = config.token_cache().cache("t".to_string()).unwrap();
        assert!(!cached.is_expired());
    }

    #[test]
    fn test_year_long_token_ttl_is_valid() {
        let config = ConnectorConfig::from_yaml_str(
            "auth:\n  username: user\n  password: secret\n  token_ttl_seconds: 31536000\n",
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_credentials() {
        let vars = HashMap::from([
            (USERNAME_ENV, "env-user".to_string()),
            (PASSWORD_ENV, "env-pass".to_string()),
        ]);
        let mut config =
            ConnectorConfig::from_yaml_str("auth:\n  username: file-user\n  password: file-pass\n")
                .unwrap();
        config.apply_vars(|key| vars.get(key).cloned());

        assert_eq!(config.auth.username.as_deref(), Some("env-user"));
        assert_eq!(config.auth.password.as_deref(), Some("env-pass"));
    }

    #[test]
    fn test_empty_env_does_not_override() {
        let mut config =
            ConnectorConfig::from_yaml_str("auth:\n  username: file-user\n").unwrap();
        config.apply_vars(|_| Some(String::new()));
        assert_eq!(config.auth.username.as_deref(), Some("file-user"));
    }

    #[test]
    fn test_auth_config_from_settings() {
        let mut config = ConnectorConfig::default();
        config.auth.username = Some("user".to_string());
        config.auth.password = Some("secret".to_string());

        match config.auth_config().unwrap() {
            AuthConfig::Login {
                login_url,
                credentials,
                cache,
            } => {
                assert_eq!(login_url, DEFAULT_LOGIN_URL);
                assert_eq!(credentials.username, "user");
                assert_eq!(cache, TokenCachePolicy::Disabled);
            }
            other => panic!("Expected Login auth, got {other:?}"),
        }
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut config = ConnectorConfig::default();
        config.auth.password = Some("hunter2".to_string());
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "authorized_nif: \"47841486Z\"").unwrap();

        let config = ConnectorConfig::load(file.path()).unwrap();
        assert_eq!(config.authorized_nif.as_deref(), Some("47841486Z"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConnectorConfig::load("/nonexistent/datadis.yaml");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = ConnectorConfig::from_yaml_str("http: [1, 2");
        assert!(matches!(result, Err(Error::YamlParse(_))));
    }
}
