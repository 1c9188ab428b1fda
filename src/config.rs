//! Provider configuration.
//!
//! The provider needs two settings: an API token and the API base URL.
//! Both can come from the provider configuration block or from the
//! environment (`SFX_AUTH_TOKEN`, `SFX_API_URL`). The URL defaults to the
//! public SignalFx endpoint.

use serde_json::Value;

use crate::error::ProviderError;

/// Default SignalFx API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.signalfx.com";

/// Environment variable holding the API token.
pub const AUTH_TOKEN_ENV: &str = "SFX_AUTH_TOKEN";

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "SFX_API_URL";

/// Resolved provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// SignalFx org or session token, sent as `X-SF-TOKEN`.
    pub auth_token: String,
    /// Base URL of the SignalFx API.
    pub api_url: String,
}

impl ProviderConfig {
    /// Build a configuration from explicit values.
    pub fn new(auth_token: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            api_url: api_url.into(),
        }
    }

    /// Resolve a configuration from a provider config value.
    ///
    /// Attributes win over environment variables; the URL falls back to
    /// [`DEFAULT_API_URL`].
    pub fn from_value(config: &Value) -> Self {
        let auth_token = string_attr(config, "auth_token")
            .or_else(|| std::env::var(AUTH_TOKEN_ENV).ok())
            .unwrap_or_default();
        let api_url = string_attr(config, "api_url")
            .or_else(|| std::env::var(API_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self {
            auth_token,
            api_url,
        }
    }

    /// Check the configuration is usable before building a client.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.auth_token.is_empty() {
            return Err(ProviderError::Configuration(format!(
                "auth_token is required (set the attribute or {AUTH_TOKEN_ENV})"
            )));
        }
        if reqwest::Url::parse(&self.api_url).is_err() {
            return Err(ProviderError::Configuration(format!(
                "api_url is not a valid URL: {}",
                self.api_url
            )));
        }
        Ok(())
    }
}

fn string_attr(config: &Value, key: &str) -> Option<String> {
    config
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
