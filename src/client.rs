//! HTTP client for the SignalFx REST API.
//!
//! A thin wrapper over [`reqwest`]: it builds resource URLs from the
//! configured base, attaches the `X-SF-TOKEN` auth header, and moves JSON
//! bodies in and out. Every provider operation is one request/response
//! cycle; there is no retry, caching, or connection coordination beyond
//! what the underlying client pools by default.

use serde_json::Value;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::ProviderError;

/// Header carrying the SignalFx auth token.
pub const AUTH_HEADER: &str = "X-SF-TOKEN";

/// Client for the SignalFx API.
#[derive(Debug, Clone)]
pub struct SignalFxClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: String,
}

impl SignalFxClient {
    /// Build a client from a validated provider configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        config.validate()?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    /// Join the base URL with a resource path such as `/v2/chart`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON payload to a collection path, returning the created
    /// resource as JSON.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ProviderError> {
        let url = self.endpoint(path);
        debug!(url = %url, "POST");
        let response = self
            .http
            .post(&url)
            .header(AUTH_HEADER, &self.auth_token)
            .json(body)
            .send()
            .await?;
        self.decode(response, path).await
    }

    /// GET a resource path, returning its JSON representation.
    pub async fn get_json(&self, path: &str) -> Result<Value, ProviderError> {
        let url = self.endpoint(path);
        debug!(url = %url, "GET");
        let response = self
            .http
            .get(&url)
            .header(AUTH_HEADER, &self.auth_token)
            .send()
            .await?;
        self.decode(response, path).await
    }

    /// PUT a JSON payload to a resource path, returning the updated
    /// resource as JSON.
    pub async fn put_json(&self, path: &str, body: &Value) -> Result<Value, ProviderError> {
        let url = self.endpoint(path);
        debug!(url = %url, "PUT");
        let response = self
            .http
            .put(&url)
            .header(AUTH_HEADER, &self.auth_token)
            .json(body)
            .send()
            .await?;
        self.decode(response, path).await
    }

    /// DELETE a resource path. The API returns an empty body on success.
    pub async fn delete(&self, path: &str) -> Result<(), ProviderError> {
        let url = self.endpoint(path);
        debug!(url = %url, "DELETE");
        let response = self
            .http
            .delete(&url)
            .header(AUTH_HEADER, &self.auth_token)
            .send()
            .await?;
        self.decode(response, path).await.map(|_| ())
    }

    /// Turn a response into JSON, mapping non-success statuses to errors.
    ///
    /// Successful responses with empty bodies (204, DELETE) decode to
    /// `Value::Null`.
    async fn decode(&self, response: reqwest::Response, context: &str) -> Result<Value, ProviderError> {
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            return Err(ProviderError::from_status(status, context, body));
        }
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
