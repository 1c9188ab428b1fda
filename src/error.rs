//! Error types for provider operations.
//!
//! Failures from the SignalFx API are surfaced verbatim as operation
//! failures. There is no local retry or recovery; a failed API call fails
//! the corresponding lifecycle step.

use thiserror::Error;

/// Errors that can occur while running provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource does not exist on the remote side.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// A resource configuration failed validation before submission.
    #[error("validation error: {0}")]
    Validation(String),

    /// The provider configuration is missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No handler is registered for the requested resource type.
    #[error("unknown resource type: {0}")]
    UnknownResource(String),

    /// The remote API rejected a create because the resource exists.
    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    /// The API token was rejected or lacks the required permissions.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A JSON payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP request itself failed (connection, timeout, bad URL).
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status not covered by a more
    /// specific variant. The body is passed through untouched.
    #[error("api error (status {status}): {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Response body, as returned by the API.
        message: String,
    },
}

impl ProviderError {
    /// Map a non-success HTTP status to an error variant.
    ///
    /// `context` names the resource or operation for the 404/401/409
    /// variants; `body` is the raw response body for everything else.
    pub fn from_status(status: reqwest::StatusCode, context: &str, body: String) -> Self {
        match status.as_u16() {
            404 => Self::NotFound(context.to_string()),
            401 | 403 => Self::PermissionDenied(context.to_string()),
            409 => Self::AlreadyExists(context.to_string()),
            code => Self::Api {
                status: code,
                message: body,
            },
        }
    }

    /// Whether this error means the remote resource is gone.
    ///
    /// Orchestrators use this to drop a resource from state instead of
    /// failing the refresh.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
