//! Session error types

use thiserror::Error;

/// Internal authentication error taxonomy.
///
/// These never cross the manager boundary: every public operation logs the
/// detail and reports a plain [`AuthFailed`] instead.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The request never reached the provider
    #[error("Network error during {operation}: {source}")]
    Network {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-2xx status or an unusable body
    #[error("Provider rejected {operation} (status {status:?}): {detail}")]
    Provider {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },

    /// Claims could not be decoded or lack required fields
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Token expiry detected locally before any network call
    #[error("Session expired at {expired_at}")]
    ExpiredSession { expired_at: i64 },
}

impl AuthError {
    /// Create a provider error without an HTTP status
    pub fn provider(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::Provider {
            operation,
            status: None,
            detail: detail.into(),
        }
    }

    /// Create a malformed token error
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedToken(detail.into())
    }
}

/// Outcome reported to UI layers when authentication did not succeed.
///
/// Carries no detail; the cause has already been logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("authentication failed")]
pub struct AuthFailed;

impl From<AuthError> for AuthFailed {
    fn from(_: AuthError) -> Self {
        Self
    }
}

/// Persistent storage failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Storage error for key '{key}': {message}")]
pub struct StorageError {
    pub key: String,
    pub message: String,
}

impl StorageError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Outbound API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The session is missing or no longer accepted; re-login required
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Server returned another error status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::Server {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Whether the caller has to sign in again
    pub fn is_reauth_required(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}
