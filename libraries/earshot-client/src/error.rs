//! Error types for the backend client.

use earshot_core::CoreError;
use thiserror::Error;

/// Errors that can occur when talking to the hosted backend.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Authentication required but no valid token available
    #[error("Authentication required")]
    AuthRequired,

    /// Sign-in rejected
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Token refresh failed
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Invalid backend URL
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse a response or realtime frame
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Backend is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),

    /// Rate limited by the backend
    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Classify a transport failure
    pub(crate) fn from_send(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            ClientError::ServerUnreachable(e.to_string())
        } else {
            ClientError::Request(e)
        }
    }
}

impl From<ClientError> for CoreError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::AuthRequired
            | ClientError::AuthFailed(_)
            | ClientError::TokenRefreshFailed(_) => CoreError::Unauthenticated,
            ClientError::ServerError { status, message } => CoreError::Backend { status, message },
            ClientError::RateLimited { retry_after_secs } => CoreError::Backend {
                status: 429,
                message: format!("retry after {retry_after_secs}s"),
            },
            ClientError::ParseError(msg) => CoreError::Malformed(msg),
            ClientError::InvalidUrl(msg) => CoreError::InvalidInput(msg),
            ClientError::Request(e) => CoreError::network(e.to_string()),
            ClientError::ServerUnreachable(msg) => CoreError::Network(msg),
        }
    }
}
