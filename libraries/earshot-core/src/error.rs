/// Core error types for Earshot
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error reported by a backend port
#[derive(Error, Debug)]
pub enum CoreError {
    /// The backend could not be reached or the request failed in transit
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with an error status
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// No signed-in viewer for an action that needs one
    #[error("Not signed in")]
    Unauthenticated,

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A change-feed payload or row did not have the expected shape
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a malformed payload error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
