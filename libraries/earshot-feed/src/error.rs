//! Error types for the feed

use earshot_core::CoreError;
use thiserror::Error;

/// Feed errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// A backend port failed
    #[error(transparent)]
    Backend(#[from] CoreError),

    /// A newer load replaced this one before it finished
    #[error("Superseded by a newer load")]
    Superseded,
}

/// Result type for feed operations
pub type Result<T> = std::result::Result<T, FeedError>;
