//! Error types for recording and publishing

use earshot_core::CoreError;
use earshot_playback::PlaybackError;
use thiserror::Error;

/// Studio errors
///
/// The `Display` text of every variant is fit to show the user as-is.
#[derive(Debug, Error)]
pub enum StudioError {
    /// Microphone access was refused
    #[error("Permission to access microphone was denied")]
    PermissionDenied,

    /// The capture device failed
    #[error("Microphone error: {0}")]
    Microphone(String),

    /// A capture is already running
    #[error("Already recording")]
    AlreadyRecording,

    /// A finished capture has to be posted or discarded first
    #[error("A recording is waiting to be posted or discarded")]
    RecordingPending,

    /// Stop was requested with no capture running
    #[error("Not recording")]
    NotRecording,

    /// The capture ended without producing a file
    #[error("No recording was saved")]
    NoRecording,

    /// Publishing requires a signed-in user
    #[error("You must be logged in to share audio")]
    NotSignedIn,

    /// Empty or blank title
    #[error("Please enter a title for your audio")]
    TitleRequired,

    /// No category selected and no default available
    #[error("Please select at least one category for your audio")]
    CategoryRequired,

    /// Another publish is still running
    #[error("An upload is already in progress")]
    UploadInProgress,

    /// Reading the local clip failed
    #[error("Failed to read recording: {0}")]
    Io(#[from] std::io::Error),

    /// Storing the clip failed
    #[error("Upload failed: {0}")]
    Upload(#[source] CoreError),

    /// Creating the post row failed after the clip was stored
    #[error("An error occurred while saving the post. Please try again.")]
    CreatePost(#[source] CoreError),

    /// Previewing the clip failed
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// Any other backend failure
    #[error(transparent)]
    Backend(#[from] CoreError),
}

impl StudioError {
    /// Create a microphone error
    pub fn microphone(msg: impl Into<String>) -> Self {
        Self::Microphone(msg.into())
    }
}

/// Result type for studio operations
pub type Result<T> = std::result::Result<T, StudioError>;
