//! Earshot Studio
//!
//! Everything on the creating side of Earshot:
//!
//! - [`RecordingSession`]: microphone capture with an elapsed-seconds ticker
//!   and preview through the shared player
//! - [`CategorySelector`]: category choice with the general default
//! - [`UploadPipeline`]: store the clip, then create the post atomically
//! - [`PostRemover`]: delete one's own post and its clip
//! - [`ProfileEditor`]: read and update the viewer's profile
//!
//! Capture hardware is reached through the [`Microphone`] port.

pub mod categories;
pub mod error;
pub mod microphone;
pub mod profile;
pub mod recording;
pub mod removal;
pub mod upload;

pub use categories::{CategorySelector, SelectionChange};
pub use error::{Result, StudioError};
pub use microphone::Microphone;
pub use profile::{ProfileEditor, ProfileUpdate};
pub use recording::{RecordingSession, RecordingSnapshot, RecordingStatus};
pub use removal::PostRemover;
pub use upload::{
    clip_extension, content_type_for, object_key, PublishedClip, UploadPipeline, UploadRequest,
};
