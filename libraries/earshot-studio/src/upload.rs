//! Upload pipeline
//!
//! Publishing is two backend steps: store the clip, then create the post row
//! and its category links in one procedure call. When the second step fails
//! the stored clip is removed again so no object is left without a post.

use crate::categories::CategorySelector;
use crate::error::{Result, StudioError};
use crate::microphone::Microphone;
use crate::recording::{RecordingSession, RecordingStatus};
use chrono::Utc;
use earshot_core::{AuthProvider, CategoryId, NewPost, ObjectStorage, PostStore, UserId};
use earshot_playback::AudioEngine;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Extension assumed when the clip locator has none
pub const DEFAULT_EXTENSION: &str = "m4a";

/// MIME type for a clip extension
pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "caf" => "audio/x-caf",
        _ => "audio/m4a",
    }
}

/// Lowercased extension of a clip locator
pub fn clip_extension(local_uri: &str) -> String {
    Path::new(local_uri)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map_or_else(|| DEFAULT_EXTENSION.to_string(), str::to_ascii_lowercase)
}

/// Storage key of a new clip: `{user}/{millis}_recording.{ext}`
pub fn object_key(user: &UserId, millis: i64, extension: &str) -> String {
    format!("{user}/{millis}_recording.{extension}")
}

/// Filesystem path behind a `file://` locator
pub fn local_path(local_uri: &str) -> PathBuf {
    PathBuf::from(local_uri.strip_prefix("file://").unwrap_or(local_uri))
}

/// Everything needed to publish one clip
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub local_uri: String,
    pub title: String,
    pub duration_seconds: u32,
    pub category_ids: Vec<CategoryId>,
}

/// Where a published clip ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedClip {
    /// Bucket-relative key
    pub storage_path: String,
    pub audio_url: String,
}

/// Resets the in-progress flag when a publish ends
struct UploadGuard<'a>(&'a AtomicBool);

impl Drop for UploadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Store-then-create publisher
pub struct UploadPipeline {
    store: Arc<dyn PostStore>,
    storage: Arc<dyn ObjectStorage>,
    auth: Arc<dyn AuthProvider>,
    uploading: AtomicBool,
}

impl UploadPipeline {
    pub fn new(
        store: Arc<dyn PostStore>,
        storage: Arc<dyn ObjectStorage>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            store,
            storage,
            auth,
            uploading: AtomicBool::new(false),
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::Acquire)
    }

    /// Publish one clip.
    ///
    /// Fails fast, before any I/O, on a blank title, an empty category set,
    /// or a missing viewer. Only one publish runs at a time.
    pub async fn publish(&self, request: UploadRequest) -> Result<PublishedClip> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(StudioError::TitleRequired);
        }
        if request.category_ids.is_empty() {
            return Err(StudioError::CategoryRequired);
        }
        let user = self
            .auth
            .current_user()
            .await
            .ok_or(StudioError::NotSignedIn)?;

        if self
            .uploading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StudioError::UploadInProgress);
        }
        let _guard = UploadGuard(&self.uploading);

        let bytes = tokio::fs::read(local_path(&request.local_uri)).await?;
        let extension = clip_extension(&request.local_uri);
        let key = object_key(&user, Utc::now().timestamp_millis(), &extension);
        debug!(key = %key, size = bytes.len(), "Uploading clip");

        let storage_path = self
            .storage
            .upload(&key, bytes, content_type_for(&extension))
            .await
            .map_err(StudioError::Upload)?;

        let post = NewPost {
            title: title.to_string(),
            duration_seconds: request.duration_seconds,
            audio_storage_path: storage_path.clone(),
            category_ids: request.category_ids,
        };
        if let Err(e) = self.store.create_post_with_categories(&post).await {
            error!(path = %storage_path, error = %e, "Creating post failed, removing clip");
            if let Err(cleanup) = self.storage.remove(&[storage_path.clone()]).await {
                warn!(path = %storage_path, error = %cleanup, "Clip left orphaned");
            }
            return Err(StudioError::CreatePost(e));
        }

        info!(path = %storage_path, title = %post.title, "Clip published");
        Ok(PublishedClip {
            audio_url: self.storage.resolve_audio_url(&storage_path),
            storage_path,
        })
    }

    /// Publish the clip under review with the selector's categories.
    ///
    /// An empty selection falls back to the general category. On success the
    /// session and the selector are reset for the next clip.
    pub async fn publish_recording<M, E>(
        &self,
        session: &RecordingSession<M, E>,
        selector: &mut CategorySelector,
        title: &str,
    ) -> Result<PublishedClip>
    where
        M: Microphone,
        E: AudioEngine,
    {
        let snapshot = session.snapshot();
        let local_uri = match (snapshot.status, snapshot.local_uri) {
            (RecordingStatus::Reviewing, Some(uri)) => uri,
            _ => return Err(StudioError::NoRecording),
        };
        if title.trim().is_empty() {
            return Err(StudioError::TitleRequired);
        }
        selector.ensure_selection()?;

        let published = self
            .publish(UploadRequest {
                local_uri,
                title: title.to_string(),
                duration_seconds: snapshot.elapsed_seconds,
                category_ids: selector.selected_ids().to_vec(),
            })
            .await?;

        session.reset();
        selector.reset_to_default();
        Ok(published)
    }
}
