//! Deleting one's own posts

use crate::error::Result;
use earshot_core::{ObjectStorage, Post, PostStore};
use earshot_feed::FeedManager;
use earshot_playback::{AudioEngine, TrackPlayer};
use std::sync::Arc;
use tracing::{info, warn};

/// Removes a post together with its clip
pub struct PostRemover<E> {
    feed: Arc<FeedManager>,
    player: Arc<TrackPlayer<E>>,
    store: Arc<dyn PostStore>,
    storage: Arc<dyn ObjectStorage>,
}

impl<E: AudioEngine> PostRemover<E> {
    pub fn new(
        feed: Arc<FeedManager>,
        player: Arc<TrackPlayer<E>>,
        store: Arc<dyn PostStore>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            feed,
            player,
            store,
            storage,
        }
    }

    /// Delete `post`.
    ///
    /// The player is closed first if it has the post loaded. A clip that
    /// cannot be removed is logged and left behind; the row delete decides
    /// the outcome. On success the post leaves the feed without waiting for
    /// its delete event.
    pub async fn delete(&self, post: &Post) -> Result<()> {
        self.player.close_if_current(post.id.as_str()).await;

        if !post.storage_path.is_empty() {
            if let Err(e) = self.storage.remove(&[post.storage_path.clone()]).await {
                warn!(post_id = %post.id, path = %post.storage_path, error = %e, "Failed to remove clip");
            }
        }

        self.store.delete_post(&post.id).await?;
        self.feed.remove_post(&post.id);

        info!(post_id = %post.id, "Post deleted");
        Ok(())
    }
}
