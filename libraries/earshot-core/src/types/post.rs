//! Post and track types
//!
//! `PostRow` is the wire shape returned by the relational store (post columns
//! plus the embedded author and category links). `Post` is the display model
//! kept in the feed cache, and `Track` is the immutable playable projection of
//! a post handed to the player.

use super::{CategoryId, PostId, UserId};
use crate::format::format_duration;
use serde::{Deserialize, Serialize};

/// Attribution shown when a post row has no joined profile
pub const UNKNOWN_USERNAME: &str = "Unknown";

/// Playable unit handed to the player
///
/// Immutable once constructed; build a new one whenever the post changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier, also the resume-position key
    pub id: String,

    /// Display title
    pub title: String,

    /// Display attribution
    pub username: String,

    /// Resolved, directly fetchable locator
    pub audio_url: String,

    /// Authoritative duration (may be approximate until the engine reports)
    pub duration_seconds: f64,
}

impl Track {
    /// Create a track
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        username: impl Into<String>,
        audio_url: impl Into<String>,
        duration_seconds: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            username: username.into(),
            audio_url: audio_url.into(),
            duration_seconds,
        }
    }
}

/// Joined author of a post row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAuthor {
    pub username: String,
}

/// One post-to-category link of a post row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLink {
    pub category_id: CategoryId,
}

/// Post row as stored, with attribution and category links embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRow {
    pub id: PostId,
    pub title: String,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub audio_file_storage_path: String,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub listen_count: u32,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub profiles: Option<PostAuthor>,
    #[serde(default)]
    pub audio_post_categories: Option<Vec<CategoryLink>>,
}

/// Counter columns of a post, the only fields an update event may touch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCounts {
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub listen_count: u32,
}

/// Feed display model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub username: String,
    pub title: String,
    pub duration_seconds: f64,
    pub audio_url: String,
    /// Object-storage key of the clip
    pub storage_path: String,
    pub like_count: u32,
    pub comment_count: u32,
    pub listen_count: u32,
    pub category_ids: Vec<CategoryId>,
    /// Viewer-relative
    pub is_liked: bool,
    /// Viewer-relative
    pub is_saved: bool,
}

impl Post {
    /// Build the display model from a stored row.
    ///
    /// `audio_url` is the already-resolved locator for
    /// `row.audio_file_storage_path`.
    pub fn from_row(row: PostRow, audio_url: String, is_liked: bool, is_saved: bool) -> Self {
        Self {
            id: row.id,
            username: row
                .profiles
                .map(|p| p.username)
                .unwrap_or_else(|| UNKNOWN_USERNAME.to_string()),
            title: row.title,
            duration_seconds: row.duration_seconds,
            audio_url,
            storage_path: row.audio_file_storage_path,
            like_count: row.like_count,
            comment_count: row.comment_count,
            listen_count: row.listen_count,
            category_ids: row
                .audio_post_categories
                .unwrap_or_default()
                .into_iter()
                .map(|link| link.category_id)
                .collect(),
            is_liked,
            is_saved,
        }
    }

    /// Current counter values
    pub fn counts(&self) -> PostCounts {
        PostCounts {
            like_count: self.like_count,
            comment_count: self.comment_count,
            listen_count: self.listen_count,
        }
    }

    /// Overwrite the counters, leaving every other field untouched
    pub fn apply_counts(&mut self, counts: PostCounts) {
        self.like_count = counts.like_count;
        self.comment_count = counts.comment_count;
        self.listen_count = counts.listen_count;
    }

    /// Playable projection of this post
    pub fn track(&self) -> Track {
        Track {
            id: self.id.as_str().to_string(),
            title: self.title.clone(),
            username: self.username.clone(),
            audio_url: self.audio_url.clone(),
            duration_seconds: self.duration_seconds,
        }
    }

    /// Duration as `m:ss`
    pub fn duration_label(&self) -> String {
        format_duration(self.duration_seconds)
    }

    /// Whether the post belongs to the given category
    pub fn in_category(&self, category: &CategoryId) -> bool {
        self.category_ids.contains(category)
    }
}

/// Arguments of the atomic "create post with categories" operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub duration_seconds: u32,
    pub audio_storage_path: String,
    pub category_ids: Vec<CategoryId>,
}
