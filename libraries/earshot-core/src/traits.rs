/// Backend ports for Earshot
///
/// Every collaborator outside the process is reached through one of these
/// traits. `earshot-client` implements them over HTTP; tests implement them
/// with in-memory fakes.
use crate::error::Result;
use crate::types::{Category, NewPost, PostId, PostRow, Profile, Relation, UserId};
use async_trait::async_trait;

/// Authentication provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The signed-in viewer, if any
    async fn current_user(&self) -> Option<UserId>;
}

/// Relational store operations on posts and viewer relations
#[async_trait]
pub trait PostStore: Send + Sync {
    /// All posts, newest first, with attribution and category links
    async fn list_posts(&self) -> Result<Vec<PostRow>>;

    /// One post with attribution and category links
    ///
    /// Returns `Ok(None)` when no row has this id.
    async fn get_post(&self, id: &PostId) -> Result<Option<PostRow>>;

    /// Ids of the posts the user holds the given relation to
    async fn relation_post_ids(&self, relation: Relation, user: &UserId) -> Result<Vec<PostId>>;

    /// Create the `(user, post)` edge
    async fn insert_relation(&self, relation: Relation, user: &UserId, post: &PostId)
        -> Result<()>;

    /// Remove the `(user, post)` edge
    async fn delete_relation(&self, relation: Relation, user: &UserId, post: &PostId)
        -> Result<()>;

    /// Delete a post row
    async fn delete_post(&self, id: &PostId) -> Result<()>;

    /// Atomically create a post row together with its category links
    async fn create_post_with_categories(&self, post: &NewPost) -> Result<()>;
}

/// Category catalogue
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// All categories
    async fn list_categories(&self) -> Result<Vec<Category>>;
}

/// Profile rows
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Profile of a user, if one exists
    async fn get_profile(&self, user: &UserId) -> Result<Option<Profile>>;

    /// Insert or update a profile row
    async fn upsert_profile(&self, profile: &Profile) -> Result<()>;
}

/// Object storage for audio clips
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store bytes under `path`; returns the stored key
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Publicly fetchable URL of a stored key
    fn public_url(&self, path: &str) -> String;

    /// Delete stored keys
    async fn remove(&self, paths: &[String]) -> Result<()>;

    /// Resolve a stored clip path to a playable URL.
    ///
    /// Absolute `http(s)` locators are passed through; an empty path stays
    /// empty.
    fn resolve_audio_url(&self, path: &str) -> String {
        if path.is_empty() {
            String::new()
        } else if path.starts_with("http") {
            path.to_string()
        } else {
            self.public_url(path)
        }
    }
}
