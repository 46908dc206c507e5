//! Types for backend requests and responses.

use chrono::{DateTime, Utc};
use earshot_core::{CategoryId, PostId, UserId};
use serde::{Deserialize, Serialize};

/// Default storage bucket for audio clips
pub const DEFAULT_BUCKET: &str = "audio-clips";

/// Configuration for connecting to the hosted backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the project (e.g., "https://xyz.example.co")
    pub url: String,
    /// Public (anonymous) API key, sent on every request
    pub anon_key: String,
    /// Storage bucket holding the clips
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Current access token (if signed in)
    #[serde(default)]
    pub access_token: Option<String>,
    /// Refresh token for obtaining new access tokens
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

impl BackendConfig {
    /// Create a config for an anonymous client.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            bucket: default_bucket(),
            access_token: None,
            refresh_token: None,
        }
    }

    /// Create a config with existing tokens.
    pub fn with_tokens(
        url: impl Into<String>,
        anon_key: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token,
            ..Self::new(url, anon_key)
        }
    }
}

// =============================================================================
// Authentication Types
// =============================================================================

/// Request body for the password grant.
#[derive(Debug, Serialize)]
pub struct PasswordGrant {
    pub email: String,
    pub password: String,
}

/// Request body for the refresh grant.
#[derive(Debug, Serialize)]
pub struct RefreshGrant {
    pub refresh_token: String,
}

/// Authenticated user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens issued by a grant.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Token validity in seconds
    #[serde(default)]
    pub expires_in: u64,
    pub user: AuthUser,
}

// =============================================================================
// Table Rows
// =============================================================================

/// Row of `user_likes` / `user_saved_posts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationRow {
    pub user_id: UserId,
    pub audio_post_id: PostId,
}

/// Projection used when listing a viewer's relations.
#[derive(Debug, Deserialize)]
pub(crate) struct RelationPostId {
    pub audio_post_id: PostId,
}

/// Body of a profile upsert.
#[derive(Debug, Serialize)]
pub(crate) struct ProfileUpdate<'a> {
    pub id: &'a UserId,
    pub username: &'a str,
    pub full_name: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub website: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

/// Arguments of the `create_post_with_categories` procedure.
#[derive(Debug, Serialize)]
pub(crate) struct CreatePostArgs<'a> {
    pub post_title: &'a str,
    pub post_duration: u32,
    pub post_audio_path: &'a str,
    pub category_ids: &'a [CategoryId],
}

/// Response of a storage upload.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(rename = "Key")]
    pub key: Option<String>,
}

/// Body of a storage removal.
#[derive(Debug, Serialize)]
pub(crate) struct RemoveRequest<'a> {
    pub prefixes: &'a [String],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_bucket() {
        let config = BackendConfig::new("https://x.test", "anon");
        assert_eq!(config.bucket, "audio-clips");
        assert!(config.access_token.is_none());

        let config = BackendConfig::with_tokens("https://x.test", "anon", "at", None);
        assert_eq!(config.access_token.as_deref(), Some("at"));
        assert_eq!(config.bucket, "audio-clips");
    }

    #[test]
    fn session_parses_grant_response() {
        let session: Session = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "rt",
            "user": { "id": "u1", "email": "ana@example.com", "aud": "authenticated" }
        }))
        .unwrap();

        assert_eq!(session.user.id, UserId::new("u1"));
        assert_eq!(session.expires_in, 3600);
    }
}
