use super::UserId;
use serde::{Deserialize, Serialize};

/// Public profile row of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl Profile {
    /// Create a profile with only the required fields
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            full_name: None,
            avatar_url: None,
            website: None,
        }
    }
}
