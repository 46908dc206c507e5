//! The viewer's own profile

use crate::error::{Result, StudioError};
use earshot_core::{AuthProvider, CoreError, Profile, ProfileStore};
use std::sync::Arc;
use tracing::info;

/// Reads and edits the signed-in viewer's profile row
pub struct ProfileEditor {
    profiles: Arc<dyn ProfileStore>,
    auth: Arc<dyn AuthProvider>,
}

/// Editable profile fields; `None` leaves a field as stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
}

impl ProfileEditor {
    pub fn new(profiles: Arc<dyn ProfileStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { profiles, auth }
    }

    /// The viewer's profile, `None` when signed out or not created yet
    pub async fn load(&self) -> Result<Option<Profile>> {
        let Some(user) = self.auth.current_user().await else {
            return Ok(None);
        };
        Ok(self.profiles.get_profile(&user).await?)
    }

    /// Apply `update` on top of the stored profile and save it.
    pub async fn save(&self, update: ProfileUpdate) -> Result<Profile> {
        let user = self
            .auth
            .current_user()
            .await
            .ok_or(StudioError::NotSignedIn)?;

        let mut profile = self
            .profiles
            .get_profile(&user)
            .await?
            .unwrap_or_else(|| Profile::new(user.clone(), String::new()));

        if let Some(username) = update.username {
            profile.username = username.trim().to_string();
        }
        if profile.username.is_empty() {
            return Err(CoreError::InvalidInput("username cannot be empty".into()).into());
        }
        if update.full_name.is_some() {
            profile.full_name = update.full_name;
        }
        if update.avatar_url.is_some() {
            profile.avatar_url = update.avatar_url;
        }
        if update.website.is_some() {
            profile.website = update.website;
        }

        self.profiles.upsert_profile(&profile).await?;
        info!(user_id = %user, "Profile saved");
        Ok(profile)
    }
}
