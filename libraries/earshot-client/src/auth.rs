//! Authentication endpoints of the hosted backend.

use crate::error::{ClientError, Result};
use crate::response::{ensure_success, json};
use crate::types::{AuthUser, PasswordGrant, RefreshGrant, Session};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

/// Authentication client.
pub struct AuthClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    anon_key: &'a str,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, anon_key: &'a str) -> Self {
        Self {
            http,
            base_url,
            anon_key,
        }
    }

    /// Sign in with email and password.
    ///
    /// Returns the session tokens on success.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/auth/v1/token", self.base_url);
        debug!(url = %url, email = %email, "Attempting sign-in");

        let request = PasswordGrant {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .http
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", self.anon_key)
            .json(&request)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Sign-in failed: invalid credentials");
            return Err(ClientError::AuthFailed(
                "Invalid email or password".to_string(),
            ));
        }

        let session: Session = json(response, "sign-in response").await?;
        info!(user_id = %session.user.id, "Sign-in successful");
        Ok(session)
    }

    /// Exchange a refresh token for a new session.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let url = format!("{}/auth/v1/token", self.base_url);
        debug!(url = %url, "Refreshing access token");

        let request = RefreshGrant {
            refresh_token: refresh_token.to_string(),
        };

        let response = self
            .http
            .post(&url)
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", self.anon_key)
            .json(&request)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            warn!("Token refresh failed: refresh token expired or invalid");
            return Err(ClientError::TokenRefreshFailed(
                "Refresh token expired or invalid".to_string(),
            ));
        }

        let session = json(response, "refresh response").await?;
        debug!("Token refresh successful");
        Ok(session)
    }

    /// Get the user an access token belongs to.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser> {
        let url = format!("{}/auth/v1/user", self.base_url);
        debug!(url = %url, "Getting current user");

        let response = self
            .http
            .get(&url)
            .header("apikey", self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        json(response, "user").await
    }

    /// Revoke the session behind an access token.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let url = format!("{}/auth/v1/logout", self.base_url);
        debug!(url = %url, "Signing out");

        let response = self
            .http
            .post(&url)
            .header("apikey", self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        ensure_success(response).await?;
        Ok(())
    }
}
