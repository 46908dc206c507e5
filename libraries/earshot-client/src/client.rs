//! Main Earshot backend client.

use crate::auth::AuthClient;
use crate::error::{ClientError, Result};
use crate::realtime::{socket_url, subscribe_changes, FEED_TOPIC, HEARTBEAT_INTERVAL};
use crate::rest::RestClient;
use crate::storage::{public_object_url, StorageClient};
use crate::types::{AuthUser, BackendConfig, Session};
use async_trait::async_trait;
use earshot_core::{
    AuthEvent, AuthProvider, Category, CategoryStore, NewPost, ObjectStorage, PostId, PostRow,
    PostStore, Profile, ProfileStore, Relation, TableChange, UserId,
};
use earshot_feed::ChangeFeed;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, info, warn};

/// Where the backend lives. Fixed for the lifetime of a client.
#[derive(Debug, Clone)]
struct Endpoint {
    url: String,
    anon_key: String,
    bucket: String,
}

/// Tokens and the user they belong to.
#[derive(Debug, Default)]
struct SessionState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user_id: Option<UserId>,
}

/// Client for the hosted backend.
///
/// Owns the HTTP connection pool and the current session, and implements
/// every backend port of `earshot-core` on top of them. Auth transitions are
/// broadcast to [`EarshotClient::on_auth_state_change`] subscribers.
///
/// # Example
///
/// ```ignore
/// use earshot_client::{BackendConfig, EarshotClient};
///
/// let client = EarshotClient::new(BackendConfig::new("https://xyz.example.co", "anon-key"))?;
/// client.sign_in("ana@example.com", "secret").await?;
///
/// let rest = client.rest().await;
/// let posts = rest.client().list_posts().await?;
/// println!("{} posts", posts.len());
/// ```
pub struct EarshotClient {
    http: Client,
    endpoint: Endpoint,
    session: Arc<RwLock<SessionState>>,
    auth_events: broadcast::Sender<AuthEvent>,
}

impl EarshotClient {
    /// Create a new client with the given configuration.
    pub fn new(config: BackendConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let url = config.url.trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Earshot/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Request)?;

        let (auth_events, _) = broadcast::channel(16);

        Ok(Self {
            http,
            endpoint: Endpoint {
                url,
                anon_key: config.anon_key,
                bucket: config.bucket,
            },
            session: Arc::new(RwLock::new(SessionState {
                access_token: config.access_token,
                refresh_token: config.refresh_token,
                user_id: None,
            })),
            auth_events,
        })
    }

    /// Backend base URL, without a trailing slash.
    pub fn url(&self) -> &str {
        &self.endpoint.url
    }

    /// Storage bucket holding the clips.
    pub fn bucket(&self) -> &str {
        &self.endpoint.bucket
    }

    /// Public (anonymous) API key.
    pub fn anon_key(&self) -> &str {
        &self.endpoint.anon_key
    }

    /// Check if the client holds an access token.
    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.access_token.is_some()
    }

    /// Subscribe to auth state transitions.
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.auth_events.subscribe()
    }

    /// Forward auth transitions into an mpsc channel.
    ///
    /// A slow consumer that lags behind the broadcast buffer skips the missed
    /// events; the stream ends when the client is dropped.
    pub fn forward_auth_events(&self) -> mpsc::Receiver<AuthEvent> {
        let mut events = self.auth_events.subscribe();
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth event consumer lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        rx
    }

    fn publish(&self, event: AuthEvent) {
        debug!(?event, "Auth state changed");
        // No subscribers is fine
        let _ = self.auth_events.send(event);
    }

    fn auth(&self) -> AuthClient<'_> {
        AuthClient::new(&self.http, &self.endpoint.url, &self.endpoint.anon_key)
    }

    /// Sign in with email and password.
    ///
    /// On success the tokens are stored for subsequent requests and
    /// `SignedIn` is broadcast.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.auth().sign_in_with_password(email, password).await?;

        let mut state = self.session.write().await;
        state.access_token = Some(session.access_token.clone());
        state.refresh_token = Some(session.refresh_token.clone());
        state.user_id = Some(session.user.id.clone());
        drop(state);

        self.publish(AuthEvent::SignedIn(session.user.id.clone()));
        Ok(session)
    }

    /// Set tokens directly (e.g., from stored credentials).
    ///
    /// The user behind the token is unknown until
    /// [`EarshotClient::fetch_current_user`] or
    /// [`EarshotClient::initial_session`] runs.
    pub async fn set_tokens(&self, access_token: String, refresh_token: Option<String>) {
        let mut state = self.session.write().await;
        state.access_token = Some(access_token);
        state.refresh_token = refresh_token;
        state.user_id = None;
    }

    /// Get the current tokens.
    pub async fn tokens(&self) -> (Option<String>, Option<String>) {
        let state = self.session.read().await;
        (state.access_token.clone(), state.refresh_token.clone())
    }

    /// End the session.
    ///
    /// The server-side revoke is best effort; local tokens are always
    /// cleared and `SignedOut` is always broadcast.
    pub async fn sign_out(&self) {
        let mut state = self.session.write().await;
        let access_token = state.access_token.take();
        state.refresh_token = None;
        state.user_id = None;
        drop(state);

        if let Some(token) = access_token {
            if let Err(e) = self.auth().sign_out(&token).await {
                warn!(error = %e, "Server-side sign-out failed");
            }
        }

        info!("Signed out");
        self.publish(AuthEvent::SignedOut);
    }

    /// Exchange the refresh token for a new session.
    pub async fn refresh_session(&self) -> Result<Session> {
        let refresh_token = self
            .session
            .read()
            .await
            .refresh_token
            .clone()
            .ok_or(ClientError::AuthRequired)?;

        let session = self.auth().refresh_session(&refresh_token).await?;

        let mut state = self.session.write().await;
        state.access_token = Some(session.access_token.clone());
        state.refresh_token = Some(session.refresh_token.clone());
        state.user_id = Some(session.user.id.clone());
        drop(state);

        self.publish(AuthEvent::TokenRefreshed(session.user.id.clone()));
        Ok(session)
    }

    /// Look up the user behind the stored access token.
    ///
    /// Returns `Ok(None)` without a request when no token is stored.
    pub async fn fetch_current_user(&self) -> Result<Option<AuthUser>> {
        if !self.is_authenticated().await {
            return Ok(None);
        }

        let user = self
            .with_auto_refresh(|| async {
                let token = self
                    .session
                    .read()
                    .await
                    .access_token
                    .clone()
                    .ok_or(ClientError::AuthRequired)?;
                self.auth().get_user(&token).await
            })
            .await?;

        self.session.write().await.user_id = Some(user.id.clone());
        Ok(Some(user))
    }

    /// Resolve the stored session at startup and broadcast the result.
    ///
    /// A token the backend no longer accepts is dropped and reported as
    /// "nobody signed in".
    pub async fn initial_session(&self) -> AuthEvent {
        let user = match self.fetch_current_user().await {
            Ok(user) => user.map(|u| u.id),
            Err(e) => {
                warn!(error = %e, "Stored session rejected");
                let mut state = self.session.write().await;
                state.access_token = None;
                state.refresh_token = None;
                state.user_id = None;
                None
            }
        };

        let event = AuthEvent::InitialSession(user);
        self.publish(event.clone());
        event
    }

    /// Handle for table and procedure operations.
    pub async fn rest(&self) -> RestClientHandle {
        RestClientHandle {
            http: self.http.clone(),
            endpoint: self.endpoint.clone(),
            access_token: self.session.read().await.access_token.clone(),
        }
    }

    /// Handle for object storage operations.
    pub async fn storage(&self) -> StorageClientHandle {
        StorageClientHandle {
            http: self.http.clone(),
            endpoint: self.endpoint.clone(),
            access_token: self.session.read().await.access_token.clone(),
        }
    }

    /// Execute an operation with automatic token refresh on 401.
    ///
    /// If the operation fails with `AuthRequired`, attempts to refresh
    /// the token and retry once.
    pub async fn with_auto_refresh<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        match operation().await {
            Ok(result) => Ok(result),
            Err(ClientError::AuthRequired) => {
                warn!("Token expired, attempting refresh");
                self.refresh_session().await?;
                operation().await
            }
            Err(e) => Err(e),
        }
    }
}

/// Handle for REST operations.
///
/// Captures the access token current when it was created.
pub struct RestClientHandle {
    http: Client,
    endpoint: Endpoint,
    access_token: Option<String>,
}

impl RestClientHandle {
    /// Get the REST client.
    pub fn client(&self) -> RestClient<'_> {
        RestClient::new(
            &self.http,
            &self.endpoint.url,
            &self.endpoint.anon_key,
            self.access_token.as_deref(),
        )
    }
}

/// Handle for storage operations.
pub struct StorageClientHandle {
    http: Client,
    endpoint: Endpoint,
    access_token: Option<String>,
}

impl StorageClientHandle {
    /// Get the storage client.
    pub fn client(&self) -> StorageClient<'_> {
        StorageClient::new(
            &self.http,
            &self.endpoint.url,
            &self.endpoint.anon_key,
            &self.endpoint.bucket,
            self.access_token.as_deref(),
        )
    }
}

// =============================================================================
// Backend ports
// =============================================================================

#[async_trait]
impl AuthProvider for EarshotClient {
    async fn current_user(&self) -> Option<UserId> {
        self.session.read().await.user_id.clone()
    }
}

#[async_trait]
impl PostStore for EarshotClient {
    async fn list_posts(&self) -> earshot_core::Result<Vec<PostRow>> {
        Ok(self
            .with_auto_refresh(|| async { self.rest().await.client().list_posts().await })
            .await?)
    }

    async fn get_post(&self, id: &PostId) -> earshot_core::Result<Option<PostRow>> {
        Ok(self
            .with_auto_refresh(|| async { self.rest().await.client().get_post(id).await })
            .await?)
    }

    async fn relation_post_ids(
        &self,
        relation: Relation,
        user: &UserId,
    ) -> earshot_core::Result<Vec<PostId>> {
        Ok(self
            .with_auto_refresh(|| async {
                self.rest()
                    .await
                    .client()
                    .relation_post_ids(relation, user)
                    .await
            })
            .await?)
    }

    async fn insert_relation(
        &self,
        relation: Relation,
        user: &UserId,
        post: &PostId,
    ) -> earshot_core::Result<()> {
        Ok(self
            .with_auto_refresh(|| async {
                self.rest()
                    .await
                    .client()
                    .insert_relation(relation, user, post)
                    .await
            })
            .await?)
    }

    async fn delete_relation(
        &self,
        relation: Relation,
        user: &UserId,
        post: &PostId,
    ) -> earshot_core::Result<()> {
        Ok(self
            .with_auto_refresh(|| async {
                self.rest()
                    .await
                    .client()
                    .delete_relation(relation, user, post)
                    .await
            })
            .await?)
    }

    async fn delete_post(&self, id: &PostId) -> earshot_core::Result<()> {
        Ok(self
            .with_auto_refresh(|| async { self.rest().await.client().delete_post(id).await })
            .await?)
    }

    async fn create_post_with_categories(&self, post: &NewPost) -> earshot_core::Result<()> {
        Ok(self
            .with_auto_refresh(|| async {
                self.rest()
                    .await
                    .client()
                    .create_post_with_categories(post)
                    .await
            })
            .await?)
    }
}

#[async_trait]
impl CategoryStore for EarshotClient {
    async fn list_categories(&self) -> earshot_core::Result<Vec<Category>> {
        Ok(self
            .with_auto_refresh(|| async { self.rest().await.client().list_categories().await })
            .await?)
    }
}

#[async_trait]
impl ProfileStore for EarshotClient {
    async fn get_profile(&self, user: &UserId) -> earshot_core::Result<Option<Profile>> {
        Ok(self
            .with_auto_refresh(|| async { self.rest().await.client().get_profile(user).await })
            .await?)
    }

    async fn upsert_profile(&self, profile: &Profile) -> earshot_core::Result<()> {
        Ok(self
            .with_auto_refresh(|| async {
                self.rest().await.client().upsert_profile(profile).await
            })
            .await?)
    }
}

#[async_trait]
impl ObjectStorage for EarshotClient {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> earshot_core::Result<String> {
        Ok(self
            .with_auto_refresh(|| {
                let bytes = bytes.clone();
                async move {
                    self.storage()
                        .await
                        .client()
                        .upload(path, bytes, content_type)
                        .await
                }
            })
            .await?)
    }

    fn public_url(&self, path: &str) -> String {
        public_object_url(&self.endpoint.url, &self.endpoint.bucket, path)
    }

    async fn remove(&self, paths: &[String]) -> earshot_core::Result<()> {
        Ok(self
            .with_auto_refresh(|| async { self.storage().await.client().remove(paths).await })
            .await?)
    }
}

#[async_trait]
impl ChangeFeed for EarshotClient {
    /// Opens a fresh socket per call, authorised as the current session
    async fn subscribe(&self) -> earshot_core::Result<mpsc::Receiver<TableChange>> {
        let url = socket_url(&self.endpoint.url, &self.endpoint.anon_key)?;
        let access_token = self.session.read().await.access_token.clone();
        Ok(subscribe_changes(&url, FEED_TOPIC, access_token.as_deref(), HEARTBEAT_INTERVAL).await?)
    }
}
