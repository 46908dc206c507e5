//! Earshot Backend Client
//!
//! HTTP client for the hosted backend behind Earshot: authentication, the
//! REST table interface, object storage and the realtime change feed.
//!
//! # Features
//!
//! - **Authentication**: password sign-in, token refresh, auth state events
//! - **Tables**: posts, likes, saves, categories, profiles
//! - **Storage**: clip upload, public URLs, removal
//! - **Realtime**: WebSocket change feed with join, heartbeat and row-change decoding
//!
//! [`EarshotClient`] implements every port of `earshot-core`, so it can be
//! handed straight to the feed, the studio and the session supervisor.
//!
//! # Example
//!
//! ```ignore
//! use earshot_client::{BackendConfig, EarshotClient};
//! use earshot_core::PostStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EarshotClient::new(BackendConfig::new("https://xyz.example.co", "anon"))?;
//!     client.sign_in("ana@example.com", "secret").await?;
//!
//!     let posts = client.list_posts().await?;
//!     println!("Found {} posts", posts.len());
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod error;
pub mod realtime;
mod response;
mod rest;
mod storage;
mod types;

pub use client::{EarshotClient, RestClientHandle, StorageClientHandle};
pub use error::{ClientError, Result};
pub use types::{
    AuthUser, BackendConfig, PasswordGrant, RefreshGrant, RelationRow, Session, DEFAULT_BUCKET,
};

// Re-export sub-clients for direct use if needed
pub use auth::AuthClient;
pub use rest::{RestClient, POST_SELECT};
pub use storage::{public_object_url, StorageClient};
