//! Earshot Core
//!
//! Platform-agnostic domain types, traits and error handling shared by every
//! Earshot crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Post`, `Track`, `Category`, `Profile` and their ids
//! - **Change Events**: decoded row-level notifications from the change feed
//! - **Ports**: `AuthProvider`, `PostStore`, `CategoryStore`, `ProfileStore`,
//!   `ObjectStorage`, implemented by the HTTP client and by test fakes
//! - **Observation**: `Selector`, a projection over a `watch` channel that only
//!   wakes when the projected value changes
//! - **Error Handling**: unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use earshot_core::types::{Post, PostId, PostRow};
//!
//! let row: PostRow = serde_json::from_value(serde_json::json!({
//!     "id": "p1",
//!     "title": "Morning thoughts",
//!     "duration_seconds": 42,
//!     "audio_file_storage_path": "u1/1700000000000_recording.m4a",
//!     "like_count": 3,
//!     "comment_count": 0,
//!     "profiles": { "username": "ada" },
//!     "audio_post_categories": [{ "category_id": "general" }]
//! }))
//! .unwrap();
//!
//! let post = Post::from_row(row, "https://cdn.example.com/clip.m4a".into(), true, false);
//! assert_eq!(post.id, PostId::new("p1"));
//! assert_eq!(post.duration_label(), "0:42");
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod format;
pub mod observe;
pub mod traits;
pub mod types;

pub use error::{CoreError, Result};
pub use observe::Selector;
pub use traits::{AuthProvider, CategoryStore, ObjectStorage, PostStore, ProfileStore};
pub use types::{
    AuthEvent, Category, CategoryId, ChangeEvent, ChangeKind, NewPost, Post, PostCounts, PostId,
    PostRow, Profile, Relation, RelationChange, TableChange, Track, UserId,
};
