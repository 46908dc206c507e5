//! Earshot - Feed
//!
//! The post collection every screen renders from.
//!
//! This crate provides:
//! - [`FeedManager`]: initial load, refresh and live-sync patching of one
//!   ordered, id-keyed post collection
//! - Optimistic like/save toggles with rollback
//! - Echo suppression for the viewer's own relation writes
//! - [`SessionSupervisor`]: starts and stops live sync from auth events
//! - [`ProfileShelves`]: own posts, likes and saves for the profile screen
//!
//! # Ordering
//!
//! Change-feed events can arrive before, during or after a load. An insert
//! for a known id and an update or delete for an unknown id are no-ops, so
//! the collection never holds two posts with the same id.

#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod echo;
pub mod error;
pub mod interactions;
pub mod live;
pub mod manager;
pub mod session;
pub mod shelves;
pub mod state;

pub use cache::PostCache;
pub use config::FeedConfig;
pub use echo::EchoFilter;
pub use error::{FeedError, Result};
pub use interactions::ToggleOutcome;
pub use live::ChangeFeed;
pub use manager::FeedManager;
pub use session::SessionSupervisor;
pub use shelves::{ProfileShelves, Shelf};
pub use state::{FeedPhase, FeedSnapshot};
