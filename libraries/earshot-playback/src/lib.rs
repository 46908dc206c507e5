//! Earshot - Track Playback
//!
//! A single audio session shared by the whole app.
//!
//! This crate provides:
//! - Play / pause / resume / restart-after-finish from one `play_track` call
//! - Per-track resume positions kept across track switches
//! - Optimistic seeking clamped to the track duration
//! - A fixed playback-rate ladder applied with pitch correction
//! - Observable state with fine-grained selectors
//!
//! # Architecture
//!
//! The player never decodes audio. A platform [`AudioEngine`] loads URLs and
//! reports status; [`TrackPlayer`] issues commands and mirrors the reports.
//!
//! # Example
//!
//! ```rust,no_run
//! use earshot_playback::{AudioEngine, PlayerConfig, TrackPlayer};
//! use earshot_core::Track;
//!
//! async fn tap<E: AudioEngine>(player: &TrackPlayer<E>) {
//!     let track = Track::new("p1", "Morning walk", "ana", "https://cdn/p1.m4a", 42.0);
//!
//!     // First tap loads and plays, second tap pauses
//!     let _ = player.play_track(track.clone()).await;
//!     let _ = player.play_track(track).await;
//!
//!     let _ = player.seek_forward().await;
//!     let rate = player.cycle_playback_rate().await;
//!     assert_eq!(rate, 1.5);
//! }
//! ```

#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod events;
pub mod manager;
pub mod types;

pub use engine::{AudioEngine, StatusReceiver};
pub use error::{PlaybackError, Result};
pub use events::PlayerEvent;
pub use manager::{PlayOutcome, TrackPlayer};
pub use types::{EngineStatus, PlayerConfig, PlayerSnapshot, DEFAULT_RATES, DEFAULT_SEEK_STEP_SECONDS};
