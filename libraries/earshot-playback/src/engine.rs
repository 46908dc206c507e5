//! Platform audio engine abstraction
//!
//! The player never decodes audio itself. A platform engine loads a URL and
//! plays it; the player only issues commands and mirrors the status reports
//! the engine sends back.

use crate::error::Result;
use crate::types::EngineStatus;
use async_trait::async_trait;
use std::sync::Arc;

/// Platform audio engine
///
/// Implementors wrap whatever the platform offers (a native media player, a
/// web audio element, ...). All commands are asynchronous and may fail; the
/// player treats every failure as non-fatal.
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Replace the current source with the resource at `url`
    async fn load(&self, url: &str) -> Result<()>;

    /// Start or resume playback of the loaded source
    async fn play(&self) -> Result<()>;

    /// Pause playback
    async fn pause(&self) -> Result<()>;

    /// Seek to an offset in seconds
    async fn seek_to(&self, seconds: f64) -> Result<()>;

    /// Change speed; `correct_pitch` keeps the pitch unchanged
    async fn set_playback_rate(&self, rate: f32, correct_pitch: bool) -> Result<()>;
}

#[async_trait]
impl<E: AudioEngine + ?Sized> AudioEngine for Arc<E> {
    async fn load(&self, url: &str) -> Result<()> {
        (**self).load(url).await
    }

    async fn play(&self) -> Result<()> {
        (**self).play().await
    }

    async fn pause(&self) -> Result<()> {
        (**self).pause().await
    }

    async fn seek_to(&self, seconds: f64) -> Result<()> {
        (**self).seek_to(seconds).await
    }

    async fn set_playback_rate(&self, rate: f32, correct_pitch: bool) -> Result<()> {
        (**self).set_playback_rate(rate, correct_pitch).await
    }
}

/// Receiver half of an engine's status stream
pub type StatusReceiver = tokio::sync::mpsc::Receiver<EngineStatus>;
