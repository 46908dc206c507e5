/// Audio engine for a terminal without audio output
use async_trait::async_trait;
use earshot_playback::{AudioEngine, Result};
use tracing::debug;

/// Accepts every command and plays nothing.
///
/// Lets the player keep its bookkeeping (closing a deleted post's track,
/// signing out) where no audio device exists.
pub struct HeadlessEngine;

#[async_trait]
impl AudioEngine for HeadlessEngine {
    async fn load(&self, url: &str) -> Result<()> {
        debug!(url, "load");
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        debug!("play");
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        debug!("pause");
        Ok(())
    }

    async fn seek_to(&self, seconds: f64) -> Result<()> {
        debug!(seconds, "seek");
        Ok(())
    }

    async fn set_playback_rate(&self, rate: f32, correct_pitch: bool) -> Result<()> {
        debug!(rate, correct_pitch, "rate");
        Ok(())
    }
}
