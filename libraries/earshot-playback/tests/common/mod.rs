//! Recording audio engine shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use earshot_core::Track;
use earshot_playback::{AudioEngine, EngineStatus, PlaybackError, Result};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(String),
    Play,
    Pause,
    Seek(f64),
    Rate(f32, bool),
}

/// Engine that records every command and can be told to fail or stall
#[derive(Default)]
pub struct FakeEngine {
    calls: Mutex<Vec<Call>>,
    failing_urls: Mutex<HashSet<String>>,
    slow_url: Mutex<Option<String>>,
    gate: Notify,
    reject_play: AtomicBool,
    reject_rate: AtomicBool,
}

impl FakeEngine {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_url(&self, url: &str) {
        self.failing_urls.lock().unwrap().insert(url.to_string());
    }

    pub fn heal_url(&self, url: &str) {
        self.failing_urls.lock().unwrap().remove(url);
    }

    /// Every `play` fails after being recorded
    pub fn reject_play(&self) {
        self.reject_play.store(true, Ordering::SeqCst);
    }

    /// Every `set_playback_rate` fails after being recorded
    pub fn reject_rate(&self) {
        self.reject_rate.store(true, Ordering::SeqCst);
    }

    /// Loads of `url` wait until `release` is called
    pub fn stall_url(&self, url: &str) {
        *self.slow_url.lock().unwrap() = Some(url.to_string());
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn has_loaded(&self, url: &str) -> bool {
        self.calls().contains(&Call::Load(url.to_string()))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AudioEngine for FakeEngine {
    async fn load(&self, url: &str) -> Result<()> {
        self.record(Call::Load(url.to_string()));
        let stalled = self.slow_url.lock().unwrap().as_deref() == Some(url);
        if stalled {
            self.gate.notified().await;
        }
        if self.failing_urls.lock().unwrap().contains(url) {
            return Err(PlaybackError::engine(format!("cannot open {url}")));
        }
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        self.record(Call::Play);
        if self.reject_play.load(Ordering::SeqCst) {
            return Err(PlaybackError::engine("output device lost"));
        }
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.record(Call::Pause);
        Ok(())
    }

    async fn seek_to(&self, seconds: f64) -> Result<()> {
        self.record(Call::Seek(seconds));
        Ok(())
    }

    async fn set_playback_rate(&self, rate: f32, correct_pitch: bool) -> Result<()> {
        self.record(Call::Rate(rate, correct_pitch));
        if self.reject_rate.load(Ordering::SeqCst) {
            return Err(PlaybackError::engine(format!("rate {rate} unsupported")));
        }
        Ok(())
    }
}

pub fn track(id: &str, duration: f64) -> Track {
    Track::new(
        id,
        format!("Title {id}"),
        "ana",
        format!("https://cdn.test/{id}.m4a"),
        duration,
    )
}

pub fn playing_at(current_time: f64, duration: f64) -> EngineStatus {
    EngineStatus {
        playing: true,
        current_time,
        duration,
        did_just_finish: false,
    }
}

pub fn finished(duration: f64) -> EngineStatus {
    EngineStatus {
        playing: false,
        current_time: duration,
        duration,
        did_just_finish: true,
    }
}
