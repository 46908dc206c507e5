//! Core types for playback management

use earshot_core::Track;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default speed ladder
pub const DEFAULT_RATES: [f32; 3] = [1.0, 1.5, 2.0];

/// Default skip distance for seek forward/backward
pub const DEFAULT_SEEK_STEP_SECONDS: f64 = 10.0;

/// Status report from the platform engine
///
/// Arrives on an arbitrary cadence while a source is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Whether audio is currently audible
    pub playing: bool,

    /// Position in seconds
    pub current_time: f64,

    /// Duration in seconds as known by the engine (0 until metadata loads)
    pub duration: f64,

    /// Set once when the source reaches its natural end
    pub did_just_finish: bool,
}

/// Observable playback session
///
/// Published after every state transition; consumers read it, only the
/// player mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Track owning the audio session
    pub current_track: Option<Track>,

    pub is_playing: bool,

    /// The current track reached its natural end
    pub is_finished: bool,

    /// A load is in flight; engine status is ignored until it plays
    pub is_loading: bool,

    /// Seconds
    pub current_time: f64,

    /// Seconds
    pub duration: f64,

    pub playback_rate: f32,

    /// Last known offset per track id, in seconds
    pub resume_positions: HashMap<String, f64>,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            current_track: None,
            is_playing: false,
            is_finished: false,
            is_loading: false,
            current_time: 0.0,
            duration: 0.0,
            playback_rate: DEFAULT_RATES[0],
            resume_positions: HashMap::new(),
        }
    }
}

impl PlayerSnapshot {
    /// Id of the current track
    pub fn current_track_id(&self) -> Option<&str> {
        self.current_track.as_ref().map(|t| t.id.as_str())
    }

    /// Whether the given track is current and audible
    pub fn is_track_playing(&self, track_id: &str) -> bool {
        self.is_playing && self.current_track_id() == Some(track_id)
    }

    /// Saved offset for a track (0 when unknown)
    pub fn resume_position(&self, track_id: &str) -> f64 {
        self.resume_positions.get(track_id).copied().unwrap_or(0.0)
    }

    /// Progress of the current track in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Configuration for the track player
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Skip distance for seek forward/backward (default: 10s)
    pub seek_step_seconds: f64,

    /// Ordered speed ladder cycled by `cycle_playback_rate` (default: 1, 1.5, 2)
    pub rates: Vec<f32>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            seek_step_seconds: DEFAULT_SEEK_STEP_SECONDS,
            rates: DEFAULT_RATES.to_vec(),
        }
    }
}

impl PlayerConfig {
    /// Rate following `current` in the ladder, wrapping.
    ///
    /// A rate not on the ladder restarts it from the first entry.
    pub fn next_rate(&self, current: f32) -> f32 {
        if self.rates.is_empty() {
            return DEFAULT_RATES[0];
        }
        let next = self
            .rates
            .iter()
            .position(|r| (*r - current).abs() < f32::EPSILON)
            .map_or(0, |i| (i + 1) % self.rates.len());
        self.rates[next]
    }

    /// First rung of the ladder
    pub fn initial_rate(&self) -> f32 {
        self.rates.first().copied().unwrap_or(DEFAULT_RATES[0])
    }
}
