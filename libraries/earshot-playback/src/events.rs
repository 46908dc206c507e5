//! Player events
//!
//! One-shot notifications for things a snapshot cannot express on its own,
//! chiefly load failures (surfaced to the UI as a notice rather than thrown)
//! and natural track completion.

use serde::{Deserialize, Serialize};

/// Events emitted by the track player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// A different track became current
    TrackChanged {
        /// ID of the new (current) track
        track_id: String,
        /// ID of the previous track (if any)
        previous_track_id: Option<String>,
    },

    /// The engine could not load, start or seek a track; the player is
    /// back in a safe idle state
    PlaybackFailed {
        track_id: String,
        message: String,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished {
        track_id: String,
    },

    /// Speed changed
    RateChanged {
        rate: f32,
    },

    /// The player was closed
    Closed {
        track_id: String,
        position: f64,
    },
}
