//! Track player - the single audio session
//!
//! Owns the [`PlayerSnapshot`] and issues commands to an [`AudioEngine`].
//! Every operation runs as one synchronous turn under the state lock; the
//! lock is never held across an engine call, so status reports and user
//! taps may interleave with an in-flight load.

use crate::{
    engine::{AudioEngine, StatusReceiver},
    error::{PlaybackError, Result},
    events::PlayerEvent,
    types::{EngineStatus, PlayerConfig, PlayerSnapshot},
};
use earshot_core::{Selector, Track};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What a call to [`TrackPlayer::play_track`] did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayOutcome {
    /// A new track was loaded and started from this offset
    Started { from: f64 },
    /// The current track was paused
    Paused,
    /// The current track was resumed
    Resumed,
    /// The current track had finished and was restarted from zero
    Restarted,
    /// The track is still loading; the tap was ignored
    StillLoading,
}

/// Mutable state guarded by the player lock
struct PlayerInner {
    snapshot: PlayerSnapshot,

    /// Bumped whenever the current track changes; in-flight loads compare
    /// against it after every engine call
    generation: u64,

    /// Events waiting to be drained by the UI
    pending_events: Vec<PlayerEvent>,
}

/// Single-session track player
///
/// Construct one per process (or per test) and share it behind an `Arc`.
pub struct TrackPlayer<E> {
    engine: E,
    config: PlayerConfig,
    inner: Mutex<PlayerInner>,
    tx: watch::Sender<PlayerSnapshot>,
}

impl<E: AudioEngine> TrackPlayer<E> {
    /// Create a player driving the given engine
    pub fn new(engine: E, config: PlayerConfig) -> Self {
        let snapshot = PlayerSnapshot {
            playback_rate: config.initial_rate(),
            ..PlayerSnapshot::default()
        };
        let (tx, _) = watch::channel(snapshot.clone());
        Self {
            engine,
            config,
            inner: Mutex::new(PlayerInner {
                snapshot,
                generation: 0,
                pending_events: Vec::new(),
            }),
            tx,
        }
    }

    /// The underlying engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Player configuration
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Copy of the current session state
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.lock().snapshot.clone()
    }

    /// Receive a new snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.tx.subscribe()
    }

    /// Observe whether one track is current and audible.
    ///
    /// Wakes only when that boolean flips, not on every position tick.
    pub fn watch_track_playing(
        &self,
        track_id: impl Into<String>,
    ) -> Selector<PlayerSnapshot, bool, impl Fn(&PlayerSnapshot) -> bool> {
        let track_id = track_id.into();
        Selector::new(self.subscribe(), move |s: &PlayerSnapshot| {
            s.is_track_playing(&track_id)
        })
    }

    /// Take all pending events
    pub fn drain_events(&self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.lock().pending_events)
    }

    /// Check whether events are waiting to be drained
    pub fn has_pending_events(&self) -> bool {
        !self.lock().pending_events.is_empty()
    }

    /// Play a track, or toggle the current one.
    ///
    /// Tapping the current track pauses it, resumes it, or restarts it from
    /// zero when it reached its natural end. Any other track replaces the
    /// current one and starts from its saved resume position.
    ///
    /// Engine failures reset the session to an idle state, queue a
    /// [`PlayerEvent::PlaybackFailed`] and are returned to the caller.
    pub async fn play_track(&self, track: Track) -> Result<PlayOutcome> {
        enum Step {
            Pause,
            Resume,
            Restart,
            Wait,
            Load { from: f64, generation: u64 },
        }

        let step = self.turn(|inner| {
            let s = &mut inner.snapshot;
            if s.current_track_id() == Some(track.id.as_str()) {
                if s.is_loading {
                    return Step::Wait;
                }
                if s.is_finished {
                    s.is_finished = false;
                    s.is_playing = true;
                    s.current_time = 0.0;
                    return Step::Restart;
                }
                if s.is_playing {
                    s.is_playing = false;
                    let at = s.current_time;
                    s.resume_positions.insert(track.id.clone(), at);
                    return Step::Pause;
                }
                s.is_playing = true;
                return Step::Resume;
            }

            let previous = s.current_track.take();
            if let Some(previous) = &previous {
                if s.is_finished {
                    s.resume_positions.insert(previous.id.clone(), 0.0);
                } else if s.current_time > 0.0 {
                    s.resume_positions
                        .insert(previous.id.clone(), s.current_time);
                }
            }

            let from = s.resume_position(&track.id);
            s.current_track = Some(track.clone());
            s.is_playing = true;
            s.is_finished = false;
            s.is_loading = true;
            s.current_time = from;
            s.duration = track.duration_seconds;

            inner.generation += 1;
            inner.pending_events.push(PlayerEvent::TrackChanged {
                track_id: track.id.clone(),
                previous_track_id: previous.map(|t| t.id),
            });
            Step::Load {
                from,
                generation: inner.generation,
            }
        });

        match step {
            Step::Wait => Ok(PlayOutcome::StillLoading),
            Step::Pause => {
                debug!(track_id = %track.id, "Pausing");
                if let Err(e) = self.engine.pause().await {
                    warn!(track_id = %track.id, error = %e, "Engine failed to pause");
                }
                Ok(PlayOutcome::Paused)
            }
            Step::Resume => {
                debug!(track_id = %track.id, "Resuming");
                match self.engine.play().await {
                    Ok(()) => Ok(PlayOutcome::Resumed),
                    Err(e) => Err(self.fail_current(&track.id, e)),
                }
            }
            Step::Restart => {
                debug!(track_id = %track.id, "Restarting finished track");
                let restart = async {
                    self.engine.seek_to(0.0).await?;
                    self.engine.play().await
                };
                match restart.await {
                    Ok(()) => Ok(PlayOutcome::Restarted),
                    Err(e) => Err(self.fail_current(&track.id, e)),
                }
            }
            Step::Load { from, generation } => {
                info!(track_id = %track.id, from, "Loading track");
                match self.load_and_play(&track, from, generation).await {
                    Ok(()) => Ok(PlayOutcome::Started { from }),
                    Err(PlaybackError::Superseded) => {
                        debug!(track_id = %track.id, "Load superseded");
                        Err(PlaybackError::Superseded)
                    }
                    Err(e) => Err(self.fail_load(&track.id, generation, e).await),
                }
            }
        }
    }

    async fn load_and_play(&self, track: &Track, from: f64, generation: u64) -> Result<()> {
        self.engine.load(&track.audio_url).await?;
        self.ensure_generation(generation)?;

        if from > 0.0 {
            self.engine.seek_to(from).await?;
            self.ensure_generation(generation)?;
        }

        self.engine.play().await?;
        self.ensure_generation(generation)?;

        // The track is audible from here on; a rejected rate must not drop it
        let rate = self.lock().snapshot.playback_rate;
        if let Err(e) = self.engine.set_playback_rate(rate, true).await {
            warn!(track_id = %track.id, rate, error = %e, "Engine rejected playback rate");
        }
        Ok(())
    }

    fn ensure_generation(&self, generation: u64) -> Result<()> {
        if self.lock().generation == generation {
            Ok(())
        } else {
            Err(PlaybackError::Superseded)
        }
    }

    /// A load failed: silence the engine and drop the track so a retry loads
    /// it again
    async fn fail_load(&self, track_id: &str, generation: u64, error: PlaybackError) -> PlaybackError {
        warn!(track_id, error = %error, "Failed to load and play track");
        if let Err(e) = self.ensure_generation(generation) {
            return e;
        }

        // No track will be current, so nothing may keep sounding
        if let Err(e) = self.engine.pause().await {
            warn!(track_id, error = %e, "Engine failed to pause after failed load");
        }

        self.turn(|inner| {
            if inner.generation != generation {
                return;
            }
            let s = &mut inner.snapshot;
            s.current_track = None;
            s.is_playing = false;
            s.is_loading = false;
            inner.pending_events.push(PlayerEvent::PlaybackFailed {
                track_id: track_id.to_owned(),
                message: error.to_string(),
            });
        });
        error
    }

    /// A command on the loaded track failed: stop, but keep it current
    fn fail_current(&self, track_id: &str, error: PlaybackError) -> PlaybackError {
        warn!(track_id, error = %error, "Playback command failed");
        self.turn(|inner| {
            if inner.snapshot.current_track_id() != Some(track_id) {
                return;
            }
            inner.snapshot.is_playing = false;
            inner.snapshot.is_loading = false;
            inner.pending_events.push(PlayerEvent::PlaybackFailed {
                track_id: track_id.to_owned(),
                message: error.to_string(),
            });
        });
        error
    }

    /// Stop and forget the current track.
    ///
    /// Returns `false` when nothing was loaded.
    pub async fn close_player(&self) -> bool {
        let closed = self.turn(|inner| {
            let s = &mut inner.snapshot;
            let track = s.current_track.take()?;
            let position = if s.is_finished { 0.0 } else { s.current_time };
            s.resume_positions.insert(track.id.clone(), position);
            s.is_playing = false;
            s.is_loading = false;
            s.is_finished = false;
            s.current_time = 0.0;
            s.duration = 0.0;

            inner.generation += 1;
            inner.pending_events.push(PlayerEvent::Closed {
                track_id: track.id.clone(),
                position,
            });
            Some(track)
        });

        let Some(track) = closed else {
            return false;
        };
        info!(track_id = %track.id, "Closed player");
        if let Err(e) = self.engine.pause().await {
            warn!(track_id = %track.id, error = %e, "Engine failed to pause on close");
        }
        true
    }

    /// Close the player if the current track plays `audio_url`.
    ///
    /// Used when the underlying file is about to disappear (a discarded
    /// recording, a deleted post).
    pub async fn close_if_playing_url(&self, audio_url: &str) -> bool {
        let matches = self
            .lock()
            .snapshot
            .current_track
            .as_ref()
            .is_some_and(|t| t.audio_url == audio_url);
        matches && self.close_player().await
    }

    /// Close the player if `track_id` is current
    pub async fn close_if_current(&self, track_id: &str) -> bool {
        let matches = self.lock().snapshot.current_track_id() == Some(track_id);
        matches && self.close_player().await
    }

    /// Skip forward by the configured step
    pub async fn seek_forward(&self) -> Result<f64> {
        let step = self.config.seek_step_seconds;
        self.seek_with(|now| now + step).await
    }

    /// Skip backward by the configured step
    pub async fn seek_backward(&self) -> Result<f64> {
        let step = self.config.seek_step_seconds;
        self.seek_with(|now| now - step).await
    }

    /// Seek to `seconds`, clamped to `[0, duration]`.
    ///
    /// The new position is published before the engine confirms it.
    pub async fn seek_to(&self, seconds: f64) -> Result<f64> {
        self.seek_with(|_| seconds).await
    }

    /// Seek to a target derived from the current position in the same turn
    async fn seek_with(&self, target_from: impl FnOnce(f64) -> f64) -> Result<f64> {
        let (track_id, target) = self.turn(|inner| {
            let s = &mut inner.snapshot;
            let track_id = s.current_track_id()?.to_owned();
            let target = clamp_position(target_from(s.current_time), s.duration);
            s.current_time = target;
            Some((track_id, target))
        })
        .ok_or(PlaybackError::NoTrackLoaded)?;

        debug!(track_id = %track_id, target, "Seeking");
        self.engine
            .seek_to(target)
            .await
            .map_err(|e| self.fail_current(&track_id, e))?;
        Ok(target)
    }

    /// Advance to the next rate on the ladder and apply it with pitch
    /// correction. Returns the new rate.
    pub async fn cycle_playback_rate(&self) -> f32 {
        let rate = self.turn(|inner| {
            let rate = self.config.next_rate(inner.snapshot.playback_rate);
            inner.snapshot.playback_rate = rate;
            inner.pending_events.push(PlayerEvent::RateChanged { rate });
            rate
        });

        debug!(rate, "Playback rate changed");
        if let Err(e) = self.engine.set_playback_rate(rate, true).await {
            // Re-applied on the next load
            warn!(rate, error = %e, "Engine rejected playback rate");
        }
        rate
    }

    /// Mirror a status report from the engine.
    ///
    /// While a load is in flight only the transition to "playing" is
    /// honoured (it ends the load).
    pub fn on_status(&self, status: EngineStatus) {
        self.turn(|inner| {
            let s = &mut inner.snapshot;
            let Some(track_id) = s.current_track_id().map(str::to_owned) else {
                return;
            };

            if s.is_loading {
                if status.playing {
                    s.is_loading = false;
                }
                return;
            }

            s.is_playing = status.playing;
            if status.playing {
                s.is_finished = false;
            }
            s.current_time = status.current_time.max(0.0);
            if status.duration > 0.0 {
                s.duration = status.duration;
            }

            if status.did_just_finish && !s.is_finished {
                s.is_playing = false;
                s.is_finished = true;
                s.resume_positions.insert(track_id.clone(), 0.0);
                inner
                    .pending_events
                    .push(PlayerEvent::TrackFinished { track_id });
            }
        });
    }

    /// Feed engine status reports into the player until the stream ends
    pub fn spawn_status_listener(self: Arc<Self>, mut rx: StatusReceiver) -> JoinHandle<()>
    where
        E: 'static,
    {
        tokio::spawn(async move {
            while let Some(status) = rx.recv().await {
                self.on_status(status);
            }
            debug!("Engine status stream ended");
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PlayerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one state transition and publish the result
    fn turn<R>(&self, f: impl FnOnce(&mut PlayerInner) -> R) -> R {
        let mut inner = self.lock();
        let out = f(&mut inner);
        let snapshot = &inner.snapshot;
        self.tx.send_if_modified(|published| {
            if *published == *snapshot {
                false
            } else {
                published.clone_from(snapshot);
                true
            }
        });
        out
    }
}

fn clamp_position(seconds: f64, duration: f64) -> f64 {
    if seconds.is_nan() {
        return 0.0;
    }
    seconds.min(duration.max(0.0)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_positions() {
        assert_eq!(clamp_position(-3.0, 60.0), 0.0);
        assert_eq!(clamp_position(30.0, 60.0), 30.0);
        assert_eq!(clamp_position(90.0, 60.0), 60.0);
        assert_eq!(clamp_position(5.0, 0.0), 0.0);
        assert_eq!(clamp_position(f64::NAN, 60.0), 0.0);
    }
}
