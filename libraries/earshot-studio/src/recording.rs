//! Recording session
//!
//! Drives the capture device through `idle -> recording -> reviewing` and
//! back. While recording, a ticker task counts elapsed whole seconds. A
//! reviewed clip can be previewed through the shared player; discarding it
//! closes the player if that preview is what is loaded.

use crate::error::{Result, StudioError};
use crate::microphone::Microphone;
use earshot_core::{format::format_duration, Track};
use earshot_playback::{AudioEngine, PlayOutcome, TrackPlayer};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Elapsed-time resolution
const TICK: Duration = Duration::from_secs(1);

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordingStatus {
    #[default]
    Idle,
    Recording,
    /// A finished clip waits to be posted or discarded
    Reviewing,
}

/// Observable session state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSnapshot {
    pub status: RecordingStatus,
    /// Locator of the finished clip, set while reviewing
    pub local_uri: Option<String>,
    pub elapsed_seconds: u32,
}

impl RecordingSnapshot {
    pub fn is_recording(&self) -> bool {
        self.status == RecordingStatus::Recording
    }

    pub fn has_recording(&self) -> bool {
        self.local_uri.is_some()
    }

    /// Elapsed time as `m:ss`
    pub fn elapsed_label(&self) -> String {
        format_duration(f64::from(self.elapsed_seconds))
    }
}

struct RecordingInner {
    snapshot: RecordingSnapshot,
    /// Bumped on every start and discard; stale tickers stop on mismatch
    epoch: u64,
    ticker: Option<JoinHandle<()>>,
    permission_granted: bool,
}

/// Lock plus publisher, shared with the ticker task
struct SessionState {
    inner: Mutex<RecordingInner>,
    tx: watch::Sender<RecordingSnapshot>,
}

impl SessionState {
    fn lock(&self) -> MutexGuard<'_, RecordingInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn turn<R>(&self, f: impl FnOnce(&mut RecordingInner) -> R) -> R {
        let mut inner = self.lock();
        let out = f(&mut inner);
        let next = inner.snapshot.clone();
        self.tx.send_if_modified(|published| {
            if *published == next {
                false
            } else {
                *published = next;
                true
            }
        });
        out
    }
}

/// One local capture at a time
pub struct RecordingSession<M, E> {
    mic: M,
    player: Arc<TrackPlayer<E>>,
    state: Arc<SessionState>,
}

impl<M: Microphone, E: AudioEngine> RecordingSession<M, E> {
    pub fn new(mic: M, player: Arc<TrackPlayer<E>>) -> Self {
        let (tx, _) = watch::channel(RecordingSnapshot::default());
        Self {
            mic,
            player,
            state: Arc::new(SessionState {
                inner: Mutex::new(RecordingInner {
                    snapshot: RecordingSnapshot::default(),
                    epoch: 0,
                    ticker: None,
                    permission_granted: false,
                }),
                tx,
            }),
        }
    }

    pub fn snapshot(&self) -> RecordingSnapshot {
        self.state.lock().snapshot.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RecordingSnapshot> {
        self.state.tx.subscribe()
    }

    pub fn microphone(&self) -> &M {
        &self.mic
    }

    /// Ask for capture permission unless it was already granted.
    pub async fn ensure_permission(&self) -> bool {
        if self.state.lock().permission_granted {
            return true;
        }
        let granted = self.mic.request_permission().await;
        if granted {
            self.state.lock().permission_granted = true;
        } else {
            warn!("Microphone permission denied");
        }
        granted
    }

    /// Start a new capture from `idle`.
    pub async fn start(&self) -> Result<()> {
        let epoch = self.state.turn(|inner| match inner.snapshot.status {
            RecordingStatus::Recording => Err(StudioError::AlreadyRecording),
            RecordingStatus::Reviewing => Err(StudioError::RecordingPending),
            RecordingStatus::Idle => {
                inner.epoch += 1;
                inner.snapshot = RecordingSnapshot {
                    status: RecordingStatus::Recording,
                    local_uri: None,
                    elapsed_seconds: 0,
                };
                Ok(inner.epoch)
            }
        })?;

        if let Err(e) = self.arm().await {
            warn!(error = %e, "Failed to start recording");
            self.state.turn(|inner| {
                if inner.epoch == epoch {
                    inner.snapshot = RecordingSnapshot::default();
                }
            });
            return Err(e);
        }

        let ticker = spawn_ticker(Arc::clone(&self.state), epoch);
        let stale = self.state.turn(|inner| {
            if inner.epoch == epoch {
                inner.ticker.replace(ticker)
            } else {
                // Discarded while the device was arming
                Some(ticker)
            }
        });
        if let Some(stale) = stale {
            stale.abort();
        }

        info!("Recording started");
        Ok(())
    }

    async fn arm(&self) -> Result<()> {
        if !self.ensure_permission().await {
            return Err(StudioError::PermissionDenied);
        }
        self.mic.prepare_to_record().await?;
        self.mic.record().await
    }

    /// Stop the running capture and move to `reviewing`.
    ///
    /// Returns the clip locator. A device that wrote nothing leaves the
    /// session `idle` with [`StudioError::NoRecording`].
    pub async fn stop(&self) -> Result<String> {
        let ticker = self.state.turn(|inner| {
            if inner.snapshot.status == RecordingStatus::Recording {
                Ok(inner.ticker.take())
            } else {
                Err(StudioError::NotRecording)
            }
        })?;
        if let Some(ticker) = ticker {
            ticker.abort();
        }

        let stopped = self.mic.stop().await;
        self.state.turn(|inner| match stopped {
            Ok(Some(uri)) => {
                inner.snapshot.status = RecordingStatus::Reviewing;
                inner.snapshot.local_uri = Some(uri.clone());
                info!(uri = %uri, elapsed = inner.snapshot.elapsed_seconds, "Recording stopped");
                Ok(uri)
            }
            Ok(None) => {
                warn!("No recording URI after stopping");
                inner.snapshot = RecordingSnapshot::default();
                Err(StudioError::NoRecording)
            }
            Err(e) => {
                warn!(error = %e, "Failed to stop recording");
                inner.snapshot = RecordingSnapshot::default();
                Err(e)
            }
        })
    }

    /// Throw away the running capture or the clip under review.
    ///
    /// Returns `false` when there was nothing to discard.
    pub async fn discard(&self) -> bool {
        let (was_recording, uri, ticker) = self.state.turn(|inner| {
            let was_recording = inner.snapshot.is_recording();
            let uri = inner.snapshot.local_uri.take();
            inner.epoch += 1;
            inner.snapshot = RecordingSnapshot::default();
            (was_recording, uri, inner.ticker.take())
        });
        if let Some(ticker) = ticker {
            ticker.abort();
        }

        if was_recording {
            if let Err(e) = self.mic.stop().await {
                warn!(error = %e, "Failed to stop discarded capture");
            }
        }

        if let Some(uri) = &uri {
            if self.player.close_if_playing_url(uri).await {
                debug!(uri = %uri, "Closed preview of discarded recording");
            }
            info!(uri = %uri, "Recording discarded");
        }

        was_recording || uri.is_some()
    }

    /// Discard the clip under review and immediately record a new one.
    pub async fn record_again(&self) -> Result<()> {
        self.discard().await;
        self.start().await
    }

    /// The single record button: start, stop, or record again.
    ///
    /// Returns the status after the action.
    pub async fn toggle(&self) -> Result<RecordingStatus> {
        match self.snapshot().status {
            RecordingStatus::Idle => self.start().await?,
            RecordingStatus::Recording => {
                self.stop().await?;
            }
            RecordingStatus::Reviewing => self.record_again().await?,
        }
        Ok(self.snapshot().status)
    }

    /// Forget the clip after it was posted. The file stays playable.
    pub fn reset(&self) {
        let ticker = self.state.turn(|inner| {
            inner.epoch += 1;
            inner.snapshot = RecordingSnapshot::default();
            inner.ticker.take()
        });
        if let Some(ticker) = ticker {
            ticker.abort();
        }
    }

    /// Playable projection of the clip under review.
    ///
    /// The locator doubles as the track id so previews never share a resume
    /// position with a feed post.
    pub fn preview_track(&self, title: &str, username: &str) -> Option<Track> {
        let snapshot = self.snapshot();
        if snapshot.status != RecordingStatus::Reviewing {
            return None;
        }
        let uri = snapshot.local_uri?;
        Some(Track::new(
            uri.clone(),
            title,
            username,
            uri,
            f64::from(snapshot.elapsed_seconds),
        ))
    }

    /// Play or pause the clip under review through the shared player.
    pub async fn toggle_preview(&self, title: &str, username: &str) -> Result<PlayOutcome> {
        let track = self
            .preview_track(title, username)
            .ok_or(StudioError::NoRecording)?;
        Ok(self.player.play_track(track).await?)
    }
}

impl<M, E> Drop for RecordingSession<M, E> {
    fn drop(&mut self) {
        if let Some(ticker) = self.state.lock().ticker.take() {
            ticker.abort();
        }
    }
}

fn spawn_ticker(state: Arc<SessionState>, epoch: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let live = state.turn(|inner| {
                if inner.epoch != epoch || !inner.snapshot.is_recording() {
                    return false;
                }
                inner.snapshot.elapsed_seconds += 1;
                true
            });
            if !live {
                break;
            }
        }
    })
}
