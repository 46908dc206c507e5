//! Session supervisor
//!
//! Drives the feed from authentication events: a session starts live sync
//! (once) and loads the feed; signing out tears live sync down, forgets the
//! viewer's flags and closes the player.

use crate::{error::Result, live::ChangeFeed, manager::FeedManager, state::FeedPhase};
use earshot_core::AuthEvent;
use earshot_playback::{AudioEngine, TrackPlayer};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct SessionSupervisor<E> {
    feed: Arc<FeedManager>,
    changes: Arc<dyn ChangeFeed>,
    player: Arc<TrackPlayer<E>>,
    live: Mutex<Option<JoinHandle<()>>>,
}

impl<E: AudioEngine + 'static> SessionSupervisor<E> {
    pub fn new(
        feed: Arc<FeedManager>,
        changes: Arc<dyn ChangeFeed>,
        player: Arc<TrackPlayer<E>>,
    ) -> Self {
        Self {
            feed,
            changes,
            player,
            live: Mutex::new(None),
        }
    }

    /// Whether a live sync task is running
    pub fn is_live(&self) -> bool {
        self.live_slot().as_ref().is_some_and(|h| !h.is_finished())
    }

    /// React to one authentication event
    pub async fn handle(&self, event: AuthEvent) -> Result<()> {
        info!(?event, "Auth state changed");
        match event {
            AuthEvent::SignedOut => {
                self.stop_live_sync();
                self.feed.sign_out();
                self.player.close_player().await;
                Ok(())
            }
            AuthEvent::TokenRefreshed(_) => self.ensure_live_sync().await,
            AuthEvent::InitialSession(_) | AuthEvent::SignedIn(_) => {
                self.feed.set_viewer(event.session_user().cloned());
                if let Err(e) = self.ensure_live_sync().await {
                    warn!(error = %e, "Live sync unavailable");
                }
                let loaded = if self.feed.phase() == FeedPhase::Empty {
                    self.feed.load_initial().await
                } else {
                    self.feed.refresh().await
                };
                loaded.map(|_| ())
            }
        }
    }

    /// Handle events from `rx` until it closes, then stop live sync
    pub fn run(self: Arc<Self>, mut rx: mpsc::Receiver<AuthEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = self.handle(event).await {
                    warn!(error = %e, "Auth event handling failed");
                }
            }
            self.shutdown();
        })
    }

    /// Stop live sync
    pub fn shutdown(&self) {
        self.stop_live_sync();
    }

    async fn ensure_live_sync(&self) -> Result<()> {
        if self.is_live() {
            return Ok(());
        }
        let rx = self.changes.subscribe().await?;
        let handle = self.feed.clone().spawn_live_sync(rx);

        let mut slot = self.live_slot();
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
        Ok(())
    }

    fn stop_live_sync(&self) {
        if let Some(handle) = self.live_slot().take() {
            handle.abort();
            info!("Live sync torn down");
        }
    }

    fn live_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
