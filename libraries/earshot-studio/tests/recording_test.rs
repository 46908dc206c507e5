//! Recording session lifecycle

mod common;

use common::{silent_player, FakeMic};
use earshot_core::Track;
use earshot_playback::PlayOutcome;
use earshot_studio::{RecordingSession, RecordingStatus, StudioError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

const CLIP: &str = "file:///data/cache/rec-1.m4a";

fn session(mic: &Arc<FakeMic>) -> RecordingSession<Arc<FakeMic>, common::SilentEngine> {
    RecordingSession::new(Arc::clone(mic), silent_player())
}

#[tokio::test(start_paused = true)]
async fn elapsed_seconds_tick_while_recording() {
    let mic = Arc::new(FakeMic::new(CLIP));
    let session = session(&mic);

    session.start().await.unwrap();
    assert_eq!(session.snapshot().status, RecordingStatus::Recording);

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(session.snapshot().elapsed_seconds, 3);

    let uri = session.stop().await.unwrap();
    assert_eq!(uri, CLIP);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, RecordingStatus::Reviewing);
    assert_eq!(snapshot.local_uri.as_deref(), Some(CLIP));
    assert_eq!(snapshot.elapsed_label(), "0:03");

    // Ticker is gone once stopped
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(session.snapshot().elapsed_seconds, 3);

    assert_eq!(mic.calls(), vec!["permission", "prepare", "record", "stop"]);
}

#[tokio::test]
async fn permission_is_asked_once_when_granted() {
    let mic = Arc::new(FakeMic::new(CLIP));
    let session = session(&mic);

    assert!(session.ensure_permission().await);
    assert!(session.ensure_permission().await);
    assert_eq!(mic.calls(), vec!["permission"]);
}

#[tokio::test]
async fn denied_permission_keeps_session_idle() {
    let mic = Arc::new(FakeMic::new(CLIP));
    mic.granted.store(false, Ordering::SeqCst);
    let session = session(&mic);

    let err = session.start().await.unwrap_err();
    assert!(matches!(err, StudioError::PermissionDenied));
    assert_eq!(session.snapshot().status, RecordingStatus::Idle);
    assert_eq!(mic.calls(), vec!["permission"]);
}

#[tokio::test]
async fn device_failure_resets_to_idle() {
    let mic = Arc::new(FakeMic::new(CLIP));
    mic.fail_prepare.store(true, Ordering::SeqCst);
    let session = session(&mic);

    assert!(matches!(
        session.start().await,
        Err(StudioError::Microphone(_))
    ));
    assert_eq!(session.snapshot().status, RecordingStatus::Idle);
}

#[tokio::test]
async fn start_is_rejected_outside_idle() {
    let mic = Arc::new(FakeMic::new(CLIP));
    let session = session(&mic);

    session.start().await.unwrap();
    assert!(matches!(
        session.start().await,
        Err(StudioError::AlreadyRecording)
    ));

    session.stop().await.unwrap();
    assert!(matches!(
        session.start().await,
        Err(StudioError::RecordingPending)
    ));
}

#[tokio::test]
async fn stop_without_capture() {
    let mic = Arc::new(FakeMic::new(CLIP));
    let session = session(&mic);

    assert!(matches!(session.stop().await, Err(StudioError::NotRecording)));
}

#[tokio::test]
async fn stop_without_file_returns_to_idle() {
    let mic = Arc::new(FakeMic::new(CLIP));
    mic.set_next_uri(None);
    let session = session(&mic);

    session.start().await.unwrap();
    assert!(matches!(session.stop().await, Err(StudioError::NoRecording)));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, RecordingStatus::Idle);
    assert!(!snapshot.has_recording());
}

#[tokio::test]
async fn toggle_walks_the_record_button() {
    let mic = Arc::new(FakeMic::new(CLIP));
    let session = session(&mic);

    assert_eq!(session.toggle().await.unwrap(), RecordingStatus::Recording);
    assert_eq!(session.toggle().await.unwrap(), RecordingStatus::Reviewing);

    // Record again: discard then start
    mic.set_next_uri(Some("file:///data/cache/rec-2.m4a"));
    assert_eq!(session.toggle().await.unwrap(), RecordingStatus::Recording);
    assert!(!session.snapshot().has_recording());

    session.toggle().await.unwrap();
    assert_eq!(
        session.snapshot().local_uri.as_deref(),
        Some("file:///data/cache/rec-2.m4a")
    );
}

#[tokio::test]
async fn discard_closes_the_preview_of_that_clip() {
    let mic = Arc::new(FakeMic::new(CLIP));
    let player = silent_player();
    let session = RecordingSession::new(Arc::clone(&mic), Arc::clone(&player));

    session.start().await.unwrap();
    session.stop().await.unwrap();

    let outcome = session.toggle_preview("Draft", "me").await.unwrap();
    assert!(matches!(outcome, PlayOutcome::Started { .. }));
    assert_eq!(
        player.snapshot().current_track.map(|t| t.audio_url),
        Some(CLIP.to_string())
    );

    assert!(session.discard().await);
    assert!(player.snapshot().current_track.is_none());
    assert_eq!(session.snapshot().status, RecordingStatus::Idle);
}

#[tokio::test]
async fn discard_leaves_other_tracks_playing() {
    let mic = Arc::new(FakeMic::new(CLIP));
    let player = silent_player();
    let session = RecordingSession::new(Arc::clone(&mic), Arc::clone(&player));

    session.start().await.unwrap();
    session.stop().await.unwrap();

    player
        .play_track(Track::new("p1", "Post", "ana", "https://storage.test/p1.m4a", 30.0))
        .await
        .unwrap();

    assert!(session.discard().await);
    assert_eq!(player.snapshot().current_track_id(), Some("p1"));
}

#[tokio::test]
async fn discard_while_recording_stops_the_device() {
    let mic = Arc::new(FakeMic::new(CLIP));
    let session = session(&mic);

    session.start().await.unwrap();
    assert!(session.discard().await);

    assert_eq!(mic.calls().last(), Some(&"stop"));
    assert_eq!(session.snapshot().status, RecordingStatus::Idle);
    assert!(!session.discard().await);
}

#[tokio::test]
async fn preview_only_while_reviewing() {
    let mic = Arc::new(FakeMic::new(CLIP));
    let session = session(&mic);

    assert!(session.preview_track("Draft", "me").is_none());
    assert!(matches!(
        session.toggle_preview("Draft", "me").await,
        Err(StudioError::NoRecording)
    ));

    session.start().await.unwrap();
    session.stop().await.unwrap();

    let track = session.preview_track("Draft", "me").unwrap();
    assert_eq!(track.id, CLIP);
    assert_eq!(track.audio_url, CLIP);
    assert_eq!(track.title, "Draft");
}

#[tokio::test]
async fn subscribers_see_status_changes() {
    let mic = Arc::new(FakeMic::new(CLIP));
    let session = session(&mic);
    let mut rx = session.subscribe();

    session.start().await.unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_recording());
}
