//! Property-based tests for the track player
//!
//! Random sequences of taps, status reports and controls must never leave
//! more than one session alive or lose track of the rate ladder.

mod common;

use earshot_playback::{PlayerConfig, TrackPlayer};
use common::{finished, playing_at, track, FakeEngine};
use proptest::prelude::*;
use std::sync::Arc;

const IDS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone)]
enum Op {
    Play(usize),
    Tick(f64),
    Finish,
    Close,
    Cycle,
    SeekForward,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..IDS.len()).prop_map(Op::Play),
        (0.0f64..60.0).prop_map(Op::Tick),
        Just(Op::Finish),
        Just(Op::Close),
        Just(Op::Cycle),
        Just(Op::SeekForward),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    /// Property: the current track is always the most recently played one
    /// (or none after close) and only it can be playing
    #[test]
    fn single_active_track(ops in prop::collection::vec(op(), 1..40)) {
        let rt = runtime();
        let player = TrackPlayer::new(Arc::new(FakeEngine::default()), PlayerConfig::default());
        let mut expected: Option<&str> = None;

        for op in ops {
            rt.block_on(async {
                match op {
                    Op::Play(i) => {
                        player.play_track(track(IDS[i], 60.0)).await.unwrap();
                        expected = Some(IDS[i]);
                    }
                    Op::Tick(t) => player.on_status(playing_at(t, 60.0)),
                    Op::Finish => player.on_status(finished(60.0)),
                    Op::Close => {
                        player.close_player().await;
                        expected = None;
                    }
                    Op::Cycle => {
                        player.cycle_playback_rate().await;
                    }
                    Op::SeekForward => {
                        let _ = player.seek_forward().await;
                    }
                }
            });

            let snap = player.snapshot();
            prop_assert_eq!(snap.current_track_id(), expected);
            if snap.current_track.is_none() {
                prop_assert!(!snap.is_playing);
                prop_assert!(!snap.is_loading);
            }
            if snap.is_finished {
                prop_assert!(!snap.is_playing);
            }
            prop_assert!(snap.resume_positions.values().all(|p| *p >= 0.0));
            prop_assert!(snap.current_time >= 0.0);
        }
    }

    /// Property: the rate after n cycles is ladder[n % 3]
    #[test]
    fn rate_cycle_has_length_three(n in 0usize..20) {
        let rt = runtime();
        let player = TrackPlayer::new(Arc::new(FakeEngine::default()), PlayerConfig::default());
        let ladder = PlayerConfig::default().rates;

        for _ in 0..n {
            rt.block_on(player.cycle_playback_rate());
        }

        prop_assert_eq!(player.snapshot().playback_rate, ladder[n % ladder.len()]);
    }
}
