/// Change feed replayed from recorded realtime frames
use async_trait::async_trait;
use earshot_client::realtime::forward_frames;
use earshot_core::{CoreError, TableChange};
use earshot_feed::ChangeFeed;
use std::sync::{Mutex, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One-shot change feed over a line-delimited frame source.
///
/// Each input line is one realtime frame as it would arrive on the socket.
/// The feed can be subscribed to once; it ends when the input does.
pub struct ReplayFeed {
    changes: Mutex<Option<mpsc::Receiver<TableChange>>>,
}

impl ReplayFeed {
    /// Start reading frames from `input`.
    ///
    /// Returns the feed and the reader task, which finishes at end of input.
    pub fn spawn<R>(input: R) -> (Self, JoinHandle<usize>)
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (frames_tx, frames_rx) = mpsc::channel(64);
        let (changes, _forwarder) = forward_frames(frames_rx);

        let reader = tokio::spawn(async move {
            let mut lines = input.lines();
            let mut count = 0;
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => {
                        count += 1;
                        if frames_tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Stopped reading frames");
                        break;
                    }
                }
            }
            debug!(count, "Frame input finished");
            count
        });

        (
            Self {
                changes: Mutex::new(Some(changes)),
            },
            reader,
        )
    }
}

#[async_trait]
impl ChangeFeed for ReplayFeed {
    async fn subscribe(&self) -> earshot_core::Result<mpsc::Receiver<TableChange>> {
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| CoreError::InvalidInput("replayed frames were already consumed".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use earshot_core::ChangeKind;

    #[tokio::test]
    async fn replays_frames_once() {
        let input = concat!(
            r#"{"topic":"realtime:feed","event":"phx_reply","payload":{},"ref":"1"}"#,
            "\n\n",
            r#"{"topic":"realtime:feed","event":"postgres_changes","payload":{"data":{"table":"audio_posts","type":"DELETE","record":{},"old_record":{"id":"p1"}}}}"#,
            "\n",
        );
        let (feed, reader) = ReplayFeed::spawn(std::io::Cursor::new(input.as_bytes().to_vec()));

        let mut rx = feed.subscribe().await.unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.kind, ChangeKind::Delete);
        assert!(rx.recv().await.is_none());

        assert_eq!(reader.await.unwrap(), 2);
        assert!(feed.subscribe().await.is_err());
    }
}
