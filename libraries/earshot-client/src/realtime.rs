//! Realtime change-feed frames.
//!
//! The backend pushes row changes as `postgres_changes` frames over a
//! Phoenix-style channel. This module builds the frames the client sends
//! (join, heartbeat), decodes the frames it receives into [`TableChange`]s,
//! and drives the WebSocket that carries both.

use crate::error::{ClientError, Result};
use earshot_core::{
    types::{LIKES_TABLE, POSTS_TABLE, SAVES_TABLE},
    ChangeKind, TableChange,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

/// Event name of row-change frames
pub const POSTGRES_CHANGES: &str = "postgres_changes";

/// Tables the feed subscribes to
pub const WATCHED_TABLES: [&str; 3] = [POSTS_TABLE, LIKES_TABLE, SAVES_TABLE];

/// Channel the feed joins
pub const FEED_TOPIC: &str = "earshot-feed";

/// The server drops sockets that stay silent for longer than a minute
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// One frame on the realtime socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostgresChange {
    table: String,
    #[serde(rename = "type", alias = "eventType")]
    kind: ChangeKind,
    #[serde(default, alias = "new")]
    record: Option<Value>,
    #[serde(default, alias = "old")]
    old_record: Option<Value>,
}

/// `{}` is how the backend spells "no row"
fn non_empty(row: Option<Value>) -> Option<Value> {
    row.filter(|v| !v.as_object().is_some_and(serde_json::Map::is_empty))
}

/// WebSocket endpoint for a project URL.
pub fn socket_url(base_url: &str, anon_key: &str) -> Result<Url> {
    let mut url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|()| ClientError::InvalidUrl(format!("cannot use {scheme} for {base_url}")))?;
    url.set_path("/realtime/v1/websocket");
    url.query_pairs_mut()
        .clear()
        .append_pair("apikey", anon_key)
        .append_pair("vsn", "1.0.0");
    Ok(url)
}

/// Frame joining `topic` with row-change subscriptions on every watched table.
pub fn join_frame(topic: &str, access_token: Option<&str>, reference: &str) -> RealtimeMessage {
    let changes: Vec<Value> = WATCHED_TABLES
        .iter()
        .map(|table| json!({ "event": "*", "schema": "public", "table": table }))
        .collect();

    let mut payload = json!({
        "config": {
            "broadcast": { "self": false },
            "presence": { "key": "" },
            "postgres_changes": changes,
        }
    });
    if let Some(token) = access_token {
        payload["access_token"] = Value::String(token.to_string());
    }

    RealtimeMessage {
        topic: format!("realtime:{topic}"),
        event: "phx_join".to_string(),
        payload,
        reference: Some(reference.to_string()),
    }
}

/// Keep-alive frame.
pub fn heartbeat_frame(reference: &str) -> RealtimeMessage {
    RealtimeMessage {
        topic: "phoenix".to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

/// Decode the payload of a `postgres_changes` frame.
///
/// Accepts both the wrapped (`{"data": {...}}`) and bare forms.
pub fn decode_change(payload: &Value) -> Result<TableChange> {
    let data = payload.get("data").unwrap_or(payload);
    let change: PostgresChange = serde_json::from_value(data.clone())
        .map_err(|e| ClientError::ParseError(format!("Failed to parse row change: {}", e)))?;

    Ok(TableChange::new(
        change.table,
        change.kind,
        non_empty(change.old_record),
        non_empty(change.record),
    ))
}

/// Decode one text frame.
///
/// Frames other than row changes (replies, heartbeats, presence) yield
/// `Ok(None)`.
pub fn decode_frame(text: &str) -> Result<Option<TableChange>> {
    let message: RealtimeMessage = serde_json::from_str(text)
        .map_err(|e| ClientError::ParseError(format!("Failed to parse frame: {}", e)))?;

    if message.event != POSTGRES_CHANGES {
        debug!(event = %message.event, topic = %message.topic, "Ignoring frame");
        return Ok(None);
    }
    decode_change(&message.payload).map(Some)
}

/// Turn a stream of raw text frames into a stream of row changes.
///
/// Undecodable frames are logged and dropped. The output closes when the
/// input does.
pub fn forward_frames(
    mut frames: mpsc::Receiver<String>,
) -> (mpsc::Receiver<TableChange>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(64);
    let handle = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            match decode_frame(&frame) {
                Ok(Some(change)) => {
                    if tx.send(change).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Dropping realtime frame"),
            }
        }
    });
    (rx, handle)
}

fn text_frame(message: &RealtimeMessage) -> Result<Message> {
    serde_json::to_string(message)
        .map(Message::Text)
        .map_err(|e| ClientError::ParseError(format!("Failed to encode frame: {}", e)))
}

/// Open the realtime socket at `url`, join `topic` and stream its row
/// changes.
///
/// A background task keeps the channel alive with a heartbeat every
/// `heartbeat`. The stream ends when the server closes the socket; dropping
/// the receiver closes the socket after the next frame.
pub async fn subscribe_changes(
    url: &Url,
    topic: &str,
    access_token: Option<&str>,
    heartbeat: Duration,
) -> Result<mpsc::Receiver<TableChange>> {
    let (socket, _) = connect_async(url.as_str())
        .await
        .map_err(|e| ClientError::ServerUnreachable(format!("realtime socket: {}", e)))?;
    let (mut sink, mut stream) = socket.split();

    sink.send(text_frame(&join_frame(topic, access_token, "1"))?)
        .await
        .map_err(|e| ClientError::ServerUnreachable(format!("realtime join: {}", e)))?;
    info!(topic, "Joined realtime channel");

    let (frames_tx, frames_rx) = mpsc::channel(64);
    let (changes, _decoder) = forward_frames(frames_rx);

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + heartbeat, heartbeat);
        let mut reference: u64 = 1;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    reference += 1;
                    let frame = match text_frame(&heartbeat_frame(&reference.to_string())) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!(error = %e, "Skipping heartbeat");
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(frame).await {
                        warn!(error = %e, "Realtime heartbeat failed");
                        break;
                    }
                }
                message = stream.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        if frames_tx.send(text).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Realtime socket closed");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "Realtime socket failed");
                        break;
                    }
                },
                () = frames_tx.closed() => {
                    debug!("Change stream dropped, leaving channel");
                    break;
                }
            }
        }
        // Already closed by the peer in most cases
        let _ = sink.close().await;
    });

    Ok(changes)
}
