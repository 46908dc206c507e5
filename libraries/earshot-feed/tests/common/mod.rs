//! In-memory backend shared by the feed integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use earshot_core::{
    AuthProvider, CoreError, NewPost, ObjectStorage, PostId, PostRow, PostStore, Relation,
    Result, TableChange, UserId,
};
use earshot_feed::{ChangeFeed, FeedConfig, FeedManager};
use earshot_playback::{AudioEngine, PlayerConfig, TrackPlayer};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

pub fn row(id: &str, username: &str, like_count: u32) -> PostRow {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "title": format!("Post {id}"),
        "duration_seconds": 30,
        "audio_file_storage_path": format!("u1/{id}.m4a"),
        "like_count": like_count,
        "comment_count": 0,
        "listen_count": 0,
        "profiles": { "username": username },
        "audio_post_categories": [{ "category_id": "general" }],
    }))
    .unwrap()
}

#[derive(Default)]
pub struct FakeStore {
    rows: Mutex<Vec<PostRow>>,
    edges: Mutex<HashSet<(Relation, UserId, PostId)>>,
    pub fail_lists: AtomicBool,
    pub fail_writes: AtomicBool,
    stall_next_list: AtomicBool,
    stall_writes: AtomicBool,
    gate: Notify,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
    pub relation_queries: AtomicUsize,
}

impl FakeStore {
    pub fn with_rows(rows: Vec<PostRow>) -> Self {
        let store = Self::default();
        store.set_rows(rows);
        store
    }

    pub fn set_rows(&self, rows: Vec<PostRow>) {
        *self.rows.lock().unwrap() = rows;
    }

    pub fn add_edge(&self, relation: Relation, user: &str, post: &str) {
        self.edges
            .lock()
            .unwrap()
            .insert((relation, UserId::new(user), PostId::new(post)));
    }

    pub fn has_edge(&self, relation: Relation, user: &str, post: &str) -> bool {
        self.edges
            .lock()
            .unwrap()
            .contains(&(relation, UserId::new(user), PostId::new(post)))
    }

    /// The next `list_posts` call waits for `release`
    pub fn stall_next_list(&self) {
        self.stall_next_list.store(true, Ordering::SeqCst);
    }

    /// Relation writes wait for `release`
    pub fn stall_writes(&self) {
        self.stall_writes.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    async fn write(&self) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.stall_writes.swap(false, Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::network("connection reset"));
        }
        Ok(())
    }
}

#[async_trait]
impl PostStore for FakeStore {
    async fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().unwrap().clone();
        if self.stall_next_list.swap(false, Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(CoreError::network("timed out"));
        }
        Ok(rows)
    }

    async fn get_post(&self, id: &PostId) -> Result<Option<PostRow>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().unwrap().iter().find(|r| &r.id == id).cloned())
    }

    async fn relation_post_ids(&self, relation: Relation, user: &UserId) -> Result<Vec<PostId>> {
        self.relation_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .edges
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, u, _)| *r == relation && u == user)
            .map(|(_, _, p)| p.clone())
            .collect())
    }

    async fn insert_relation(&self, relation: Relation, user: &UserId, post: &PostId) -> Result<()> {
        self.write().await?;
        self.edges
            .lock()
            .unwrap()
            .insert((relation, user.clone(), post.clone()));
        Ok(())
    }

    async fn delete_relation(&self, relation: Relation, user: &UserId, post: &PostId) -> Result<()> {
        self.write().await?;
        self.edges
            .lock()
            .unwrap()
            .remove(&(relation, user.clone(), post.clone()));
        Ok(())
    }

    async fn delete_post(&self, id: &PostId) -> Result<()> {
        self.rows.lock().unwrap().retain(|r| &r.id != id);
        Ok(())
    }

    async fn create_post_with_categories(&self, _post: &NewPost) -> Result<()> {
        Ok(())
    }
}

pub struct FakeStorage;

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(&self, path: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        Ok(path.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://storage.test/{path}")
    }

    async fn remove(&self, _paths: &[String]) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAuth {
    user: Mutex<Option<UserId>>,
}

impl FakeAuth {
    pub fn signed_in(user: &str) -> Self {
        Self {
            user: Mutex::new(Some(UserId::new(user))),
        }
    }

    pub fn set(&self, user: Option<&str>) {
        *self.user.lock().unwrap() = user.map(UserId::new);
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn current_user(&self) -> Option<UserId> {
        self.user.lock().unwrap().clone()
    }
}

/// Change feed handing out one channel per subscription
#[derive(Default)]
pub struct FakeChangeFeed {
    sender: Mutex<Option<mpsc::Sender<TableChange>>>,
    pub subscriptions: AtomicUsize,
}

impl FakeChangeFeed {
    pub fn sender(&self) -> Option<mpsc::Sender<TableChange>> {
        self.sender.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChangeFeed for FakeChangeFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<TableChange>> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(32);
        *self.sender.lock().unwrap() = Some(tx);
        Ok(rx)
    }
}

/// Engine that accepts every command
pub struct SilentEngine;

#[async_trait]
impl AudioEngine for SilentEngine {
    async fn load(&self, _url: &str) -> earshot_playback::Result<()> {
        Ok(())
    }

    async fn play(&self) -> earshot_playback::Result<()> {
        Ok(())
    }

    async fn pause(&self) -> earshot_playback::Result<()> {
        Ok(())
    }

    async fn seek_to(&self, _seconds: f64) -> earshot_playback::Result<()> {
        Ok(())
    }

    async fn set_playback_rate(&self, _rate: f32, _correct_pitch: bool) -> earshot_playback::Result<()> {
        Ok(())
    }
}

pub fn silent_player() -> Arc<TrackPlayer<SilentEngine>> {
    Arc::new(TrackPlayer::new(SilentEngine, PlayerConfig::default()))
}

pub struct Harness {
    pub feed: Arc<FeedManager>,
    pub store: Arc<FakeStore>,
    pub auth: Arc<FakeAuth>,
}

pub fn harness(store: FakeStore, auth: FakeAuth) -> Harness {
    let store = Arc::new(store);
    let auth = Arc::new(auth);
    let feed = Arc::new(FeedManager::new(
        store.clone(),
        Arc::new(FakeStorage),
        auth.clone(),
        FeedConfig::default(),
    ));
    Harness { feed, store, auth }
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    while !condition() {
        tokio::task::yield_now().await;
    }
}
