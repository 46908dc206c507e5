//! Fakes shared by the studio integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use earshot_core::{
    AuthProvider, Category, CategoryId, CategoryStore, CoreError, NewPost, ObjectStorage, PostId,
    PostRow, PostStore, Profile, ProfileStore, Relation, Result, UserId,
};
use earshot_playback::{AudioEngine, PlayerConfig, TrackPlayer};
use earshot_studio::{Microphone, StudioError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted capture device
pub struct FakeMic {
    pub granted: AtomicBool,
    pub fail_prepare: AtomicBool,
    next_uri: Mutex<Option<String>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeMic {
    pub fn new(uri: &str) -> Self {
        Self {
            granted: AtomicBool::new(true),
            fail_prepare: AtomicBool::new(false),
            next_uri: Mutex::new(Some(uri.to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_next_uri(&self, uri: Option<&str>) {
        *self.next_uri.lock().unwrap() = uri.map(str::to_string);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Microphone for FakeMic {
    async fn request_permission(&self) -> bool {
        self.log("permission");
        self.granted.load(Ordering::SeqCst)
    }

    async fn prepare_to_record(&self) -> earshot_studio::Result<()> {
        self.log("prepare");
        if self.fail_prepare.load(Ordering::SeqCst) {
            return Err(StudioError::microphone("device busy"));
        }
        Ok(())
    }

    async fn record(&self) -> earshot_studio::Result<()> {
        self.log("record");
        Ok(())
    }

    async fn stop(&self) -> earshot_studio::Result<Option<String>> {
        self.log("stop");
        Ok(self.next_uri.lock().unwrap().clone())
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

pub fn row(id: &str, path: &str) -> PostRow {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "title": format!("Post {id}"),
        "duration_seconds": 12,
        "audio_file_storage_path": path,
        "profiles": { "username": "ana" },
        "audio_post_categories": [],
    }))
    .unwrap()
}

/// Post store that records what was created and deleted
#[derive(Default)]
pub struct FakeStore {
    pub rows: Mutex<Vec<PostRow>>,
    pub created: Mutex<Vec<NewPost>>,
    pub deleted: Mutex<Vec<PostId>>,
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
}

#[async_trait]
impl PostStore for FakeStore {
    async fn list_posts(&self) -> Result<Vec<PostRow>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn get_post(&self, id: &PostId) -> Result<Option<PostRow>> {
        Ok(self.rows.lock().unwrap().iter().find(|r| &r.id == id).cloned())
    }

    async fn relation_post_ids(&self, _relation: Relation, _user: &UserId) -> Result<Vec<PostId>> {
        Ok(Vec::new())
    }

    async fn insert_relation(&self, _relation: Relation, _user: &UserId, _post: &PostId) -> Result<()> {
        Ok(())
    }

    async fn delete_relation(&self, _relation: Relation, _user: &UserId, _post: &PostId) -> Result<()> {
        Ok(())
    }

    async fn delete_post(&self, id: &PostId) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(CoreError::Backend {
                status: 403,
                message: "not the owner".into(),
            });
        }
        self.rows.lock().unwrap().retain(|r| &r.id != id);
        self.deleted.lock().unwrap().push(id.clone());
        Ok(())
    }

    async fn create_post_with_categories(&self, post: &NewPost) -> Result<()> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(CoreError::Backend {
                status: 400,
                message: "category does not exist".into(),
            });
        }
        self.created.lock().unwrap().push(post.clone());
        Ok(())
    }
}

/// Storage that records uploads and removals
#[derive(Default)]
pub struct FakeStorage {
    /// (key, size, content type)
    pub uploads: Mutex<Vec<(String, usize, String)>>,
    pub removed: Mutex<Vec<String>>,
    pub fail_upload: AtomicBool,
    pub fail_remove: AtomicBool,
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(CoreError::network("connection reset"));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), bytes.len(), content_type.to_string()));
        Ok(path.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://storage.test/{path}")
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(CoreError::network("connection reset"));
        }
        self.removed.lock().unwrap().extend(paths.iter().cloned());
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
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn current_user(&self) -> Option<UserId> {
        self.user.lock().unwrap().clone()
    }
}

pub fn category(id: &str, slug: &str) -> Category {
    Category {
        id: CategoryId::new(id),
        name: slug.to_uppercase(),
        slug: slug.to_string(),
    }
}

pub struct FakeCategories(pub Vec<Category>);

#[async_trait]
impl CategoryStore for FakeCategories {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct FakeProfiles {
    pub rows: Mutex<HashMap<UserId, Profile>>,
}

#[async_trait]
impl ProfileStore for FakeProfiles {
    async fn get_profile(&self, user: &UserId) -> Result<Option<Profile>> {
        Ok(self.rows.lock().unwrap().get(user).cloned())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        self.rows
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile.clone());
        Ok(())
    }
}
