//! Feed manager - post cache with live sync
//!
//! Holds the single post collection. Fetches replace it wholesale; change
//! feed events patch it in place. Each mutation is one synchronous turn
//! under the state lock, and no lock is held across a backend call.

use crate::{
    cache::PostCache,
    config::FeedConfig,
    echo::EchoFilter,
    error::{FeedError, Result},
    state::{FeedPhase, FeedSnapshot},
};
use earshot_core::{
    AuthProvider, CategoryId, ChangeEvent, ObjectStorage, Post, PostId, PostStore, Relation,
    RelationChange, Selector, TableChange, UserId,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// State guarded by the feed lock
pub(crate) struct FeedInner {
    pub(crate) cache: PostCache,
    pub(crate) phase: FeedPhase,
    /// Bumped by every load/refresh; older responses are discarded
    generation: u64,
    /// Viewer the relation flags belong to
    pub(crate) viewer: Option<UserId>,
    pub(crate) echoes: EchoFilter,
    /// Toggles awaiting the server, one per post and relation
    pub(crate) in_flight: HashSet<(PostId, Relation)>,
}

impl FeedInner {
    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            phase: self.phase,
            posts: self.cache.posts().to_vec(),
        }
    }

    fn reset_viewer(&mut self, viewer: Option<UserId>) {
        if self.viewer != viewer {
            self.echoes.clear();
            self.in_flight.clear();
        }
        self.viewer = viewer;
    }
}

/// Owner of the post collection
pub struct FeedManager {
    pub(crate) store: Arc<dyn PostStore>,
    storage: Arc<dyn ObjectStorage>,
    pub(crate) auth: Arc<dyn AuthProvider>,
    inner: Mutex<FeedInner>,
    tx: watch::Sender<FeedSnapshot>,
}

impl FeedManager {
    pub fn new(
        store: Arc<dyn PostStore>,
        storage: Arc<dyn ObjectStorage>,
        auth: Arc<dyn AuthProvider>,
        config: FeedConfig,
    ) -> Self {
        let (tx, _) = watch::channel(FeedSnapshot::default());
        Self {
            store,
            storage,
            auth,
            inner: Mutex::new(FeedInner {
                cache: PostCache::new(),
                phase: FeedPhase::Empty,
                generation: 0,
                viewer: None,
                echoes: EchoFilter::new(config.echo_window()),
                in_flight: HashSet::new(),
            }),
            tx,
        }
    }

    /// Current phase and posts
    pub fn snapshot(&self) -> FeedSnapshot {
        self.lock().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.tx.subscribe()
    }

    pub fn phase(&self) -> FeedPhase {
        self.lock().phase
    }

    /// Posts in display order
    pub fn posts(&self) -> Vec<Post> {
        self.lock().cache.posts().to_vec()
    }

    pub fn post(&self, id: &PostId) -> Option<Post> {
        self.lock().cache.get(id).cloned()
    }

    /// Posts linked to a category, in display order
    pub fn posts_in_category(&self, category: &CategoryId) -> Vec<Post> {
        self.lock()
            .cache
            .iter()
            .filter(|p| p.in_category(category))
            .cloned()
            .collect()
    }

    /// Viewer the relation flags currently belong to
    pub fn viewer(&self) -> Option<UserId> {
        self.lock().viewer.clone()
    }

    /// Observe one post; wakes only when that post changes
    pub fn watch_post(
        &self,
        id: PostId,
    ) -> Selector<FeedSnapshot, Option<Post>, impl Fn(&FeedSnapshot) -> Option<Post>> {
        Selector::new(self.subscribe(), move |s: &FeedSnapshot| {
            s.posts.iter().find(|p| p.id == id).cloned()
        })
    }

    pub fn watch_phase(
        &self,
    ) -> Selector<FeedSnapshot, FeedPhase, impl Fn(&FeedSnapshot) -> FeedPhase> {
        Selector::new(self.subscribe(), |s: &FeedSnapshot| s.phase)
    }

    /// Fetch the full feed and the viewer's like/save sets.
    ///
    /// Returns the number of posts. A newer load or refresh started while
    /// this one was in flight wins; this one then returns
    /// [`FeedError::Superseded`] without touching the cache.
    pub async fn load_initial(&self) -> Result<usize> {
        self.fetch(false).await
    }

    /// Re-fetch and replace the collection wholesale.
    ///
    /// Posts stay visible until the new snapshot arrives.
    pub async fn refresh(&self) -> Result<usize> {
        self.fetch(true).await
    }

    async fn fetch(&self, refresh: bool) -> Result<usize> {
        let generation = self.turn(|inner| {
            inner.generation += 1;
            inner.phase = match inner.phase {
                FeedPhase::Ready | FeedPhase::Refreshing if refresh => FeedPhase::Refreshing,
                _ => FeedPhase::Loading,
            };
            inner.generation
        });
        debug!(generation, refresh, "Fetching feed");

        let fetched = self.fetch_posts().await;

        self.turn(|inner| {
            if inner.generation != generation {
                debug!(generation, "Discarding stale feed response");
                return Err(FeedError::Superseded);
            }
            match fetched {
                Ok((viewer, posts)) => {
                    inner.reset_viewer(viewer);
                    inner.cache.replace_all(posts);
                    inner.phase = FeedPhase::Ready;
                    info!(count = inner.cache.len(), "Feed loaded");
                    Ok(inner.cache.len())
                }
                Err(e) => {
                    warn!(error = %e, "Failed to fetch feed");
                    inner.phase = if inner.cache.is_empty() {
                        FeedPhase::Empty
                    } else {
                        FeedPhase::Ready
                    };
                    Err(e)
                }
            }
        })
    }

    async fn fetch_posts(&self) -> Result<(Option<UserId>, Vec<Post>)> {
        let viewer = self.auth.current_user().await;

        let (rows, liked, saved) = tokio::try_join!(
            self.store.list_posts(),
            self.relation_set(Relation::Like, viewer.as_ref()),
            self.relation_set(Relation::Save, viewer.as_ref()),
        )?;

        let posts = rows
            .into_iter()
            .map(|row| {
                let url = self.storage.resolve_audio_url(&row.audio_file_storage_path);
                let is_liked = liked.contains(&row.id);
                let is_saved = saved.contains(&row.id);
                Post::from_row(row, url, is_liked, is_saved)
            })
            .collect();
        Ok((viewer, posts))
    }

    async fn relation_set(
        &self,
        relation: Relation,
        viewer: Option<&UserId>,
    ) -> earshot_core::Result<HashSet<PostId>> {
        match viewer {
            Some(user) => Ok(self
                .store
                .relation_post_ids(relation, user)
                .await?
                .into_iter()
                .collect()),
            None => Ok(HashSet::new()),
        }
    }

    /// Decode and apply a raw change-feed notification
    pub async fn apply_table_change(&self, change: TableChange) -> Result<bool> {
        let event = ChangeEvent::try_from(change)?;
        self.apply_change(event).await
    }

    /// Patch the collection with one change-feed event.
    ///
    /// Returns whether the collection changed. Inserts for ids already
    /// present, and updates/deletes for ids not present, are no-ops.
    pub async fn apply_change(&self, event: ChangeEvent) -> Result<bool> {
        match event {
            ChangeEvent::PostInserted(id) => self.insert_post(id).await,
            ChangeEvent::PostDeleted(id) => Ok(self.turn(|inner| inner.cache.remove(&id).is_some())),
            ChangeEvent::PostUpdated { id, counts } => {
                Ok(self.turn(|inner| inner.cache.update_counts(&id, counts)))
            }
            ChangeEvent::Relation(change) => Ok(self.apply_relation(&change)),
        }
    }

    async fn insert_post(&self, id: PostId) -> Result<bool> {
        if self.lock().cache.contains(&id) {
            debug!(post_id = %id, "Insert for known post ignored");
            return Ok(false);
        }

        let Some(row) = self.store.get_post(&id).await? else {
            debug!(post_id = %id, "Inserted post no longer exists");
            return Ok(false);
        };
        let url = self.storage.resolve_audio_url(&row.audio_file_storage_path);
        let post = Post::from_row(row, url, false, false);

        let added = self.turn(|inner| inner.cache.prepend(post));
        if added {
            info!(post_id = %id, "New post");
        }
        Ok(added)
    }

    fn apply_relation(&self, change: &RelationChange) -> bool {
        self.turn(|inner| {
            let Some(viewer) = inner.viewer.as_ref() else {
                return false;
            };
            if change.user_id.as_ref().is_some_and(|u| u != viewer) {
                return false;
            }
            if inner
                .echoes
                .suppress(change.relation, &change.post_id, change.present)
            {
                debug!(post_id = %change.post_id, relation = ?change.relation, "Suppressed echo");
                return false;
            }
            inner
                .cache
                .set_relation(&change.post_id, change.relation, change.present)
        })
    }

    /// Set the viewer the relation flags belong to.
    ///
    /// Switching to a different viewer clears every flag; they are restored
    /// by the next load. A load or refresh still in flight belongs to the
    /// previous viewer and is superseded.
    pub fn set_viewer(&self, viewer: Option<UserId>) {
        self.turn(|inner| {
            if inner.viewer != viewer {
                inner.cache.clear_viewer_flags();
                inner.generation += 1;
                if inner.phase.is_busy() {
                    inner.phase = if inner.cache.is_empty() {
                        FeedPhase::Empty
                    } else {
                        FeedPhase::Ready
                    };
                }
                debug!(generation = inner.generation, "Viewer changed");
            }
            inner.reset_viewer(viewer);
        });
    }

    /// Forget the viewer and every viewer-relative flag
    pub fn sign_out(&self) {
        self.set_viewer(None);
    }

    /// Drop a post locally (its delete event may arrive later)
    pub fn remove_post(&self, id: &PostId) -> Option<Post> {
        self.turn(|inner| inner.cache.remove(id))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, FeedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one state transition and publish the result
    pub(crate) fn turn<R>(&self, f: impl FnOnce(&mut FeedInner) -> R) -> R {
        let mut inner = self.lock();
        let out = f(&mut inner);
        let next = inner.snapshot();
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
