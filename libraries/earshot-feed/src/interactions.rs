//! Optimistic like/save toggles
//!
//! The flag (and, for likes, the count) flips before the server call. A
//! failed call restores the pre-toggle flag, and the pre-toggle count unless
//! the server reported a newer one meanwhile. At most one toggle per post and
//! relation is in flight; a tap while one is pending is ignored.

use crate::{
    cache::{flag, set_flag},
    manager::FeedManager,
};
use earshot_core::{PostId, Relation};
use tracing::{debug, info, warn};

/// Result of a like/save toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The server accepted the write; holds the new flag value
    Applied(bool),
    /// No signed-in viewer; nothing was sent
    SignInRequired,
    /// A toggle for the same post and relation is still in flight
    Busy,
    /// The post is not in the feed
    NotInFeed,
    /// The server write failed and the optimistic change was reverted
    RolledBack,
}

struct Pending {
    previous: bool,
    previous_like_count: u32,
    optimistic_like_count: u32,
}

impl FeedManager {
    /// Like or unlike a post
    pub async fn toggle_like(&self, post_id: &PostId) -> ToggleOutcome {
        self.toggle(post_id, Relation::Like).await
    }

    /// Save or unsave a post
    pub async fn toggle_save(&self, post_id: &PostId) -> ToggleOutcome {
        self.toggle(post_id, Relation::Save).await
    }

    async fn toggle(&self, post_id: &PostId, relation: Relation) -> ToggleOutcome {
        let Some(viewer) = self.auth.current_user().await else {
            info!(post_id = %post_id, ?relation, "Sign in to continue");
            return ToggleOutcome::SignInRequired;
        };

        let key = (post_id.clone(), relation);
        let pending = self.turn(|inner| {
            if inner.in_flight.contains(&key) {
                return Err(ToggleOutcome::Busy);
            }
            let post = inner
                .cache
                .get_mut(post_id)
                .ok_or(ToggleOutcome::NotInFeed)?;

            let previous = flag(post, relation);
            let previous_like_count = post.like_count;
            set_flag(post, relation, !previous);
            if relation == Relation::Like {
                post.like_count = if previous {
                    previous_like_count.saturating_sub(1)
                } else {
                    previous_like_count.saturating_add(1)
                };
            }
            let optimistic_like_count = post.like_count;

            inner.in_flight.insert(key.clone());
            inner.echoes.record(relation, post_id.clone(), !previous);
            Ok(Pending {
                previous,
                previous_like_count,
                optimistic_like_count,
            })
        });
        let pending = match pending {
            Ok(pending) => pending,
            Err(outcome) => {
                debug!(post_id = %post_id, ?relation, ?outcome, "Toggle skipped");
                return outcome;
            }
        };

        let target = !pending.previous;
        let written = if target {
            self.store.insert_relation(relation, &viewer, post_id).await
        } else {
            self.store.delete_relation(relation, &viewer, post_id).await
        };

        self.turn(|inner| {
            inner.in_flight.remove(&key);
            match written {
                Ok(()) => ToggleOutcome::Applied(target),
                Err(e) => {
                    warn!(post_id = %post_id, ?relation, error = %e, "Toggle failed, reverting");
                    inner.echoes.forget(relation, post_id, target);
                    if let Some(post) = inner.cache.get_mut(post_id) {
                        set_flag(post, relation, pending.previous);
                        // A count pushed by the server since the flip is newer
                        if relation == Relation::Like
                            && post.like_count == pending.optimistic_like_count
                        {
                            post.like_count = pending.previous_like_count;
                        }
                    }
                    ToggleOutcome::RolledBack
                }
            }
        })
    }
}
