//! Echo suppression for local relation writes
//!
//! The change feed reports our own like/save writes back to us. When the
//! viewer toggles quickly (like, unlike) the echo of the first write can
//! arrive after the second optimistic flip and would undo it. Each local
//! write is remembered for a short window; a feed event carrying the same
//! post, relation and value inside that window is consumed instead of
//! applied.

use earshot_core::{PostId, Relation};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct LocalWrite {
    relation: Relation,
    post_id: PostId,
    value: bool,
    at: Instant,
}

/// Recent local relation writes
#[derive(Debug, Clone)]
pub struct EchoFilter {
    window: Duration,
    writes: Vec<LocalWrite>,
}

impl EchoFilter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            writes: Vec::new(),
        }
    }

    /// Remember a local write before it is sent
    pub fn record(&mut self, relation: Relation, post_id: PostId, value: bool) {
        self.record_at(relation, post_id, value, Instant::now());
    }

    /// Consume the matching local write, if any.
    ///
    /// Returns `true` when the event is our own echo and must be dropped.
    pub fn suppress(&mut self, relation: Relation, post_id: &PostId, value: bool) -> bool {
        self.suppress_at(relation, post_id, value, Instant::now())
    }

    /// Drop a remembered write whose server call failed
    pub fn forget(&mut self, relation: Relation, post_id: &PostId, value: bool) {
        self.suppress(relation, post_id, value);
    }

    pub fn record_at(&mut self, relation: Relation, post_id: PostId, value: bool, at: Instant) {
        self.prune(at);
        self.writes.push(LocalWrite {
            relation,
            post_id,
            value,
            at,
        });
    }

    pub fn suppress_at(
        &mut self,
        relation: Relation,
        post_id: &PostId,
        value: bool,
        now: Instant,
    ) -> bool {
        self.prune(now);
        let hit = self
            .writes
            .iter()
            .position(|w| w.relation == relation && &w.post_id == post_id && w.value == value);
        match hit {
            Some(index) => {
                self.writes.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }

    fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.writes
            .retain(|w| now.saturating_duration_since(w.at) <= window);
    }
}
