//! Ordered post collection keyed by unique id
//!
//! Newest known post first. Only [`PostCache::replace_all`] reorders
//! existing entries; every other mutation either prepends, removes or
//! patches in place.

use earshot_core::{Post, PostCounts, PostId, Relation};
use std::collections::HashSet;

/// In-memory post collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostCache {
    posts: Vec<Post>,
}

impl PostCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Posts in display order
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter()
    }

    pub fn contains(&self, id: &PostId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|p| &p.id == id)
    }

    pub fn get_mut(&mut self, id: &PostId) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| &p.id == id)
    }

    fn position(&self, id: &PostId) -> Option<usize> {
        self.posts.iter().position(|p| &p.id == id)
    }

    /// Insert at the front.
    ///
    /// An id already present is left exactly as it is; returns whether the
    /// post was added.
    pub fn prepend(&mut self, post: Post) -> bool {
        if self.contains(&post.id) {
            return false;
        }
        self.posts.insert(0, post);
        true
    }

    /// Remove by id
    pub fn remove(&mut self, id: &PostId) -> Option<Post> {
        let index = self.position(id)?;
        Some(self.posts.remove(index))
    }

    /// Overwrite the counters of a post; returns whether it was present
    pub fn update_counts(&mut self, id: &PostId, counts: PostCounts) -> bool {
        match self.get_mut(id) {
            Some(post) => {
                post.apply_counts(counts);
                true
            }
            None => false,
        }
    }

    /// Set a viewer-relative flag; returns whether the post was present
    pub fn set_relation(&mut self, id: &PostId, relation: Relation, value: bool) -> bool {
        match self.get_mut(id) {
            Some(post) => {
                set_flag(post, relation, value);
                true
            }
            None => false,
        }
    }

    /// Replace the whole collection with a fresh snapshot.
    ///
    /// Later duplicates of an id are dropped so the collection stays keyed.
    pub fn replace_all(&mut self, posts: Vec<Post>) {
        let mut seen = HashSet::with_capacity(posts.len());
        self.posts = posts
            .into_iter()
            .filter(|p| seen.insert(p.id.clone()))
            .collect();
    }

    /// Forget every viewer-relative flag (sign-out)
    pub fn clear_viewer_flags(&mut self) {
        for post in &mut self.posts {
            post.is_liked = false;
            post.is_saved = false;
        }
    }
}

/// Read a viewer-relative flag
pub fn flag(post: &Post, relation: Relation) -> bool {
    match relation {
        Relation::Like => post.is_liked,
        Relation::Save => post.is_saved,
    }
}

/// Write a viewer-relative flag
pub fn set_flag(post: &mut Post, relation: Relation, value: bool) {
    match relation {
        Relation::Like => post.is_liked = value,
        Relation::Save => post.is_saved = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use earshot_core::PostRow;

    fn post(id: &str) -> Post {
        let row: PostRow = serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Post {id}"),
            "duration_seconds": 30,
            "like_count": 1,
        }))
        .unwrap();
        Post::from_row(row, format!("https://cdn/{id}.m4a"), false, false)
    }

    fn ids(cache: &PostCache) -> Vec<&str> {
        cache.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn prepend_is_newest_first_and_idempotent() {
        let mut cache = PostCache::new();
        assert!(cache.prepend(post("p1")));
        assert!(cache.prepend(post("p2")));

        let mut liked = post("p1");
        liked.is_liked = true;
        cache.set_relation(&PostId::new("p1"), Relation::Like, true);

        let mut stale = post("p1");
        stale.title = "different".into();
        assert!(!cache.prepend(stale));

        assert_eq!(ids(&cache), vec!["p2", "p1"]);
        assert_eq!(cache.get(&PostId::new("p1")), Some(&liked));
    }

    #[test]
    fn remove_and_update_of_missing_ids_are_noops() {
        let mut cache = PostCache::new();
        cache.prepend(post("p1"));

        assert!(cache.remove(&PostId::new("zz")).is_none());
        assert!(!cache.update_counts(&PostId::new("zz"), PostCounts::default()));
        assert!(!cache.set_relation(&PostId::new("zz"), Relation::Save, true));
        assert_eq!(cache.len(), 1);

        assert!(cache.remove(&PostId::new("p1")).is_some());
        assert!(cache.is_empty());
    }

    #[test]
    fn update_counts_touches_only_counters() {
        let mut cache = PostCache::new();
        cache.prepend(post("p1"));
        cache.set_relation(&PostId::new("p1"), Relation::Save, true);

        let counts = PostCounts {
            like_count: 8,
            comment_count: 2,
            listen_count: 40,
        };
        assert!(cache.update_counts(&PostId::new("p1"), counts));

        let p = cache.get(&PostId::new("p1")).unwrap();
        assert_eq!(p.counts(), counts);
        assert_eq!(p.title, "Post p1");
        assert!(p.is_saved);
    }

    #[test]
    fn replace_all_drops_duplicate_ids() {
        let mut cache = PostCache::new();
        cache.prepend(post("old"));
        cache.replace_all(vec![post("a"), post("b"), post("a")]);
        assert_eq!(ids(&cache), vec!["a", "b"]);
    }

    #[test]
    fn clear_viewer_flags_resets_likes_and_saves() {
        let mut cache = PostCache::new();
        cache.prepend(post("p1"));
        cache.set_relation(&PostId::new("p1"), Relation::Like, true);
        cache.set_relation(&PostId::new("p1"), Relation::Save, true);

        cache.clear_viewer_flags();

        let p = cache.get(&PostId::new("p1")).unwrap();
        assert!(!flag(p, Relation::Like));
        assert!(!flag(p, Relation::Save));
    }
}
