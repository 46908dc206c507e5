//! Profile shelves: the viewer's own posts, likes and saves

use earshot_core::Post;
use serde::{Deserialize, Serialize};

/// Profile tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shelf {
    #[default]
    Posts,
    Likes,
    Saved,
}

/// Feed split into the three profile tabs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileShelves {
    pub posts: Vec<Post>,
    pub likes: Vec<Post>,
    pub saved: Vec<Post>,
}

impl ProfileShelves {
    /// Split `posts` for the viewer named `username`; order is preserved
    pub fn from_feed(posts: &[Post], username: &str) -> Self {
        Self {
            posts: posts.iter().filter(|p| p.username == username).cloned().collect(),
            likes: posts.iter().filter(|p| p.is_liked).cloned().collect(),
            saved: posts.iter().filter(|p| p.is_saved).cloned().collect(),
        }
    }

    pub fn shelf(&self, shelf: Shelf) -> &[Post] {
        match shelf {
            Shelf::Posts => &self.posts,
            Shelf::Likes => &self.likes,
            Shelf::Saved => &self.saved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use earshot_core::PostRow;

    fn post(id: &str, username: &str, liked: bool, saved: bool) -> Post {
        let row: PostRow = serde_json::from_value(serde_json::json!({
            "id": id,
            "title": id,
            "profiles": { "username": username },
        }))
        .unwrap();
        Post::from_row(row, String::new(), liked, saved)
    }

    #[test]
    fn splits_by_author_and_flags() {
        let feed = vec![
            post("p1", "ana", false, true),
            post("p2", "bo", true, false),
            post("p3", "ana", true, true),
        ];

        let shelves = ProfileShelves::from_feed(&feed, "ana");
        let ids = |s: &[Post]| s.iter().map(|p| p.id.to_string()).collect::<Vec<_>>();

        assert_eq!(ids(shelves.shelf(Shelf::Posts)), vec!["p1", "p3"]);
        assert_eq!(ids(shelves.shelf(Shelf::Likes)), vec!["p2", "p3"]);
        assert_eq!(ids(shelves.shelf(Shelf::Saved)), vec!["p1", "p3"]);
    }
}
