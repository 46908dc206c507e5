mod auth;
mod category;
mod change;
mod ids;
mod post;
mod profile;

pub use auth::AuthEvent;
pub use category::{Category, GENERAL_CATEGORY_SLUG};
pub use change::{
    ChangeEvent, ChangeKind, Relation, RelationChange, TableChange, LIKES_TABLE, POSTS_TABLE,
    SAVES_TABLE,
};
pub use ids::{CategoryId, PostId, UserId};
pub use post::{
    CategoryLink, NewPost, Post, PostAuthor, PostCounts, PostRow, Track, UNKNOWN_USERNAME,
};
pub use profile::Profile;
