//! Change-feed events
//!
//! The change feed delivers raw row-level notifications (`TableChange`) for
//! the posts table and the two viewer relation tables. `ChangeEvent` is the
//! decoded form the feed cache consumes.

use super::{PostCounts, PostId, UserId};
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Posts table
pub const POSTS_TABLE: &str = "audio_posts";

/// Viewer-to-post like edges
pub const LIKES_TABLE: &str = "user_likes";

/// Viewer-to-post save edges
pub const SAVES_TABLE: &str = "user_saved_posts";

/// Row operation reported by the change feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Viewer-to-post relation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Like,
    Save,
}

impl Relation {
    /// Backing table of this relation
    pub fn table(self) -> &'static str {
        match self {
            Relation::Like => LIKES_TABLE,
            Relation::Save => SAVES_TABLE,
        }
    }

    /// Relation stored in the given table, if any
    pub fn from_table(table: &str) -> Option<Self> {
        match table {
            LIKES_TABLE => Some(Relation::Like),
            SAVES_TABLE => Some(Relation::Save),
            _ => None,
        }
    }
}

/// Raw notification as delivered by the change feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableChange {
    pub table: String,
    pub kind: ChangeKind,
    #[serde(default)]
    pub old: Option<Value>,
    #[serde(default)]
    pub new: Option<Value>,
}

impl TableChange {
    /// Create a raw change
    pub fn new(
        table: impl Into<String>,
        kind: ChangeKind,
        old: Option<Value>,
        new: Option<Value>,
    ) -> Self {
        Self {
            table: table.into(),
            kind,
            old,
            new,
        }
    }
}

/// A like or save edge appearing or disappearing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationChange {
    pub relation: Relation,
    pub post_id: PostId,
    /// Owner of the edge; delete payloads may omit it
    pub user_id: Option<UserId>,
    /// True when the edge now exists (insert), false when removed
    pub present: bool,
}

/// Decoded change-feed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChangeEvent {
    /// A post row was created; the full row must be fetched
    PostInserted(PostId),
    /// Counter columns of a post changed
    PostUpdated { id: PostId, counts: PostCounts },
    /// A post row was deleted
    PostDeleted(PostId),
    /// A viewer relation edge changed
    Relation(RelationChange),
}

fn string_field<'a>(row: Option<&'a Value>, key: &str) -> Option<&'a str> {
    row.and_then(|r| r.get(key)).and_then(Value::as_str)
}

impl TryFrom<TableChange> for ChangeEvent {
    type Error = CoreError;

    fn try_from(change: TableChange) -> Result<Self> {
        if change.table == POSTS_TABLE {
            return match change.kind {
                ChangeKind::Insert => string_field(change.new.as_ref(), "id")
                    .map(|id| ChangeEvent::PostInserted(PostId::new(id)))
                    .ok_or_else(|| CoreError::malformed("post insert without new.id")),
                ChangeKind::Delete => string_field(change.old.as_ref(), "id")
                    .map(|id| ChangeEvent::PostDeleted(PostId::new(id)))
                    .ok_or_else(|| CoreError::malformed("post delete without old.id")),
                ChangeKind::Update => {
                    let new = change
                        .new
                        .ok_or_else(|| CoreError::malformed("post update without new row"))?;
                    let id = string_field(Some(&new), "id")
                        .map(PostId::new)
                        .ok_or_else(|| CoreError::malformed("post update without new.id"))?;
                    let counts: PostCounts = serde_json::from_value(new)?;
                    Ok(ChangeEvent::PostUpdated { id, counts })
                }
            };
        }

        let relation = Relation::from_table(&change.table)
            .ok_or_else(|| CoreError::malformed(format!("unexpected table {}", change.table)))?;

        let present = match change.kind {
            ChangeKind::Insert => true,
            ChangeKind::Delete => false,
            ChangeKind::Update => {
                return Err(CoreError::malformed(format!(
                    "{} rows are never updated",
                    change.table
                )))
            }
        };

        let post_id = string_field(change.new.as_ref(), "audio_post_id")
            .or_else(|| string_field(change.old.as_ref(), "audio_post_id"))
            .map(PostId::new)
            .ok_or_else(|| CoreError::malformed("relation change without audio_post_id"))?;
        let user_id = string_field(change.new.as_ref(), "user_id")
            .or_else(|| string_field(change.old.as_ref(), "user_id"))
            .map(UserId::new);

        Ok(ChangeEvent::Relation(RelationChange {
            relation,
            post_id,
            user_id,
            present,
        }))
    }
}
