use super::CategoryId;
use serde::{Deserialize, Serialize};

/// Slug of the category auto-selected when a user picks nothing else
pub const GENERAL_CATEGORY_SLUG: &str = "general";

/// A post category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

impl Category {
    /// Whether this is the default "general" category
    pub fn is_general(&self) -> bool {
        self.slug == GENERAL_CATEGORY_SLUG
    }
}
