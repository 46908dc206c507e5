//! Observable feed state

use earshot_core::Post;
use serde::{Deserialize, Serialize};

/// Load state of the post collection
///
/// `Empty -> Loading -> Ready`, and `Ready -> Refreshing -> Ready` for a
/// manual refresh. Live sync runs independently of the phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedPhase {
    #[default]
    Empty,
    Loading,
    Ready,
    Refreshing,
}

impl FeedPhase {
    /// A fetch is in flight
    pub fn is_busy(self) -> bool {
        matches!(self, FeedPhase::Loading | FeedPhase::Refreshing)
    }
}

/// Published after every change to the feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub phase: FeedPhase,
    pub posts: Vec<Post>,
}
