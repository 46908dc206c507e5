//! Live sync from the change feed

use crate::manager::FeedManager;
use async_trait::async_trait;
use earshot_core::TableChange;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Source of row-level change notifications
///
/// One subscription per session; dropping the receiver ends it.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Subscribe to the posts table and both relation tables
    async fn subscribe(&self) -> earshot_core::Result<mpsc::Receiver<TableChange>>;
}

impl FeedManager {
    /// Apply every notification from `rx` in arrival order until the
    /// stream ends. Undecodable or failing events are logged and skipped.
    pub fn spawn_live_sync(self: Arc<Self>, mut rx: mpsc::Receiver<TableChange>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Live sync started");
            while let Some(change) = rx.recv().await {
                let table = change.table.clone();
                match self.apply_table_change(change).await {
                    Ok(changed) => debug!(%table, changed, "Applied change"),
                    Err(e) => warn!(%table, error = %e, "Skipped change"),
                }
            }
            info!("Live sync stopped");
        })
    }
}
