//! Capture device port

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Local audio capture
///
/// Implemented by the platform layer. A capture runs from `record` until
/// `stop`, which hands back the locator of the written file.
#[async_trait]
pub trait Microphone: Send + Sync {
    /// Ask for (or confirm) capture permission; `false` when refused
    async fn request_permission(&self) -> bool;

    /// Arm the device for a new capture
    async fn prepare_to_record(&self) -> Result<()>;

    /// Start capturing
    async fn record(&self) -> Result<()>;

    /// Stop capturing; `None` when nothing was written
    async fn stop(&self) -> Result<Option<String>>;
}

#[async_trait]
impl<M: Microphone + ?Sized> Microphone for Arc<M> {
    async fn request_permission(&self) -> bool {
        (**self).request_permission().await
    }

    async fn prepare_to_record(&self) -> Result<()> {
        (**self).prepare_to_record().await
    }

    async fn record(&self) -> Result<()> {
        (**self).record().await
    }

    async fn stop(&self) -> Result<Option<String>> {
        (**self).stop().await
    }
}
