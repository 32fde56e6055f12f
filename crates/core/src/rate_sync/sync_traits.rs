use async_trait::async_trait;

use crate::actors::Actor;
use crate::errors::Result;
use crate::rate_sync::sync_model::{SyncRequest, SyncSummary};

/// Incremental matrix synchronization.
#[async_trait]
pub trait MatrixSyncServiceTrait: Send + Sync {
    /// Zones the request would probe, after authorization and metadata checks.
    fn plan_zones(&self, actor: &Actor, request: &SyncRequest) -> Result<Vec<String>>;

    /// Probes the missing zones of a price list and stores one bracket per
    /// matched weight. Each zone is committed with a single insert.
    async fn sync_price_list(&self, actor: &Actor, request: SyncRequest) -> Result<SyncSummary>;
}
