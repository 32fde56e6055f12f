//! Rate sync module - fills price list matrices from the carrier rate API.

mod probe_client;
mod sync_errors;
mod sync_model;
mod sync_service;
mod sync_traits;


pub use probe_client::{CarrierRatesClient, RateProbeClient};
pub use sync_errors::SyncError;
pub use sync_model::{SyncMode, SyncRequest, SyncSettings, SyncSummary, ZoneSyncResult};
pub use sync_service::MatrixSyncService;
pub use sync_traits::MatrixSyncServiceTrait;
