//! Incremental matrix synchronization.
//!
//! ```text
//! MatrixSyncService
//!       │
//!       ├─► PriceListRepository (list, existing zones, per-zone replace)
//!       └─► RateProbeClient     (rate-limited carrier rate API)
//! ```
//!
//! Zones are processed in batches; the probes of one zone run concurrently
//! and the zone's standard rows are replaced in a single transaction, so a
//! zone is either fully rewritten or left as it was. Syncing a zone twice
//! never stacks brackets.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use parcelrate_carrier_rates::{Address, Parcel, RateRequest};
use rust_decimal::Decimal;

use crate::action_result::public_message;
use crate::actors::Actor;
use crate::constants::{PROBE_PARCEL_HEIGHT_CM, PROBE_PARCEL_LENGTH_CM, PROBE_PARCEL_WIDTH_CM};
use crate::errors::Result;
use crate::price_lists::{NewPriceListEntry, PriceList, PriceListRepositoryTrait};
use crate::rate_sync::probe_client::RateProbeClient;
use crate::rate_sync::sync_errors::SyncError;
use crate::rate_sync::sync_model::{SyncRequest, SyncSettings, SyncSummary, ZoneSyncResult};
use crate::rate_sync::sync_traits::MatrixSyncServiceTrait;
use crate::zones::{normalize_zone_code, sample_address, zone_display_name};

const SENDER_NAME: &str = "Parcelrate";
const SENDER_STREET: &str = "Via Roma 1";
const SENDER_CITY: &str = "Roma";
const SENDER_PROVINCE: &str = "RM";
const SENDER_POSTAL_CODE: &str = "00100";
const SENDER_COUNTRY: &str = "IT";

/// Everything a run needs to know about the list being synced.
#[derive(Debug, Clone)]
struct SyncTarget {
    price_list_id: String,
    carrier_code: String,
    contract_code: String,
    config_id: String,
    zones: Vec<String>,
    weights: Vec<Decimal>,
}

pub struct MatrixSyncService {
    price_lists: Arc<dyn PriceListRepositoryTrait>,
    probe_client: Arc<dyn RateProbeClient>,
    settings: SyncSettings,
}

impl MatrixSyncService {
    pub fn new(
        price_lists: Arc<dyn PriceListRepositoryTrait>,
        probe_client: Arc<dyn RateProbeClient>,
    ) -> Self {
        Self::with_settings(price_lists, probe_client, SyncSettings::default())
    }

    pub fn with_settings(
        price_lists: Arc<dyn PriceListRepositoryTrait>,
        probe_client: Arc<dyn RateProbeClient>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            price_lists,
            probe_client,
            settings,
        }
    }

    fn load_authorized(&self, actor: &Actor, price_list_id: &str) -> Result<PriceList> {
        if !actor.role.can_manage_price_lists() {
            return Err(SyncError::Unauthorized(format!("role {}", actor.role)).into());
        }
        let list = self
            .price_lists
            .get_by_id(price_list_id)?
            .ok_or_else(|| SyncError::PriceListNotFound(price_list_id.to_string()))?;
        if !actor.is_admin() && list.created_by != actor.id {
            return Err(SyncError::Unauthorized(format!("price list {}", list.id)).into());
        }
        Ok(list)
    }

    fn plan(&self, actor: &Actor, request: &SyncRequest) -> Result<SyncTarget> {
        let list = self.load_authorized(actor, &request.price_list_id)?;
        let metadata = list.effective_metadata();

        let config_id = request
            .config_id
            .clone()
            .filter(|c| !c.trim().is_empty())
            .or(metadata.courier_config_id)
            .ok_or_else(|| SyncError::MissingMetadata("courier_config_id".to_string()))?;
        let carrier_code = metadata
            .carrier_code
            .ok_or_else(|| SyncError::MissingMetadata("carrier_code".to_string()))?;
        let contract_code = metadata
            .contract_code
            .ok_or_else(|| SyncError::MissingMetadata("contract_code".to_string()))?;

        let zones = match &request.target_zones {
            Some(targets) => {
                let mut seen = HashSet::new();
                targets
                    .iter()
                    .filter(|z| !z.trim().is_empty())
                    .map(|z| normalize_zone_code(z))
                    .filter(|z| seen.insert(z.clone()))
                    .collect()
            }
            None => {
                let existing: HashSet<String> = self
                    .price_lists
                    .existing_zone_codes(&list.id)?
                    .iter()
                    .map(|z| normalize_zone_code(z))
                    .collect();
                request
                    .mode
                    .zones()
                    .into_iter()
                    .filter(|z| !existing.contains(*z))
                    .map(str::to_string)
                    .collect()
            }
        };

        Ok(SyncTarget {
            price_list_id: list.id,
            carrier_code,
            contract_code,
            config_id,
            zones,
            weights: request.mode.weights(),
        })
    }

    fn probe_request(target: &SyncTarget, zone: &str, weight: Decimal) -> RateRequest {
        let sample = sample_address(zone);
        RateRequest {
            packages: vec![Parcel {
                length: PROBE_PARCEL_LENGTH_CM,
                width: PROBE_PARCEL_WIDTH_CM,
                height: PROBE_PARCEL_HEIGHT_CM,
                weight,
            }],
            ship_from: Address {
                name: SENDER_NAME.to_string(),
                street1: SENDER_STREET.to_string(),
                city: SENDER_CITY.to_string(),
                state: SENDER_PROVINCE.to_string(),
                postal_code: SENDER_POSTAL_CODE.to_string(),
                country: SENDER_COUNTRY.to_string(),
                email: None,
            },
            ship_to: Address {
                name: "Rate probe".to_string(),
                street1: "Via Garibaldi 1".to_string(),
                city: sample.city.to_string(),
                state: sample.province.to_string(),
                postal_code: sample.postal_code.to_string(),
                country: sample.country.to_string(),
                email: None,
            },
            notes: None,
            insurance_value: None,
            cod_value: None,
            config_id: Some(target.config_id.clone()),
        }
    }

    /// Price of the target contract for one weight. Any failure is "no price".
    async fn probe(&self, target: &SyncTarget, zone: &str, weight: Decimal) -> Option<Decimal> {
        let request = Self::probe_request(target, zone, weight);
        let response = match tokio::time::timeout(
            self.settings.probe_timeout,
            self.probe_client.get_rates(&request),
        )
        .await
        {
            Err(_) => {
                warn!("Probe {} {}kg timed out", zone, weight);
                return None;
            }
            Ok(Err(e)) => {
                warn!(
                    "Probe {} {}kg failed ({:?}): {}",
                    zone,
                    weight,
                    e.retry_class(),
                    e
                );
                return None;
            }
            Ok(Ok(response)) => response,
        };

        if !response.success {
            debug!(
                "Probe {} {}kg returned no rates: {}",
                zone,
                weight,
                response.error.as_deref().unwrap_or("unsuccessful response")
            );
            return None;
        }

        response
            .rates
            .iter()
            .find(|r| r.matches_contract(&target.carrier_code, &target.contract_code))
            .and_then(|r| r.total_price)
    }

    async fn sync_zone(&self, actor: &Actor, target: &SyncTarget, zone: &str) -> ZoneSyncResult {
        let zone_name = zone_display_name(zone);

        let mut priced: Vec<(usize, Option<Decimal>)> =
            stream::iter(target.weights.clone().into_iter().enumerate())
                .map(|(index, weight)| async move { (index, self.probe(target, zone, weight).await) })
                .buffer_unordered(self.settings.probe_concurrency.max(1))
                .collect()
                .await;
        priced.sort_by_key(|(index, _)| *index);

        let entries: Vec<NewPriceListEntry> = priced
            .into_iter()
            .filter_map(|(index, price)| {
                let price = price?;
                let weight_from = index
                    .checked_sub(1)
                    .map_or(Decimal::ZERO, |prev| target.weights[prev]);
                Some(NewPriceListEntry::standard(
                    target.price_list_id.clone(),
                    zone,
                    weight_from,
                    target.weights[index],
                    price,
                ))
            })
            .collect();

        if entries.is_empty() {
            warn!("Zone {} of {}: no rates found", zone, target.price_list_id);
            return ZoneSyncResult::failed(zone, zone_name, "no rates found");
        }

        match self
            .price_lists
            .replace_zone_entries(&target.price_list_id, zone, entries)
            .await
        {
            Ok(added) => {
                info!(
                    "Zone {} of {} synced: {} entries",
                    zone, target.price_list_id, added
                );
                ZoneSyncResult::succeeded(zone, zone_name, added)
            }
            Err(e) => {
                warn!(
                    "Zone {} of {} not stored: {}",
                    zone, target.price_list_id, e
                );
                ZoneSyncResult::failed(zone, zone_name, public_message(&e, Some(actor)))
            }
        }
    }
}

#[async_trait]
impl MatrixSyncServiceTrait for MatrixSyncService {
    fn plan_zones(&self, actor: &Actor, request: &SyncRequest) -> Result<Vec<String>> {
        Ok(self.plan(actor, request)?.zones)
    }

    async fn sync_price_list(&self, actor: &Actor, request: SyncRequest) -> Result<SyncSummary> {
        let target = self.plan(actor, &request)?;
        if target.zones.is_empty() {
            info!(
                "Price list {} has every {} zone already",
                target.price_list_id, request.mode
            );
            return Ok(SyncSummary::nothing_to_sync(
                "All zones are already synchronized",
            ));
        }

        let batch_size = self.settings.zone_batch_size(request.mode);
        info!(
            "Syncing {} zones of {} ({} mode, {} probes, batches of {})",
            target.zones.len(),
            target.price_list_id,
            request.mode,
            target.zones.len() * target.weights.len(),
            batch_size
        );

        let mut results = Vec::with_capacity(target.zones.len());
        for (batch_index, batch) in target.zones.chunks(batch_size).enumerate() {
            if batch_index > 0 && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }
            let outcomes =
                join_all(batch.iter().map(|zone| self.sync_zone(actor, &target, zone))).await;
            results.extend(outcomes);
        }

        let summary = SyncSummary::from_results(results);
        info!(
            "Sync of {} finished: {}/{} zones, {} entries",
            target.price_list_id,
            summary.zones_succeeded,
            summary.zones_processed,
            summary.total_entries_added
        );
        Ok(summary)
    }
}
