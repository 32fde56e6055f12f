//! In-memory price list store shared by the service tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::actors::Actor;
use crate::errors::{DatabaseError, Error, Result};
use crate::price_lists::{
    NewPriceList, NewPriceListEntry, PriceList, PriceListAssignment, PriceListEntry,
    PriceListMetadata, PriceListRepositoryTrait, PriceListStatus, PriceListType, PriceListUpdate,
    ServiceType, VatMode,
};

#[derive(Default)]
struct State {
    lists: Vec<PriceList>,
    entries: Vec<PriceListEntry>,
    assignments: Vec<PriceListAssignment>,
    failing_zones: HashSet<String>,
    fail_all_inserts: bool,
    insert_calls: usize,
}

#[derive(Clone, Default)]
pub struct InMemoryPriceListRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryPriceListRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_list(&self, list: PriceList) {
        self.state.lock().unwrap().lists.push(list);
    }

    pub fn add_entry(&self, entry: NewPriceListEntry) {
        self.state.lock().unwrap().entries.push(to_entry(entry));
    }

    /// Every bulk insert or replacement touching `zone` fails without persisting anything.
    pub fn fail_inserts_for_zone(&self, zone: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_zones
            .insert(zone.to_string());
    }

    pub fn entries_for_zone(&self, price_list_id: &str, zone: &str) -> Vec<PriceListEntry> {
        self.state
            .lock()
            .unwrap()
            .entries
            .iter()
            .filter(|e| e.price_list_id == price_list_id && e.zone_code == zone)
            .cloned()
            .collect()
    }

    pub fn insert_calls(&self) -> usize {
        self.state.lock().unwrap().insert_calls
    }

    /// Every bulk insert fails from now on.
    pub fn fail_all_inserts(&self) {
        self.state.lock().unwrap().fail_all_inserts = true;
    }

    pub fn assignments(&self) -> Vec<PriceListAssignment> {
        self.state.lock().unwrap().assignments.clone()
    }

    pub fn list(&self, id: &str) -> Option<PriceList> {
        self.state
            .lock()
            .unwrap()
            .lists
            .iter()
            .find(|l| l.id == id)
            .cloned()
    }
}

fn to_entry(entry: NewPriceListEntry) -> PriceListEntry {
    PriceListEntry {
        id: Uuid::new_v4().to_string(),
        price_list_id: entry.price_list_id,
        zone_code: entry.zone_code,
        weight_from: entry.weight_from,
        weight_to: entry.weight_to,
        service_type: entry.service_type,
        base_price: entry.base_price,
        fuel_surcharge_percent: entry.fuel_surcharge_percent,
        cash_on_delivery_surcharge: entry.cash_on_delivery_surcharge,
        insurance_rate_percent: entry.insurance_rate_percent,
        island_surcharge: entry.island_surcharge,
        ztl_surcharge: entry.ztl_surcharge,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl PriceListRepositoryTrait for InMemoryPriceListRepository {
    fn get_by_id(&self, id: &str) -> Result<Option<PriceList>> {
        Ok(self.list(id))
    }

    fn list_by_owner_or_assignment(&self, actor_id: &str) -> Result<Vec<PriceList>> {
        let state = self.state.lock().unwrap();
        let assigned: HashSet<&str> = state
            .assignments
            .iter()
            .filter(|a| a.user_id == actor_id && a.is_active())
            .map(|a| a.price_list_id.as_str())
            .collect();
        Ok(state
            .lists
            .iter()
            .filter(|l| {
                l.created_by == actor_id
                    || l.assigned_to_user_id.as_deref() == Some(actor_id)
                    || assigned.contains(l.id.as_str())
            })
            .cloned()
            .collect())
    }

    fn list_all(&self) -> Result<Vec<PriceList>> {
        Ok(self.state.lock().unwrap().lists.clone())
    }

    fn list_global(&self) -> Result<Vec<PriceList>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .lists
            .iter()
            .filter(|l| l.list_type == PriceListType::Global)
            .cloned()
            .collect())
    }

    fn list_assigned(&self, actor_id: &str) -> Result<Vec<PriceList>> {
        let state = self.state.lock().unwrap();
        let mut assignments: Vec<&PriceListAssignment> = state
            .assignments
            .iter()
            .filter(|a| a.user_id == actor_id && a.is_active())
            .collect();
        assignments.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
        Ok(assignments
            .into_iter()
            .filter_map(|a| state.lists.iter().find(|l| l.id == a.price_list_id).cloned())
            .collect())
    }

    fn list_legacy_assigned(&self, actor_id: &str) -> Result<Vec<PriceList>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .lists
            .iter()
            .filter(|l| l.assigned_to_user_id.as_deref() == Some(actor_id))
            .cloned()
            .collect())
    }

    fn list_entries(&self, price_list_id: &str) -> Result<Vec<PriceListEntry>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .entries
            .iter()
            .filter(|e| e.price_list_id == price_list_id)
            .cloned()
            .collect())
    }

    fn existing_zone_codes(&self, price_list_id: &str) -> Result<Vec<String>> {
        let mut zones: Vec<String> = self
            .list_entries(price_list_id)?
            .into_iter()
            .map(|e| e.zone_code)
            .collect();
        zones.sort();
        zones.dedup();
        Ok(zones)
    }

    fn list_assignments(&self, price_list_id: &str) -> Result<Vec<PriceListAssignment>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .assignments
            .iter()
            .filter(|a| a.price_list_id == price_list_id)
            .cloned()
            .collect())
    }

    async fn create(&self, new_list: NewPriceList, actor_id: &str) -> Result<PriceList> {
        let id = new_list
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let list = new_list.into_price_list(id, actor_id, Utc::now());
        self.add_list(list.clone());
        Ok(list)
    }

    async fn update(&self, id: &str, patch: PriceListUpdate, _actor_id: &str) -> Result<PriceList> {
        let mut state = self.state.lock().unwrap();
        let list = state
            .lists
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(id.to_string())))?;
        patch.apply_to(list, Utc::now())?;
        Ok(list.clone())
    }

    async fn delete(&self, id: &str) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let before = state.lists.len();
        state.lists.retain(|l| l.id != id);
        state.entries.retain(|e| e.price_list_id != id);
        state.assignments.retain(|a| a.price_list_id != id);
        Ok(before - state.lists.len())
    }

    async fn delete_entries(&self, price_list_id: &str) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let before = state.entries.len();
        state.entries.retain(|e| e.price_list_id != price_list_id);
        Ok(before - state.entries.len())
    }

    async fn bulk_insert_entries(&self, rows: Vec<NewPriceListEntry>) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        state.insert_calls += 1;
        if state.fail_all_inserts || rows.iter().any(|r| state.failing_zones.contains(&r.zone_code)) {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "simulated insert failure".to_string(),
            )));
        }
        let count = rows.len();
        state.entries.extend(rows.into_iter().map(to_entry));
        Ok(count)
    }

    async fn replace_zone_entries(
        &self,
        price_list_id: &str,
        zone_code: &str,
        rows: Vec<NewPriceListEntry>,
    ) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        state.insert_calls += 1;
        if state.failing_zones.contains(zone_code) {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "simulated insert failure".to_string(),
            )));
        }
        state.entries.retain(|e| {
            e.price_list_id != price_list_id
                || e.zone_code != zone_code
                || e.service_type != ServiceType::Standard
        });
        let count = rows.len();
        state.entries.extend(rows.into_iter().map(to_entry));
        Ok(count)
    }

    async fn assign(
        &self,
        price_list_id: &str,
        user_id: &str,
        assigned_by: &str,
    ) -> Result<PriceListAssignment> {
        let assignment = PriceListAssignment {
            id: Uuid::new_v4().to_string(),
            price_list_id: price_list_id.to_string(),
            user_id: user_id.to_string(),
            assigned_by: assigned_by.to_string(),
            assigned_at: Utc::now(),
            revoked_at: None,
        };
        self.state
            .lock()
            .unwrap()
            .assignments
            .push(assignment.clone());
        Ok(assignment)
    }

    async fn revoke_assignment(&self, price_list_id: &str, user_id: &str) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let mut revoked = 0;
        for a in state.assignments.iter_mut() {
            if a.price_list_id == price_list_id && a.user_id == user_id && a.revoked_at.is_none() {
                a.revoked_at = Some(Utc::now());
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}

/// An active, excluded-VAT list with no rules or margin.
pub fn price_list(id: &str, list_type: PriceListType, created_by: &str) -> PriceList {
    let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    PriceList {
        id: id.to_string(),
        name: format!("List {}", id),
        description: None,
        list_type,
        status: PriceListStatus::Active,
        created_by: created_by.to_string(),
        assigned_to_user_id: None,
        master_list_id: None,
        courier_id: None,
        default_margin_percent: None,
        vat_mode: VatMode::Excluded,
        vat_rate: Decimal::from(22),
        valid_from: None,
        valid_until: None,
        metadata: PriceListMetadata::default(),
        source_metadata: PriceListMetadata::default(),
        rules: Vec::new(),
        version: 1,
        created_at: ts,
        updated_at: ts,
    }
}

pub fn entry(
    price_list_id: &str,
    zone: &str,
    weight_from: Decimal,
    weight_to: Decimal,
    base_price: Decimal,
) -> NewPriceListEntry {
    NewPriceListEntry::standard(price_list_id, zone, weight_from, weight_to, base_price)
}

pub fn admin() -> Actor {
    Actor::new("admin-1", crate::actors::ActorRole::Admin)
}
