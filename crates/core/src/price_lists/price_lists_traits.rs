use async_trait::async_trait;

use crate::actors::Actor;
use crate::errors::Result;
use crate::price_lists::price_lists_model::{
    NewPriceList, NewPriceListEntry, PriceList, PriceListAssignment, PriceListEntry,
    PriceListUpdate,
};

/// Persistence of price lists, their entries and assignments.
#[async_trait]
pub trait PriceListRepositoryTrait: Send + Sync {
    fn get_by_id(&self, id: &str) -> Result<Option<PriceList>>;

    /// Lists created by the actor, legacy-assigned to them, or assigned through
    /// an active N:N assignment.
    fn list_by_owner_or_assignment(&self, actor_id: &str) -> Result<Vec<PriceList>>;

    fn list_all(&self) -> Result<Vec<PriceList>>;

    fn list_global(&self) -> Result<Vec<PriceList>>;

    /// Lists reachable through active (non-revoked) assignments, most recent first.
    fn list_assigned(&self, actor_id: &str) -> Result<Vec<PriceList>>;

    /// Lists whose legacy `assigned_to_user_id` is the actor, most recently updated first.
    fn list_legacy_assigned(&self, actor_id: &str) -> Result<Vec<PriceList>>;

    fn list_entries(&self, price_list_id: &str) -> Result<Vec<PriceListEntry>>;

    /// Distinct zone codes that already have at least one entry.
    fn existing_zone_codes(&self, price_list_id: &str) -> Result<Vec<String>>;

    fn list_assignments(&self, price_list_id: &str) -> Result<Vec<PriceListAssignment>>;

    async fn create(&self, new_list: NewPriceList, actor_id: &str) -> Result<PriceList>;

    async fn update(&self, id: &str, patch: PriceListUpdate, actor_id: &str) -> Result<PriceList>;

    /// Deletes the list together with its entries and assignments.
    async fn delete(&self, id: &str) -> Result<usize>;

    async fn delete_entries(&self, price_list_id: &str) -> Result<usize>;

    /// Insert all rows or none of them.
    async fn bulk_insert_entries(&self, rows: Vec<NewPriceListEntry>) -> Result<usize>;

    /// Swap the zone's standard rows for `rows` in one transaction. Rows for
    /// other zones, and non-standard rows of this zone, are left alone.
    async fn replace_zone_entries(
        &self,
        price_list_id: &str,
        zone_code: &str,
        rows: Vec<NewPriceListEntry>,
    ) -> Result<usize>;

    async fn assign(
        &self,
        price_list_id: &str,
        user_id: &str,
        assigned_by: &str,
    ) -> Result<PriceListAssignment>;

    async fn revoke_assignment(&self, price_list_id: &str, user_id: &str) -> Result<usize>;
}

/// Price list management on behalf of an actor.
#[async_trait]
pub trait PriceListServiceTrait: Send + Sync {
    fn get_price_list(&self, actor: &Actor, id: &str) -> Result<PriceList>;
    fn list_price_lists(&self, actor: &Actor) -> Result<Vec<PriceList>>;
    fn list_entries(&self, actor: &Actor, price_list_id: &str) -> Result<Vec<PriceListEntry>>;
    fn resolve_applicable_list(
        &self,
        actor: &Actor,
        courier_id: Option<&str>,
    ) -> Result<Option<PriceList>>;
    async fn create_price_list(&self, actor: &Actor, new_list: NewPriceList) -> Result<PriceList>;
    async fn update_price_list(
        &self,
        actor: &Actor,
        id: &str,
        patch: PriceListUpdate,
    ) -> Result<PriceList>;
    async fn archive_price_list(&self, actor: &Actor, id: &str) -> Result<PriceList>;
    async fn replace_entries(
        &self,
        actor: &Actor,
        price_list_id: &str,
        entries: Vec<NewPriceListEntry>,
    ) -> Result<usize>;
    async fn assign_price_list(
        &self,
        actor: &Actor,
        price_list_id: &str,
        user_id: &str,
    ) -> Result<PriceListAssignment>;
    async fn revoke_assignment(&self, actor: &Actor, price_list_id: &str, user_id: &str)
        -> Result<usize>;
}
