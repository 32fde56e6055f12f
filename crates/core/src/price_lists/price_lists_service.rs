use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};

use crate::actors::Actor;
use crate::errors::{Result, ValidationError};
use crate::price_lists::price_lists_model::{
    NewPriceList, NewPriceListEntry, PriceList, PriceListAssignment, PriceListEntry,
    PriceListType, PriceListUpdate,
};
use crate::price_lists::price_lists_traits::{PriceListRepositoryTrait, PriceListServiceTrait};
use crate::pricing::{ApplicableListResolver, PricingError};

/// Fails with `Unauthorized` unless the actor may read the list.
pub fn ensure_visible(
    repository: &dyn PriceListRepositoryTrait,
    actor: &Actor,
    list: &PriceList,
) -> Result<()> {
    if list.is_visible_to(actor) {
        return Ok(());
    }
    let assigned = repository.list_assigned(&actor.id)?;
    if assigned.iter().any(|l| l.id == list.id) {
        return Ok(());
    }
    Err(PricingError::Unauthorized(format!("price list {}", list.id)).into())
}

fn ensure_owner(actor: &Actor, list: &PriceList) -> Result<()> {
    if actor.is_admin() || list.created_by == actor.id {
        Ok(())
    } else {
        Err(PricingError::Unauthorized(format!("price list {}", list.id)).into())
    }
}

pub struct PriceListService {
    repository: Arc<dyn PriceListRepositoryTrait>,
    resolver: ApplicableListResolver,
}

impl PriceListService {
    pub fn new(repository: Arc<dyn PriceListRepositoryTrait>) -> Self {
        let resolver = ApplicableListResolver::standard(repository.clone());
        Self {
            repository,
            resolver,
        }
    }

    fn load(&self, id: &str) -> Result<PriceList> {
        self.repository
            .get_by_id(id)?
            .ok_or_else(|| PricingError::PriceListNotFound(id.to_string()).into())
    }
}

#[async_trait]
impl PriceListServiceTrait for PriceListService {
    fn get_price_list(&self, actor: &Actor, id: &str) -> Result<PriceList> {
        let list = self.load(id)?;
        ensure_visible(self.repository.as_ref(), actor, &list)?;
        Ok(list)
    }

    fn list_price_lists(&self, actor: &Actor) -> Result<Vec<PriceList>> {
        if actor.is_admin() {
            return self.repository.list_all();
        }
        let mut lists = self.repository.list_by_owner_or_assignment(&actor.id)?;
        for global in self.repository.list_global()? {
            if !lists.iter().any(|l| l.id == global.id) {
                lists.push(global);
            }
        }
        lists.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(lists)
    }

    fn list_entries(&self, actor: &Actor, price_list_id: &str) -> Result<Vec<PriceListEntry>> {
        let list = self.load(price_list_id)?;
        ensure_visible(self.repository.as_ref(), actor, &list)?;
        self.repository.list_entries(price_list_id)
    }

    fn resolve_applicable_list(
        &self,
        actor: &Actor,
        courier_id: Option<&str>,
    ) -> Result<Option<PriceList>> {
        let resolved = self
            .resolver
            .resolve(actor, courier_id, Utc::now().date_naive())?;
        Ok(resolved.map(|r| r.price_list))
    }

    async fn create_price_list(&self, actor: &Actor, mut new_list: NewPriceList) -> Result<PriceList> {
        new_list.validate()?;

        let list_type = new_list.list_type.unwrap_or(PriceListType::Supplier);
        if !actor.role.can_manage_price_lists() {
            return Err(PricingError::Unauthorized("creating price lists".to_string()).into());
        }
        if list_type == PriceListType::Global && !actor.is_admin() {
            return Err(PricingError::Unauthorized("creating global price lists".to_string()).into());
        }

        if let Some(master_id) = new_list.master_list_id.clone() {
            let master = self.load(&master_id)?;
            ensure_visible(self.repository.as_ref(), actor, &master)?;
            if new_list.source_metadata.is_empty() {
                new_list.source_metadata = master.effective_metadata();
            }
            if new_list.vat_mode.is_none() {
                new_list.vat_mode = Some(master.vat_mode);
                new_list.vat_rate = new_list.vat_rate.or(Some(master.vat_rate));
            }
        }

        let created = self.repository.create(new_list, &actor.id).await?;
        info!(
            "Created {} price list '{}' ({}) for {}",
            created.list_type, created.name, created.id, actor.id
        );
        Ok(created)
    }

    async fn update_price_list(
        &self,
        actor: &Actor,
        id: &str,
        patch: PriceListUpdate,
    ) -> Result<PriceList> {
        let list = self.load(id)?;
        ensure_owner(actor, &list)?;
        self.repository.update(id, patch, &actor.id).await
    }

    async fn archive_price_list(&self, actor: &Actor, id: &str) -> Result<PriceList> {
        let list = self.load(id)?;
        ensure_owner(actor, &list)?;
        debug!("Archiving price list {}", id);
        self.repository
            .update(id, PriceListUpdate::archive(), &actor.id)
            .await
    }

    async fn replace_entries(
        &self,
        actor: &Actor,
        price_list_id: &str,
        entries: Vec<NewPriceListEntry>,
    ) -> Result<usize> {
        let list = self.load(price_list_id)?;
        ensure_owner(actor, &list)?;

        for entry in &entries {
            if entry.price_list_id != price_list_id {
                return Err(ValidationError::InvalidInput(format!(
                    "entry belongs to price list {}, expected {}",
                    entry.price_list_id, price_list_id
                ))
                .into());
            }
            entry.validate()?;
        }

        // Delete then insert is not atomic at list level; readers may briefly see an empty list.
        let removed = self.repository.delete_entries(price_list_id).await?;
        let inserted = self.repository.bulk_insert_entries(entries).await?;
        info!(
            "Replaced entries of price list {}: {} removed, {} inserted",
            price_list_id, removed, inserted
        );
        Ok(inserted)
    }

    async fn assign_price_list(
        &self,
        actor: &Actor,
        price_list_id: &str,
        user_id: &str,
    ) -> Result<PriceListAssignment> {
        let list = self.load(price_list_id)?;
        ensure_owner(actor, &list)?;
        self.repository
            .assign(price_list_id, user_id, &actor.id)
            .await
    }

    async fn revoke_assignment(
        &self,
        actor: &Actor,
        price_list_id: &str,
        user_id: &str,
    ) -> Result<usize> {
        let list = self.load(price_list_id)?;
        ensure_owner(actor, &list)?;
        self.repository.revoke_assignment(price_list_id, user_id).await
    }
}
