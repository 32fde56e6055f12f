use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::debug;

use crate::actors::Actor;
use crate::errors::{Error, Result};
use crate::price_lists::{ensure_visible, PriceList, PriceListRepositoryTrait, PriceListType};
use crate::pricing::best_price::{select_best, BestPriceResult};
use crate::pricing::calculator::calculate_price;
use crate::pricing::pricing_errors::PricingError;
use crate::pricing::pricing_model::{PriceCalculationResult, PricingSettings, ShipmentDescriptor};
use crate::pricing::pricing_traits::PricingServiceTrait;
use crate::pricing::resolver::ApplicableListResolver;

/// Service resolving shipment prices from price lists.
pub struct PricingService {
    repository: Arc<dyn PriceListRepositoryTrait>,
    resolver: ApplicableListResolver,
    settings: PricingSettings,
}

impl PricingService {
    pub fn new(repository: Arc<dyn PriceListRepositoryTrait>) -> Self {
        Self::with_settings(repository, PricingSettings::default())
    }

    pub fn with_settings(
        repository: Arc<dyn PriceListRepositoryTrait>,
        settings: PricingSettings,
    ) -> Self {
        let resolver = ApplicableListResolver::standard(repository.clone());
        Self {
            repository,
            resolver,
            settings,
        }
    }

    fn price_against(
        &self,
        list: &PriceList,
        shipment: &ShipmentDescriptor,
        today: NaiveDate,
    ) -> Result<PriceCalculationResult> {
        let entries = self.repository.list_entries(&list.id)?;
        Ok(calculate_price(list, &entries, shipment, &self.settings, today)?)
    }

    fn explicit_list(&self, actor: &Actor, id: &str, today: NaiveDate) -> Result<PriceList> {
        let list = self
            .repository
            .get_by_id(id)?
            .ok_or_else(|| PricingError::PriceListNotFound(id.to_string()))?;
        ensure_visible(self.repository.as_ref(), actor, &list)?;
        if !list.is_active_on(today) {
            return Err(PricingError::NoApplicablePriceList.into());
        }
        Ok(list)
    }

    /// The reseller's own active lists, custom ones first when any exist.
    fn reseller_candidates(
        &self,
        actor: &Actor,
        shipment: &ShipmentDescriptor,
        contract_code: Option<&str>,
        today: NaiveDate,
    ) -> Result<Vec<PriceList>> {
        let own: Vec<PriceList> = self
            .repository
            .list_by_owner_or_assignment(&actor.id)?
            .into_iter()
            .filter(|l| l.created_by == actor.id)
            .filter(|l| l.is_active_on(today) && l.serves_courier(shipment.courier_id.as_deref()))
            .filter(|l| contract_matches(l, contract_code))
            .collect();

        let custom: Vec<PriceList> = own
            .iter()
            .filter(|l| l.list_type == PriceListType::Custom)
            .cloned()
            .collect();
        if !custom.is_empty() {
            return Ok(custom);
        }
        Ok(own
            .into_iter()
            .filter(|l| l.list_type == PriceListType::Supplier)
            .collect())
    }

    /// Cheapest successful resolution among the reseller's lists.
    fn reseller_price(
        &self,
        actor: &Actor,
        shipment: &ShipmentDescriptor,
        contract_code: Option<&str>,
        today: NaiveDate,
    ) -> Result<Option<PriceCalculationResult>> {
        let mut best: Option<PriceCalculationResult> = None;
        for list in self.reseller_candidates(actor, shipment, contract_code, today)? {
            match recover_pricing(self.price_against(&list, shipment, today))? {
                Some(price) => {
                    if best.as_ref().map_or(true, |b| price.final_price < b.final_price) {
                        best = Some(price);
                    }
                }
                None => debug!("Reseller list {} cannot price this shipment", list.id),
            }
        }
        Ok(best)
    }

    fn master_price(
        &self,
        actor: &Actor,
        shipment: &ShipmentDescriptor,
        today: NaiveDate,
    ) -> Result<Option<PriceCalculationResult>> {
        let resolved = self.resolver.resolve_where(
            actor,
            shipment.courier_id.as_deref(),
            today,
            |l| l.created_by != actor.id,
        )?;
        match resolved {
            Some(r) => recover_pricing(self.price_against(&r.price_list, shipment, today)),
            None => Ok(None),
        }
    }
}

/// Case-insensitive exact or prefix match on the list's contract code.
fn contract_matches(list: &PriceList, contract_code: Option<&str>) -> bool {
    let Some(wanted) = contract_code.map(str::trim).filter(|c| !c.is_empty()) else {
        return true;
    };
    let wanted = wanted.to_lowercase();
    list.effective_metadata()
        .contract_code
        .map(|c| c.to_lowercase())
        .map_or(false, |c| c == wanted || c.starts_with(&wanted))
}

/// Pricing failures count as "no price"; store failures propagate.
fn recover_pricing(
    result: Result<PriceCalculationResult>,
) -> Result<Option<PriceCalculationResult>> {
    match result {
        Ok(price) => Ok(Some(price)),
        Err(Error::Pricing(e)) => {
            debug!("Skipping price source: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

impl PricingServiceTrait for PricingService {
    fn resolve_price(
        &self,
        actor: Option<&Actor>,
        shipment: &ShipmentDescriptor,
        explicit_price_list_id: Option<&str>,
    ) -> Result<PriceCalculationResult> {
        let actor = actor.ok_or(PricingError::NotAuthenticated)?;
        shipment.validate()?;
        let today = Utc::now().date_naive();

        let list = match explicit_price_list_id {
            Some(id) => self.explicit_list(actor, id, today)?,
            None => {
                self.resolver
                    .resolve(actor, shipment.courier_id.as_deref(), today)?
                    .ok_or(PricingError::NoApplicablePriceList)?
                    .price_list
            }
        };

        self.price_against(&list, shipment, today)
    }

    fn select_best_price(
        &self,
        actor: Option<&Actor>,
        shipment: &ShipmentDescriptor,
        contract_code: Option<&str>,
    ) -> Result<BestPriceResult> {
        let actor = actor.ok_or(PricingError::NotAuthenticated)?;
        shipment.validate()?;

        if !actor.role.has_reseller_capability() {
            return Ok(BestPriceResult::single(self.resolve_price(
                Some(actor),
                shipment,
                None,
            )?));
        }

        let today = Utc::now().date_naive();
        let reseller = self.reseller_price(actor, shipment, contract_code, today)?;
        let master = self.master_price(actor, shipment, today)?;
        let result = select_best(reseller, master)?;

        debug!(
            "Best price for {}: {} from {} (difference {:?})",
            actor.id, result.best_price.final_price, result.api_source, result.price_difference
        );
        Ok(result)
    }
}
