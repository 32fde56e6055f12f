use crate::actors::Actor;
use crate::errors::Result;
use crate::pricing::best_price::BestPriceResult;
use crate::pricing::pricing_model::{PriceCalculationResult, ShipmentDescriptor};

/// Shipment pricing on behalf of an actor. Read-only.
pub trait PricingServiceTrait: Send + Sync {
    /// Price a shipment against the explicit list, or the list resolved for the actor.
    fn resolve_price(
        &self,
        actor: Option<&Actor>,
        shipment: &ShipmentDescriptor,
        explicit_price_list_id: Option<&str>,
    ) -> Result<PriceCalculationResult>;

    /// Compare the reseller's own pricing with the master list and pick the better one.
    fn select_best_price(
        &self,
        actor: Option<&Actor>,
        shipment: &ShipmentDescriptor,
        contract_code: Option<&str>,
    ) -> Result<BestPriceResult>;
}
