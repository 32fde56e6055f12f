//! Price lists module - domain models, services, and traits.

mod price_lists_model;
mod price_lists_service;
mod price_lists_traits;


#[cfg(test)]
pub(crate) mod price_lists_test_utils;

pub(crate) use price_lists_model::string_enum;
pub use price_lists_model::{
    find_bracket_gaps, NewPriceList, NewPriceListEntry, PriceList, PriceListAssignment,
    PriceListEntry, PriceListMetadata, PriceListStatus, PriceListType, PriceListUpdate, PriceRule,
    RuleCategory, RuleConditions, RuleEffect, ServiceType, VatMode,
};
pub use price_lists_service::{ensure_visible, PriceListService};
pub use price_lists_traits::{PriceListRepositoryTrait, PriceListServiceTrait};
