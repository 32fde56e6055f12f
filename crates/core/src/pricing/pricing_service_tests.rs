#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal_macros::dec;

    use crate::actors::{Actor, ActorRole};
    use crate::errors::Error;
    use crate::price_lists::price_lists_test_utils::{entry, price_list, InMemoryPriceListRepository};
    use crate::price_lists::{PriceListMetadata, PriceListStatus, PriceListType};
    use crate::pricing::{
        PriceProvenance, PricingError, PricingService, PricingServiceTrait, ShipmentDescriptor,
    };

    fn setup() -> (Arc<InMemoryPriceListRepository>, PricingService) {
        let repo = Arc::new(InMemoryPriceListRepository::new());
        let service = PricingService::new(repo.clone());
        (repo, service)
    }

    fn with_global(repo: &InMemoryPriceListRepository, base: rust_decimal::Decimal) {
        repo.add_list(price_list("master", PriceListType::Global, "admin-1"));
        repo.add_entry(entry("master", "IT-A", dec!(0), dec!(5), base));
    }

    fn user() -> Actor {
        Actor::new("user-1", ActorRole::User)
    }

    fn reseller() -> Actor {
        Actor::new("reseller-1", ActorRole::Reseller)
    }

    #[test]
    fn test_resolve_price_fuel_surcharge_scenario() {
        let (repo, service) = setup();
        repo.add_list(price_list("master", PriceListType::Global, "admin-1"));
        let mut row = entry("master", "IT-A", dec!(0), dec!(5), dec!(10));
        row.fuel_surcharge_percent = dec!(10);
        repo.add_entry(row);

        let shipment = ShipmentDescriptor::to_zone(dec!(3), "IT-A");
        let result = service.resolve_price(Some(&user()), &shipment, None).unwrap();

        assert_eq!(result.price_list_id, "master");
        assert_eq!(result.final_price, dec!(11.00));
    }

    #[test]
    fn test_resolve_price_outside_brackets_fails() {
        let (repo, service) = setup();
        with_global(&repo, dec!(10));

        let shipment = ShipmentDescriptor::to_zone(dec!(6), "IT-A");
        let err = service.resolve_price(Some(&user()), &shipment, None).unwrap_err();

        assert!(matches!(
            err,
            Error::Pricing(PricingError::NoApplicableRate { ref zone_code, .. }) if zone_code == "IT-A"
        ));
    }

    #[test]
    fn test_resolve_price_requires_actor() {
        let (repo, service) = setup();
        with_global(&repo, dec!(10));

        let shipment = ShipmentDescriptor::to_zone(dec!(3), "IT-A");
        let err = service.resolve_price(None, &shipment, None).unwrap_err();
        assert!(matches!(err, Error::Pricing(PricingError::NotAuthenticated)));
    }

    #[test]
    fn test_resolve_price_rejects_bad_shipment() {
        let (repo, service) = setup();
        with_global(&repo, dec!(10));

        let shipment = ShipmentDescriptor::to_zone(dec!(0), "IT-A");
        let err = service.resolve_price(Some(&user()), &shipment, None).unwrap_err();
        assert!(matches!(
            err,
            Error::Pricing(PricingError::InvalidShipmentDescriptor(_))
        ));
    }

    #[test]
    fn test_no_list_at_all() {
        let (_repo, service) = setup();
        let shipment = ShipmentDescriptor::to_zone(dec!(3), "IT-A");
        let err = service.resolve_price(Some(&user()), &shipment, None).unwrap_err();
        assert!(matches!(err, Error::Pricing(PricingError::NoApplicablePriceList)));
    }

    #[test]
    fn test_explicit_list_checks() {
        let (repo, service) = setup();
        with_global(&repo, dec!(10));
        repo.add_list(price_list("private", PriceListType::Custom, "someone-else"));
        let mut draft = price_list("draft", PriceListType::Custom, "user-1");
        draft.status = PriceListStatus::Draft;
        repo.add_list(draft);

        let shipment = ShipmentDescriptor::to_zone(dec!(3), "IT-A");

        let err = service
            .resolve_price(Some(&user()), &shipment, Some("missing"))
            .unwrap_err();
        assert!(matches!(err, Error::Pricing(PricingError::PriceListNotFound(_))));

        let err = service
            .resolve_price(Some(&user()), &shipment, Some("private"))
            .unwrap_err();
        assert!(matches!(err, Error::Pricing(PricingError::Unauthorized(_))));

        let err = service
            .resolve_price(Some(&user()), &shipment, Some("draft"))
            .unwrap_err();
        assert!(matches!(err, Error::Pricing(PricingError::NoApplicablePriceList)));

        let ok = service
            .resolve_price(Some(&user()), &shipment, Some("master"))
            .unwrap();
        assert_eq!(ok.final_price, dec!(10.00));
    }

    #[test]
    fn test_best_price_prefers_cheaper_reseller_list() {
        let (repo, service) = setup();
        with_global(&repo, dec!(10));
        repo.add_list(price_list("own", PriceListType::Custom, "reseller-1"));
        repo.add_entry(entry("own", "IT-A", dec!(0), dec!(5), dec!(8)));

        let shipment = ShipmentDescriptor::to_zone(dec!(3), "IT-A");
        let result = service
            .select_best_price(Some(&reseller()), &shipment, None)
            .unwrap();

        assert_eq!(result.api_source, PriceProvenance::Reseller);
        assert_eq!(result.best_price.price_list_id, "own");
        assert_eq!(result.master_price.unwrap().final_price, dec!(10.00));
        assert_eq!(result.price_difference, Some(dec!(-2.00)));
    }

    #[test]
    fn test_best_price_falls_back_to_master_when_cheaper() {
        let (repo, service) = setup();
        with_global(&repo, dec!(10));
        repo.add_list(price_list("own", PriceListType::Custom, "reseller-1"));
        repo.add_entry(entry("own", "IT-A", dec!(0), dec!(5), dec!(14)));

        let shipment = ShipmentDescriptor::to_zone(dec!(3), "IT-A");
        let result = service
            .select_best_price(Some(&reseller()), &shipment, None)
            .unwrap();

        assert_eq!(result.api_source, PriceProvenance::Master);
        assert_eq!(result.best_price.price_list_id, "master");
        assert_eq!(result.price_difference, Some(dec!(4.00)));
    }

    #[test]
    fn test_best_price_tie_is_reseller() {
        let (repo, service) = setup();
        with_global(&repo, dec!(10));
        repo.add_list(price_list("own", PriceListType::Custom, "reseller-1"));
        repo.add_entry(entry("own", "IT-A", dec!(0), dec!(5), dec!(10)));

        let shipment = ShipmentDescriptor::to_zone(dec!(3), "IT-A");
        for _ in 0..5 {
            let result = service
                .select_best_price(Some(&reseller()), &shipment, None)
                .unwrap();
            assert_eq!(result.api_source, PriceProvenance::Reseller);
            assert_eq!(result.price_difference, Some(dec!(0)));
        }
    }

    #[test]
    fn test_best_price_reseller_side_failure_is_silent() {
        let (repo, service) = setup();
        with_global(&repo, dec!(10));
        // Own list only covers up to 2 kg.
        repo.add_list(price_list("own", PriceListType::Custom, "reseller-1"));
        repo.add_entry(entry("own", "IT-A", dec!(0), dec!(2), dec!(5)));

        let shipment = ShipmentDescriptor::to_zone(dec!(3), "IT-A");
        let result = service
            .select_best_price(Some(&reseller()), &shipment, None)
            .unwrap();

        assert_eq!(result.api_source, PriceProvenance::Master);
        assert!(result.reseller_price.is_none());
        assert_eq!(result.price_difference, None);
    }

    #[test]
    fn test_best_price_both_missing() {
        let (_repo, service) = setup();
        let shipment = ShipmentDescriptor::to_zone(dec!(3), "IT-A");
        let err = service
            .select_best_price(Some(&reseller()), &shipment, None)
            .unwrap_err();
        assert!(matches!(err, Error::Pricing(PricingError::NoApplicablePriceList)));
    }

    #[test]
    fn test_custom_lists_preferred_over_supplier() {
        let (repo, service) = setup();
        repo.add_list(price_list("supplier", PriceListType::Supplier, "reseller-1"));
        repo.add_entry(entry("supplier", "IT-A", dec!(0), dec!(5), dec!(4)));
        repo.add_list(price_list("custom", PriceListType::Custom, "reseller-1"));
        repo.add_entry(entry("custom", "IT-A", dec!(0), dec!(5), dec!(9)));

        let shipment = ShipmentDescriptor::to_zone(dec!(3), "IT-A");
        let result = service
            .select_best_price(Some(&reseller()), &shipment, None)
            .unwrap();

        assert_eq!(result.best_price.price_list_id, "custom");
        assert!(result.master_price.is_none());
    }

    #[test]
    fn test_contract_filter_on_reseller_lists() {
        let (repo, service) = setup();
        let mut gls = price_list("gls", PriceListType::Supplier, "reseller-1");
        gls.metadata = PriceListMetadata {
            carrier_code: Some("gls".to_string()),
            contract_code: Some("GLS-Standard-5000".to_string()),
            courier_config_id: None,
        };
        repo.add_list(gls);
        repo.add_entry(entry("gls", "IT-A", dec!(0), dec!(5), dec!(7)));
        let mut brt = price_list("brt", PriceListType::Supplier, "reseller-1");
        brt.metadata.contract_code = Some("brt-express".to_string());
        repo.add_list(brt);
        repo.add_entry(entry("brt", "IT-A", dec!(0), dec!(5), dec!(6)));

        let shipment = ShipmentDescriptor::to_zone(dec!(3), "IT-A");

        let result = service
            .select_best_price(Some(&reseller()), &shipment, Some("gls-standard"))
            .unwrap();
        assert_eq!(result.best_price.price_list_id, "gls");

        let result = service
            .select_best_price(Some(&reseller()), &shipment, None)
            .unwrap();
        assert_eq!(result.best_price.price_list_id, "brt");
    }

    #[test]
    fn test_non_reseller_gets_default_provenance() {
        let (repo, service) = setup();
        with_global(&repo, dec!(10));

        let shipment = ShipmentDescriptor::to_zone(dec!(3), "IT-A");
        let result = service
            .select_best_price(Some(&user()), &shipment, None)
            .unwrap();

        assert_eq!(result.api_source, PriceProvenance::Default);
        assert!(result.reseller_price.is_none());
        assert!(result.master_price.is_none());
    }
}
