//! Pure price computation against one price list.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::MONEY_DECIMAL_PLACES;
use crate::price_lists::{PriceList, PriceListEntry, ServiceType, VatMode};
use crate::pricing::pricing_model::{
    Dimensions, PriceCalculationResult, PriceLine, PriceLineKind, PricingSettings,
    ShipmentDescriptor,
};
use crate::pricing::rules::{apply_rules, RuleContext};
use crate::pricing::PricingError;
use crate::zones::{normalize_zone_code, resolve_zone};

/// Round a monetary amount to cents, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `L×W×H / divisor`, in kilograms.
pub fn volumetric_weight(dimensions: &Dimensions, divisor: Decimal) -> Decimal {
    if divisor <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (dimensions.length_cm * dimensions.width_cm * dimensions.height_cm / divisor).round_dp(3)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxableWeight {
    pub actual: Decimal,
    pub volumetric: Option<Decimal>,
    /// The greater of actual and volumetric weight.
    pub taxable: Decimal,
}

pub fn taxable_weight(shipment: &ShipmentDescriptor, divisor: Decimal) -> TaxableWeight {
    let volumetric = shipment
        .dimensions
        .as_ref()
        .map(|d| volumetric_weight(d, divisor));
    let taxable = volumetric.map_or(shipment.weight_kg, |v| v.max(shipment.weight_kg));
    TaxableWeight {
        actual: shipment.weight_kg,
        volumetric,
        taxable,
    }
}

/// The entry whose bracket contains `weight` for the zone and service. No extrapolation.
pub fn find_entry<'a>(
    entries: &'a [PriceListEntry],
    zone_code: &str,
    service_type: ServiceType,
    weight: Decimal,
) -> Option<&'a PriceListEntry> {
    entries.iter().find(|e| {
        e.service_type == service_type
            && e.contains_weight(weight)
            && normalize_zone_code(&e.zone_code) == zone_code
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurchargeBreakdown {
    pub base: Decimal,
    pub surcharges: Decimal,
    pub lines: Vec<PriceLine>,
}

impl SurchargeBreakdown {
    pub fn total(&self) -> Decimal {
        self.base + self.surcharges
    }
}

/// Base price, then fuel, insurance, cash on delivery, island and ZTL, in that order.
pub fn apply_surcharges(entry: &PriceListEntry, shipment: &ShipmentDescriptor) -> SurchargeBreakdown {
    let base = entry.base_price;
    let mut lines = vec![PriceLine::new(PriceLineKind::Base, "Base price", base)];
    let mut surcharges = Decimal::ZERO;

    let mut add = |kind: PriceLineKind, label: &str, amount: Decimal| {
        if !amount.is_zero() {
            surcharges += amount;
            lines.push(PriceLine::new(kind, label, amount));
        }
    };

    add(
        PriceLineKind::FuelSurcharge,
        "Fuel surcharge",
        base * entry.fuel_surcharge_percent / Decimal::ONE_HUNDRED,
    );

    if shipment.insurance {
        let declared = shipment.declared_value.unwrap_or_default();
        add(
            PriceLineKind::Insurance,
            "Insurance",
            declared * entry.insurance_rate_percent / Decimal::ONE_HUNDRED,
        );
    }

    if shipment.cash_on_delivery {
        add(
            PriceLineKind::CashOnDelivery,
            "Cash on delivery",
            entry.cash_on_delivery_surcharge,
        );
    }

    if shipment.destination.is_island {
        add(PriceLineKind::IslandSurcharge, "Island surcharge", entry.island_surcharge);
    }

    if shipment.destination.is_ztl {
        add(PriceLineKind::ZtlSurcharge, "ZTL surcharge", entry.ztl_surcharge);
    }

    SurchargeBreakdown {
        base,
        surcharges,
        lines,
    }
}

/// Split a total expressed in `vat_mode` into (excluded, vat, included), rounded to cents.
pub fn split_vat(total: Decimal, vat_mode: VatMode, vat_rate: Decimal) -> (Decimal, Decimal, Decimal) {
    let factor = Decimal::ONE + vat_rate / Decimal::ONE_HUNDRED;
    match vat_mode {
        VatMode::Excluded => {
            let excl = round_money(total);
            let vat = round_money(excl * vat_rate / Decimal::ONE_HUNDRED);
            (excl, vat, excl + vat)
        }
        VatMode::Included => {
            let incl = round_money(total);
            let excl = round_money(incl / factor);
            (excl, incl - excl, incl)
        }
    }
}

/// Price `shipment` against `list`.
pub fn calculate_price(
    list: &PriceList,
    entries: &[PriceListEntry],
    shipment: &ShipmentDescriptor,
    settings: &PricingSettings,
    today: NaiveDate,
) -> Result<PriceCalculationResult, PricingError> {
    shipment.validate()?;

    let zone_code = resolve_zone(&shipment.destination);
    let weight = taxable_weight(shipment, settings.volumetric_divisor);

    let entry = find_entry(entries, &zone_code, shipment.service_type, weight.taxable).ok_or_else(
        || PricingError::NoApplicableRate {
            zone_code: zone_code.clone(),
            weight: weight.taxable,
        },
    )?;

    let surcharges = apply_surcharges(entry, shipment);
    let ctx = RuleContext {
        shipment,
        zone_code: &zone_code,
        taxable_weight: weight.taxable,
        today,
    };
    let outcome = apply_rules(
        &list.rules,
        &ctx,
        surcharges.total(),
        list.default_margin_percent,
    );

    let total = outcome.total.max(Decimal::ZERO);
    let (total_excl_vat, vat_amount, total_incl_vat) = split_vat(total, list.vat_mode, list.vat_rate);

    let mut breakdown = surcharges.lines.clone();
    breakdown.extend(outcome.lines);
    breakdown.push(PriceLine::new(
        PriceLineKind::Vat,
        format!("VAT {}%", list.vat_rate.normalize()),
        vat_amount,
    ));

    Ok(PriceCalculationResult {
        price_list_id: list.id.clone(),
        price_list_name: list.name.clone(),
        zone_code,
        service_type: shipment.service_type,
        actual_weight: weight.actual,
        volumetric_weight: weight.volumetric,
        taxable_weight: weight.taxable,
        base_price: round_money(surcharges.base),
        surcharges_total: round_money(surcharges.surcharges),
        rules_adjustment: round_money(outcome.adjustment),
        total_excl_vat,
        vat_mode: list.vat_mode,
        vat_rate: list.vat_rate,
        vat_amount,
        total_incl_vat,
        final_price: total_excl_vat,
        applied_rule_ids: outcome.applied_rule_ids,
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_lists::PriceListType;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn entry(zone: &str, from: Decimal, to: Decimal, base: Decimal) -> PriceListEntry {
        PriceListEntry {
            id: format!("{}-{}", zone, from),
            price_list_id: "pl-1".to_string(),
            zone_code: zone.to_string(),
            weight_from: from,
            weight_to: to,
            service_type: ServiceType::Standard,
            base_price: base,
            fuel_surcharge_percent: Decimal::ZERO,
            cash_on_delivery_surcharge: Decimal::ZERO,
            insurance_rate_percent: Decimal::ZERO,
            island_surcharge: Decimal::ZERO,
            ztl_surcharge: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    fn list() -> PriceList {
        crate::price_lists::price_lists_test_utils::price_list("pl-1", PriceListType::Supplier, "owner")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    #[test]
    fn test_fuel_surcharge_on_base() {
        let mut e = entry("IT-A", dec!(0), dec!(5), dec!(10));
        e.fuel_surcharge_percent = dec!(10);
        let shipment = ShipmentDescriptor::to_zone(dec!(3), "IT-A");

        let result =
            calculate_price(&list(), &[e], &shipment, &PricingSettings::default(), today()).unwrap();

        assert_eq!(result.final_price, dec!(11.00));
        assert_eq!(result.surcharges_total, dec!(1.00));
        assert_eq!(result.total_incl_vat, dec!(13.42));
    }

    #[test]
    fn test_upper_bound_is_exclusive_and_no_extrapolation() {
        let entries = vec![entry("IT-A", dec!(0), dec!(5), dec!(10))];
        let settings = PricingSettings::default();

        let at_bound = ShipmentDescriptor::to_zone(dec!(5), "IT-A");
        assert!(matches!(
            calculate_price(&list(), &entries, &at_bound, &settings, today()),
            Err(PricingError::NoApplicableRate { .. })
        ));

        let beyond = ShipmentDescriptor::to_zone(dec!(6), "IT-A");
        let err = calculate_price(&list(), &entries, &beyond, &settings, today()).unwrap_err();
        assert_eq!(
            err,
            PricingError::NoApplicableRate {
                zone_code: "IT-A".to_string(),
                weight: dec!(6),
            }
        );
    }

    #[test]
    fn test_volumetric_weight_selects_bracket() {
        let entries = vec![
            entry("IT-ITALIA", dec!(0), dec!(5), dec!(6)),
            entry("IT-ITALIA", dec!(5), dec!(10), dec!(8)),
        ];
        let mut shipment = ShipmentDescriptor::to_zone(dec!(2), "IT-ITALIA");
        // 40×30×30 / 5000 = 7.2 kg
        shipment.dimensions = Some(Dimensions {
            length_cm: dec!(40),
            width_cm: dec!(30),
            height_cm: dec!(30),
        });

        let result = calculate_price(
            &list(),
            &entries,
            &shipment,
            &PricingSettings::default(),
            today(),
        )
        .unwrap();

        assert_eq!(result.volumetric_weight, Some(dec!(7.2)));
        assert_eq!(result.taxable_weight, dec!(7.2));
        assert_eq!(result.final_price, dec!(8));
    }

    #[test]
    fn test_surcharge_order_and_flags() {
        let mut e = entry("IT-SICILIA", dec!(0), dec!(10), dec!(10));
        e.fuel_surcharge_percent = dec!(5);
        e.insurance_rate_percent = dec!(1);
        e.cash_on_delivery_surcharge = dec!(2.5);
        e.island_surcharge = dec!(3);
        e.ztl_surcharge = dec!(4);

        let mut shipment = ShipmentDescriptor::to_zone(dec!(1), "IT-SICILIA");
        shipment.insurance = true;
        shipment.declared_value = Some(dec!(200));
        shipment.cash_on_delivery = true;
        shipment.destination.is_island = true;

        let breakdown = apply_surcharges(&e, &shipment);
        let kinds: Vec<PriceLineKind> = breakdown.lines.iter().map(|l| l.kind).collect();

        assert_eq!(
            kinds,
            vec![
                PriceLineKind::Base,
                PriceLineKind::FuelSurcharge,
                PriceLineKind::Insurance,
                PriceLineKind::CashOnDelivery,
                PriceLineKind::IslandSurcharge,
            ]
        );
        // 10 + 0.5 + 2 + 2.5 + 3
        assert_eq!(breakdown.total(), dec!(18));
    }

    #[test]
    fn test_vat_included_list_reports_excluded_final_price() {
        let mut l = list();
        l.vat_mode = VatMode::Included;
        let entries = vec![entry("IT-ITALIA", dec!(0), dec!(5), dec!(12.20))];
        let shipment = ShipmentDescriptor::to_zone(dec!(1), "IT-ITALIA");

        let result =
            calculate_price(&l, &entries, &shipment, &PricingSettings::default(), today()).unwrap();

        assert_eq!(result.total_incl_vat, dec!(12.20));
        assert_eq!(result.total_excl_vat, dec!(10.00));
        assert_eq!(result.vat_amount, dec!(2.20));
    }

    #[test]
    fn test_invalid_shipment_rejected() {
        let shipment = ShipmentDescriptor::to_zone(dec!(0), "IT-A");
        assert!(matches!(
            calculate_price(&list(), &[], &shipment, &PricingSettings::default(), today()),
            Err(PricingError::InvalidShipmentDescriptor(_))
        ));
    }
}
