//! Evaluation of ordered price rules.
//!
//! Rules are grouped by category and categories run in a fixed order. Inside
//! a category the first matching rule in declared order applies and the rest
//! of that category is skipped.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::price_lists::{PriceRule, RuleCategory, RuleConditions, RuleEffect};
use crate::pricing::pricing_model::{PriceLine, PriceLineKind, ShipmentDescriptor};
use crate::zones::normalize_zone_code;

/// Facts a rule is matched against.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub shipment: &'a ShipmentDescriptor,
    pub zone_code: &'a str,
    pub taxable_weight: Decimal,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub total: Decimal,
    /// Sum of every rule delta, including the default margin.
    pub adjustment: Decimal,
    pub applied_rule_ids: Vec<String>,
    pub lines: Vec<PriceLine>,
}

pub fn rule_matches(rule: &PriceRule, ctx: &RuleContext<'_>) -> bool {
    if !rule.is_active {
        return false;
    }
    if rule.valid_from.map_or(false, |from| ctx.today < from)
        || rule.valid_until.map_or(false, |until| ctx.today > until)
    {
        return false;
    }
    conditions_match(&rule.conditions, ctx)
}

fn conditions_match(c: &RuleConditions, ctx: &RuleContext<'_>) -> bool {
    let dest = &ctx.shipment.destination;

    if c.weight_from.map_or(false, |from| ctx.taxable_weight < from) {
        return false;
    }
    if c.weight_to.map_or(false, |to| ctx.taxable_weight >= to) {
        return false;
    }
    if !c.zone_codes.is_empty()
        && !c
            .zone_codes
            .iter()
            .any(|z| normalize_zone_code(z) == ctx.zone_code)
    {
        return false;
    }
    if !matches_any(&c.province_codes, dest.province.as_deref()) {
        return false;
    }
    if !matches_any(&c.regions, dest.region.as_deref()) {
        return false;
    }
    if !matches_any(&c.countries, Some(dest.country.as_deref().unwrap_or("IT"))) {
        return false;
    }
    if (c.zip_from.is_some() || c.zip_to.is_some()) && !zip_in_range(c, dest.zip.as_deref()) {
        return false;
    }
    if !c.service_types.is_empty() && !c.service_types.contains(&ctx.shipment.service_type) {
        return false;
    }
    if !c.courier_ids.is_empty()
        && !ctx
            .shipment
            .courier_id
            .as_ref()
            .map_or(false, |id| c.courier_ids.contains(id))
    {
        return false;
    }
    true
}

fn matches_any(allowed: &[String], value: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    match value.map(str::trim) {
        Some(v) => allowed.iter().any(|a| a.trim().eq_ignore_ascii_case(v)),
        None => false,
    }
}

fn zip_in_range(c: &RuleConditions, zip: Option<&str>) -> bool {
    let Some(zip) = zip.map(str::trim) else {
        return false;
    };
    let compare = |bound: &str| -> std::cmp::Ordering {
        match (zip.parse::<u32>(), bound.trim().parse::<u32>()) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            _ => zip.cmp(bound.trim()),
        }
    };
    let above_from = c
        .zip_from
        .as_deref()
        .map_or(true, |from| compare(from) != std::cmp::Ordering::Less);
    let below_to = c
        .zip_to
        .as_deref()
        .map_or(true, |to| compare(to) != std::cmp::Ordering::Greater);
    above_from && below_to
}

fn effect_delta(effect: &RuleEffect, running_total: Decimal) -> Decimal {
    match effect {
        RuleEffect::Override { amount } => *amount - running_total,
        RuleEffect::AddFixed { amount } => *amount,
        RuleEffect::AddPercent { percent } => running_total * *percent / Decimal::ONE_HUNDRED,
    }
}

/// Apply `rules` to `starting_total`.
///
/// When no margin rule matches, `default_margin_percent` is applied as the
/// margin step.
pub fn apply_rules(
    rules: &[PriceRule],
    ctx: &RuleContext<'_>,
    starting_total: Decimal,
    default_margin_percent: Option<Decimal>,
) -> RuleOutcome {
    let mut total = starting_total;
    let mut applied_rule_ids = Vec::new();
    let mut lines = Vec::new();

    for category in RuleCategory::EVALUATION_ORDER {
        let matched = rules
            .iter()
            .filter(|r| r.category == category)
            .find(|r| rule_matches(r, ctx));

        match matched {
            Some(rule) => {
                let delta = effect_delta(&rule.effect, total);
                total += delta;
                applied_rule_ids.push(rule.id.clone());
                lines.push(PriceLine::new(PriceLineKind::Rule, rule.name.clone(), delta));
            }
            None if category == RuleCategory::Margin => {
                if let Some(margin) = default_margin_percent.filter(|m| !m.is_zero()) {
                    let delta = total * margin / Decimal::ONE_HUNDRED;
                    total += delta;
                    lines.push(PriceLine::new(
                        PriceLineKind::Rule,
                        format!("Default margin {}%", margin.normalize()),
                        delta,
                    ));
                }
            }
            None => {}
        }
    }

    RuleOutcome {
        total,
        adjustment: total - starting_total,
        applied_rule_ids,
        lines,
    }
}
