//! Price list domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::actors::Actor;
use crate::constants::DEFAULT_VAT_RATE;
use crate::errors::{Error, Result, ValidationError};

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                        "Unknown {} '{}'",
                        stringify!($name),
                        other
                    )))),
                }
            }
        }
    };
}

pub(crate) use string_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceListType {
    /// Platform-wide list, visible to everybody.
    Global,
    /// Cost list of a carrier contract.
    Supplier,
    /// Sell list built for a specific client.
    Custom,
}

string_enum!(PriceListType {
    Global => "global",
    Supplier => "supplier",
    Custom => "custom",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceListStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

string_enum!(PriceListStatus {
    Draft => "draft",
    Active => "active",
    Archived => "archived",
});

/// Whether stored amounts already contain VAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VatMode {
    Included,
    #[default]
    Excluded,
}

string_enum!(VatMode {
    Included => "included",
    Excluded => "excluded",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    #[default]
    Standard,
    Express,
    Economy,
    SameDay,
    NextDay,
}

string_enum!(ServiceType {
    Standard => "standard",
    Express => "express",
    Economy => "economy",
    SameDay => "same_day",
    NextDay => "next_day",
});

/// Carrier provenance of a price list.
///
/// Lists derived from a master carry the master's identifiers in
/// `PriceList::source_metadata`; the list's own fields take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_code: Option<String>,
    /// Courier configuration whose credentials are used to probe rates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_config_id: Option<String>,
}

impl PriceListMetadata {
    pub fn is_empty(&self) -> bool {
        self.carrier_code.is_none() && self.contract_code.is_none() && self.courier_config_id.is_none()
    }

    /// Field-wise merge: values present here win, missing ones come from `fallback`.
    pub fn or(&self, fallback: &PriceListMetadata) -> PriceListMetadata {
        PriceListMetadata {
            carrier_code: pick(&self.carrier_code, &fallback.carrier_code),
            contract_code: pick(&self.contract_code, &fallback.contract_code),
            courier_config_id: pick(&self.courier_config_id, &fallback.courier_config_id),
        }
    }

    /// Blank strings are normalized to `None` at the boundary.
    pub fn normalized(self) -> PriceListMetadata {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        PriceListMetadata {
            carrier_code: clean(self.carrier_code),
            contract_code: clean(self.contract_code),
            courier_config_id: clean(self.courier_config_id),
        }
    }
}

fn pick(primary: &Option<String>, fallback: &Option<String>) -> Option<String> {
    primary.clone().or_else(|| fallback.clone())
}

// ============================================================================
// Rules
// ============================================================================

/// Mutually exclusive rule categories, evaluated in declaration order of this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    BaseOverride,
    Surcharge,
    Margin,
    Discount,
}

impl RuleCategory {
    pub const EVALUATION_ORDER: [RuleCategory; 4] = [
        RuleCategory::BaseOverride,
        RuleCategory::Surcharge,
        RuleCategory::Margin,
        RuleCategory::Discount,
    ];
}

/// What a matching rule does to the running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleEffect {
    /// Replace the running total.
    Override { amount: Decimal },
    /// Add a fixed amount (negative for discounts).
    AddFixed { amount: Decimal },
    /// Add a percentage of the running total (negative for discounts).
    AddPercent { percent: Decimal },
}

/// Conditions of a rule. Empty lists and `None` bounds match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleConditions {
    /// Inclusive lower bound on taxable weight.
    pub weight_from: Option<Decimal>,
    /// Exclusive upper bound on taxable weight.
    pub weight_to: Option<Decimal>,
    pub zone_codes: Vec<String>,
    pub province_codes: Vec<String>,
    pub regions: Vec<String>,
    pub countries: Vec<String>,
    pub zip_from: Option<String>,
    pub zip_to: Option<String>,
    pub service_types: Vec<ServiceType>,
    pub courier_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRule {
    pub id: String,
    pub name: String,
    pub category: RuleCategory,
    #[serde(default)]
    pub conditions: RuleConditions,
    pub effect: RuleEffect,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Price lists
// ============================================================================

/// Domain model representing a price list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceList {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub list_type: PriceListType,
    pub status: PriceListStatus,
    pub created_by: String,
    /// Legacy single assignee; N:N assignments live in their own table.
    pub assigned_to_user_id: Option<String>,
    pub master_list_id: Option<String>,
    /// Restricts the list to one courier; `None` applies to every courier.
    pub courier_id: Option<String>,
    pub default_margin_percent: Option<Decimal>,
    pub vat_mode: VatMode,
    pub vat_rate: Decimal,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub metadata: PriceListMetadata,
    /// Metadata inherited from the master list at derivation time.
    pub source_metadata: PriceListMetadata,
    /// Ordered rule set, evaluated in declared order.
    pub rules: Vec<PriceRule>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PriceList {
    pub fn is_global(&self) -> bool {
        self.list_type == PriceListType::Global
    }

    /// Active status and inside the validity window on `today`.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.status == PriceListStatus::Active
            && self.valid_from.map_or(true, |from| from <= today)
            && self.valid_until.map_or(true, |until| today <= until)
    }

    /// Whether the list applies to the given courier.
    pub fn serves_courier(&self, courier_id: Option<&str>) -> bool {
        match (&self.courier_id, courier_id) {
            (Some(own), Some(requested)) => own == requested,
            _ => true,
        }
    }

    /// Visibility from the list row alone: global, creator, legacy assignee or admin.
    /// N:N assignments are checked by the service against the assignment table.
    pub fn is_visible_to(&self, actor: &Actor) -> bool {
        self.is_global()
            || actor.is_admin()
            || self.created_by == actor.id
            || self.assigned_to_user_id.as_deref() == Some(actor.id.as_str())
    }

    /// Metadata with the documented fallback applied.
    pub fn effective_metadata(&self) -> PriceListMetadata {
        self.metadata.or(&self.source_metadata)
    }
}

/// Input model for creating a price list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPriceList {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub list_type: Option<PriceListType>,
    pub status: Option<PriceListStatus>,
    pub assigned_to_user_id: Option<String>,
    pub master_list_id: Option<String>,
    pub courier_id: Option<String>,
    pub default_margin_percent: Option<Decimal>,
    pub vat_mode: Option<VatMode>,
    pub vat_rate: Option<Decimal>,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub metadata: PriceListMetadata,
    pub source_metadata: PriceListMetadata,
    pub rules: Vec<PriceRule>,
}

impl NewPriceList {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        validate_window(self.valid_from, self.valid_until)?;
        if let Some(rate) = self.vat_rate {
            validate_vat_rate(rate)?;
        }
        Ok(())
    }

    /// Materialize the list with defaults applied.
    pub fn into_price_list(self, id: String, created_by: &str, now: DateTime<Utc>) -> PriceList {
        PriceList {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            list_type: self.list_type.unwrap_or(PriceListType::Supplier),
            status: self.status.unwrap_or_default(),
            created_by: created_by.to_string(),
            assigned_to_user_id: self.assigned_to_user_id,
            master_list_id: self.master_list_id,
            courier_id: self.courier_id,
            default_margin_percent: self.default_margin_percent,
            vat_mode: self.vat_mode.unwrap_or_default(),
            vat_rate: self.vat_rate.unwrap_or(DEFAULT_VAT_RATE),
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            metadata: self.metadata.normalized(),
            source_metadata: self.source_metadata.normalized(),
            rules: self.rules,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a price list. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PriceListUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<PriceListStatus>,
    pub assigned_to_user_id: Option<String>,
    pub courier_id: Option<String>,
    pub default_margin_percent: Option<Decimal>,
    pub vat_mode: Option<VatMode>,
    pub vat_rate: Option<Decimal>,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub metadata: Option<PriceListMetadata>,
    pub rules: Option<Vec<PriceRule>>,
}

impl PriceListUpdate {
    pub fn archive() -> Self {
        Self {
            status: Some(PriceListStatus::Archived),
            ..Default::default()
        }
    }

    /// Apply the patch, bumping the version. Validates the resulting list.
    pub fn apply_to(self, list: &mut PriceList, now: DateTime<Utc>) -> Result<()> {
        if let Some(name) = self.name {
            if name.trim().is_empty() {
                return Err(ValidationError::MissingField("name".to_string()).into());
            }
            list.name = name.trim().to_string();
        }
        if self.description.is_some() {
            list.description = self.description;
        }
        if let Some(status) = self.status {
            list.status = status;
        }
        if self.assigned_to_user_id.is_some() {
            list.assigned_to_user_id = self.assigned_to_user_id;
        }
        if self.courier_id.is_some() {
            list.courier_id = self.courier_id;
        }
        if self.default_margin_percent.is_some() {
            list.default_margin_percent = self.default_margin_percent;
        }
        if let Some(mode) = self.vat_mode {
            list.vat_mode = mode;
        }
        if let Some(rate) = self.vat_rate {
            validate_vat_rate(rate)?;
            list.vat_rate = rate;
        }
        if self.valid_from.is_some() {
            list.valid_from = self.valid_from;
        }
        if self.valid_until.is_some() {
            list.valid_until = self.valid_until;
        }
        validate_window(list.valid_from, list.valid_until)?;
        if let Some(metadata) = self.metadata {
            list.metadata = metadata.normalized();
        }
        if let Some(rules) = self.rules {
            list.rules = rules;
        }
        list.version += 1;
        list.updated_at = now;
        Ok(())
    }
}

fn validate_window(from: Option<NaiveDate>, until: Option<NaiveDate>) -> Result<()> {
    if let (Some(from), Some(until)) = (from, until) {
        if from > until {
            return Err(ValidationError::InvalidInput(format!(
                "valid_from {} is after valid_until {}",
                from, until
            ))
            .into());
        }
    }
    Ok(())
}

fn validate_vat_rate(rate: Decimal) -> Result<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(ValidationError::InvalidInput(format!("VAT rate {} out of range", rate)).into());
    }
    Ok(())
}

// ============================================================================
// Entries
// ============================================================================

/// One pricing row over the half-open weight interval `[weight_from, weight_to)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListEntry {
    pub id: String,
    pub price_list_id: String,
    pub zone_code: String,
    pub weight_from: Decimal,
    pub weight_to: Decimal,
    pub service_type: ServiceType,
    pub base_price: Decimal,
    /// Percent of the base price.
    pub fuel_surcharge_percent: Decimal,
    /// Fixed fee when cash on delivery is requested.
    pub cash_on_delivery_surcharge: Decimal,
    /// Percent of the declared value when insurance is requested.
    pub insurance_rate_percent: Decimal,
    pub island_surcharge: Decimal,
    pub ztl_surcharge: Decimal,
    pub created_at: DateTime<Utc>,
}

impl PriceListEntry {
    pub fn contains_weight(&self, weight: Decimal) -> bool {
        self.weight_from <= weight && weight < self.weight_to
    }
}

/// Input model for inserting an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPriceListEntry {
    pub price_list_id: String,
    pub zone_code: String,
    pub weight_from: Decimal,
    pub weight_to: Decimal,
    #[serde(default)]
    pub service_type: ServiceType,
    pub base_price: Decimal,
    #[serde(default)]
    pub fuel_surcharge_percent: Decimal,
    #[serde(default)]
    pub cash_on_delivery_surcharge: Decimal,
    #[serde(default)]
    pub insurance_rate_percent: Decimal,
    #[serde(default)]
    pub island_surcharge: Decimal,
    #[serde(default)]
    pub ztl_surcharge: Decimal,
}

impl NewPriceListEntry {
    /// A standard-service row with no surcharges.
    pub fn standard(
        price_list_id: impl Into<String>,
        zone_code: impl Into<String>,
        weight_from: Decimal,
        weight_to: Decimal,
        base_price: Decimal,
    ) -> Self {
        Self {
            price_list_id: price_list_id.into(),
            zone_code: zone_code.into(),
            weight_from,
            weight_to,
            service_type: ServiceType::Standard,
            base_price,
            fuel_surcharge_percent: Decimal::ZERO,
            cash_on_delivery_surcharge: Decimal::ZERO,
            insurance_rate_percent: Decimal::ZERO,
            island_surcharge: Decimal::ZERO,
            ztl_surcharge: Decimal::ZERO,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.zone_code.trim().is_empty() {
            return Err(ValidationError::MissingField("zone_code".to_string()).into());
        }
        if self.weight_from < Decimal::ZERO || self.weight_to <= self.weight_from {
            return Err(ValidationError::InvalidInput(format!(
                "invalid weight interval [{}, {})",
                self.weight_from, self.weight_to
            ))
            .into());
        }
        if self.base_price < Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "negative base price {} in zone {}",
                self.base_price, self.zone_code
            ))
            .into());
        }
        Ok(())
    }
}

/// Checks that brackets sharing (zone, service type) neither overlap nor leave gaps.
///
/// Returns the offending (zone, service type, weight) triples; empty means contiguous.
pub fn find_bracket_gaps(entries: &[PriceListEntry]) -> Vec<(String, ServiceType, Decimal)> {
    use std::collections::BTreeMap;

    let mut groups: BTreeMap<(String, &'static str), Vec<&PriceListEntry>> = BTreeMap::new();
    for entry in entries {
        groups
            .entry((entry.zone_code.clone(), entry.service_type.as_str()))
            .or_default()
            .push(entry);
    }

    let mut problems = Vec::new();
    for rows in groups.values_mut() {
        rows.sort_by(|a, b| a.weight_from.cmp(&b.weight_from));
        if let Some(first) = rows.first() {
            if first.weight_from != Decimal::ZERO {
                problems.push((first.zone_code.clone(), first.service_type, first.weight_from));
            }
        }
        for pair in rows.windows(2) {
            if pair[0].weight_to != pair[1].weight_from {
                problems.push((pair[1].zone_code.clone(), pair[1].service_type, pair[1].weight_from));
            }
        }
    }
    problems
}

// ============================================================================
// Assignments
// ============================================================================

/// N:N assignment of a price list to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListAssignment {
    pub id: String,
    pub price_list_id: String,
    pub user_id: String,
    pub assigned_by: String,
    pub assigned_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl PriceListAssignment {
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}
