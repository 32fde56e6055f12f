//! Commercial quote domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};
use crate::matrix::{DeliveryMode, PriceMatrixSnapshot};
use crate::price_lists::{string_enum, VatMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Draft,
    Sent,
    Negotiating,
    Accepted,
    Rejected,
    Expired,
}

string_enum!(QuoteStatus {
    Draft => "draft",
    Sent => "sent",
    Negotiating => "negotiating",
    Accepted => "accepted",
    Rejected => "rejected",
    Expired => "expired",
});

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 6] = [
        QuoteStatus::Draft,
        QuoteStatus::Sent,
        QuoteStatus::Negotiating,
        QuoteStatus::Accepted,
        QuoteStatus::Rejected,
        QuoteStatus::Expired,
    ];

    /// User-driven transitions. Expiry is applied by `expire_overdue` only.
    pub fn allowed_transitions(&self) -> &'static [QuoteStatus] {
        match self {
            QuoteStatus::Draft => &[QuoteStatus::Sent],
            QuoteStatus::Sent => &[
                QuoteStatus::Negotiating,
                QuoteStatus::Accepted,
                QuoteStatus::Rejected,
            ],
            QuoteStatus::Negotiating => &[
                QuoteStatus::Sent,
                QuoteStatus::Accepted,
                QuoteStatus::Rejected,
            ],
            QuoteStatus::Accepted | QuoteStatus::Rejected | QuoteStatus::Expired => &[],
        }
    }

    pub fn can_transition_to(&self, to: QuoteStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Statuses that lapse into `Expired` once past `expires_at`.
    pub fn can_expire(&self) -> bool {
        matches!(self, QuoteStatus::Sent | QuoteStatus::Negotiating)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteEventType {
    Created,
    Updated,
    Sent,
    Viewed,
    Revised,
    Accepted,
    Rejected,
    Expired,
    ReminderSent,
    Renewed,
    Converted,
}

string_enum!(QuoteEventType {
    Created => "created",
    Updated => "updated",
    Sent => "sent",
    Viewed => "viewed",
    Revised => "revised",
    Accepted => "accepted",
    Rejected => "rejected",
    Expired => "expired",
    ReminderSent => "reminder_sent",
    Renewed => "renewed",
    Converted => "converted",
});

impl QuoteEventType {
    /// Event recorded when a quote enters `status`.
    pub fn for_status(status: QuoteStatus) -> Option<QuoteEventType> {
        match status {
            QuoteStatus::Draft => None,
            QuoteStatus::Sent => Some(QuoteEventType::Sent),
            QuoteStatus::Negotiating => Some(QuoteEventType::Updated),
            QuoteStatus::Accepted => Some(QuoteEventType::Accepted),
            QuoteStatus::Rejected => Some(QuoteEventType::Rejected),
            QuoteStatus::Expired => Some(QuoteEventType::Expired),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClauseType {
    #[default]
    Standard,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteClause {
    pub title: String,
    pub text: String,
    #[serde(rename = "type", default)]
    pub clause_type: ClauseType,
}

impl QuoteClause {
    pub fn standard(title: &str, text: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            text: text.into(),
            clause_type: ClauseType::Standard,
        }
    }

    pub fn custom(title: &str, text: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            text: text.into(),
            clause_type: ClauseType::Custom,
        }
    }
}

/// Prospect the quote is addressed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProspectContact {
    pub company: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub sector: Option<String>,
    /// Estimated monthly shipments.
    pub estimated_volume: Option<i32>,
    pub notes: Option<String>,
}

impl ProspectContact {
    pub fn validate(&self) -> Result<()> {
        if self.company.trim().is_empty() {
            return Err(ValidationError::MissingField("prospect_company".to_string()).into());
        }
        if let Some(email) = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            let valid = email
                .split_once('@')
                .map_or(false, |(user, domain)| !user.is_empty() && domain.contains('.'));
            if !valid {
                return Err(ValidationError::InvalidInput(format!(
                    "invalid prospect email '{}'",
                    email
                ))
                .into());
            }
        }
        if self.estimated_volume.map_or(false, |v| v < 0) {
            return Err(ValidationError::InvalidInput(
                "estimated volume must not be negative".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Trimmed copy; the email is lower-cased and blank optionals dropped.
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            company: self.company.trim().to_string(),
            contact_name: clean(self.contact_name),
            email: clean(self.email).map(|e| e.to_lowercase()),
            phone: clean(self.phone),
            sector: clean(self.sector),
            estimated_volume: self.estimated_volume,
            notes: clean(self.notes),
        }
    }
}

/// A revisable commercial proposal with an embedded price matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommercialQuote {
    pub id: String,
    pub created_by: String,
    pub prospect: ProspectContact,
    pub carrier_code: String,
    pub contract_code: String,
    pub price_list_id: Option<String>,
    pub margin_percent: Decimal,
    pub margin_fixed_eur: Option<Decimal>,
    /// Margin of the first revision, kept across the chain.
    pub original_margin_percent: Option<Decimal>,
    pub validity_days: i32,
    pub delivery_mode: DeliveryMode,
    pub pickup_fee: Option<Decimal>,
    pub goods_needs_processing: bool,
    pub processing_fee: Option<Decimal>,
    pub revision: i32,
    /// Root of the revision chain; `None` on the root itself.
    pub parent_quote_id: Option<String>,
    pub revision_notes: Option<String>,
    pub price_matrix: PriceMatrixSnapshot,
    pub clauses: Vec<QuoteClause>,
    pub vat_mode: VatMode,
    pub vat_rate: Decimal,
    pub status: QuoteStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub response_notes: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub converted_user_id: Option<String>,
    pub converted_price_list_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommercialQuote {
    pub fn root_id(&self) -> &str {
        self.parent_quote_id.as_deref().unwrap_or(&self.id)
    }

    pub fn is_visible_to(&self, actor: &crate::actors::Actor) -> bool {
        actor.is_admin() || self.created_by == actor.id
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.can_expire() && self.expires_at.map_or(false, |at| at <= now)
    }

    /// Delivery terms that feed the standard clauses.
    pub fn delivery_terms(&self) -> DeliveryTerms {
        DeliveryTerms {
            delivery_mode: self.delivery_mode,
            pickup_fee: self.pickup_fee,
            goods_needs_processing: self.goods_needs_processing,
            processing_fee: self.processing_fee,
        }
    }
}

/// Inbound logistics terms of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryTerms {
    pub delivery_mode: DeliveryMode,
    pub pickup_fee: Option<Decimal>,
    pub goods_needs_processing: bool,
    pub processing_fee: Option<Decimal>,
}

/// Input model for creating a quote.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCommercialQuote {
    pub prospect: ProspectContact,
    pub carrier_code: String,
    pub contract_code: String,
    /// Explicit source list; otherwise looked up by contract code.
    pub price_list_id: Option<String>,
    pub margin_percent: Option<Decimal>,
    pub margin_fixed_eur: Option<Decimal>,
    pub validity_days: Option<i32>,
    pub clauses: Option<Vec<QuoteClause>>,
    pub vat_mode: Option<VatMode>,
    pub vat_rate: Option<Decimal>,
    pub delivery_mode: Option<DeliveryMode>,
    pub pickup_fee: Option<Decimal>,
    pub goods_needs_processing: Option<bool>,
    pub processing_fee: Option<Decimal>,
    pub volumetric_divisor: Option<Decimal>,
    /// Hand-edited matrix used instead of building one.
    pub price_matrix_override: Option<PriceMatrixSnapshot>,
}

impl NewCommercialQuote {
    pub fn validate(&self) -> Result<()> {
        self.prospect.validate()?;
        if self.carrier_code.trim().is_empty() {
            return Err(ValidationError::MissingField("carrier_code".to_string()).into());
        }
        if self.contract_code.trim().is_empty() {
            return Err(ValidationError::MissingField("contract_code".to_string()).into());
        }
        validate_validity(self.validity_days)?;
        validate_margin(self.margin_percent)
    }
}

/// Input model for a new revision of an existing quote. `None` keeps the parent's value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteRevisionInput {
    pub revision_notes: Option<String>,
    pub margin_percent: Option<Decimal>,
    /// `None` keeps the parent's fixed margin, `Some(None)` removes it.
    #[serde(deserialize_with = "deserialize_some")]
    pub margin_fixed_eur: Option<Option<Decimal>>,
    pub validity_days: Option<i32>,
    pub clauses: Option<Vec<QuoteClause>>,
    pub delivery_mode: Option<DeliveryMode>,
    pub pickup_fee: Option<Decimal>,
    pub goods_needs_processing: Option<bool>,
    pub processing_fee: Option<Decimal>,
}

impl QuoteRevisionInput {
    pub fn validate(&self) -> Result<()> {
        validate_validity(self.validity_days)?;
        validate_margin(self.margin_percent)
    }
}

/// Input model for renewing an expired quote.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteRenewalInput {
    pub revision_notes: Option<String>,
    pub margin_percent: Option<Decimal>,
    /// `None` keeps the expired quote's fixed margin, `Some(None)` removes it.
    #[serde(deserialize_with = "deserialize_some")]
    pub margin_fixed_eur: Option<Option<Decimal>>,
    pub validity_days: Option<i32>,
}

impl QuoteRenewalInput {
    pub fn validate(&self) -> Result<()> {
        validate_validity(self.validity_days)?;
        validate_margin(self.margin_percent)
    }
}

/// Tells a present `null` apart from a missing field.
fn deserialize_some<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Input model for turning an accepted quote into a client price list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteConversionInput {
    /// Already provisioned client account receiving the list.
    pub client_user_id: String,
    pub price_list_name: Option<String>,
}

/// Outcome of a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteConversion {
    pub user_id: String,
    pub price_list_id: String,
    pub entries_created: usize,
}

fn validate_validity(days: Option<i32>) -> Result<()> {
    if days.map_or(false, |d| d <= 0) {
        return Err(ValidationError::InvalidInput("validity days must be positive".to_string()).into());
    }
    Ok(())
}

fn validate_margin(margin: Option<Decimal>) -> Result<()> {
    if margin.map_or(false, |m| m < -Decimal::ONE_HUNDRED) {
        return Err(ValidationError::InvalidInput(
            "margin percent must be at least -100".to_string(),
        )
        .into());
    }
    Ok(())
}

/// Fields written by a status change. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteStatusChange {
    pub status: QuoteStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub response_notes: Option<String>,
}

impl QuoteStatusChange {
    pub fn to(status: QuoteStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }
}

/// Append-only lifecycle record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEvent {
    pub id: String,
    pub quote_id: String,
    pub event_type: QuoteEventType,
    pub event_data: serde_json::Value,
    pub actor_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePipelineStats {
    pub draft: usize,
    pub sent: usize,
    pub negotiating: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub expired: usize,
    pub total: usize,
    /// `accepted / (accepted + rejected)`, zero without outcomes.
    pub conversion_rate: Decimal,
}

impl QuotePipelineStats {
    pub fn from_statuses(statuses: impl IntoIterator<Item = QuoteStatus>) -> Self {
        let mut stats = Self::default();
        for status in statuses {
            stats.total += 1;
            match status {
                QuoteStatus::Draft => stats.draft += 1,
                QuoteStatus::Sent => stats.sent += 1,
                QuoteStatus::Negotiating => stats.negotiating += 1,
                QuoteStatus::Accepted => stats.accepted += 1,
                QuoteStatus::Rejected => stats.rejected += 1,
                QuoteStatus::Expired => stats.expired += 1,
            }
        }
        let outcomes = stats.accepted + stats.rejected;
        if outcomes > 0 {
            stats.conversion_rate =
                (Decimal::from(stats.accepted) / Decimal::from(outcomes)).round_dp(4);
        }
        stats
    }
}
