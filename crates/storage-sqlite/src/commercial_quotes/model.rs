//! Database models for commercial quotes and their event log.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use parcelrate_core::commercial_quotes::{CommercialQuote, QuoteEvent, QuoteStatusChange};
use parcelrate_core::errors::Result;

use crate::utils::{
    decimal_from_text, decimal_to_text, from_timestamp, opt_decimal_from_text, to_timestamp,
};

/// Database model for commercial quotes. Prospect, matrix and clauses are JSON text.
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::commercial_quotes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CommercialQuoteDB {
    pub id: String,
    pub created_by: String,
    pub prospect: String,
    pub carrier_code: String,
    pub contract_code: String,
    pub price_list_id: Option<String>,
    pub margin_percent: String,
    pub margin_fixed_eur: Option<String>,
    pub original_margin_percent: Option<String>,
    pub validity_days: i32,
    pub delivery_mode: String,
    pub pickup_fee: Option<String>,
    pub goods_needs_processing: bool,
    pub processing_fee: Option<String>,
    pub revision: i32,
    pub parent_quote_id: Option<String>,
    pub revision_notes: Option<String>,
    pub price_matrix: String,
    pub clauses: String,
    pub vat_mode: String,
    pub vat_rate: String,
    pub status: String,
    pub sent_at: Option<NaiveDateTime>,
    pub responded_at: Option<NaiveDateTime>,
    pub response_notes: Option<String>,
    pub expires_at: Option<NaiveDateTime>,
    pub converted_user_id: Option<String>,
    pub converted_price_list_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl CommercialQuoteDB {
    pub fn from_domain(quote: &CommercialQuote) -> Result<Self> {
        Ok(Self {
            id: quote.id.clone(),
            created_by: quote.created_by.clone(),
            prospect: serde_json::to_string(&quote.prospect)?,
            carrier_code: quote.carrier_code.clone(),
            contract_code: quote.contract_code.clone(),
            price_list_id: quote.price_list_id.clone(),
            margin_percent: decimal_to_text(quote.margin_percent),
            margin_fixed_eur: quote.margin_fixed_eur.map(decimal_to_text),
            original_margin_percent: quote.original_margin_percent.map(decimal_to_text),
            validity_days: quote.validity_days,
            delivery_mode: quote.delivery_mode.as_str().to_string(),
            pickup_fee: quote.pickup_fee.map(decimal_to_text),
            goods_needs_processing: quote.goods_needs_processing,
            processing_fee: quote.processing_fee.map(decimal_to_text),
            revision: quote.revision,
            parent_quote_id: quote.parent_quote_id.clone(),
            revision_notes: quote.revision_notes.clone(),
            price_matrix: serde_json::to_string(&quote.price_matrix)?,
            clauses: serde_json::to_string(&quote.clauses)?,
            vat_mode: quote.vat_mode.as_str().to_string(),
            vat_rate: decimal_to_text(quote.vat_rate),
            status: quote.status.as_str().to_string(),
            sent_at: quote.sent_at.map(to_timestamp),
            responded_at: quote.responded_at.map(to_timestamp),
            response_notes: quote.response_notes.clone(),
            expires_at: quote.expires_at.map(to_timestamp),
            converted_user_id: quote.converted_user_id.clone(),
            converted_price_list_id: quote.converted_price_list_id.clone(),
            created_at: to_timestamp(quote.created_at),
            updated_at: to_timestamp(quote.updated_at),
        })
    }

    pub fn into_domain(self) -> Result<CommercialQuote> {
        Ok(CommercialQuote {
            id: self.id,
            created_by: self.created_by,
            prospect: serde_json::from_str(&self.prospect)?,
            carrier_code: self.carrier_code,
            contract_code: self.contract_code,
            price_list_id: self.price_list_id,
            margin_percent: decimal_from_text(&self.margin_percent)?,
            margin_fixed_eur: opt_decimal_from_text(self.margin_fixed_eur.as_deref())?,
            original_margin_percent: opt_decimal_from_text(self.original_margin_percent.as_deref())?,
            validity_days: self.validity_days,
            delivery_mode: self.delivery_mode.parse()?,
            pickup_fee: opt_decimal_from_text(self.pickup_fee.as_deref())?,
            goods_needs_processing: self.goods_needs_processing,
            processing_fee: opt_decimal_from_text(self.processing_fee.as_deref())?,
            revision: self.revision,
            parent_quote_id: self.parent_quote_id,
            revision_notes: self.revision_notes,
            price_matrix: serde_json::from_str(&self.price_matrix)?,
            clauses: serde_json::from_str(&self.clauses)?,
            vat_mode: self.vat_mode.parse()?,
            vat_rate: decimal_from_text(&self.vat_rate)?,
            status: self.status.parse()?,
            sent_at: self.sent_at.map(from_timestamp),
            responded_at: self.responded_at.map(from_timestamp),
            response_notes: self.response_notes,
            expires_at: self.expires_at.map(from_timestamp),
            converted_user_id: self.converted_user_id,
            converted_price_list_id: self.converted_price_list_id,
            created_at: from_timestamp(self.created_at),
            updated_at: from_timestamp(self.updated_at),
        })
    }
}

/// Columns written by a status change; `None` fields are left untouched.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::commercial_quotes)]
pub struct QuoteStatusChangeDB {
    pub status: String,
    pub sent_at: Option<NaiveDateTime>,
    pub expires_at: Option<NaiveDateTime>,
    pub responded_at: Option<NaiveDateTime>,
    pub response_notes: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl QuoteStatusChangeDB {
    pub fn new(change: QuoteStatusChange, now: NaiveDateTime) -> Self {
        Self {
            status: change.status.as_str().to_string(),
            sent_at: change.sent_at.map(to_timestamp),
            expires_at: change.expires_at.map(to_timestamp),
            responded_at: change.responded_at.map(to_timestamp),
            response_notes: change.response_notes,
            updated_at: now,
        }
    }
}

/// Database model for quote events
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::commercial_quote_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QuoteEventDB {
    pub id: String,
    pub quote_id: String,
    pub event_type: String,
    pub event_data: String,
    pub actor_id: Option<String>,
    pub created_at: NaiveDateTime,
}

impl QuoteEventDB {
    pub fn into_domain(self) -> Result<QuoteEvent> {
        Ok(QuoteEvent {
            id: self.id,
            quote_id: self.quote_id,
            event_type: self.event_type.parse()?,
            event_data: serde_json::from_str(&self.event_data)?,
            actor_id: self.actor_id,
            created_at: from_timestamp(self.created_at),
        })
    }
}
