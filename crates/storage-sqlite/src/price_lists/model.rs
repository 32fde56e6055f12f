//! Database models for price lists, entries and assignments.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use parcelrate_core::errors::Result;
use parcelrate_core::price_lists::{
    NewPriceListEntry, PriceList, PriceListAssignment, PriceListEntry,
};

use crate::utils::{
    decimal_from_text, decimal_to_text, from_timestamp, opt_decimal_from_text, to_timestamp,
};

/// Database model for price lists
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::price_lists)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct PriceListDB {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub list_type: String,
    pub status: String,
    pub created_by: String,
    pub assigned_to_user_id: Option<String>,
    pub master_list_id: Option<String>,
    pub courier_id: Option<String>,
    pub default_margin_percent: Option<String>,
    pub vat_mode: String,
    pub vat_rate: String,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub metadata: String,
    pub source_metadata: String,
    pub rules: String,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl PriceListDB {
    pub fn from_domain(list: &PriceList) -> Result<Self> {
        Ok(Self {
            id: list.id.clone(),
            name: list.name.clone(),
            description: list.description.clone(),
            list_type: list.list_type.as_str().to_string(),
            status: list.status.as_str().to_string(),
            created_by: list.created_by.clone(),
            assigned_to_user_id: list.assigned_to_user_id.clone(),
            master_list_id: list.master_list_id.clone(),
            courier_id: list.courier_id.clone(),
            default_margin_percent: list.default_margin_percent.map(decimal_to_text),
            vat_mode: list.vat_mode.as_str().to_string(),
            vat_rate: decimal_to_text(list.vat_rate),
            valid_from: list.valid_from,
            valid_until: list.valid_until,
            metadata: serde_json::to_string(&list.metadata)?,
            source_metadata: serde_json::to_string(&list.source_metadata)?,
            rules: serde_json::to_string(&list.rules)?,
            version: list.version,
            created_at: to_timestamp(list.created_at),
            updated_at: to_timestamp(list.updated_at),
        })
    }

    pub fn into_domain(self) -> Result<PriceList> {
        Ok(PriceList {
            id: self.id,
            name: self.name,
            description: self.description,
            list_type: self.list_type.parse()?,
            status: self.status.parse()?,
            created_by: self.created_by,
            assigned_to_user_id: self.assigned_to_user_id,
            master_list_id: self.master_list_id,
            courier_id: self.courier_id,
            default_margin_percent: opt_decimal_from_text(self.default_margin_percent.as_deref())?,
            vat_mode: self.vat_mode.parse()?,
            vat_rate: decimal_from_text(&self.vat_rate)?,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            metadata: serde_json::from_str(&self.metadata)?,
            source_metadata: serde_json::from_str(&self.source_metadata)?,
            rules: serde_json::from_str(&self.rules)?,
            version: self.version,
            created_at: from_timestamp(self.created_at),
            updated_at: from_timestamp(self.updated_at),
        })
    }
}

/// Database model for price list entries
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::price_list_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceListEntryDB {
    pub id: String,
    pub price_list_id: String,
    pub zone_code: String,
    pub weight_from: String,
    pub weight_to: String,
    pub service_type: String,
    pub base_price: String,
    pub fuel_surcharge_percent: String,
    pub cash_on_delivery_surcharge: String,
    pub insurance_rate_percent: String,
    pub island_surcharge: String,
    pub ztl_surcharge: String,
    pub created_at: NaiveDateTime,
}

/// Number of bound parameters per entry row.
pub const ENTRY_COLUMNS: usize = 13;

impl PriceListEntryDB {
    pub fn from_new(id: String, entry: NewPriceListEntry, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            price_list_id: entry.price_list_id,
            zone_code: entry.zone_code,
            weight_from: decimal_to_text(entry.weight_from),
            weight_to: decimal_to_text(entry.weight_to),
            service_type: entry.service_type.as_str().to_string(),
            base_price: decimal_to_text(entry.base_price),
            fuel_surcharge_percent: decimal_to_text(entry.fuel_surcharge_percent),
            cash_on_delivery_surcharge: decimal_to_text(entry.cash_on_delivery_surcharge),
            insurance_rate_percent: decimal_to_text(entry.insurance_rate_percent),
            island_surcharge: decimal_to_text(entry.island_surcharge),
            ztl_surcharge: decimal_to_text(entry.ztl_surcharge),
            created_at,
        }
    }

    pub fn into_domain(self) -> Result<PriceListEntry> {
        Ok(PriceListEntry {
            id: self.id,
            price_list_id: self.price_list_id,
            zone_code: self.zone_code,
            weight_from: decimal_from_text(&self.weight_from)?,
            weight_to: decimal_from_text(&self.weight_to)?,
            service_type: self.service_type.parse()?,
            base_price: decimal_from_text(&self.base_price)?,
            fuel_surcharge_percent: decimal_from_text(&self.fuel_surcharge_percent)?,
            cash_on_delivery_surcharge: decimal_from_text(&self.cash_on_delivery_surcharge)?,
            insurance_rate_percent: decimal_from_text(&self.insurance_rate_percent)?,
            island_surcharge: decimal_from_text(&self.island_surcharge)?,
            ztl_surcharge: decimal_from_text(&self.ztl_surcharge)?,
            created_at: from_timestamp(self.created_at),
        })
    }
}

/// Database model for N:N price list assignments
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::price_list_assignments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceListAssignmentDB {
    pub id: String,
    pub price_list_id: String,
    pub user_id: String,
    pub assigned_by: String,
    pub assigned_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
}

impl From<PriceListAssignmentDB> for PriceListAssignment {
    fn from(db: PriceListAssignmentDB) -> Self {
        PriceListAssignment {
            id: db.id,
            price_list_id: db.price_list_id,
            user_id: db.user_id,
            assigned_by: db.assigned_by,
            assigned_at: from_timestamp(db.assigned_at),
            revoked_at: db.revoked_at.map(from_timestamp),
        }
    }
}
