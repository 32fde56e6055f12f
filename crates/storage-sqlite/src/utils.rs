//! Column conversion and batching helpers shared by the repositories.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use parcelrate_core::errors::{Result, ValidationError};
use rust_decimal::Decimal;

/// Conservative bound on bound parameters per statement.
///
/// Older SQLite builds cap `SQLITE_MAX_VARIABLE_NUMBER` at 999; staying under
/// it keeps multi-row inserts portable across builds.
pub const SQLITE_MAX_PARAMS: usize = 999;

/// Split rows so that one multi-row INSERT never exceeds `SQLITE_MAX_PARAMS`.
pub fn chunk_rows<T>(rows: &[T], columns: usize) -> impl Iterator<Item = &[T]> {
    let per_statement = (SQLITE_MAX_PARAMS / columns.max(1)).max(1);
    rows.chunks(per_statement)
}

/// Money and weights are stored as decimal text to avoid float drift.
pub fn decimal_to_text(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn decimal_from_text(value: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim()).map_err(|e| ValidationError::DecimalParse(e).into())
}

pub fn opt_decimal_from_text(value: Option<&str>) -> Result<Option<Decimal>> {
    value.map(decimal_from_text).transpose()
}

pub fn to_timestamp(value: DateTime<Utc>) -> NaiveDateTime {
    value.naive_utc()
}

pub fn from_timestamp(value: NaiveDateTime) -> DateTime<Utc> {
    value.and_utc()
}
