use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

use parcelrate_core::errors::{DatabaseError, Result, ValidationError};
use parcelrate_core::price_lists::{
    NewPriceList, NewPriceListEntry, PriceList, PriceListAssignment, PriceListEntry,
    PriceListRepositoryTrait, PriceListType, PriceListUpdate, ServiceType,
};

use super::model::{PriceListAssignmentDB, PriceListDB, PriceListEntryDB, ENTRY_COLUMNS};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{price_list_assignments, price_list_entries, price_lists};
use crate::utils::{chunk_rows, to_timestamp};

pub struct PriceListRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PriceListRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        PriceListRepository { pool, writer }
    }

    fn load_lists(
        &self,
        query: impl FnOnce(&mut SqliteConnection) -> QueryResult<Vec<PriceListDB>>,
    ) -> Result<Vec<PriceList>> {
        let mut conn = get_connection(&self.pool)?;
        query(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(PriceListDB::into_domain)
            .collect()
    }
}

fn entry_rows(rows: Vec<NewPriceListEntry>) -> Result<Vec<PriceListEntryDB>> {
    for row in &rows {
        row.validate()?;
    }
    let now = to_timestamp(Utc::now());
    Ok(rows
        .into_iter()
        .map(|row| PriceListEntryDB::from_new(Uuid::new_v4().to_string(), row, now))
        .collect())
}

fn insert_entry_rows(conn: &mut SqliteConnection, rows: &[PriceListEntryDB]) -> Result<usize> {
    let mut inserted = 0;
    for chunk in chunk_rows(rows, ENTRY_COLUMNS) {
        inserted += diesel::insert_into(price_list_entries::table)
            .values(chunk)
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(inserted)
}

fn load_list(conn: &mut SqliteConnection, list_id: &str) -> Result<PriceListDB> {
    price_lists::table
        .find(list_id)
        .select(PriceListDB::as_select())
        .first::<PriceListDB>(conn)
        .optional()
        .map_err(StorageError::from)?
        .ok_or_else(|| DatabaseError::NotFound(format!("price list {}", list_id)).into())
}

#[async_trait]
impl PriceListRepositoryTrait for PriceListRepository {
    fn get_by_id(&self, list_id: &str) -> Result<Option<PriceList>> {
        let mut conn = get_connection(&self.pool)?;
        price_lists::table
            .find(list_id)
            .select(PriceListDB::as_select())
            .first::<PriceListDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(PriceListDB::into_domain)
            .transpose()
    }

    fn list_by_owner_or_assignment(&self, actor_id: &str) -> Result<Vec<PriceList>> {
        let assigned_ids = price_list_assignments::table
            .filter(price_list_assignments::user_id.eq(actor_id.to_string()))
            .filter(price_list_assignments::revoked_at.is_null())
            .select(price_list_assignments::price_list_id);

        self.load_lists(|conn| {
            price_lists::table
                .filter(
                    price_lists::created_by
                        .eq(actor_id.to_string())
                        .or(price_lists::assigned_to_user_id.eq(actor_id.to_string()))
                        .or(price_lists::id.eq_any(assigned_ids)),
                )
                .order(price_lists::updated_at.desc())
                .select(PriceListDB::as_select())
                .load::<PriceListDB>(conn)
        })
    }

    fn list_all(&self) -> Result<Vec<PriceList>> {
        self.load_lists(|conn| {
            price_lists::table
                .order(price_lists::updated_at.desc())
                .select(PriceListDB::as_select())
                .load::<PriceListDB>(conn)
        })
    }

    fn list_global(&self) -> Result<Vec<PriceList>> {
        self.load_lists(|conn| {
            price_lists::table
                .filter(price_lists::list_type.eq(PriceListType::Global.as_str()))
                .order(price_lists::updated_at.desc())
                .select(PriceListDB::as_select())
                .load::<PriceListDB>(conn)
        })
    }

    fn list_assigned(&self, actor_id: &str) -> Result<Vec<PriceList>> {
        self.load_lists(|conn| {
            price_lists::table
                .inner_join(price_list_assignments::table)
                .filter(price_list_assignments::user_id.eq(actor_id.to_string()))
                .filter(price_list_assignments::revoked_at.is_null())
                .order(price_list_assignments::assigned_at.desc())
                .select(PriceListDB::as_select())
                .load::<PriceListDB>(conn)
        })
    }

    fn list_legacy_assigned(&self, actor_id: &str) -> Result<Vec<PriceList>> {
        self.load_lists(|conn| {
            price_lists::table
                .filter(price_lists::assigned_to_user_id.eq(actor_id.to_string()))
                .order(price_lists::updated_at.desc())
                .select(PriceListDB::as_select())
                .load::<PriceListDB>(conn)
        })
    }

    fn list_entries(&self, list_id: &str) -> Result<Vec<PriceListEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let mut entries = price_list_entries::table
            .filter(price_list_entries::price_list_id.eq(list_id))
            .select(PriceListEntryDB::as_select())
            .load::<PriceListEntryDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(PriceListEntryDB::into_domain)
            .collect::<Result<Vec<_>>>()?;
        // Weights are decimal text, so numeric ordering happens here.
        entries.sort_by(|a, b| {
            a.zone_code
                .cmp(&b.zone_code)
                .then(a.weight_from.cmp(&b.weight_from))
                .then(a.service_type.as_str().cmp(b.service_type.as_str()))
        });
        Ok(entries)
    }

    fn existing_zone_codes(&self, list_id: &str) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let codes = price_list_entries::table
            .filter(price_list_entries::price_list_id.eq(list_id))
            .select(price_list_entries::zone_code)
            .distinct()
            .order(price_list_entries::zone_code.asc())
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(codes)
    }

    fn list_assignments(&self, list_id: &str) -> Result<Vec<PriceListAssignment>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = price_list_assignments::table
            .filter(price_list_assignments::price_list_id.eq(list_id))
            .order(price_list_assignments::assigned_at.desc())
            .select(PriceListAssignmentDB::as_select())
            .load::<PriceListAssignmentDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(PriceListAssignment::from).collect())
    }

    async fn create(&self, new_list: NewPriceList, actor_id: &str) -> Result<PriceList> {
        let list_id = new_list
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let list = new_list.into_price_list(list_id, actor_id, Utc::now());
        let row = PriceListDB::from_domain(&list)?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PriceList> {
                diesel::insert_into(price_lists::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(list)
            })
            .await
    }

    async fn update(
        &self,
        list_id: &str,
        patch: PriceListUpdate,
        actor_id: &str,
    ) -> Result<PriceList> {
        let list_id = list_id.to_string();
        let actor_id = actor_id.to_string();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PriceList> {
                let mut list = load_list(conn, &list_id)?.into_domain()?;
                patch.apply_to(&mut list, Utc::now())?;

                let row = PriceListDB::from_domain(&list)?;
                diesel::update(price_lists::table.find(&list_id))
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                debug!(
                    "Price list {} updated to version {} by {}",
                    list_id, list.version, actor_id
                );
                Ok(list)
            })
            .await
    }

    async fn delete(&self, list_id: &str) -> Result<usize> {
        let list_id = list_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let deleted = diesel::delete(price_lists::table.find(list_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(deleted)
            })
            .await
    }

    async fn delete_entries(&self, list_id: &str) -> Result<usize> {
        let list_id = list_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let deleted = diesel::delete(
                    price_list_entries::table.filter(price_list_entries::price_list_id.eq(list_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(deleted)
            })
            .await
    }

    async fn bulk_insert_entries(&self, rows: Vec<NewPriceListEntry>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let db_rows = entry_rows(rows)?;

        // One writer job is one transaction: a failing chunk rolls back the
        // chunks already written.
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                insert_entry_rows(conn, &db_rows)
            })
            .await
    }

    async fn replace_zone_entries(
        &self,
        list_id: &str,
        zone_code: &str,
        rows: Vec<NewPriceListEntry>,
    ) -> Result<usize> {
        if let Some(stray) = rows
            .iter()
            .find(|r| r.price_list_id != list_id || r.zone_code != zone_code)
        {
            return Err(ValidationError::InvalidInput(format!(
                "entry for {}/{} does not belong to {}/{}",
                stray.price_list_id, stray.zone_code, list_id, zone_code
            ))
            .into());
        }
        let db_rows = entry_rows(rows)?;
        let list_id = list_id.to_string();
        let zone_code = zone_code.to_string();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let removed = diesel::delete(
                    price_list_entries::table
                        .filter(price_list_entries::price_list_id.eq(&list_id))
                        .filter(price_list_entries::zone_code.eq(&zone_code))
                        .filter(
                            price_list_entries::service_type.eq(ServiceType::Standard.as_str()),
                        ),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                if removed > 0 {
                    debug!("Replacing {} rows of {}/{}", removed, list_id, zone_code);
                }
                insert_entry_rows(conn, &db_rows)
            })
            .await
    }

    async fn assign(
        &self,
        list_id: &str,
        user_id: &str,
        assigned_by: &str,
    ) -> Result<PriceListAssignment> {
        let row = PriceListAssignmentDB {
            id: Uuid::new_v4().to_string(),
            price_list_id: list_id.to_string(),
            user_id: user_id.to_string(),
            assigned_by: assigned_by.to_string(),
            assigned_at: to_timestamp(Utc::now()),
            revoked_at: None,
        };

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PriceListAssignment> {
                load_list(conn, &row.price_list_id)?;
                diesel::insert_into(price_list_assignments::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(PriceListAssignment::from(row))
            })
            .await
    }

    async fn revoke_assignment(&self, list_id: &str, user_id: &str) -> Result<usize> {
        let list_id = list_id.to_string();
        let user_id = user_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let revoked = diesel::update(
                    price_list_assignments::table
                        .filter(price_list_assignments::price_list_id.eq(list_id))
                        .filter(price_list_assignments::user_id.eq(user_id))
                        .filter(price_list_assignments::revoked_at.is_null()),
                )
                .set(price_list_assignments::revoked_at.eq(Some(to_timestamp(Utc::now()))))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(revoked)
            })
            .await
    }
}
