use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use parcelrate_core::commercial_quotes::{
    CommercialQuote, QuoteEvent, QuoteEventType, QuoteRepositoryTrait, QuoteStatus,
    QuoteStatusChange,
};
use parcelrate_core::errors::Result;

use super::model::{CommercialQuoteDB, QuoteEventDB, QuoteStatusChangeDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{commercial_quote_events, commercial_quotes};
use crate::utils::to_timestamp;

pub struct QuoteRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl QuoteRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        QuoteRepository { pool, writer }
    }
}

fn into_quotes(rows: Vec<CommercialQuoteDB>) -> Result<Vec<CommercialQuote>> {
    rows.into_iter().map(CommercialQuoteDB::into_domain).collect()
}

#[async_trait]
impl QuoteRepositoryTrait for QuoteRepository {
    fn get_quote(&self, quote_id: &str) -> Result<Option<CommercialQuote>> {
        let mut conn = get_connection(&self.pool)?;
        commercial_quotes::table
            .find(quote_id)
            .select(CommercialQuoteDB::as_select())
            .first::<CommercialQuoteDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(CommercialQuoteDB::into_domain)
            .transpose()
    }

    fn list_quotes(&self, created_by: Option<&str>) -> Result<Vec<CommercialQuote>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = commercial_quotes::table
            .select(CommercialQuoteDB::as_select())
            .order(commercial_quotes::created_at.desc())
            .into_boxed();
        if let Some(creator) = created_by {
            query = query.filter(commercial_quotes::created_by.eq(creator));
        }
        let rows = query
            .load::<CommercialQuoteDB>(&mut conn)
            .map_err(StorageError::from)?;
        into_quotes(rows)
    }

    fn list_chain(&self, root_id: &str) -> Result<Vec<CommercialQuote>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = commercial_quotes::table
            .filter(
                commercial_quotes::id
                    .eq(root_id)
                    .or(commercial_quotes::parent_quote_id.eq(root_id)),
            )
            .order(commercial_quotes::revision.asc())
            .select(CommercialQuoteDB::as_select())
            .load::<CommercialQuoteDB>(&mut conn)
            .map_err(StorageError::from)?;
        into_quotes(rows)
    }

    fn count_revisions_in_chain(&self, root_id: &str) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = commercial_quotes::table
            .filter(
                commercial_quotes::id
                    .eq(root_id)
                    .or(commercial_quotes::parent_quote_id.eq(root_id)),
            )
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count)
    }

    fn list_events(&self, quote_id: &str) -> Result<Vec<QuoteEvent>> {
        let mut conn = get_connection(&self.pool)?;
        commercial_quote_events::table
            .filter(commercial_quote_events::quote_id.eq(quote_id))
            .order(commercial_quote_events::created_at.asc())
            .select(QuoteEventDB::as_select())
            .load::<QuoteEventDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(QuoteEventDB::into_domain)
            .collect()
    }

    async fn insert_quote(&self, quote: CommercialQuote) -> Result<CommercialQuote> {
        let row = CommercialQuoteDB::from_domain(&quote)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<CommercialQuote> {
                diesel::insert_into(commercial_quotes::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(quote)
            })
            .await
    }

    async fn update_quote_status(
        &self,
        quote_id: &str,
        expected: QuoteStatus,
        change: QuoteStatusChange,
    ) -> Result<usize> {
        let quote_id = quote_id.to_string();
        let changeset = QuoteStatusChangeDB::new(change, to_timestamp(Utc::now()));
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let updated = diesel::update(
                    commercial_quotes::table
                        .filter(commercial_quotes::id.eq(quote_id))
                        .filter(commercial_quotes::status.eq(expected.as_str())),
                )
                .set(&changeset)
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(updated)
            })
            .await
    }

    async fn update_conversion(
        &self,
        quote_id: &str,
        converted_user_id: &str,
        converted_price_list_id: &str,
    ) -> Result<usize> {
        let quote_id = quote_id.to_string();
        let user_id = converted_user_id.to_string();
        let list_id = converted_price_list_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let updated = diesel::update(
                    commercial_quotes::table
                        .filter(commercial_quotes::id.eq(quote_id))
                        .filter(commercial_quotes::converted_user_id.is_null()),
                )
                .set((
                    commercial_quotes::converted_user_id.eq(Some(user_id)),
                    commercial_quotes::converted_price_list_id.eq(Some(list_id)),
                    commercial_quotes::updated_at.eq(to_timestamp(Utc::now())),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(updated)
            })
            .await
    }

    async fn append_quote_event(
        &self,
        quote_id: &str,
        event_type: QuoteEventType,
        data: serde_json::Value,
        actor_id: Option<&str>,
    ) -> Result<QuoteEvent> {
        let row = QuoteEventDB {
            id: Uuid::new_v4().to_string(),
            quote_id: quote_id.to_string(),
            event_type: event_type.as_str().to_string(),
            event_data: serde_json::to_string(&data)?,
            actor_id: actor_id.map(str::to_string),
            created_at: to_timestamp(Utc::now()),
        };
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<QuoteEvent> {
                diesel::insert_into(commercial_quote_events::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                row.into_domain()
            })
            .await
    }

    async fn delete_quote(&self, quote_id: &str) -> Result<usize> {
        let quote_id = quote_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let deleted = diesel::delete(commercial_quotes::table.find(quote_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(deleted)
            })
            .await
    }
}
