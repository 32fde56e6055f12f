//! In-memory quote store shared by the quote service tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::commercial_quotes::{
    CommercialQuote, QuoteEvent, QuoteEventType, QuoteRepositoryTrait, QuoteStatus,
    QuoteStatusChange,
};
use crate::errors::{DatabaseError, Error, Result};

#[derive(Default)]
struct State {
    quotes: Vec<CommercialQuote>,
    events: Vec<QuoteEvent>,
    stale_counts: usize,
    lost_conversions: usize,
}

/// Enforces the unique `(chain root, revision)` pair like the SQLite store.
#[derive(Clone, Default)]
pub struct InMemoryQuoteRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryQuoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` chain counts under-report by one, as if a concurrent
    /// revision landed between counting and inserting.
    pub fn stale_revision_counts(&self, n: usize) {
        self.state.lock().unwrap().stale_counts = n;
    }

    /// The next `n` conversion claims find the quote already converted.
    pub fn lose_conversions(&self, n: usize) {
        self.state.lock().unwrap().lost_conversions = n;
    }

    pub fn events_of(&self, quote_id: &str) -> Vec<QuoteEventType> {
        self.state
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|e| e.quote_id == quote_id)
            .map(|e| e.event_type)
            .collect()
    }

    /// Overwrites a stored quote, bypassing the lifecycle.
    pub fn put(&self, quote: CommercialQuote) {
        let mut state = self.state.lock().unwrap();
        state.quotes.retain(|q| q.id != quote.id);
        state.quotes.push(quote);
    }
}

#[async_trait]
impl QuoteRepositoryTrait for InMemoryQuoteRepository {
    fn get_quote(&self, id: &str) -> Result<Option<CommercialQuote>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .quotes
            .iter()
            .find(|q| q.id == id)
            .cloned())
    }

    fn list_quotes(&self, created_by: Option<&str>) -> Result<Vec<CommercialQuote>> {
        let mut quotes: Vec<CommercialQuote> = self
            .state
            .lock()
            .unwrap()
            .quotes
            .iter()
            .filter(|q| created_by.map_or(true, |c| q.created_by == c))
            .cloned()
            .collect();
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(quotes)
    }

    fn list_chain(&self, root_id: &str) -> Result<Vec<CommercialQuote>> {
        let mut chain: Vec<CommercialQuote> = self
            .state
            .lock()
            .unwrap()
            .quotes
            .iter()
            .filter(|q| q.root_id() == root_id)
            .cloned()
            .collect();
        chain.sort_by_key(|q| q.revision);
        Ok(chain)
    }

    fn count_revisions_in_chain(&self, root_id: &str) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        let count = state.quotes.iter().filter(|q| q.root_id() == root_id).count() as i64;
        if state.stale_counts > 0 {
            state.stale_counts -= 1;
            return Ok(count - 1);
        }
        Ok(count)
    }

    fn list_events(&self, quote_id: &str) -> Result<Vec<QuoteEvent>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|e| e.quote_id == quote_id)
            .cloned()
            .collect())
    }

    async fn insert_quote(&self, quote: CommercialQuote) -> Result<CommercialQuote> {
        let mut state = self.state.lock().unwrap();
        let taken = state
            .quotes
            .iter()
            .any(|q| q.root_id() == quote.root_id() && q.revision == quote.revision);
        if taken {
            return Err(Error::Database(DatabaseError::UniqueViolation(format!(
                "revision {} of {}",
                quote.revision,
                quote.root_id()
            ))));
        }
        state.quotes.push(quote.clone());
        Ok(quote)
    }

    async fn update_quote_status(
        &self,
        id: &str,
        expected: QuoteStatus,
        change: QuoteStatusChange,
    ) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let Some(quote) = state
            .quotes
            .iter_mut()
            .find(|q| q.id == id && q.status == expected)
        else {
            return Ok(0);
        };
        quote.status = change.status;
        if change.sent_at.is_some() {
            quote.sent_at = change.sent_at;
        }
        if change.expires_at.is_some() {
            quote.expires_at = change.expires_at;
        }
        if change.responded_at.is_some() {
            quote.responded_at = change.responded_at;
        }
        if change.response_notes.is_some() {
            quote.response_notes = change.response_notes;
        }
        quote.updated_at = Utc::now();
        Ok(1)
    }

    async fn update_conversion(&self, id: &str, user_id: &str, price_list_id: &str) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        if state.lost_conversions > 0 {
            state.lost_conversions -= 1;
            return Ok(0);
        }
        let Some(quote) = state
            .quotes
            .iter_mut()
            .find(|q| q.id == id && q.converted_user_id.is_none())
        else {
            return Ok(0);
        };
        quote.converted_user_id = Some(user_id.to_string());
        quote.converted_price_list_id = Some(price_list_id.to_string());
        Ok(1)
    }

    async fn append_quote_event(
        &self,
        quote_id: &str,
        event_type: QuoteEventType,
        event_data: serde_json::Value,
        actor_id: Option<&str>,
    ) -> Result<QuoteEvent> {
        let event = QuoteEvent {
            id: Uuid::new_v4().to_string(),
            quote_id: quote_id.to_string(),
            event_type,
            event_data,
            actor_id: actor_id.map(str::to_string),
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().events.push(event.clone());
        Ok(event)
    }

    async fn delete_quote(&self, id: &str) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let before = state.quotes.len();
        state.quotes.retain(|q| q.id != id);
        Ok(before - state.quotes.len())
    }
}
