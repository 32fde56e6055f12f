use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::actors::Actor;
use crate::commercial_quotes::commercial_quotes_model::{
    CommercialQuote, NewCommercialQuote, QuoteConversion, QuoteConversionInput, QuoteEvent,
    QuoteEventType, QuotePipelineStats, QuoteRenewalInput, QuoteRevisionInput, QuoteStatus,
    QuoteStatusChange,
};
use crate::errors::Result;

/// Persistence of commercial quotes and their event log.
#[async_trait]
pub trait QuoteRepositoryTrait: Send + Sync {
    fn get_quote(&self, id: &str) -> Result<Option<CommercialQuote>>;

    /// Every quote, or those created by `created_by`, newest first.
    fn list_quotes(&self, created_by: Option<&str>) -> Result<Vec<CommercialQuote>>;

    /// Root and revisions of a chain, by revision.
    fn list_chain(&self, root_id: &str) -> Result<Vec<CommercialQuote>>;

    /// Number of quotes in the chain, root included.
    fn count_revisions_in_chain(&self, root_id: &str) -> Result<i64>;

    fn list_events(&self, quote_id: &str) -> Result<Vec<QuoteEvent>>;

    /// Fails with `DatabaseError::UniqueViolation` when `(root, revision)` is taken.
    async fn insert_quote(&self, quote: CommercialQuote) -> Result<CommercialQuote>;

    /// Applies `change` only while the quote is still in `expected`. Returns the
    /// number of updated rows.
    async fn update_quote_status(
        &self,
        id: &str,
        expected: QuoteStatus,
        change: QuoteStatusChange,
    ) -> Result<usize>;

    /// Records a conversion unless one is already recorded. Returns the number of updated rows.
    async fn update_conversion(
        &self,
        id: &str,
        converted_user_id: &str,
        converted_price_list_id: &str,
    ) -> Result<usize>;

    async fn append_quote_event(
        &self,
        quote_id: &str,
        event_type: QuoteEventType,
        data: serde_json::Value,
        actor_id: Option<&str>,
    ) -> Result<QuoteEvent>;

    async fn delete_quote(&self, id: &str) -> Result<usize>;
}

/// Quote lifecycle on behalf of an actor.
#[async_trait]
pub trait QuoteServiceTrait: Send + Sync {
    fn get_quote(&self, actor: &Actor, id: &str) -> Result<CommercialQuote>;
    fn list_quotes(&self, actor: &Actor) -> Result<Vec<CommercialQuote>>;
    fn list_chain(&self, actor: &Actor, quote_id: &str) -> Result<Vec<CommercialQuote>>;
    fn list_events(&self, actor: &Actor, quote_id: &str) -> Result<Vec<QuoteEvent>>;
    fn pipeline_stats(&self, actor: &Actor) -> Result<QuotePipelineStats>;

    async fn create_quote(&self, actor: &Actor, input: NewCommercialQuote) -> Result<CommercialQuote>;
    async fn revise_quote(
        &self,
        actor: &Actor,
        parent_quote_id: &str,
        input: QuoteRevisionInput,
    ) -> Result<CommercialQuote>;
    async fn transition_quote(
        &self,
        actor: &Actor,
        quote_id: &str,
        new_status: QuoteStatus,
        notes: Option<String>,
    ) -> Result<CommercialQuote>;
    async fn send_quote(&self, actor: &Actor, quote_id: &str) -> Result<CommercialQuote>;
    async fn renew_quote(
        &self,
        actor: &Actor,
        expired_quote_id: &str,
        input: QuoteRenewalInput,
    ) -> Result<CommercialQuote>;
    async fn convert_quote(
        &self,
        actor: &Actor,
        quote_id: &str,
        input: QuoteConversionInput,
    ) -> Result<QuoteConversion>;
    async fn delete_draft(&self, actor: &Actor, quote_id: &str) -> Result<()>;
    /// Expires sent/negotiating quotes past their deadline. Returns the expired ids.
    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<Vec<String>>;
}
