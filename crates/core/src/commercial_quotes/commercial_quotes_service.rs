use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::actors::Actor;
use crate::commercial_quotes::clauses::{default_clauses, merge_with_custom_clauses, ClauseTerms};
use crate::commercial_quotes::commercial_quotes_errors::QuoteError;
use crate::commercial_quotes::commercial_quotes_model::{
    CommercialQuote, DeliveryTerms, NewCommercialQuote, QuoteConversion, QuoteConversionInput,
    QuoteEvent, QuoteEventType, QuotePipelineStats, QuoteRenewalInput, QuoteRevisionInput,
    QuoteStatus, QuoteStatusChange,
};
use crate::commercial_quotes::commercial_quotes_traits::{QuoteRepositoryTrait, QuoteServiceTrait};
use crate::constants::{
    DEFAULT_QUOTE_MARGIN_PERCENT, DEFAULT_QUOTE_VALIDITY_DAYS, DEFAULT_VAT_RATE,
    REVISION_INSERT_ATTEMPTS,
};
use crate::errors::{Result, ValidationError};
use crate::matrix::{
    format_carrier_display_name, MatrixBuildParams, MatrixServiceTrait, PriceMatrixSnapshot,
};
use crate::price_lists::{
    ensure_visible, NewPriceList, NewPriceListEntry, PriceList, PriceListMetadata,
    PriceListRepositoryTrait, PriceListStatus, PriceListType, VatMode,
};
use crate::pricing::PricingError;
use crate::zones::{normalize_zone_code, ZONE_CATALOG};

/// Service managing the commercial quote lifecycle.
pub struct QuoteService {
    repository: Arc<dyn QuoteRepositoryTrait>,
    price_lists: Arc<dyn PriceListRepositoryTrait>,
    matrix_service: Arc<dyn MatrixServiceTrait>,
}

impl QuoteService {
    pub fn new(
        repository: Arc<dyn QuoteRepositoryTrait>,
        price_lists: Arc<dyn PriceListRepositoryTrait>,
        matrix_service: Arc<dyn MatrixServiceTrait>,
    ) -> Self {
        Self {
            repository,
            price_lists,
            matrix_service,
        }
    }

    /// Loads a quote the actor may see. Invisible quotes are reported as missing.
    fn load_visible(&self, actor: &Actor, id: &str) -> Result<CommercialQuote> {
        self.repository
            .get_quote(id)?
            .filter(|q| q.is_visible_to(actor))
            .ok_or_else(|| QuoteError::QuoteNotFound(id.to_string()).into())
    }

    fn reload(&self, id: &str) -> Result<CommercialQuote> {
        self.repository
            .get_quote(id)?
            .ok_or_else(|| QuoteError::QuoteNotFound(id.to_string()).into())
    }

    /// The explicit list, or the first active accessible list carrying the contract code.
    fn resolve_source_list(&self, actor: &Actor, input: &NewCommercialQuote) -> Result<PriceList> {
        if let Some(id) = &input.price_list_id {
            let list = self
                .price_lists
                .get_by_id(id)?
                .ok_or_else(|| PricingError::PriceListNotFound(id.clone()))?;
            ensure_visible(self.price_lists.as_ref(), actor, &list)?;
            return Ok(list);
        }

        let contract = input.contract_code.trim().to_lowercase();
        let mut candidates = if actor.is_admin() {
            self.price_lists.list_all()?
        } else {
            let mut accessible = self.price_lists.list_by_owner_or_assignment(&actor.id)?;
            accessible.extend(self.price_lists.list_global()?);
            accessible
        };
        candidates.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        candidates
            .into_iter()
            .filter(|l| l.status == PriceListStatus::Active)
            .find(|l| {
                l.effective_metadata()
                    .contract_code
                    .map_or(false, |c| c.trim().to_lowercase() == contract)
            })
            .ok_or_else(|| PricingError::PriceListNotFound(input.contract_code.clone()).into())
    }

    fn matrix_params(
        quote_margin: Decimal,
        margin_fixed_eur: Option<Decimal>,
        vat_mode: VatMode,
        vat_rate: Decimal,
        terms: &DeliveryTerms,
        carrier_display_name: String,
        volumetric_divisor: Option<Decimal>,
    ) -> MatrixBuildParams {
        MatrixBuildParams {
            margin_percent: quote_margin,
            margin_fixed_eur,
            vat_mode,
            vat_rate,
            delivery_mode: terms.delivery_mode,
            pickup_fee: terms.pickup_fee,
            goods_needs_processing: terms.goods_needs_processing,
            processing_fee: terms.processing_fee,
            volumetric_divisor,
            carrier_display_name: Some(carrier_display_name),
        }
    }

    /// Builds a fresh matrix for a derived revision when the margin moved,
    /// otherwise reuses the parent's snapshot untouched.
    fn derive_matrix(
        &self,
        actor: &Actor,
        parent: &CommercialQuote,
        margin: Decimal,
        margin_fixed_eur: Option<Decimal>,
        terms: &DeliveryTerms,
    ) -> Result<PriceMatrixSnapshot> {
        let margin_changed =
            margin != parent.margin_percent || margin_fixed_eur != parent.margin_fixed_eur;
        match (&parent.price_list_id, margin_changed) {
            (Some(price_list_id), true) => {
                let params = Self::matrix_params(
                    margin,
                    margin_fixed_eur,
                    parent.vat_mode,
                    parent.vat_rate,
                    terms,
                    parent.price_matrix.carrier_display_name.clone(),
                    Some(parent.price_matrix.volumetric_divisor),
                );
                self.matrix_service.build_matrix(actor, price_list_id, &params)
            }
            (None, true) => {
                warn!(
                    "Quote {} lost its source price list, keeping the previous matrix",
                    parent.id
                );
                Ok(parent.price_matrix.clone())
            }
            (_, false) => Ok(parent.price_matrix.clone()),
        }
    }

    /// Inserts a chained quote, recomputing its revision number when another
    /// revision of the same chain got there first.
    async fn insert_revision(&self, mut quote: CommercialQuote, root_id: &str) -> Result<CommercialQuote> {
        for attempt in 1..=REVISION_INSERT_ATTEMPTS {
            let count = self.repository.count_revisions_in_chain(root_id)?;
            quote.revision = count.max(1) as i32 + 1;
            match self.repository.insert_quote(quote.clone()).await {
                Ok(inserted) => return Ok(inserted),
                Err(e) if e.is_unique_violation() => {
                    warn!(
                        "Revision {} of chain {} already taken (attempt {}/{})",
                        quote.revision, root_id, attempt, REVISION_INSERT_ATTEMPTS
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Err(QuoteError::RevisionConflict(root_id.to_string()).into())
    }

    /// Grid cells of a snapshot as entries of `price_list_id`. Missing and
    /// clamped cells are skipped; a clamped cell would be a free bracket.
    fn snapshot_entries(matrix: &PriceMatrixSnapshot, price_list_id: &str) -> Vec<NewPriceListEntry> {
        let codes: Vec<String> = if matrix.zone_codes.len() == matrix.zones.len() {
            matrix.zone_codes.iter().map(|c| normalize_zone_code(c)).collect()
        } else {
            matrix
                .zones
                .iter()
                .map(|name| {
                    ZONE_CATALOG
                        .iter()
                        .find(|z| z.name.eq_ignore_ascii_case(name))
                        .map(|z| z.code.to_string())
                        .unwrap_or_else(|| normalize_zone_code(name))
                })
                .collect()
        };

        let flagged = |weight_index: usize, zone_index: usize| {
            matrix
                .missing_cells
                .iter()
                .chain(matrix.clamped_cells.iter())
                .any(|c| c.weight_index == weight_index && c.zone_index == zone_index)
        };

        let mut entries = Vec::new();
        for (weight_index, range) in matrix.weight_ranges.iter().enumerate() {
            for (zone_index, code) in codes.iter().enumerate() {
                if flagged(weight_index, zone_index) {
                    continue;
                }
                if let Some(price) = matrix.cell(weight_index, zone_index) {
                    entries.push(NewPriceListEntry::standard(
                        price_list_id,
                        code.clone(),
                        range.from,
                        range.to,
                        price,
                    ));
                }
            }
        }
        if !matrix.clamped_cells.is_empty() {
            warn!(
                "Skipped {} clamped cells while copying a quote matrix into {}",
                matrix.clamped_cells.len(),
                price_list_id
            );
        }
        entries
    }

    /// Removes a client list built by a conversion that did not go through.
    async fn discard_client_list(&self, price_list_id: &str) {
        if let Err(e) = self.price_lists.delete(price_list_id).await {
            error!(
                "Could not remove client price list {} of an abandoned conversion: {}",
                price_list_id, e
            );
        }
    }

    /// Fills and assigns the client list. Returns the number of entries written.
    async fn populate_client_list(
        &self,
        actor: &Actor,
        matrix: &PriceMatrixSnapshot,
        price_list_id: &str,
        client_user_id: &str,
    ) -> Result<usize> {
        let entries = Self::snapshot_entries(matrix, price_list_id);
        let entries_created = self.price_lists.bulk_insert_entries(entries).await?;
        self.price_lists
            .assign(price_list_id, client_user_id, &actor.id)
            .await?;
        Ok(entries_created)
    }
}

fn validate_override(matrix: &PriceMatrixSnapshot) -> Result<()> {
    if matrix.is_empty() {
        return Err(QuoteError::InvalidMatrixOverride("empty matrix".to_string()).into());
    }
    matrix
        .validate_shape()
        .map_err(|reason| QuoteError::InvalidMatrixOverride(reason).into())
}

#[async_trait]
impl QuoteServiceTrait for QuoteService {
    fn get_quote(&self, actor: &Actor, id: &str) -> Result<CommercialQuote> {
        self.load_visible(actor, id)
    }

    fn list_quotes(&self, actor: &Actor) -> Result<Vec<CommercialQuote>> {
        if actor.is_admin() {
            self.repository.list_quotes(None)
        } else {
            self.repository.list_quotes(Some(&actor.id))
        }
    }

    fn list_chain(&self, actor: &Actor, quote_id: &str) -> Result<Vec<CommercialQuote>> {
        let quote = self.load_visible(actor, quote_id)?;
        self.repository.list_chain(quote.root_id())
    }

    fn list_events(&self, actor: &Actor, quote_id: &str) -> Result<Vec<QuoteEvent>> {
        self.load_visible(actor, quote_id)?;
        self.repository.list_events(quote_id)
    }

    fn pipeline_stats(&self, actor: &Actor) -> Result<QuotePipelineStats> {
        let quotes = self.list_quotes(actor)?;
        Ok(QuotePipelineStats::from_statuses(quotes.iter().map(|q| q.status)))
    }

    async fn create_quote(&self, actor: &Actor, input: NewCommercialQuote) -> Result<CommercialQuote> {
        input.validate()?;
        if !actor.role.can_manage_price_lists() {
            return Err(PricingError::Unauthorized("creating commercial quotes".to_string()).into());
        }

        let list = self.resolve_source_list(actor, &input)?;

        let margin = input.margin_percent.unwrap_or(DEFAULT_QUOTE_MARGIN_PERCENT);
        let vat_mode = input.vat_mode.unwrap_or(VatMode::Excluded);
        let vat_rate = input.vat_rate.unwrap_or(DEFAULT_VAT_RATE);
        let validity_days = input.validity_days.unwrap_or(DEFAULT_QUOTE_VALIDITY_DAYS);
        let terms = DeliveryTerms {
            delivery_mode: input.delivery_mode.unwrap_or_default(),
            pickup_fee: input.pickup_fee,
            goods_needs_processing: input.goods_needs_processing.unwrap_or(false),
            processing_fee: input.processing_fee,
        };

        let price_matrix = match input.price_matrix_override.clone() {
            Some(matrix) => {
                validate_override(&matrix)?;
                matrix
            }
            None => {
                let params = Self::matrix_params(
                    margin,
                    input.margin_fixed_eur,
                    vat_mode,
                    vat_rate,
                    &terms,
                    format_carrier_display_name(&input.carrier_code),
                    input.volumetric_divisor,
                );
                self.matrix_service.build_matrix(actor, &list.id, &params)?
            }
        };

        let defaults = default_clauses(&ClauseTerms {
            vat_mode,
            vat_rate,
            delivery: terms,
            validity_days,
            volumetric_divisor: Some(price_matrix.volumetric_divisor),
        });
        let clauses = match &input.clauses {
            Some(custom) => merge_with_custom_clauses(defaults, custom),
            None => defaults,
        };

        let now = Utc::now();
        let quote = CommercialQuote {
            id: Uuid::new_v4().to_string(),
            created_by: actor.id.clone(),
            prospect: input.prospect.normalized(),
            carrier_code: input.carrier_code.trim().to_string(),
            contract_code: input.contract_code.trim().to_string(),
            price_list_id: Some(list.id.clone()),
            margin_percent: margin,
            margin_fixed_eur: input.margin_fixed_eur,
            original_margin_percent: Some(margin),
            validity_days,
            delivery_mode: terms.delivery_mode,
            pickup_fee: terms.pickup_fee,
            goods_needs_processing: terms.goods_needs_processing,
            processing_fee: terms.processing_fee,
            revision: 1,
            parent_quote_id: None,
            revision_notes: None,
            price_matrix,
            clauses,
            vat_mode,
            vat_rate,
            status: QuoteStatus::Draft,
            sent_at: None,
            responded_at: None,
            response_notes: None,
            expires_at: None,
            converted_user_id: None,
            converted_price_list_id: None,
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.insert_quote(quote).await?;
        self.repository
            .append_quote_event(
                &created.id,
                QuoteEventType::Created,
                json!({ "revision": 1, "priceListId": list.id, "marginPercent": margin }),
                Some(&actor.id),
            )
            .await?;
        info!(
            "Created quote {} for '{}' on price list {}",
            created.id, created.prospect.company, list.id
        );
        Ok(created)
    }

    async fn revise_quote(
        &self,
        actor: &Actor,
        parent_quote_id: &str,
        input: QuoteRevisionInput,
    ) -> Result<CommercialQuote> {
        input.validate()?;
        let parent = self.load_visible(actor, parent_quote_id)?;
        let root_id = parent.root_id().to_string();

        let margin = input.margin_percent.unwrap_or(parent.margin_percent);
        let margin_fixed_eur = input.margin_fixed_eur.unwrap_or(parent.margin_fixed_eur);
        let validity_days = input.validity_days.unwrap_or(parent.validity_days);
        let terms = DeliveryTerms {
            delivery_mode: input.delivery_mode.unwrap_or(parent.delivery_mode),
            pickup_fee: input.pickup_fee.or(parent.pickup_fee),
            goods_needs_processing: input
                .goods_needs_processing
                .unwrap_or(parent.goods_needs_processing),
            processing_fee: input.processing_fee.or(parent.processing_fee),
        };

        let price_matrix = self.derive_matrix(actor, &parent, margin, margin_fixed_eur, &terms)?;

        let base_clauses = input.clauses.clone().unwrap_or_else(|| parent.clauses.clone());
        let clauses = if terms != parent.delivery_terms() {
            let defaults = default_clauses(&ClauseTerms {
                vat_mode: parent.vat_mode,
                vat_rate: parent.vat_rate,
                delivery: terms,
                validity_days,
                volumetric_divisor: Some(price_matrix.volumetric_divisor),
            });
            merge_with_custom_clauses(defaults, &base_clauses)
        } else {
            base_clauses
        };

        let now = Utc::now();
        let draft = CommercialQuote {
            id: Uuid::new_v4().to_string(),
            created_by: actor.id.clone(),
            margin_percent: margin,
            margin_fixed_eur,
            original_margin_percent: parent.original_margin_percent.or(Some(parent.margin_percent)),
            validity_days,
            delivery_mode: terms.delivery_mode,
            pickup_fee: terms.pickup_fee,
            goods_needs_processing: terms.goods_needs_processing,
            processing_fee: terms.processing_fee,
            revision: parent.revision + 1,
            parent_quote_id: Some(root_id.clone()),
            revision_notes: input.revision_notes.clone(),
            price_matrix,
            clauses,
            status: QuoteStatus::Draft,
            sent_at: None,
            responded_at: None,
            response_notes: None,
            expires_at: None,
            converted_user_id: None,
            converted_price_list_id: None,
            created_at: now,
            updated_at: now,
            ..parent.clone()
        };

        let revision = self.insert_revision(draft, &root_id).await?;
        self.repository
            .append_quote_event(
                &revision.id,
                QuoteEventType::Revised,
                json!({
                    "previousRevision": parent.revision,
                    "newRevision": revision.revision,
                    "marginChanged": margin != parent.margin_percent
                        || margin_fixed_eur != parent.margin_fixed_eur,
                    "previousMargin": parent.margin_percent,
                    "newMargin": margin,
                }),
                Some(&actor.id),
            )
            .await?;
        info!(
            "Quote chain {} revised to revision {} ({})",
            root_id, revision.revision, revision.id
        );
        Ok(revision)
    }

    async fn transition_quote(
        &self,
        actor: &Actor,
        quote_id: &str,
        new_status: QuoteStatus,
        notes: Option<String>,
    ) -> Result<CommercialQuote> {
        let quote = self.load_visible(actor, quote_id)?;
        let from = quote.status;
        if !from.can_transition_to(new_status) {
            return Err(QuoteError::InvalidTransition {
                from,
                to: new_status,
            }
            .into());
        }

        let now = Utc::now();
        let mut change = QuoteStatusChange::to(new_status);
        match new_status {
            QuoteStatus::Sent => {
                change.sent_at = Some(now);
                change.expires_at = Some(now + Duration::days(i64::from(quote.validity_days)));
            }
            QuoteStatus::Accepted | QuoteStatus::Rejected => {
                change.responded_at = Some(now);
            }
            _ => {}
        }
        change.response_notes = notes.clone().filter(|n| !n.trim().is_empty());

        let updated = self
            .repository
            .update_quote_status(quote_id, from, change)
            .await?;
        if updated == 0 {
            let current = self.reload(quote_id)?;
            return Err(QuoteError::InvalidTransition {
                from: current.status,
                to: new_status,
            }
            .into());
        }

        if let Some(event_type) = QuoteEventType::for_status(new_status) {
            self.repository
                .append_quote_event(
                    quote_id,
                    event_type,
                    json!({ "previousStatus": from, "notes": notes }),
                    Some(&actor.id),
                )
                .await?;
        }
        info!("Quote {} moved {} -> {}", quote_id, from, new_status);
        self.reload(quote_id)
    }

    async fn send_quote(&self, actor: &Actor, quote_id: &str) -> Result<CommercialQuote> {
        let quote = self.load_visible(actor, quote_id)?;
        if !matches!(quote.status, QuoteStatus::Draft | QuoteStatus::Negotiating) {
            return Err(QuoteError::NotDraftOrNegotiating(quote.status).into());
        }
        self.transition_quote(actor, quote_id, QuoteStatus::Sent, None)
            .await
    }

    async fn renew_quote(
        &self,
        actor: &Actor,
        expired_quote_id: &str,
        input: QuoteRenewalInput,
    ) -> Result<CommercialQuote> {
        input.validate()?;
        let expired = self.load_visible(actor, expired_quote_id)?;
        if expired.status != QuoteStatus::Expired {
            return Err(QuoteError::NotExpired(expired.status).into());
        }
        let root_id = expired.root_id().to_string();

        let margin = input.margin_percent.unwrap_or(expired.margin_percent);
        let margin_fixed_eur = input.margin_fixed_eur.unwrap_or(expired.margin_fixed_eur);
        let terms = expired.delivery_terms();
        let price_matrix = self.derive_matrix(actor, &expired, margin, margin_fixed_eur, &terms)?;

        let now = Utc::now();
        let draft = CommercialQuote {
            id: Uuid::new_v4().to_string(),
            created_by: actor.id.clone(),
            margin_percent: margin,
            margin_fixed_eur,
            original_margin_percent: expired
                .original_margin_percent
                .or(Some(expired.margin_percent)),
            validity_days: input.validity_days.unwrap_or(expired.validity_days),
            revision: expired.revision + 1,
            parent_quote_id: Some(root_id.clone()),
            revision_notes: Some(
                input
                    .revision_notes
                    .clone()
                    .unwrap_or_else(|| "Renewal of expired quote".to_string()),
            ),
            price_matrix,
            status: QuoteStatus::Draft,
            sent_at: None,
            responded_at: None,
            response_notes: None,
            expires_at: None,
            converted_user_id: None,
            converted_price_list_id: None,
            created_at: now,
            updated_at: now,
            ..expired.clone()
        };

        let renewal = self.insert_revision(draft, &root_id).await?;
        self.repository
            .append_quote_event(
                &expired.id,
                QuoteEventType::Renewed,
                json!({
                    "newQuoteId": renewal.id,
                    "newRevision": renewal.revision,
                    "newMargin": margin,
                }),
                Some(&actor.id),
            )
            .await?;
        self.repository
            .append_quote_event(
                &renewal.id,
                QuoteEventType::Created,
                json!({ "renewedFrom": expired.id, "revision": renewal.revision }),
                Some(&actor.id),
            )
            .await?;
        info!(
            "Expired quote {} renewed as {} (revision {})",
            expired.id, renewal.id, renewal.revision
        );
        Ok(renewal)
    }

    async fn convert_quote(
        &self,
        actor: &Actor,
        quote_id: &str,
        input: QuoteConversionInput,
    ) -> Result<QuoteConversion> {
        let client_user_id = input.client_user_id.trim().to_string();
        if client_user_id.is_empty() {
            return Err(ValidationError::MissingField("client_user_id".to_string()).into());
        }

        let quote = self.load_visible(actor, quote_id)?;
        if quote.status != QuoteStatus::Accepted {
            return Err(QuoteError::NotAccepted(quote.status).into());
        }
        if quote.converted_user_id.is_some() {
            return Err(QuoteError::AlreadyConverted(quote.id.clone()).into());
        }

        let matrix = &quote.price_matrix;
        let name = input.price_list_name.clone().unwrap_or_else(|| {
            format!("{} - {}", quote.prospect.company, matrix.carrier_display_name)
        });
        let list = self
            .price_lists
            .create(
                NewPriceList {
                    name,
                    description: Some(format!(
                        "From quote {} revision {}",
                        quote.root_id(),
                        quote.revision
                    )),
                    list_type: Some(PriceListType::Custom),
                    status: Some(PriceListStatus::Active),
                    assigned_to_user_id: Some(client_user_id.clone()),
                    master_list_id: quote.price_list_id.clone(),
                    vat_mode: Some(matrix.vat_mode),
                    vat_rate: Some(matrix.vat_rate),
                    metadata: PriceListMetadata {
                        carrier_code: Some(quote.carrier_code.clone()),
                        contract_code: Some(quote.contract_code.clone()),
                        courier_config_id: None,
                    },
                    ..Default::default()
                },
                &actor.id,
            )
            .await?;

        let entries_created = match self
            .populate_client_list(actor, matrix, &list.id, &client_user_id)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                self.discard_client_list(&list.id).await;
                return Err(e);
            }
        };

        // The conditional update is the claim: only one conversion wins.
        let updated = match self
            .repository
            .update_conversion(quote_id, &client_user_id, &list.id)
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                self.discard_client_list(&list.id).await;
                return Err(e);
            }
        };
        if updated == 0 {
            warn!(
                "Quote {} was converted concurrently, dropping price list {}",
                quote_id, list.id
            );
            self.discard_client_list(&list.id).await;
            return Err(QuoteError::AlreadyConverted(quote.id.clone()).into());
        }

        self.repository
            .append_quote_event(
                quote_id,
                QuoteEventType::Converted,
                json!({ "userId": client_user_id, "priceListId": list.id }),
                Some(&actor.id),
            )
            .await?;
        info!(
            "Quote {} converted into price list {} ({} entries) for {}",
            quote_id, list.id, entries_created, client_user_id
        );

        Ok(QuoteConversion {
            user_id: client_user_id,
            price_list_id: list.id,
            entries_created,
        })
    }

    async fn delete_draft(&self, actor: &Actor, quote_id: &str) -> Result<()> {
        let quote = self.load_visible(actor, quote_id)?;
        if quote.status != QuoteStatus::Draft {
            return Err(QuoteError::OnlyDraftDeletable(quote.status).into());
        }
        self.repository.delete_quote(quote_id).await?;
        debug!("Deleted draft quote {}", quote_id);
        Ok(())
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let overdue: Vec<CommercialQuote> = self
            .repository
            .list_quotes(None)?
            .into_iter()
            .filter(|q| q.is_overdue(now))
            .collect();

        let mut expired = Vec::new();
        for quote in overdue {
            let updated = self
                .repository
                .update_quote_status(&quote.id, quote.status, QuoteStatusChange::to(QuoteStatus::Expired))
                .await?;
            if updated == 0 {
                continue;
            }
            self.repository
                .append_quote_event(
                    &quote.id,
                    QuoteEventType::Expired,
                    json!({ "previousStatus": quote.status, "expiresAt": quote.expires_at }),
                    None,
                )
                .await?;
            expired.push(quote.id);
        }
        if !expired.is_empty() {
            info!("Expired {} overdue quotes", expired.len());
        }
        Ok(expired)
    }
}
