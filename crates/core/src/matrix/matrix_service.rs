use std::sync::Arc;

use chrono::Utc;
use log::debug;

use crate::actors::Actor;
use crate::errors::Result;
use crate::matrix::matrix_builder::build_matrix;
use crate::matrix::matrix_model::{MatrixBuildParams, PriceMatrixSnapshot};
use crate::matrix::matrix_traits::MatrixServiceTrait;
use crate::price_lists::{ensure_visible, PriceListRepositoryTrait};
use crate::pricing::PricingError;

pub struct MatrixService {
    repository: Arc<dyn PriceListRepositoryTrait>,
}

impl MatrixService {
    pub fn new(repository: Arc<dyn PriceListRepositoryTrait>) -> Self {
        Self { repository }
    }
}

impl MatrixServiceTrait for MatrixService {
    fn build_matrix(
        &self,
        actor: &Actor,
        price_list_id: &str,
        params: &MatrixBuildParams,
    ) -> Result<PriceMatrixSnapshot> {
        params.validate()?;
        let list = self
            .repository
            .get_by_id(price_list_id)?
            .ok_or_else(|| PricingError::PriceListNotFound(price_list_id.to_string()))?;
        ensure_visible(self.repository.as_ref(), actor, &list)?;

        let entries = self.repository.list_entries(price_list_id)?;
        let snapshot = build_matrix(&list, &entries, params, Utc::now());
        debug!(
            "Built {}x{} matrix for price list {} ({} missing, {} clamped)",
            snapshot.weight_ranges.len(),
            snapshot.zones.len(),
            price_list_id,
            snapshot.missing_cells.len(),
            snapshot.clamped_cells.len()
        );
        Ok(snapshot)
    }
}
