use crate::actors::Actor;
use crate::errors::Result;
use crate::matrix::matrix_model::{MatrixBuildParams, PriceMatrixSnapshot};

/// Builds sell matrices from stored price lists.
pub trait MatrixServiceTrait: Send + Sync {
    /// Snapshot of the list's current entries under `params`. Fails when the
    /// actor cannot see the list.
    fn build_matrix(
        &self,
        actor: &Actor,
        price_list_id: &str,
        params: &MatrixBuildParams,
    ) -> Result<PriceMatrixSnapshot>;
}
