//! Matrix module - sell price matrices built from cost price lists.

mod matrix_builder;
mod matrix_model;
mod matrix_service;
mod matrix_traits;

pub use matrix_builder::{build_matrix, format_carrier_display_name};
pub use matrix_model::{
    DeliveryMode, MatrixBuildParams, MatrixCell, PriceMatrixSnapshot, WeightRange,
};
pub use matrix_service::MatrixService;
pub use matrix_traits::MatrixServiceTrait;
