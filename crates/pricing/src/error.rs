use thiserror::Error;

use backstock_core::DomainError;
use backstock_products::VariantId;

/// Errors raised by order-draft operations.
///
/// Malformed numeric *input* is deliberately not represented here: the
/// sanitize policy (see [`crate::amount`]) coerces it to zero so that totals
/// keep computing while the user is mid-edit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// The variant is already on the order; adds are rejected, never merged.
    #[error("product variant {0} is already on the order")]
    DuplicateLineItem(VariantId),

    /// The variant is not on the order.
    #[error("product variant {0} is not on the order")]
    UnknownLineItem(VariantId),

    /// A required field was absent on a line-item edit.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

impl From<PricingError> for DomainError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::DuplicateLineItem(_) => DomainError::conflict(err.to_string()),
            PricingError::UnknownLineItem(_) => DomainError::not_found(),
            PricingError::MissingField(_) => DomainError::validation(err.to_string()),
        }
    }
}
