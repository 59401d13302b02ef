use common::{CenterCode, FulfillmentId, ProductId};
use thiserror::Error;

use crate::status::FulfillmentStatus;

/// Errors that can occur in the fulfillment workflow and center selection.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The requested status change is not allowed from the current status.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: FulfillmentStatus,
        to: FulfillmentStatus,
    },

    /// Picking cannot complete while pick-list entries remain unpicked.
    #[error("pick incomplete: {remaining} entries still unpicked")]
    PickIncomplete { remaining: usize },

    /// The pick-list index does not exist.
    #[error("pick-list entry {index} not found")]
    PickItemNotFound { index: usize },

    /// Shipping requires a carrier before a tracking number can be generated.
    #[error("no carrier assigned to fulfillment {0}")]
    CarrierNotAssigned(FulfillmentId),

    /// The record has no live reservation to consume or release.
    #[error("no active inventory hold on fulfillment {0}")]
    NoActiveHold(FulfillmentId),

    /// Fulfillments are for whole units; a zero-quantity line is a caller bug.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// No stocked, active center could serve the product at all.
    #[error("no fulfillment center available for product {product_id}")]
    NoFulfillmentCenterAvailable { product_id: ProductId },

    /// Centers carry the product, but none has enough available units.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, best center has {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The fulfillment record does not exist.
    #[error("fulfillment record not found: {0}")]
    RecordNotFound(FulfillmentId),

    /// The center code is not registered in the directory.
    #[error("unknown fulfillment center: {0}")]
    UnknownCenter(CenterCode),

    /// A center with this code is already registered.
    #[error("fulfillment center already registered: {0}")]
    DuplicateCenter(CenterCode),
}

/// Result type for fulfillment operations.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
