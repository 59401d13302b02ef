//! Shared types for the inventory and fulfillment engine.

pub mod types;

pub use types::{
    Actor, CenterCode, FulfillmentId, LineId, OrderId, ProductId, RecordId, ReservationId,
    SellerId, VariantId,
};
