//! Fulfillment workflow for the inventory and fulfillment engine.
//!
//! This crate owns the per-order-line fulfillment records and everything
//! around them: the pick/pack/ship state machine, the fulfillment center
//! directory, deterministic center selection, and carrier tracking numbers.
//! Records reference stock held in the inventory ledger through a
//! [`record::ReservationHold`]; the orchestrator crate ties the two sides
//! together.

pub mod center;
pub mod error;
pub mod record;
pub mod selector;
pub mod status;
pub mod store;
pub mod tracking;

pub use center::{
    Capabilities, CenterDirectory, CenterStatus, CenterType, FulfillmentCenter,
};
pub use error::{FulfillmentError, Result};
pub use record::{
    Address, FulfillmentRecord, FulfillmentType, NewFulfillment, PickItem, ReservationHold,
    ShippingInfo, StatusChange,
};
pub use selector::{CenterSelector, Selection, SelectionRequest};
pub use status::FulfillmentStatus;
pub use store::FulfillmentStore;
