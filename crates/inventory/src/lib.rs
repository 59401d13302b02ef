//! Inventory ledger for the fulfillment engine.
//!
//! This crate owns the stock counters for every (product, variant, location)
//! pair and exposes the four atomic operations everything else is built on:
//! reserve, release, commit, and adjust. Each operation runs in a per-record
//! critical section and appends exactly one movement to the record's
//! append-only audit log.

pub mod error;
pub mod ledger;
pub mod movement;
pub mod query;
pub mod record;

pub use error::{InventoryError, Result};
pub use ledger::InventoryLedger;
pub use movement::{
    MovementId, MovementKind, MovementReference, MovementStream, StockMovement,
};
pub use query::InventoryFilter;
pub use record::{InventoryRecord, NewInventoryRecord, StockStatus, StockThresholds};
