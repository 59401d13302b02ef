//! Order-fulfillment orchestration.
//!
//! This crate is the write-side entry point of the engine. It wires the
//! inventory ledger, the fulfillment center directory, and the fulfillment
//! store together behind [`FulfillmentOrchestrator`], and runs the
//! [`ExpirySweeper`] that reclaims stock from abandoned reservations.
//!
//! The lifecycle in one breath: `place_fulfillment` picks a center and
//! creates a `Pending` record; advancing to `Confirmed` takes a 24-hour
//! inventory hold; pick, pack, and carrier assignment happen under the
//! record's lock; shipping commits the hold and generates tracking; an exit
//! at any pre-shipment point, including sweeper expiry, releases the hold.

pub mod config;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod sweeper;
pub mod telemetry;

pub use config::Config;
pub use error::{OrchestratorError, Result};
pub use notify::{
    FulfillmentNotice, InMemoryNotificationService, NotificationError, NotificationService,
};
pub use orchestrator::{FulfillmentOrchestrator, PlaceFulfillment};
pub use sweeper::ExpirySweeper;
