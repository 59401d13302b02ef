use fulfillment::FulfillmentError;
use inventory::InventoryError;
use thiserror::Error;

/// Errors surfaced by orchestrator entry points.
///
/// The orchestrator adds no failure modes of its own; it forwards whatever
/// the ledger or the fulfillment workflow rejected.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Fulfillment(#[from] FulfillmentError),
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
