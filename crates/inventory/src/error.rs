use common::RecordId;
use thiserror::Error;

/// Errors that can occur when operating on the inventory ledger.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// A reservation asked for more units than are currently available.
    #[error(
        "insufficient stock on record {record_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        record_id: RecordId,
        requested: u32,
        available: u32,
    },

    /// A commit asked for more units than are currently reserved.
    #[error("invalid commit on record {record_id}: requested {requested}, reserved {reserved}")]
    InvalidCommit {
        record_id: RecordId,
        requested: u32,
        reserved: u32,
    },

    /// A manual adjustment would violate the ledger invariant.
    #[error("invalid adjustment on record {record_id}: {reason}")]
    InvalidAdjustment { record_id: RecordId, reason: String },

    /// The stock record does not exist.
    #[error("inventory record not found: {0}")]
    RecordNotFound(RecordId),

    /// The stock record has been retired and no longer accepts holds.
    #[error("inventory record {0} is not active")]
    RecordInactive(RecordId),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
