//! Fulfillment state machine.

use serde::{Deserialize, Serialize};

/// The status of a fulfillment record in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ─► Confirmed ─► Picking ─► Picked ─► Packing ─► Packed ─► Shipped ─► Delivered
///    │           │           │          │          │          │
///    └───────────┴───────────┴──────────┴──────────┴──────────┴──► Cancelled / Returned / Refunded
/// ```
///
/// `Delivered`, `Cancelled`, `Returned`, and `Refunded` are terminal. The
/// side exits are reachable from every non-terminal state, including
/// `Shipped` (a shipped order can still come back as a return).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FulfillmentStatus {
    /// Record created, no inventory hold taken yet.
    #[default]
    Pending,

    /// Inventory reserved with a 24-hour expiry.
    Confirmed,

    /// Pick list generated, warehouse is picking.
    Picking,

    /// Every pick-list entry picked.
    Picked,

    /// Packing in progress.
    Packing,

    /// Packed and awaiting carrier handoff.
    Packed,

    /// Handed to the carrier; the hold has been committed.
    Shipped,

    /// Confirmed delivered (terminal state).
    Delivered,

    /// Cancelled before completion (terminal state).
    Cancelled,

    /// Returned by the customer (terminal state).
    Returned,

    /// Refunded (terminal state).
    Refunded,
}

impl FulfillmentStatus {
    /// Returns the next state on the forward pick/pack/ship path, if any.
    pub fn next_forward(&self) -> Option<FulfillmentStatus> {
        match self {
            FulfillmentStatus::Pending => Some(FulfillmentStatus::Confirmed),
            FulfillmentStatus::Confirmed => Some(FulfillmentStatus::Picking),
            FulfillmentStatus::Picking => Some(FulfillmentStatus::Picked),
            FulfillmentStatus::Picked => Some(FulfillmentStatus::Packing),
            FulfillmentStatus::Packing => Some(FulfillmentStatus::Packed),
            FulfillmentStatus::Packed => Some(FulfillmentStatus::Shipped),
            FulfillmentStatus::Shipped => Some(FulfillmentStatus::Delivered),
            _ => None,
        }
    }

    /// Returns true if `target` is reachable in one transition from here.
    pub fn can_advance_to(&self, target: FulfillmentStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if target.is_exit() {
            return true;
        }
        self.next_forward() == Some(target)
    }

    /// Returns true for the side-exit states.
    pub fn is_exit(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Cancelled | FulfillmentStatus::Returned | FulfillmentStatus::Refunded
        )
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FulfillmentStatus::Delivered) || self.is_exit()
    }

    /// Returns true for states where the inventory hold has not yet been
    /// committed, so cancellation must release it.
    pub fn is_pre_shipment(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Pending
                | FulfillmentStatus::Confirmed
                | FulfillmentStatus::Picking
                | FulfillmentStatus::Picked
                | FulfillmentStatus::Packing
                | FulfillmentStatus::Packed
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "Pending",
            FulfillmentStatus::Confirmed => "Confirmed",
            FulfillmentStatus::Picking => "Picking",
            FulfillmentStatus::Picked => "Picked",
            FulfillmentStatus::Packing => "Packing",
            FulfillmentStatus::Packed => "Packed",
            FulfillmentStatus::Shipped => "Shipped",
            FulfillmentStatus::Delivered => "Delivered",
            FulfillmentStatus::Cancelled => "Cancelled",
            FulfillmentStatus::Returned => "Returned",
            FulfillmentStatus::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
