//! Append-only audit trail for stock counter mutations.

use std::pin::Pin;

use chrono::{DateTime, Utc};
use common::{Actor, LineId, OrderId, RecordId};
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single movement entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(Uuid);

impl MovementId {
    /// Creates a new random movement ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MovementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MovementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of counter change a movement describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    /// Stock received (initial intake or positive adjustment).
    In,

    /// Stock permanently deducted at shipment.
    Out,

    /// Negative manual correction (damage, shrinkage).
    Adjustment,

    /// Units moved into the reserved counter.
    Reservation,

    /// Units moved back out of the reserved counter.
    Release,
}

impl MovementKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::In => "In",
            MovementKind::Out => "Out",
            MovementKind::Adjustment => "Adjustment",
            MovementKind::Reservation => "Reservation",
            MovementKind::Release => "Release",
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a movement points back to.
///
/// Modeled as a tagged union rather than a free-form string so callers can
/// trace a counter change to the order line or adjustment ticket behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementReference {
    /// Change driven by an order line (reserve, release, ship).
    Order { order_id: OrderId, line_id: LineId },

    /// Change driven by a stock-adjustment ticket.
    Adjustment { ticket: String },

    /// Ad-hoc operator action with no backing record.
    Manual,
}

/// One immutable audit entry describing a single counter change.
///
/// Movements are appended in the same critical section as the mutation they
/// describe and are never edited or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub record_id: RecordId,
    pub kind: MovementKind,
    pub quantity: u32,
    pub reason: String,
    pub reference: MovementReference,
    pub actor: Actor,
    pub timestamp: DateTime<Utc>,
}

impl StockMovement {
    /// Creates a movement stamped with the current time.
    pub fn new(
        record_id: RecordId,
        kind: MovementKind,
        quantity: u32,
        reason: impl Into<String>,
        reference: MovementReference,
        actor: Actor,
    ) -> Self {
        Self {
            id: MovementId::new(),
            record_id,
            kind,
            quantity,
            reason: reason.into(),
            reference,
            actor,
            timestamp: Utc::now(),
        }
    }
}

/// A lazy, restartable sequence of movements for one record.
pub type MovementStream = Pin<Box<dyn Stream<Item = StockMovement> + Send>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_serialization_roundtrip() {
        let movement = StockMovement::new(
            RecordId::new(),
            MovementKind::Reservation,
            4,
            "order hold",
            MovementReference::Order {
                order_id: OrderId::new(),
                line_id: LineId::new(),
            },
            Actor::system(),
        );

        let json = serde_json::to_string(&movement).unwrap();
        let deserialized: StockMovement = serde_json::from_str(&json).unwrap();
        assert_eq!(movement, deserialized);
    }

    #[test]
    fn kind_display() {
        assert_eq!(MovementKind::In.to_string(), "In");
        assert_eq!(MovementKind::Out.to_string(), "Out");
        assert_eq!(MovementKind::Reservation.to_string(), "Reservation");
    }
}
