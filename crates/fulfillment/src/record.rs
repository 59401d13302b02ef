//! Fulfillment records: one per order line, driving pick/pack/ship.

use chrono::{DateTime, Utc};
use common::{
    Actor, CenterCode, FulfillmentId, LineId, OrderId, ProductId, RecordId, ReservationId,
    SellerId, VariantId,
};
use serde::{Deserialize, Serialize};

use crate::error::{FulfillmentError, Result};
use crate::status::FulfillmentStatus;
use crate::tracking;

/// Which kind of location should serve an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FulfillmentType {
    /// Ship from the seller's own location.
    SellerFulfilled,

    /// Ship from a platform-operated location.
    PlatformFulfilled,

    /// Ship directly from the manufacturer.
    Dropship,
}

impl FulfillmentType {
    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentType::SellerFulfilled => "SellerFulfilled",
            FulfillmentType::PlatformFulfilled => "PlatformFulfilled",
            FulfillmentType::Dropship => "Dropship",
        }
    }
}

impl std::fmt::Display for FulfillmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Destination address. Carried for the carrier handoff; the selector
/// deliberately ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

/// One entry in the append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: FulfillmentStatus,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
    pub actor: Actor,
}

/// A time-bounded claim on reserved stock for one order line.
///
/// This is a reference to the ledger entry plus a quantity snapshot, never a
/// second copy of the mutable counters. Set once at confirmation; cleared
/// only when the hold is released or committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationHold {
    pub reservation_id: ReservationId,
    pub inventory_record_id: RecordId,
    pub quantity: u32,
    pub reserved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ReservationHold {
    /// Returns true once the hold has passed its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// One pick-list entry: where to pick and how many units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickItem {
    pub location: String,
    pub quantity: u32,
    pub picked: bool,
}

/// Shipping metadata, filled in as the record moves toward shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShippingInfo {
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub label_generated: bool,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
}

/// Request to place a fulfillment for one order line.
#[derive(Debug, Clone)]
pub struct NewFulfillment {
    pub order_id: OrderId,
    pub line_id: LineId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
    pub seller_id: SellerId,
    pub destination: Address,
    pub fulfillment_type: FulfillmentType,
}

/// One fulfillment record per (order, order line).
///
/// Transitions are the only way `status` changes; every transition appends
/// exactly one entry to the status history. Terminal records accept audit
/// annotations but nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentRecord {
    pub id: FulfillmentId,
    pub order_id: OrderId,
    pub line_id: LineId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
    pub seller_id: SellerId,
    pub fulfillment_type: FulfillmentType,
    pub center_code: CenterCode,

    /// The ledger entry this record draws stock from.
    pub inventory_record_id: RecordId,

    status: FulfillmentStatus,
    history: Vec<StatusChange>,
    reservation: Option<ReservationHold>,
    pick_list: Vec<PickItem>,
    shipping: ShippingInfo,
    pub destination: Address,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FulfillmentRecord {
    /// Creates a record in `Pending` against the selected center and ledger
    /// entry.
    pub fn place(
        new: NewFulfillment,
        center_code: CenterCode,
        inventory_record_id: RecordId,
        actor: Actor,
    ) -> Self {
        let now = Utc::now();
        let mut record = Self {
            id: FulfillmentId::new(),
            order_id: new.order_id,
            line_id: new.line_id,
            product_id: new.product_id,
            variant_id: new.variant_id,
            quantity: new.quantity,
            seller_id: new.seller_id,
            fulfillment_type: new.fulfillment_type,
            center_code,
            inventory_record_id,
            status: FulfillmentStatus::Pending,
            history: Vec::new(),
            reservation: None,
            pick_list: Vec::new(),
            shipping: ShippingInfo::default(),
            destination: new.destination,
            created_at: now,
            updated_at: now,
        };
        record.history.push(StatusChange {
            status: FulfillmentStatus::Pending,
            timestamp: now,
            note: Some("fulfillment placed".to_string()),
            actor,
        });
        record
    }

    /// Current status.
    pub fn status(&self) -> FulfillmentStatus {
        self.status
    }

    /// Full status history, oldest first.
    pub fn history(&self) -> &[StatusChange] {
        &self.history
    }

    /// The live inventory hold, if one exists.
    pub fn reservation(&self) -> Option<&ReservationHold> {
        self.reservation.as_ref()
    }

    /// Pick-list entries.
    pub fn pick_list(&self) -> &[PickItem] {
        &self.pick_list
    }

    /// Shipping metadata.
    pub fn shipping(&self) -> &ShippingInfo {
        &self.shipping
    }

    /// Returns true if the record holds an expired, still-unreleased
    /// reservation on a pre-shipment record.
    pub fn hold_expired(&self, now: DateTime<Utc>) -> bool {
        self.status.is_pre_shipment()
            && self
                .reservation
                .as_ref()
                .is_some_and(|hold| hold.is_expired(now))
    }

    fn guard(&self, target: FulfillmentStatus) -> Result<()> {
        if !self.status.can_advance_to(target) {
            return Err(FulfillmentError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        Ok(())
    }

    fn transition(&mut self, target: FulfillmentStatus, note: Option<String>, actor: Actor) {
        self.status = target;
        self.updated_at = Utc::now();
        self.history.push(StatusChange {
            status: target,
            timestamp: self.updated_at,
            note,
            actor,
        });
    }

    /// Appends an audit annotation at the current status. Allowed even on
    /// terminal records.
    pub fn annotate(&mut self, note: impl Into<String>, actor: Actor) {
        self.updated_at = Utc::now();
        self.history.push(StatusChange {
            status: self.status,
            timestamp: self.updated_at,
            note: Some(note.into()),
            actor,
        });
    }

    /// `Pending -> Confirmed`: attaches the inventory hold taken by the
    /// orchestrator.
    pub fn confirm(&mut self, hold: ReservationHold, actor: Actor, note: Option<String>) -> Result<()> {
        self.guard(FulfillmentStatus::Confirmed)?;
        self.reservation = Some(hold);
        self.transition(FulfillmentStatus::Confirmed, note, actor);
        Ok(())
    }

    /// `Confirmed -> Picking`: generates the pick list, one entry for the
    /// line's held quantity at the given storage location.
    pub fn start_picking(
        &mut self,
        location: impl Into<String>,
        actor: Actor,
        note: Option<String>,
    ) -> Result<()> {
        self.guard(FulfillmentStatus::Picking)?;
        let hold = self
            .reservation
            .as_ref()
            .ok_or(FulfillmentError::NoActiveHold(self.id))?;
        self.pick_list = vec![PickItem {
            location: location.into(),
            quantity: hold.quantity,
            picked: false,
        }];
        self.transition(FulfillmentStatus::Picking, note, actor);
        Ok(())
    }

    /// Marks one pick-list entry as picked.
    pub fn mark_picked(&mut self, index: usize, actor: Actor) -> Result<()> {
        if self.status != FulfillmentStatus::Picking {
            return Err(FulfillmentError::InvalidTransition {
                from: self.status,
                to: FulfillmentStatus::Picking,
            });
        }
        let item = self
            .pick_list
            .get_mut(index)
            .ok_or(FulfillmentError::PickItemNotFound { index })?;
        item.picked = true;
        self.annotate(format!("pick-list entry {index} picked"), actor);
        Ok(())
    }

    /// `Picking -> Picked`: every entry must be picked.
    pub fn complete_picking(&mut self, actor: Actor, note: Option<String>) -> Result<()> {
        self.guard(FulfillmentStatus::Picked)?;
        let remaining = self.pick_list.iter().filter(|item| !item.picked).count();
        if remaining > 0 {
            return Err(FulfillmentError::PickIncomplete { remaining });
        }
        self.transition(FulfillmentStatus::Picked, note, actor);
        Ok(())
    }

    /// `Picked -> Packing`.
    pub fn start_packing(&mut self, actor: Actor, note: Option<String>) -> Result<()> {
        self.guard(FulfillmentStatus::Packing)?;
        self.transition(FulfillmentStatus::Packing, note, actor);
        Ok(())
    }

    /// `Packing -> Packed`.
    pub fn complete_packing(&mut self, actor: Actor, note: Option<String>) -> Result<()> {
        self.guard(FulfillmentStatus::Packed)?;
        self.transition(FulfillmentStatus::Packed, note, actor);
        Ok(())
    }

    /// Records the carrier that will take the parcel. Only before shipment.
    pub fn assign_carrier(&mut self, carrier: impl Into<String>, actor: Actor) -> Result<()> {
        if !self.status.is_pre_shipment() {
            return Err(FulfillmentError::InvalidTransition {
                from: self.status,
                to: FulfillmentStatus::Shipped,
            });
        }
        let carrier = carrier.into();
        self.annotate(format!("carrier assigned: {carrier}"), actor);
        self.shipping.carrier = Some(carrier);
        Ok(())
    }

    /// Validates that `ship` would succeed, returning the hold that will be
    /// committed. Lets the orchestrator commit stock before mutating.
    pub fn ensure_shippable(&self) -> Result<&ReservationHold> {
        self.guard(FulfillmentStatus::Shipped)?;
        if self.shipping.carrier.is_none() {
            return Err(FulfillmentError::CarrierNotAssigned(self.id));
        }
        self.reservation
            .as_ref()
            .ok_or(FulfillmentError::NoActiveHold(self.id))
    }

    /// `Packed -> Shipped`: generates the tracking number and URL and
    /// consumes the hold. The caller has already committed the stock.
    pub fn ship(&mut self, actor: Actor, note: Option<String>) -> Result<ReservationHold> {
        self.ensure_shippable()?;
        let carrier = self
            .shipping
            .carrier
            .clone()
            .ok_or(FulfillmentError::CarrierNotAssigned(self.id))?;

        let tracking_number = tracking::generate_tracking_number(&carrier);
        self.shipping.tracking_url = tracking::tracking_url(&carrier, &tracking_number);
        self.shipping.tracking_number = Some(tracking_number.clone());
        self.shipping.label_generated = true;

        let hold = self
            .reservation
            .take()
            .ok_or(FulfillmentError::NoActiveHold(self.id))?;
        let note = note.or(Some(format!("shipped via {carrier}: {tracking_number}")));
        self.transition(FulfillmentStatus::Shipped, note, actor);
        Ok(hold)
    }

    /// `Shipped -> Delivered`: stamps the actual delivery time.
    pub fn deliver(&mut self, actor: Actor, note: Option<String>) -> Result<()> {
        self.guard(FulfillmentStatus::Delivered)?;
        self.shipping.actual_delivery = Some(Utc::now());
        self.transition(FulfillmentStatus::Delivered, note, actor);
        Ok(())
    }

    /// Moves to a side exit (`Cancelled`, `Returned`, `Refunded`).
    ///
    /// Before shipment the outstanding hold is handed back to the caller for
    /// release; afterwards the stock is already committed and `None` is
    /// returned. Idempotent against a racing close: once terminal, the guard
    /// rejects a second exit, and the hold can only ever be taken once.
    pub fn close(
        &mut self,
        target: FulfillmentStatus,
        reason: impl Into<String>,
        actor: Actor,
    ) -> Result<Option<ReservationHold>> {
        debug_assert!(target.is_exit());
        self.guard(target)?;
        let hold = if self.status.is_pre_shipment() {
            self.reservation.take()
        } else {
            None
        };
        self.transition(target, Some(reason.into()), actor);
        Ok(hold)
    }
}
