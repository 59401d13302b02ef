//! Orchestrator entry points tying the ledger and the fulfillment workflow
//! together.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Actor, CenterCode, FulfillmentId, LineId, OrderId, ProductId, RecordId, SellerId, VariantId};
use fulfillment::{
    Address, CenterDirectory, CenterSelector, FulfillmentError, FulfillmentRecord,
    FulfillmentStatus, FulfillmentStore, FulfillmentType, NewFulfillment, ReservationHold,
    SelectionRequest,
};
use inventory::{
    InventoryFilter, InventoryLedger, InventoryRecord, MovementReference, StockMovement,
};

use crate::config::Config;
use crate::error::Result;
use crate::notify::{FulfillmentNotice, NotificationService};

/// Command to fulfill one order line.
#[derive(Debug, Clone)]
pub struct PlaceFulfillment {
    pub order_id: OrderId,
    pub line_id: LineId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
    pub seller_id: SellerId,
    pub destination: Address,
    pub fulfillment_type: FulfillmentType,
    pub preferred_center: Option<CenterCode>,
}

/// The engine's single entry point for order-fulfillment work.
///
/// Every mutation of a fulfillment record happens under that record's lock,
/// so concurrent calls against the same fulfillment are serialized. Ledger
/// calls are made while holding the fulfillment lock; the ledger never locks
/// fulfillment records, so the ordering cannot deadlock.
///
/// Notifications are best-effort: a delivery failure is logged and never
/// rolls back or blocks a transition.
pub struct FulfillmentOrchestrator<N: NotificationService> {
    ledger: Arc<InventoryLedger>,
    directory: Arc<CenterDirectory>,
    store: Arc<FulfillmentStore>,
    selector: CenterSelector,
    notifier: Arc<N>,
    config: Config,
}

impl<N: NotificationService> FulfillmentOrchestrator<N> {
    pub fn new(
        ledger: Arc<InventoryLedger>,
        directory: Arc<CenterDirectory>,
        store: Arc<FulfillmentStore>,
        notifier: Arc<N>,
        config: Config,
    ) -> Self {
        Self {
            ledger,
            directory,
            store,
            selector: CenterSelector,
            notifier,
            config,
        }
    }

    /// The fulfillment store, for read-side callers.
    pub fn store(&self) -> &FulfillmentStore {
        &self.store
    }

    /// Places a fulfillment for one order line.
    ///
    /// Selects a center that can cover the quantity and creates the record in
    /// `Pending`. No stock is held yet; the hold is taken when the record is
    /// advanced to `Confirmed` (payment cleared).
    #[tracing::instrument(skip(self, command), fields(order = %command.order_id, product = %command.product_id))]
    pub async fn place_fulfillment(
        &self,
        command: PlaceFulfillment,
        actor: Actor,
    ) -> Result<FulfillmentRecord> {
        if command.quantity == 0 {
            return Err(FulfillmentError::InvalidQuantity.into());
        }

        let selection = self
            .selector
            .select(
                &self.ledger,
                &self.directory,
                &SelectionRequest {
                    product_id: command.product_id.clone(),
                    variant_id: command.variant_id.clone(),
                    seller_id: command.seller_id,
                    quantity: command.quantity,
                    fulfillment_type: command.fulfillment_type,
                    preferred_center: command.preferred_center.clone(),
                },
            )
            .await?;

        let record = FulfillmentRecord::place(
            NewFulfillment {
                order_id: command.order_id,
                line_id: command.line_id,
                product_id: command.product_id,
                variant_id: command.variant_id,
                quantity: command.quantity,
                seller_id: command.seller_id,
                destination: command.destination,
                fulfillment_type: command.fulfillment_type,
            },
            selection.center.code,
            selection.record.id,
            actor,
        );
        self.store.insert(record.clone()).await;

        metrics::counter!("fulfillments_placed_total").increment(1);
        tracing::info!(fulfillment = %record.id, center = %record.center_code, "fulfillment placed");
        Ok(record)
    }

    /// Advances a fulfillment to `target`, running the side effects that
    /// transition carries (reserve on confirm, commit on ship, release on an
    /// exit).
    #[tracing::instrument(skip(self, actor, note), fields(fulfillment = %id, target = %target))]
    pub async fn advance_status(
        &self,
        id: FulfillmentId,
        target: FulfillmentStatus,
        actor: Actor,
        note: Option<String>,
    ) -> Result<FulfillmentRecord> {
        let cell = self.store.cell(id).await?;
        let mut record = cell.lock().await;

        match target {
            FulfillmentStatus::Confirmed => {
                // Check the transition before touching the ledger, so a bad
                // call never leaves an orphaned hold.
                if !record.status().can_advance_to(FulfillmentStatus::Confirmed) {
                    return Err(FulfillmentError::InvalidTransition {
                        from: record.status(),
                        to: FulfillmentStatus::Confirmed,
                    }
                    .into());
                }
                let reservation_id = self
                    .ledger
                    .reserve(
                        record.inventory_record_id,
                        record.quantity,
                        "order hold",
                        self.order_reference(&record),
                        actor.clone(),
                    )
                    .await?;
                let now = Utc::now();
                let hold = ReservationHold {
                    reservation_id,
                    inventory_record_id: record.inventory_record_id,
                    quantity: record.quantity,
                    reserved_at: now,
                    expires_at: now + self.config.reservation_ttl,
                };
                record.confirm(hold, actor, note)?;
                self.notify(FulfillmentNotice::ReservationCreated {
                    order_id: record.order_id,
                    fulfillment_id: record.id,
                })
                .await;
            }
            FulfillmentStatus::Picking => {
                let location = record.center_code.to_string();
                record.start_picking(location, actor, note)?;
            }
            FulfillmentStatus::Picked => record.complete_picking(actor, note)?,
            FulfillmentStatus::Packing => record.start_packing(actor, note)?,
            FulfillmentStatus::Packed => record.complete_packing(actor, note)?,
            FulfillmentStatus::Shipped => {
                // Commit the stock before mutating the record; if the commit
                // fails, the record stays Packed with its hold intact.
                let hold = record.ensure_shippable()?.clone();
                self.ledger
                    .commit(
                        hold.inventory_record_id,
                        hold.quantity,
                        "shipment",
                        self.order_reference(&record),
                        actor.clone(),
                    )
                    .await?;
                record.ship(actor, note)?;
                metrics::counter!("fulfillments_shipped_total").increment(1);

                let shipping = record.shipping();
                if let (Some(carrier), Some(tracking_number)) =
                    (shipping.carrier.clone(), shipping.tracking_number.clone())
                {
                    self.notify(FulfillmentNotice::Shipped {
                        order_id: record.order_id,
                        fulfillment_id: record.id,
                        carrier,
                        tracking_number,
                    })
                    .await;
                }
            }
            FulfillmentStatus::Delivered => {
                record.deliver(actor, note)?;
                self.notify(FulfillmentNotice::Delivered {
                    order_id: record.order_id,
                    fulfillment_id: record.id,
                })
                .await;
            }
            FulfillmentStatus::Cancelled
            | FulfillmentStatus::Returned
            | FulfillmentStatus::Refunded => {
                let reason = note.unwrap_or_else(|| "closed by operator".to_string());
                self.close(&mut record, target, reason, actor).await?;
            }
            FulfillmentStatus::Pending => {
                return Err(FulfillmentError::InvalidTransition {
                    from: record.status(),
                    to: FulfillmentStatus::Pending,
                }
                .into());
            }
        }

        Ok(record.clone())
    }

    /// Cancels a fulfillment, releasing any outstanding hold.
    #[tracing::instrument(skip(self, reason, actor), fields(fulfillment = %id))]
    pub async fn cancel_fulfillment(
        &self,
        id: FulfillmentId,
        reason: impl Into<String>,
        actor: Actor,
    ) -> Result<FulfillmentRecord> {
        let cell = self.store.cell(id).await?;
        let mut record = cell.lock().await;
        self.close(&mut record, FulfillmentStatus::Cancelled, reason.into(), actor)
            .await?;
        Ok(record.clone())
    }

    /// Marks one pick-list entry as picked.
    pub async fn mark_picked(&self, id: FulfillmentId, index: usize, actor: Actor) -> Result<FulfillmentRecord> {
        let cell = self.store.cell(id).await?;
        let mut record = cell.lock().await;
        record.mark_picked(index, actor)?;
        Ok(record.clone())
    }

    /// Assigns the carrier that will take the parcel.
    pub async fn assign_carrier(
        &self,
        id: FulfillmentId,
        carrier: impl Into<String>,
        actor: Actor,
    ) -> Result<FulfillmentRecord> {
        let cell = self.store.cell(id).await?;
        let mut record = cell.lock().await;
        record.assign_carrier(carrier, actor)?;
        Ok(record.clone())
    }

    /// Manual stock correction against one ledger record.
    ///
    /// A ticket reference ties the movement to the ops ticket that ordered
    /// the correction.
    #[tracing::instrument(skip(self, reason, ticket, notes, actor), fields(record = %record_id, delta))]
    pub async fn adjust_inventory(
        &self,
        record_id: RecordId,
        delta: i64,
        reason: impl Into<String>,
        ticket: Option<String>,
        notes: Option<String>,
        actor: Actor,
    ) -> Result<InventoryRecord> {
        let reference = match ticket {
            Some(ticket) => MovementReference::Adjustment { ticket },
            None => MovementReference::Manual,
        };
        let record = self
            .ledger
            .adjust(record_id, delta, reason, reference, actor, notes)
            .await?;
        Ok(record)
    }

    /// Returns a snapshot of one stock record.
    pub async fn get_inventory(&self, record_id: RecordId) -> Result<InventoryRecord> {
        Ok(self.ledger.get(record_id).await?)
    }

    /// Returns stock records matching the filter.
    pub async fn find_inventory(&self, filter: &InventoryFilter) -> Vec<InventoryRecord> {
        self.ledger.find(filter).await
    }

    /// Returns the movement history for one stock record, oldest first.
    pub async fn inventory_movements(&self, record_id: RecordId) -> Result<Vec<StockMovement>> {
        Ok(self.ledger.movements(record_id).await?)
    }

    /// Returns a snapshot of one fulfillment record.
    pub async fn get_fulfillment(&self, id: FulfillmentId) -> Result<FulfillmentRecord> {
        Ok(self.store.get(id).await?)
    }

    /// Returns every fulfillment for an order, in creation order.
    pub async fn fulfillments_for_order(&self, order_id: OrderId) -> Vec<FulfillmentRecord> {
        self.store.for_order(order_id).await
    }

    /// Cancels one fulfillment whose hold has expired, releasing the stock.
    ///
    /// Re-checks expiry under the record lock, so a transition that raced the
    /// sweep scan wins and the record is left alone. Returns whether the
    /// record was expired.
    pub(crate) async fn expire(&self, id: FulfillmentId, now: DateTime<Utc>) -> Result<bool> {
        let cell = self.store.cell(id).await?;
        let mut record = cell.lock().await;
        if !record.hold_expired(now) {
            return Ok(false);
        }
        self.close(
            &mut record,
            FulfillmentStatus::Cancelled,
            "reservation_expired".to_string(),
            Actor::sweeper(),
        )
        .await?;
        metrics::counter!("reservations_expired_total").increment(1);
        Ok(true)
    }

    /// Moves a locked record to an exit state, releasing any outstanding
    /// hold first. Ordered this way so a failed release leaves the record in
    /// its current status with the hold attached, rather than a terminal
    /// record silently dropping a live hold.
    async fn close(
        &self,
        record: &mut FulfillmentRecord,
        target: FulfillmentStatus,
        reason: String,
        actor: Actor,
    ) -> Result<()> {
        if !record.status().can_advance_to(target) {
            return Err(FulfillmentError::InvalidTransition {
                from: record.status(),
                to: target,
            }
            .into());
        }

        if record.status().is_pre_shipment()
            && let Some(hold) = record.reservation()
        {
            self.ledger
                .release(
                    hold.inventory_record_id,
                    hold.quantity,
                    reason.clone(),
                    self.order_reference(record),
                    actor.clone(),
                )
                .await?;
        }
        record.close(target, reason.clone(), actor)?;

        metrics::counter!("fulfillments_closed_total", "target" => target.as_str()).increment(1);
        if target == FulfillmentStatus::Cancelled {
            self.notify(FulfillmentNotice::Cancelled {
                order_id: record.order_id,
                fulfillment_id: record.id,
                reason,
            })
            .await;
        }
        Ok(())
    }

    fn order_reference(&self, record: &FulfillmentRecord) -> MovementReference {
        MovementReference::Order {
            order_id: record.order_id,
            line_id: record.line_id,
        }
    }

    async fn notify(&self, notice: FulfillmentNotice) {
        if let Err(error) = self.notifier.notify(notice).await {
            tracing::warn!(%error, "notification delivery failed, continuing");
        }
    }
}
