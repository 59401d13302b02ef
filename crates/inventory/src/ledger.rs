//! The inventory ledger: serialized per-record counter mutations with an
//! append-only movement log.

use std::collections::HashMap;
use std::sync::Arc;

use common::{Actor, RecordId, ReservationId};
use futures_util::stream;
use tokio::sync::{Mutex, RwLock};

use crate::error::{InventoryError, Result};
use crate::movement::{MovementKind, MovementReference, MovementStream, StockMovement};
use crate::query::InventoryFilter;
use crate::record::{InventoryRecord, NewInventoryRecord, StockStatus};

/// The ledger owning all stock records and their movement logs.
///
/// Each record sits behind its own mutex, so operations against different
/// records proceed independently while operations against the same record are
/// mutually exclusive. A counter mutation and its movement append happen
/// inside the same critical section; observers never see one without the
/// other. Movements live in a log arena keyed by record id, separate from the
/// primary record, so record snapshots stay small no matter how long the
/// history grows.
///
/// Lock order: record mutex first, then the movement arena. Never the
/// reverse.
#[derive(Clone, Default)]
pub struct InventoryLedger {
    records: Arc<RwLock<HashMap<RecordId, Arc<Mutex<InventoryRecord>>>>>,
    movements: Arc<RwLock<HashMap<RecordId, Vec<StockMovement>>>>,
}

impl InventoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records stock for the first time at a (product, location) pair.
    ///
    /// The initial quantity is logged as an `In` movement.
    #[tracing::instrument(skip(self, new, actor), fields(product = %new.product_id, center = %new.center_code))]
    pub async fn create_record(
        &self,
        new: NewInventoryRecord,
        actor: Actor,
    ) -> Result<InventoryRecord> {
        let quantity = new.quantity;
        let record = InventoryRecord::create(new);
        let record_id = record.id;
        let snapshot = record.clone();

        {
            let mut records = self.records.write().await;
            records.insert(record_id, Arc::new(Mutex::new(record)));
        }
        if quantity > 0 {
            let movement = StockMovement::new(
                record_id,
                MovementKind::In,
                quantity,
                "initial stock",
                MovementReference::Manual,
                actor,
            );
            self.append_movement(movement).await;
        }

        metrics::counter!("inventory_records_created_total").increment(1);
        tracing::info!(%record_id, quantity, "stock record created");
        Ok(snapshot)
    }

    /// Places a hold of `qty` units against a record.
    ///
    /// Fails with `InsufficientStock` when `available < qty`. Two concurrent
    /// reserves against the same record are serialized, so they can never
    /// jointly oversell.
    #[tracing::instrument(skip(self, reason, reference, actor), fields(%record_id, qty))]
    pub async fn reserve(
        &self,
        record_id: RecordId,
        qty: u32,
        reason: impl Into<String>,
        reference: MovementReference,
        actor: Actor,
    ) -> Result<ReservationId> {
        let cell = self.cell(record_id).await?;
        let mut record = cell.lock().await;

        if !record.status.is_active() {
            return Err(InventoryError::RecordInactive(record_id));
        }
        record.try_reserve(qty)?;
        record.touch();

        let movement = StockMovement::new(
            record_id,
            MovementKind::Reservation,
            qty,
            reason,
            reference,
            actor,
        );
        self.append_movement(movement).await;

        metrics::counter!("inventory_reservations_total").increment(1);
        Ok(ReservationId::new())
    }

    /// Releases up to `qty` held units back to available stock.
    ///
    /// Clamps to the currently reserved amount, so a double release of the
    /// same hold (callers track holds on their fulfillment record) changes
    /// the counters at most once. Returns the number of units released.
    #[tracing::instrument(skip(self, reason, reference, actor), fields(%record_id, qty))]
    pub async fn release(
        &self,
        record_id: RecordId,
        qty: u32,
        reason: impl Into<String>,
        reference: MovementReference,
        actor: Actor,
    ) -> Result<u32> {
        let cell = self.cell(record_id).await?;
        let mut record = cell.lock().await;

        let released = record.release(qty);
        if released > 0 {
            record.touch();
            let movement = StockMovement::new(
                record_id,
                MovementKind::Release,
                released,
                reason,
                reference,
                actor,
            );
            self.append_movement(movement).await;
            metrics::counter!("inventory_releases_total").increment(1);
        }
        Ok(released)
    }

    /// Permanently deducts `qty` held units at shipment time.
    ///
    /// Fails with `InvalidCommit` when `qty > reserved`.
    #[tracing::instrument(skip(self, reason, reference, actor), fields(%record_id, qty))]
    pub async fn commit(
        &self,
        record_id: RecordId,
        qty: u32,
        reason: impl Into<String>,
        reference: MovementReference,
        actor: Actor,
    ) -> Result<()> {
        let cell = self.cell(record_id).await?;
        let mut record = cell.lock().await;

        record.try_commit(qty)?;
        record.touch();

        let movement =
            StockMovement::new(record_id, MovementKind::Out, qty, reason, reference, actor);
        self.append_movement(movement).await;

        metrics::counter!("inventory_commits_total").increment(1);
        Ok(())
    }

    /// Manual stock correction (receiving, damage write-off).
    ///
    /// `delta` may be negative but never below the reserved count or zero
    /// total. Does not touch `reserved`. Returns the updated record.
    #[tracing::instrument(skip(self, reason, reference, actor, notes), fields(%record_id, delta))]
    pub async fn adjust(
        &self,
        record_id: RecordId,
        delta: i64,
        reason: impl Into<String>,
        reference: MovementReference,
        actor: Actor,
        notes: Option<String>,
    ) -> Result<InventoryRecord> {
        let cell = self.cell(record_id).await?;
        let mut record = cell.lock().await;

        record.try_adjust(delta)?;
        record.touch();

        let mut reason = reason.into();
        if let Some(notes) = notes {
            reason = format!("{reason}; {notes}");
        }
        let kind = if delta > 0 {
            MovementKind::In
        } else {
            MovementKind::Adjustment
        };
        let movement = StockMovement::new(
            record_id,
            kind,
            delta.unsigned_abs() as u32,
            reason,
            reference,
            actor,
        );
        self.append_movement(movement).await;

        metrics::counter!("inventory_adjustments_total").increment(1);
        Ok(record.clone())
    }

    /// Soft-retires (or reactivates) a record. Records are never deleted.
    pub async fn set_status(
        &self,
        record_id: RecordId,
        status: StockStatus,
    ) -> Result<InventoryRecord> {
        let cell = self.cell(record_id).await?;
        let mut record = cell.lock().await;
        record.status = status;
        record.touch();
        Ok(record.clone())
    }

    /// Returns a snapshot of one record.
    pub async fn get(&self, record_id: RecordId) -> Result<InventoryRecord> {
        let cell = self.cell(record_id).await?;
        let record = cell.lock().await;
        Ok(record.clone())
    }

    /// Returns snapshots of all records matching the filter, in creation
    /// order.
    pub async fn find(&self, filter: &InventoryFilter) -> Vec<InventoryRecord> {
        let cells: Vec<Arc<Mutex<InventoryRecord>>> = {
            let records = self.records.read().await;
            records.values().cloned().collect()
        };

        let mut matches = Vec::new();
        for cell in cells {
            let record = cell.lock().await;
            if filter.matches(&record) {
                matches.push(record.clone());
            }
        }
        matches.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.id.as_uuid().cmp(&b.id.as_uuid()))
        });
        matches
    }

    /// Returns the full movement history for a record, oldest first.
    pub async fn movements(&self, record_id: RecordId) -> Result<Vec<StockMovement>> {
        // Existence check so an unknown id is an error, not an empty history.
        self.cell(record_id).await?;
        let movements = self.movements.read().await;
        Ok(movements.get(&record_id).cloned().unwrap_or_default())
    }

    /// Returns the movement history as a lazy, restartable stream.
    pub async fn stream_movements(&self, record_id: RecordId) -> Result<MovementStream> {
        let movements = self.movements(record_id).await?;
        Ok(Box::pin(stream::iter(movements)))
    }

    async fn cell(&self, record_id: RecordId) -> Result<Arc<Mutex<InventoryRecord>>> {
        let records = self.records.read().await;
        records
            .get(&record_id)
            .cloned()
            .ok_or(InventoryError::RecordNotFound(record_id))
    }

    async fn append_movement(&self, movement: StockMovement) {
        let mut movements = self.movements.write().await;
        movements
            .entry(movement.record_id)
            .or_default()
            .push(movement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{LineId, OrderId, ProductId, SellerId};
    use futures_util::StreamExt;

    use crate::record::StockThresholds;

    fn new_record(quantity: u32) -> NewInventoryRecord {
        NewInventoryRecord {
            product_id: ProductId::new("SKU-001"),
            variant_id: None,
            center_code: "FC-EAST".into(),
            seller_id: SellerId::new(),
            quantity,
            thresholds: StockThresholds::default(),
        }
    }

    fn order_ref() -> MovementReference {
        MovementReference::Order {
            order_id: OrderId::new(),
            line_id: LineId::new(),
        }
    }

    #[tokio::test]
    async fn create_logs_initial_intake() {
        let ledger = InventoryLedger::new();
        let record = ledger
            .create_record(new_record(10), Actor::system())
            .await
            .unwrap();

        let movements = ledger.movements(record.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::In);
        assert_eq!(movements[0].quantity, 10);
    }

    #[tokio::test]
    async fn create_with_zero_stock_logs_nothing() {
        let ledger = InventoryLedger::new();
        let record = ledger
            .create_record(new_record(0), Actor::system())
            .await
            .unwrap();
        assert!(ledger.movements(record.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reserve_release_commit_append_movements_in_order() {
        let ledger = InventoryLedger::new();
        let record = ledger
            .create_record(new_record(10), Actor::system())
            .await
            .unwrap();

        ledger
            .reserve(record.id, 4, "order hold", order_ref(), Actor::system())
            .await
            .unwrap();
        ledger
            .release(record.id, 1, "line cancelled", order_ref(), Actor::system())
            .await
            .unwrap();
        ledger
            .commit(record.id, 3, "shipment", order_ref(), Actor::system())
            .await
            .unwrap();

        let kinds: Vec<MovementKind> = ledger
            .movements(record.id)
            .await
            .unwrap()
            .iter()
            .map(|m| m.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                MovementKind::In,
                MovementKind::Reservation,
                MovementKind::Release,
                MovementKind::Out,
            ]
        );

        let current = ledger.get(record.id).await.unwrap();
        assert_eq!(current.quantity(), 7);
        assert_eq!(current.reserved(), 0);
        assert_eq!(current.available(), 7);
    }

    #[tokio::test]
    async fn reserve_on_inactive_record_fails() {
        let ledger = InventoryLedger::new();
        let record = ledger
            .create_record(new_record(10), Actor::system())
            .await
            .unwrap();
        ledger
            .set_status(record.id, StockStatus::Recalled)
            .await
            .unwrap();

        let result = ledger
            .reserve(record.id, 1, "order hold", order_ref(), Actor::system())
            .await;
        assert!(matches!(result, Err(InventoryError::RecordInactive(_))));
    }

    #[tokio::test]
    async fn release_is_clamped_and_skips_noop_movements() {
        let ledger = InventoryLedger::new();
        let record = ledger
            .create_record(new_record(10), Actor::system())
            .await
            .unwrap();
        ledger
            .reserve(record.id, 4, "order hold", order_ref(), Actor::system())
            .await
            .unwrap();

        let first = ledger
            .release(record.id, 4, "cancelled", order_ref(), Actor::system())
            .await
            .unwrap();
        let second = ledger
            .release(record.id, 4, "cancelled", order_ref(), Actor::sweeper())
            .await
            .unwrap();
        assert_eq!(first, 4);
        assert_eq!(second, 0);

        // The second release is a no-op and must not forge an audit entry.
        let releases = ledger
            .movements(record.id)
            .await
            .unwrap()
            .iter()
            .filter(|m| m.kind == MovementKind::Release)
            .count();
        assert_eq!(releases, 1);
    }

    #[tokio::test]
    async fn adjust_records_direction() {
        let ledger = InventoryLedger::new();
        let record = ledger
            .create_record(new_record(10), Actor::system())
            .await
            .unwrap();

        ledger
            .adjust(
                record.id,
                5,
                "receiving",
                MovementReference::Adjustment {
                    ticket: "ADJ-100".to_string(),
                },
                Actor::user("ops"),
                None,
            )
            .await
            .unwrap();
        let updated = ledger
            .adjust(
                record.id,
                -2,
                "damage write-off",
                MovementReference::Manual,
                Actor::user("ops"),
                Some("crushed in transit".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(updated.quantity(), 13);
        let movements = ledger.movements(record.id).await.unwrap();
        assert_eq!(movements[1].kind, MovementKind::In);
        assert_eq!(movements[2].kind, MovementKind::Adjustment);
        assert_eq!(movements[2].reason, "damage write-off; crushed in transit");
    }

    #[tokio::test]
    async fn unknown_record_is_an_error() {
        let ledger = InventoryLedger::new();
        let id = RecordId::new();
        assert!(matches!(
            ledger.get(id).await,
            Err(InventoryError::RecordNotFound(_))
        ));
        assert!(matches!(
            ledger.movements(id).await,
            Err(InventoryError::RecordNotFound(_))
        ));
    }

    #[tokio::test]
    async fn find_filters_and_orders_by_creation() {
        let ledger = InventoryLedger::new();
        let seller = SellerId::new();

        let mut first = new_record(10);
        first.seller_id = seller;
        let mut second = new_record(5);
        second.center_code = "FC-WEST".into();
        second.seller_id = seller;
        let mut other = new_record(3);
        other.product_id = ProductId::new("SKU-999");

        let a = ledger.create_record(first, Actor::system()).await.unwrap();
        let b = ledger.create_record(second, Actor::system()).await.unwrap();
        ledger.create_record(other, Actor::system()).await.unwrap();

        let found = ledger
            .find(&InventoryFilter::new().product("SKU-001").seller(seller))
            .await;
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, a.id);
        assert_eq!(found[1].id, b.id);
    }

    #[tokio::test]
    async fn movement_stream_is_restartable() {
        let ledger = InventoryLedger::new();
        let record = ledger
            .create_record(new_record(10), Actor::system())
            .await
            .unwrap();
        ledger
            .reserve(record.id, 2, "order hold", order_ref(), Actor::system())
            .await
            .unwrap();

        let first: Vec<StockMovement> =
            ledger.stream_movements(record.id).await.unwrap().collect().await;
        let second: Vec<StockMovement> =
            ledger.stream_movements(record.id).await.unwrap().collect().await;
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }
}
