//! In-memory store of fulfillment records.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{FulfillmentId, OrderId};
use tokio::sync::{Mutex, RwLock};

use crate::error::{FulfillmentError, Result};
use crate::record::FulfillmentRecord;

/// Store of fulfillment records, one mutex per record.
///
/// Callers that mutate a record lock its cell, so concurrent transitions on
/// the same fulfillment are serialized while different fulfillments proceed
/// independently. Query methods return snapshots.
#[derive(Clone, Default)]
pub struct FulfillmentStore {
    records: Arc<RwLock<HashMap<FulfillmentId, Arc<Mutex<FulfillmentRecord>>>>>,
}

impl FulfillmentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a freshly placed record.
    pub async fn insert(&self, record: FulfillmentRecord) {
        let mut records = self.records.write().await;
        records.insert(record.id, Arc::new(Mutex::new(record)));
    }

    /// Returns the lockable cell for a record, for transition sequences that
    /// must be atomic with respect to other callers.
    pub async fn cell(&self, id: FulfillmentId) -> Result<Arc<Mutex<FulfillmentRecord>>> {
        let records = self.records.read().await;
        records
            .get(&id)
            .cloned()
            .ok_or(FulfillmentError::RecordNotFound(id))
    }

    /// Returns a snapshot of one record.
    pub async fn get(&self, id: FulfillmentId) -> Result<FulfillmentRecord> {
        let cell = self.cell(id).await?;
        let record = cell.lock().await;
        Ok(record.clone())
    }

    /// Returns snapshots of every record for an order, in creation order.
    pub async fn for_order(&self, order_id: OrderId) -> Vec<FulfillmentRecord> {
        let cells: Vec<Arc<Mutex<FulfillmentRecord>>> = {
            let records = self.records.read().await;
            records.values().cloned().collect()
        };

        let mut matches = Vec::new();
        for cell in cells {
            let record = cell.lock().await;
            if record.order_id == order_id {
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

    /// Returns ids of pre-shipment records whose holds expired before `now`.
    ///
    /// This is only a scan; the caller must re-check expiry under the record
    /// lock before acting, since a transition can race the sweep.
    pub async fn expired_holds(&self, now: DateTime<Utc>) -> Vec<FulfillmentId> {
        let cells: Vec<Arc<Mutex<FulfillmentRecord>>> = {
            let records = self.records.read().await;
            records.values().cloned().collect()
        };

        let mut expired = Vec::new();
        for cell in cells {
            let record = cell.lock().await;
            if record.hold_expired(now) {
                expired.push(record.id);
            }
        }
        expired
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Actor, LineId, ProductId, RecordId, ReservationId, SellerId};

    use crate::record::{Address, FulfillmentType, NewFulfillment, ReservationHold};
    use crate::status::FulfillmentStatus;

    fn place(order_id: OrderId) -> FulfillmentRecord {
        FulfillmentRecord::place(
            NewFulfillment {
                order_id,
                line_id: LineId::new(),
                product_id: ProductId::new("SKU-001"),
                variant_id: None,
                quantity: 2,
                seller_id: SellerId::new(),
                destination: Address::default(),
                fulfillment_type: FulfillmentType::PlatformFulfilled,
            },
            "FC-EAST".into(),
            RecordId::new(),
            Actor::system(),
        )
    }

    fn hold_expiring(expires_at: DateTime<Utc>) -> ReservationHold {
        ReservationHold {
            reservation_id: ReservationId::new(),
            inventory_record_id: RecordId::new(),
            quantity: 2,
            reserved_at: Utc::now(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = FulfillmentStore::new();
        let record = place(OrderId::new());
        let id = record.id;
        store.insert(record.clone()).await;
        assert_eq!(store.get(id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn missing_record_is_an_error() {
        let store = FulfillmentStore::new();
        assert!(matches!(
            store.get(FulfillmentId::new()).await,
            Err(FulfillmentError::RecordNotFound(_))
        ));
    }

    #[tokio::test]
    async fn for_order_filters_by_order() {
        let store = FulfillmentStore::new();
        let order = OrderId::new();
        store.insert(place(order)).await;
        store.insert(place(order)).await;
        store.insert(place(OrderId::new())).await;

        assert_eq!(store.for_order(order).await.len(), 2);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn expired_holds_skips_records_without_expired_holds() {
        let store = FulfillmentStore::new();
        let now = Utc::now();

        // Pending, no hold yet.
        store.insert(place(OrderId::new())).await;

        // Confirmed with a live hold.
        let mut live = place(OrderId::new());
        live.confirm(hold_expiring(now + chrono::Duration::hours(24)), Actor::system(), None)
            .unwrap();
        store.insert(live).await;

        // Confirmed with an expired hold.
        let mut stale = place(OrderId::new());
        stale
            .confirm(hold_expiring(now - chrono::Duration::minutes(1)), Actor::system(), None)
            .unwrap();
        let stale_id = stale.id;
        store.insert(stale).await;

        // Expired hold, but already cancelled.
        let mut closed = place(OrderId::new());
        closed
            .confirm(hold_expiring(now - chrono::Duration::minutes(1)), Actor::system(), None)
            .unwrap();
        closed
            .close(FulfillmentStatus::Cancelled, "customer cancelled", Actor::system())
            .unwrap();
        store.insert(closed).await;

        assert_eq!(store.expired_holds(now).await, vec![stale_id]);
    }

    #[tokio::test]
    async fn cell_serializes_mutations() {
        let store = FulfillmentStore::new();
        let record = place(OrderId::new());
        let id = record.id;
        store.insert(record).await;

        let cell = store.cell(id).await.unwrap();
        {
            let mut record = cell.lock().await;
            record
                .confirm(hold_expiring(Utc::now() + chrono::Duration::hours(24)), Actor::system(), None)
                .unwrap();
        }
        assert_eq!(store.get(id).await.unwrap().status(), FulfillmentStatus::Confirmed);
    }
}
