//! Customer notification boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{FulfillmentId, OrderId};
use thiserror::Error;
use tokio::sync::Mutex;

/// Milestones worth telling the customer about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentNotice {
    ReservationCreated {
        order_id: OrderId,
        fulfillment_id: FulfillmentId,
    },
    Shipped {
        order_id: OrderId,
        fulfillment_id: FulfillmentId,
        carrier: String,
        tracking_number: String,
    },
    Delivered {
        order_id: OrderId,
        fulfillment_id: FulfillmentId,
    },
    Cancelled {
        order_id: OrderId,
        fulfillment_id: FulfillmentId,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Delivery channel for fulfillment milestones.
///
/// Notification is strictly best-effort: the orchestrator logs failures and
/// moves on, so implementations must never be load-bearing for state.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn notify(&self, notice: FulfillmentNotice) -> Result<(), NotificationError>;
}

/// In-memory notification service for tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryNotificationService {
    sent: Arc<Mutex<Vec<FulfillmentNotice>>>,
    should_fail: Arc<AtomicBool>,
}

impl InMemoryNotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent delivery fail, for exercising the
    /// fire-and-forget path.
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Returns everything delivered so far.
    pub async fn sent(&self) -> Vec<FulfillmentNotice> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn notify(&self, notice: FulfillmentNotice) -> Result<(), NotificationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::DeliveryFailed(
                "simulated delivery failure".to_string(),
            ));
        }
        self.sent.lock().await.push(notice);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_notices_in_order() {
        let service = InMemoryNotificationService::new();
        let order_id = OrderId::new();
        let fulfillment_id = FulfillmentId::new();

        service
            .notify(FulfillmentNotice::ReservationCreated {
                order_id,
                fulfillment_id,
            })
            .await
            .unwrap();
        service
            .notify(FulfillmentNotice::Delivered {
                order_id,
                fulfillment_id,
            })
            .await
            .unwrap();

        let sent = service.sent().await;
        assert_eq!(sent.len(), 2);
        assert!(matches!(sent[0], FulfillmentNotice::ReservationCreated { .. }));
        assert!(matches!(sent[1], FulfillmentNotice::Delivered { .. }));
    }

    #[tokio::test]
    async fn failure_toggle() {
        let service = InMemoryNotificationService::new();
        service.set_should_fail(true);

        let result = service
            .notify(FulfillmentNotice::Delivered {
                order_id: OrderId::new(),
                fulfillment_id: FulfillmentId::new(),
            })
            .await;
        assert!(matches!(result, Err(NotificationError::DeliveryFailed(_))));
        assert!(service.sent().await.is_empty());
    }
}
