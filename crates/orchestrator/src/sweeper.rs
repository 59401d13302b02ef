//! Background sweep of expired reservation holds.

use std::sync::Arc;

use chrono::Utc;

use crate::notify::NotificationService;
use crate::orchestrator::FulfillmentOrchestrator;

/// Periodically cancels pre-shipment fulfillments whose holds have expired,
/// returning the held stock to available.
///
/// The scan produces candidates only; each candidate is re-checked under its
/// record lock, so a fulfillment that shipped or was cancelled between scan
/// and action is skipped. One failing record never aborts the rest of the
/// sweep.
pub struct ExpirySweeper<N: NotificationService> {
    orchestrator: Arc<FulfillmentOrchestrator<N>>,
    interval: std::time::Duration,
}

impl<N: NotificationService> ExpirySweeper<N> {
    pub fn new(orchestrator: Arc<FulfillmentOrchestrator<N>>, interval: std::time::Duration) -> Self {
        Self {
            orchestrator,
            interval,
        }
    }

    /// Runs the sweep loop forever. Spawn this on the runtime.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let released = self.sweep_once().await;
            if released > 0 {
                tracing::info!(released, "expiry sweep released holds");
            }
        }
    }

    /// Runs a single sweep, returning how many fulfillments were expired.
    #[tracing::instrument(skip(self))]
    pub async fn sweep_once(&self) -> usize {
        let now = Utc::now();
        let candidates = self.orchestrator.store().expired_holds(now).await;

        let mut released = 0;
        for id in candidates {
            match self.orchestrator.expire(id, now).await {
                Ok(true) => released += 1,
                Ok(false) => {}
                Err(error) => {
                    tracing::error!(fulfillment = %id, %error, "failed to expire hold, skipping");
                }
            }
        }
        metrics::counter!("sweeper_released_total").increment(released as u64);
        released
    }
}
