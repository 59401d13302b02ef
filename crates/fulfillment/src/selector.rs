//! Deterministic fulfillment center selection.

use common::{CenterCode, ProductId, SellerId, VariantId};
use inventory::{InventoryFilter, InventoryLedger, InventoryRecord};

use crate::center::{CenterDirectory, CenterType, FulfillmentCenter};
use crate::error::{FulfillmentError, Result};
use crate::record::FulfillmentType;

/// What the selector needs to know about an order line.
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub seller_id: SellerId,
    pub quantity: u32,
    pub fulfillment_type: FulfillmentType,

    /// If set, this center wins whenever it can cover the quantity.
    pub preferred_center: Option<CenterCode>,
}

/// The selector's answer: the center and the ledger record to draw from.
#[derive(Debug, Clone)]
pub struct Selection {
    pub center: FulfillmentCenter,
    pub record: InventoryRecord,
}

/// Picks the center that will serve an order line.
///
/// Selection is purely deterministic: given the same directory and ledger
/// state, the same request always lands on the same center. Candidates are
/// walked in center creation order, so ties go to the oldest center. No
/// geographic routing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenterSelector;

impl CenterSelector {
    /// Selects a (center, record) pair with at least `quantity` available
    /// units.
    ///
    /// `NoFulfillmentCenterAvailable` means no active center holds the
    /// product at all; `InsufficientStock` means centers hold it, but the
    /// best of them has too few available units.
    #[tracing::instrument(skip(self, ledger, directory), fields(product = %request.product_id, qty = request.quantity))]
    pub async fn select(
        &self,
        ledger: &InventoryLedger,
        directory: &CenterDirectory,
        request: &SelectionRequest,
    ) -> Result<Selection> {
        let candidates = self.candidates(ledger, directory, request).await;
        if candidates.is_empty() {
            return Err(FulfillmentError::NoFulfillmentCenterAvailable {
                product_id: request.product_id.clone(),
            });
        }

        // A preferred center short-circuits the tiers, but only when it can
        // actually cover the line.
        if let Some(preferred) = &request.preferred_center
            && let Some(selection) = candidates
                .iter()
                .find(|c| &c.center.code == preferred && c.record.available() >= request.quantity)
        {
            return Ok(selection.clone());
        }

        let tiered = match request.fulfillment_type {
            FulfillmentType::SellerFulfilled => self.tier(&candidates, |c| {
                c.center.owned_by(request.seller_id)
            }),
            FulfillmentType::PlatformFulfilled => self.tier(&candidates, |c| {
                c.center.center_type == CenterType::Platform
            }),
            FulfillmentType::Dropship => self.tier(&candidates, |c| {
                c.center.center_type == CenterType::Dropship
            }),
        };

        if let Some(&selection) = tiered
            .iter()
            .find(|c| c.record.available() >= request.quantity)
        {
            tracing::info!(center = %selection.center.code, "fulfillment center selected");
            return Ok(selection.clone());
        }

        let best = tiered
            .iter()
            .map(|c| c.record.available())
            .max()
            .unwrap_or(0);
        Err(FulfillmentError::InsufficientStock {
            product_id: request.product_id.clone(),
            requested: request.quantity,
            available: best,
        })
    }

    /// Joins stocked ledger records to active, fulfillment-capable centers,
    /// in center creation order.
    async fn candidates(
        &self,
        ledger: &InventoryLedger,
        directory: &CenterDirectory,
        request: &SelectionRequest,
    ) -> Vec<Selection> {
        let records = ledger
            .find(&InventoryFilter::new().product(request.product_id.clone()))
            .await;

        let mut candidates = Vec::new();
        for center in directory.all().await {
            if !center.can_fulfill() {
                continue;
            }
            for record in &records {
                if record.center_code == center.code
                    && record.status.is_active()
                    && record.available() > 0
                    && record.variant_id == request.variant_id
                {
                    candidates.push(Selection {
                        center: center.clone(),
                        record: record.clone(),
                    });
                }
            }
        }
        candidates
    }

    /// Applies a preference tier: matching candidates first if any exist,
    /// otherwise fall back to the whole list.
    fn tier<'a>(
        &self,
        candidates: &'a [Selection],
        preferred: impl Fn(&Selection) -> bool,
    ) -> Vec<&'a Selection> {
        let matching: Vec<&Selection> = candidates.iter().filter(|c| preferred(c)).collect();
        if matching.is_empty() {
            candidates.iter().collect()
        } else {
            matching
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Actor;
    use inventory::{NewInventoryRecord, StockThresholds};

    use crate::center::CenterStatus;

    async fn seed_stock(
        ledger: &InventoryLedger,
        center: &str,
        seller: SellerId,
        quantity: u32,
    ) -> InventoryRecord {
        ledger
            .create_record(
                NewInventoryRecord {
                    product_id: ProductId::new("SKU-001"),
                    variant_id: None,
                    center_code: center.into(),
                    seller_id: seller,
                    quantity,
                    thresholds: StockThresholds::default(),
                },
                Actor::system(),
            )
            .await
            .unwrap()
    }

    fn request(quantity: u32, fulfillment_type: FulfillmentType, seller: SellerId) -> SelectionRequest {
        SelectionRequest {
            product_id: ProductId::new("SKU-001"),
            variant_id: None,
            seller_id: seller,
            quantity,
            fulfillment_type,
            preferred_center: None,
        }
    }

    #[tokio::test]
    async fn picks_oldest_center_with_enough_stock() {
        let ledger = InventoryLedger::new();
        let directory = CenterDirectory::new();
        let seller = SellerId::new();

        for code in ["FC-1", "FC-2"] {
            directory
                .register(FulfillmentCenter::new(code, code, CenterType::Platform, None))
                .await
                .unwrap();
        }
        seed_stock(&ledger, "FC-1", seller, 5).await;
        seed_stock(&ledger, "FC-2", seller, 50).await;

        let selection = CenterSelector
            .select(&ledger, &directory, &request(3, FulfillmentType::PlatformFulfilled, seller))
            .await
            .unwrap();
        assert_eq!(selection.center.code.to_string(), "FC-1");
    }

    #[tokio::test]
    async fn skips_centers_that_cannot_cover_the_line() {
        let ledger = InventoryLedger::new();
        let directory = CenterDirectory::new();
        let seller = SellerId::new();

        for code in ["FC-1", "FC-2"] {
            directory
                .register(FulfillmentCenter::new(code, code, CenterType::Platform, None))
                .await
                .unwrap();
        }
        seed_stock(&ledger, "FC-1", seller, 2).await;
        seed_stock(&ledger, "FC-2", seller, 50).await;

        let selection = CenterSelector
            .select(&ledger, &directory, &request(10, FulfillmentType::PlatformFulfilled, seller))
            .await
            .unwrap();
        assert_eq!(selection.center.code.to_string(), "FC-2");
    }

    #[tokio::test]
    async fn no_stocked_center_at_all() {
        let ledger = InventoryLedger::new();
        let directory = CenterDirectory::new();
        let seller = SellerId::new();
        directory
            .register(FulfillmentCenter::new("FC-1", "One", CenterType::Platform, None))
            .await
            .unwrap();

        let err = CenterSelector
            .select(&ledger, &directory, &request(1, FulfillmentType::PlatformFulfilled, seller))
            .await;
        assert!(matches!(
            err,
            Err(FulfillmentError::NoFulfillmentCenterAvailable { .. })
        ));
    }

    #[tokio::test]
    async fn stocked_but_short_reports_best_available() {
        let ledger = InventoryLedger::new();
        let directory = CenterDirectory::new();
        let seller = SellerId::new();
        directory
            .register(FulfillmentCenter::new("FC-1", "One", CenterType::Platform, None))
            .await
            .unwrap();
        seed_stock(&ledger, "FC-1", seller, 4).await;

        let err = CenterSelector
            .select(&ledger, &directory, &request(6, FulfillmentType::PlatformFulfilled, seller))
            .await;
        assert!(matches!(
            err,
            Err(FulfillmentError::InsufficientStock {
                requested: 6,
                available: 4,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn seller_fulfilled_prefers_the_sellers_center() {
        let ledger = InventoryLedger::new();
        let directory = CenterDirectory::new();
        let seller = SellerId::new();

        directory
            .register(FulfillmentCenter::new("FC-PLAT", "Platform", CenterType::Platform, None))
            .await
            .unwrap();
        directory
            .register(FulfillmentCenter::new(
                "FC-SELLER",
                "Seller DC",
                CenterType::Seller,
                Some(seller),
            ))
            .await
            .unwrap();
        seed_stock(&ledger, "FC-PLAT", seller, 50).await;
        seed_stock(&ledger, "FC-SELLER", seller, 50).await;

        let selection = CenterSelector
            .select(&ledger, &directory, &request(3, FulfillmentType::SellerFulfilled, seller))
            .await
            .unwrap();
        assert_eq!(selection.center.code.to_string(), "FC-SELLER");
    }

    #[tokio::test]
    async fn seller_tier_falls_back_when_seller_center_is_dry() {
        let ledger = InventoryLedger::new();
        let directory = CenterDirectory::new();
        let seller = SellerId::new();

        directory
            .register(FulfillmentCenter::new("FC-PLAT", "Platform", CenterType::Platform, None))
            .await
            .unwrap();
        directory
            .register(FulfillmentCenter::new(
                "FC-SELLER",
                "Seller DC",
                CenterType::Seller,
                Some(seller),
            ))
            .await
            .unwrap();
        seed_stock(&ledger, "FC-PLAT", seller, 50).await;

        let selection = CenterSelector
            .select(&ledger, &directory, &request(3, FulfillmentType::SellerFulfilled, seller))
            .await
            .unwrap();
        assert_eq!(selection.center.code.to_string(), "FC-PLAT");
    }

    #[tokio::test]
    async fn preferred_center_wins_when_it_can_cover() {
        let ledger = InventoryLedger::new();
        let directory = CenterDirectory::new();
        let seller = SellerId::new();

        for code in ["FC-1", "FC-2"] {
            directory
                .register(FulfillmentCenter::new(code, code, CenterType::Platform, None))
                .await
                .unwrap();
        }
        seed_stock(&ledger, "FC-1", seller, 50).await;
        seed_stock(&ledger, "FC-2", seller, 50).await;

        let mut req = request(3, FulfillmentType::PlatformFulfilled, seller);
        req.preferred_center = Some("FC-2".into());
        let selection = CenterSelector
            .select(&ledger, &directory, &req)
            .await
            .unwrap();
        assert_eq!(selection.center.code.to_string(), "FC-2");
    }

    #[tokio::test]
    async fn preferred_center_is_ignored_when_short() {
        let ledger = InventoryLedger::new();
        let directory = CenterDirectory::new();
        let seller = SellerId::new();

        for code in ["FC-1", "FC-2"] {
            directory
                .register(FulfillmentCenter::new(code, code, CenterType::Platform, None))
                .await
                .unwrap();
        }
        seed_stock(&ledger, "FC-1", seller, 50).await;
        seed_stock(&ledger, "FC-2", seller, 2).await;

        let mut req = request(10, FulfillmentType::PlatformFulfilled, seller);
        req.preferred_center = Some("FC-2".into());
        let selection = CenterSelector
            .select(&ledger, &directory, &req)
            .await
            .unwrap();
        assert_eq!(selection.center.code.to_string(), "FC-1");
    }

    #[tokio::test]
    async fn inactive_centers_are_never_selected() {
        let ledger = InventoryLedger::new();
        let directory = CenterDirectory::new();
        let seller = SellerId::new();

        let mut down = FulfillmentCenter::new("FC-DOWN", "Down", CenterType::Platform, None);
        down.status = CenterStatus::Maintenance;
        directory.register(down).await.unwrap();
        seed_stock(&ledger, "FC-DOWN", seller, 50).await;

        let err = CenterSelector
            .select(&ledger, &directory, &request(1, FulfillmentType::PlatformFulfilled, seller))
            .await;
        assert!(matches!(
            err,
            Err(FulfillmentError::NoFulfillmentCenterAvailable { .. })
        ));
    }

    #[tokio::test]
    async fn variant_mismatch_is_no_candidate() {
        let ledger = InventoryLedger::new();
        let directory = CenterDirectory::new();
        let seller = SellerId::new();
        directory
            .register(FulfillmentCenter::new("FC-1", "One", CenterType::Platform, None))
            .await
            .unwrap();
        seed_stock(&ledger, "FC-1", seller, 50).await;

        let mut req = request(1, FulfillmentType::PlatformFulfilled, seller);
        req.variant_id = Some(VariantId::new("V-RED"));
        let err = CenterSelector.select(&ledger, &directory, &req).await;
        assert!(matches!(
            err,
            Err(FulfillmentError::NoFulfillmentCenterAvailable { .. })
        ));
    }
}
