//! Stock records, one per (product, variant, location, seller).

use chrono::{DateTime, Utc};
use common::{CenterCode, ProductId, RecordId, SellerId, VariantId};
use serde::{Deserialize, Serialize};

use crate::error::InventoryError;

/// Lifecycle status of a stock record.
///
/// Records are never hard-deleted; they are retired by moving them out of
/// `Active`. Only active records accept new holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StockStatus {
    /// Record accepts reservations and commits.
    #[default]
    Active,

    /// Temporarily withdrawn from sale.
    Inactive,

    /// Product line has been discontinued.
    Discontinued,

    /// Stock pulled due to a recall.
    Recalled,
}

impl StockStatus {
    /// Returns true if the record accepts new holds.
    pub fn is_active(&self) -> bool {
        matches!(self, StockStatus::Active)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Active => "Active",
            StockStatus::Inactive => "Inactive",
            StockStatus::Discontinued => "Discontinued",
            StockStatus::Recalled => "Recalled",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Advisory stocking thresholds. These never gate ledger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StockThresholds {
    /// Available-at-or-below this level flags the record as low stock.
    pub reorder_point: u32,
    pub min_stock: u32,
    pub max_stock: u32,
}

/// Request to create a stock record when stock is first received at a location.
#[derive(Debug, Clone)]
pub struct NewInventoryRecord {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub center_code: CenterCode,
    pub seller_id: SellerId,
    pub quantity: u32,
    pub thresholds: StockThresholds,
}

/// One stock record in the ledger.
///
/// The counters obey `quantity = reserved + available` with both sides
/// non-negative at every observable point. All counter mutations go through
/// the ledger, which serializes them per record and appends exactly one
/// movement per mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: RecordId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub center_code: CenterCode,
    pub seller_id: SellerId,

    /// Total physical units on hand.
    quantity: u32,

    /// Units held against in-flight orders.
    reserved: u32,

    pub thresholds: StockThresholds,
    pub status: StockStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Bumped on every counter mutation.
    version: u64,
}

impl InventoryRecord {
    pub(crate) fn create(new: NewInventoryRecord) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(),
            product_id: new.product_id,
            variant_id: new.variant_id,
            center_code: new.center_code,
            seller_id: new.seller_id,
            quantity: new.quantity,
            reserved: 0,
            thresholds: new.thresholds,
            status: StockStatus::Active,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Total physical units on hand.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Units held against in-flight orders.
    pub fn reserved(&self) -> u32 {
        self.reserved
    }

    /// Units free to sell: `quantity - reserved`. Always recomputed,
    /// never stored.
    pub fn available(&self) -> u32 {
        self.quantity - self.reserved
    }

    /// Current mutation counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns true if available stock has fallen to the reorder point.
    pub fn is_low_stock(&self) -> bool {
        self.available() <= self.thresholds.reorder_point
    }

    pub(crate) fn try_reserve(&mut self, qty: u32) -> Result<(), InventoryError> {
        let available = self.available();
        if qty > available {
            return Err(InventoryError::InsufficientStock {
                record_id: self.id,
                requested: qty,
                available,
            });
        }
        self.reserved += qty;
        Ok(())
    }

    /// Releases up to `qty` held units, returning how many were released.
    pub(crate) fn release(&mut self, qty: u32) -> u32 {
        let released = qty.min(self.reserved);
        self.reserved -= released;
        released
    }

    pub(crate) fn try_commit(&mut self, qty: u32) -> Result<(), InventoryError> {
        if qty > self.reserved {
            return Err(InventoryError::InvalidCommit {
                record_id: self.id,
                requested: qty,
                reserved: self.reserved,
            });
        }
        self.quantity -= qty;
        self.reserved -= qty;
        Ok(())
    }

    pub(crate) fn try_adjust(&mut self, delta: i64) -> Result<(), InventoryError> {
        if delta == 0 {
            return Err(InventoryError::InvalidAdjustment {
                record_id: self.id,
                reason: "delta must be non-zero".to_string(),
            });
        }
        let new_quantity = i64::from(self.quantity) + delta;
        if new_quantity < i64::from(self.reserved) {
            return Err(InventoryError::InvalidAdjustment {
                record_id: self.id,
                reason: format!(
                    "quantity would drop to {} below {} reserved units",
                    new_quantity.max(0),
                    self.reserved
                ),
            });
        }
        if new_quantity > i64::from(u32::MAX) {
            return Err(InventoryError::InvalidAdjustment {
                record_id: self.id,
                reason: "quantity overflow".to_string(),
            });
        }
        self.quantity = new_quantity as u32;
        Ok(())
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }
}
