//! Filters for querying stock records.

use common::{CenterCode, ProductId, SellerId};

use crate::record::InventoryRecord;

/// Filter for `InventoryLedger::find`. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    pub product_id: Option<ProductId>,
    pub center_code: Option<CenterCode>,
    pub seller_id: Option<SellerId>,
    pub low_stock_only: bool,
}

impl InventoryFilter {
    /// Creates an empty filter matching all records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one product.
    pub fn product(mut self, product_id: impl Into<ProductId>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    /// Restricts to one fulfillment center.
    pub fn center(mut self, center_code: impl Into<CenterCode>) -> Self {
        self.center_code = Some(center_code.into());
        self
    }

    /// Restricts to one seller.
    pub fn seller(mut self, seller_id: SellerId) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    /// Restricts to records at or below their reorder point.
    pub fn low_stock(mut self) -> Self {
        self.low_stock_only = true;
        self
    }

    /// Returns true if the record matches every set field.
    pub fn matches(&self, record: &InventoryRecord) -> bool {
        if let Some(ref product_id) = self.product_id
            && &record.product_id != product_id
        {
            return false;
        }
        if let Some(ref center_code) = self.center_code
            && &record.center_code != center_code
        {
            return false;
        }
        if let Some(seller_id) = self.seller_id
            && record.seller_id != seller_id
        {
            return false;
        }
        if self.low_stock_only && !record.is_low_stock() {
            return false;
        }
        true
    }
}
