//! Fulfillment center directory.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{CenterCode, SellerId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{FulfillmentError, Result};

/// Who operates a fulfillment center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CenterType {
    /// Operated by the marketplace platform.
    Platform,

    /// Operated by an individual seller.
    Seller,

    /// Outsourced third-party-logistics warehouse.
    ThirdPartyLogistics,

    /// Ships directly from the manufacturer.
    Dropship,
}

impl CenterType {
    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CenterType::Platform => "Platform",
            CenterType::Seller => "Seller",
            CenterType::ThirdPartyLogistics => "ThirdPartyLogistics",
            CenterType::Dropship => "Dropship",
        }
    }
}

impl std::fmt::Display for CenterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operational status of a center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CenterStatus {
    #[default]
    Active,
    Inactive,
    Maintenance,
    Suspended,
}

impl CenterStatus {
    /// Returns true if the center can serve new fulfillments.
    pub fn is_active(&self) -> bool {
        matches!(self, CenterStatus::Active)
    }
}

/// What a center can do. Each flag is enabled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Capabilities {
    pub pick: bool,
    pub pack: bool,
    pub ship: bool,
    pub returns: bool,
    pub storage: bool,
}

impl Capabilities {
    /// All capabilities enabled.
    pub fn full() -> Self {
        Self {
            pick: true,
            pack: true,
            ship: true,
            returns: true,
            storage: true,
        }
    }
}

/// One fulfillment location. Administered out of band and read-only from the
/// orchestrator's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentCenter {
    pub code: CenterCode,
    pub name: String,
    pub center_type: CenterType,
    pub capabilities: Capabilities,
    pub status: CenterStatus,

    /// Set only for seller-operated centers.
    pub seller_id: Option<SellerId>,

    pub created_at: DateTime<Utc>,
}

impl FulfillmentCenter {
    /// Creates an active center with full capabilities.
    pub fn new(
        code: impl Into<CenterCode>,
        name: impl Into<String>,
        center_type: CenterType,
        seller_id: Option<SellerId>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            center_type,
            capabilities: Capabilities::full(),
            status: CenterStatus::Active,
            seller_id,
            created_at: Utc::now(),
        }
    }

    /// Returns true if the center is active and able to pick, pack, and ship.
    pub fn can_fulfill(&self) -> bool {
        self.status.is_active()
            && self.capabilities.pick
            && self.capabilities.pack
            && self.capabilities.ship
    }

    /// Returns true if this center is operated by the given seller.
    pub fn owned_by(&self, seller_id: SellerId) -> bool {
        self.seller_id == Some(seller_id)
    }
}

#[derive(Default)]
struct DirectoryState {
    /// Centers in registration order; "first" always means earliest created.
    centers: Vec<FulfillmentCenter>,
    index: HashMap<CenterCode, usize>,
}

/// Registry of fulfillment centers, preserving creation order.
///
/// Creation order is the deterministic tie-break the selector relies on, so
/// it is part of this type's contract, not an implementation detail.
#[derive(Clone, Default)]
pub struct CenterDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl CenterDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a center. Codes must be unique.
    pub async fn register(&self, center: FulfillmentCenter) -> Result<()> {
        let mut state = self.state.write().await;
        if state.index.contains_key(&center.code) {
            return Err(FulfillmentError::DuplicateCenter(center.code));
        }
        let next_index = state.centers.len();
        state.index.insert(center.code.clone(), next_index);
        tracing::info!(code = %center.code, center_type = %center.center_type, "fulfillment center registered");
        state.centers.push(center);
        Ok(())
    }

    /// Looks up one center by code.
    pub async fn get(&self, code: &CenterCode) -> Result<FulfillmentCenter> {
        let state = self.state.read().await;
        state
            .index
            .get(code)
            .map(|&i| state.centers[i].clone())
            .ok_or_else(|| FulfillmentError::UnknownCenter(code.clone()))
    }

    /// Returns all centers in creation order.
    pub async fn all(&self) -> Vec<FulfillmentCenter> {
        self.state.read().await.centers.clone()
    }

    /// Returns the number of registered centers.
    pub async fn len(&self) -> usize {
        self.state.read().await.centers.len()
    }

    /// Returns true if no centers are registered.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
