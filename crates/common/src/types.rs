use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Defines a UUID-backed identifier newtype.
///
/// Wrapping the UUID provides type safety and prevents mixing up, say,
/// an order ID with a reservation ID in a call site that takes both.
macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a seller account.
    SellerId
}

uuid_id! {
    /// Unique identifier for an order, supplied by the order-management collaborator.
    OrderId
}

uuid_id! {
    /// Unique identifier for one line within an order.
    LineId
}

uuid_id! {
    /// Unique identifier for an inventory stock record.
    RecordId
}

uuid_id! {
    /// Unique identifier for one inventory hold.
    ReservationId
}

uuid_id! {
    /// Unique identifier for a fulfillment record.
    FulfillmentId
}

/// Defines a string-backed identifier newtype.
macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Product identifier (SKU).
    ProductId
}

string_id! {
    /// Product variant identifier (size, color, and so on).
    VariantId
}

string_id! {
    /// Unique code identifying one fulfillment center.
    CenterCode
}

/// Who performed a mutation, recorded on every movement and status change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    /// An action taken by a named operator or collaborator.
    pub fn user(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// An action taken by the orchestrator itself.
    pub fn system() -> Self {
        Self("system".to_string())
    }

    /// An action taken by the reservation expiry sweeper.
    pub fn sweeper() -> Self {
        Self("sweeper".to_string())
    }

    /// Returns the actor name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Actor {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_new_creates_unique_ids() {
        let id1 = RecordId::new();
        let id2 = RecordId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn record_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = RecordId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn reservation_id_serialization_roundtrip() {
        let id = ReservationId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ReservationId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn product_id_is_transparent_over_the_sku() {
        let sku = ProductId::new("SKU-001");
        assert_eq!(sku.as_str(), "SKU-001");
        assert_eq!(serde_json::to_string(&sku).unwrap(), "\"SKU-001\"");
    }

    #[test]
    fn actor_constructors() {
        assert_eq!(Actor::system().as_str(), "system");
        assert_eq!(Actor::sweeper().as_str(), "sweeper");
        assert_eq!(Actor::user("ops@example.com").as_str(), "ops@example.com");
    }
}
