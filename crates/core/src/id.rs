//! Strongly-typed identifiers used across the domain.

use serde::{Deserialize, Serialize};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identifier of a catalog item (opaque string, e.g. `"b1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

/// Identifier of a completed transaction.
///
/// Time-derived for human scanning, e.g. `"TX-1717000000000-018f3c..."`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

macro_rules! impl_string_newtype {
    ($t:ty) => {
        impl $t {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_string_newtype!(ItemId);
impl_string_newtype!(TransactionId);

impl TransactionId {
    /// Generate a new transaction identifier for a settlement at `at`.
    ///
    /// The epoch-millis prefix keeps ids time-derived and sortable; the
    /// UUIDv7 suffix removes same-millisecond collisions. Prefer passing ids
    /// explicitly in tests for determinism.
    pub fn generate(at: DateTime<Utc>) -> Self {
        Self(format!(
            "TX-{}-{}",
            at.timestamp_millis(),
            Uuid::now_v7().simple()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_carries_epoch_millis_prefix() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let id = TransactionId::generate(at);
        assert!(id.as_str().starts_with("TX-1700000000123-"));
    }

    #[test]
    fn same_millisecond_ids_do_not_collide() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let a = TransactionId::generate(at);
        let b = TransactionId::generate(at);
        assert_ne!(a, b);
    }

    #[test]
    fn item_id_round_trips_through_string() {
        let id = ItemId::new("b1");
        assert_eq!(id.as_str(), "b1");
        assert_eq!(String::from(id.clone()), "b1");
        assert_eq!(ItemId::from("b1"), id);
    }
}
