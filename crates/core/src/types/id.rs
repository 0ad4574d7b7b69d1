//! Customer identifier.
//!
//! Identifiers are opaque to everything above the persistence layer: the
//! store assigns one on insert and the rest of the system only relays it.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when a string is not a valid [`CustomerId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid customer id: {0}")]
pub struct CustomerIdError(String);

/// Opaque, store-assigned customer identifier.
///
/// ```
/// use customer_core::CustomerId;
///
/// let id = CustomerId::generate();
/// let parsed: CustomerId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(transparent)]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random identifier.
    ///
    /// Only persistence adapters should call this.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CustomerId {
    type Err = CustomerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| CustomerIdError(s.to_owned()))
    }
}

impl From<Uuid> for CustomerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<CustomerId> for Uuid {
    fn from(id: CustomerId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(CustomerId::generate(), CustomerId::generate());
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        let err = "not-a-uuid".parse::<CustomerId>().unwrap_err();
        assert_eq!(err.to_string(), "invalid customer id: not-a-uuid");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let uuid = Uuid::parse_str("7f1d8c7e-3c55-4f7b-9d6c-2b9f0f7a1e42").unwrap();
        let json = serde_json::to_string(&CustomerId::new(uuid)).unwrap();
        assert_eq!(json, "\"7f1d8c7e-3c55-4f7b-9d6c-2b9f0f7a1e42\"");
    }
}
