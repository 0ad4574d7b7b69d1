//! Customer classification.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown [`CustomerType`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown customer type: {0}")]
pub struct CustomerTypeError(String);

/// Kind of customer.
///
/// Hints which of `full_name` / `business_name` is meaningful, but nothing
/// enforces that coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "customer_type", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerType {
    /// An individual.
    Personal,
    /// A company or other organization.
    Enterprise,
}

impl CustomerType {
    /// Wire and database name of this type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "PERSONAL",
            Self::Enterprise => "ENTERPRISE",
        }
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerType {
    type Err = CustomerTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERSONAL" => Ok(Self::Personal),
            "ENTERPRISE" => Ok(Self::Enterprise),
            _ => Err(CustomerTypeError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("personal".parse::<CustomerType>().unwrap(), CustomerType::Personal);
        assert_eq!(" ENTERPRISE ".parse::<CustomerType>().unwrap(), CustomerType::Enterprise);
        assert!("GOVERNMENT".parse::<CustomerType>().is_err());
    }

    #[test]
    fn test_serde_uses_upper_case_names() {
        let json = serde_json::to_string(&CustomerType::Enterprise).unwrap();
        assert_eq!(json, "\"ENTERPRISE\"");

        let parsed: CustomerType = serde_json::from_str("\"PERSONAL\"").unwrap();
        assert_eq!(parsed, CustomerType::Personal);
    }
}
