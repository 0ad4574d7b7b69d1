//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A normalized email address.
///
/// Normalization trims surrounding whitespace and lower-cases the address.
/// No syntactic validation is applied; the stored contact address is kept as
/// the customer gave it, modulo case and whitespace.
///
/// ## Examples
///
/// ```
/// use customer_core::Email;
///
/// let email = Email::normalize("  Sales@ACME.com ").unwrap();
/// assert_eq!(email.as_str(), "sales@acme.com");
///
/// // Blank input normalizes to no email at all
/// assert!(Email::normalize("   ").is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Normalize a raw email; returns `None` if it is blank after trimming.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_lowercase()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
