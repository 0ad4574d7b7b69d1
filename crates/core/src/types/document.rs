//! Document number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`DocumentNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentNumberError {
    /// The input is empty or only whitespace.
    #[error("documentNumber required")]
    Blank,
}

/// A customer's document number (national id, tax id, ...).
///
/// Unique across all customers; the store enforces that. The value is always
/// trimmed and never empty, so two spellings that differ only by surrounding
/// whitespace map to the same cache key.
///
/// ```
/// use customer_core::DocumentNumber;
///
/// let doc = DocumentNumber::parse("  12345678 ").unwrap();
/// assert_eq!(doc.as_str(), "12345678");
///
/// assert!(DocumentNumber::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentNumber(String);

impl DocumentNumber {
    /// Parse a document number, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentNumberError::Blank`] if nothing is left after trimming.
    pub fn parse(raw: &str) -> Result<Self, DocumentNumberError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DocumentNumberError::Blank);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Normalize an optional raw value; blank and absent both become `None`.
    #[must_use]
    pub fn normalize(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|s| Self::parse(s).ok())
    }

    /// Returns the document number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DocumentNumber {
    type Error = DocumentNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentNumber> for String {
    fn from(doc: DocumentNumber) -> Self {
        doc.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        assert_eq!(DocumentNumber::parse("\t42 ").unwrap().as_str(), "42");
    }

    #[test]
    fn test_parse_blank() {
        assert_eq!(DocumentNumber::parse(""), Err(DocumentNumberError::Blank));
        assert_eq!(DocumentNumber::parse("   "), Err(DocumentNumberError::Blank));
    }

    #[test]
    fn test_normalize_absent_and_blank() {
        assert_eq!(DocumentNumber::normalize(None), None);
        assert_eq!(DocumentNumber::normalize(Some(" ")), None);
        assert_eq!(
            DocumentNumber::normalize(Some(" A-1 ")),
            Some(DocumentNumber::parse("A-1").unwrap())
        );
    }

    #[test]
    fn test_deserialize_rejects_blank() {
        assert!(serde_json::from_str::<DocumentNumber>("\"  \"").is_err());
        let doc: DocumentNumber = serde_json::from_str("\" 99 \"").unwrap();
        assert_eq!(doc.as_str(), "99");
    }
}
