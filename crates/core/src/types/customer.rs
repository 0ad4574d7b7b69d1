//! The customer entity and its write-side shapes.
//!
//! - [`NewCustomer`] is raw create input as it arrives from a caller.
//! - [`CustomerDraft`] is validated, normalized create input for the store.
//! - [`Customer`] is a persisted record and always carries an id.
//! - [`CustomerPatch`] is a partial update; see [`Customer::apply_patch`].

use serde::{Deserialize, Serialize};

use super::{CustomerId, CustomerType, DocumentNumber, DocumentNumberError, Email, normalize_phones};

/// A persisted customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Store-assigned identifier.
    pub id: CustomerId,
    /// Personal or enterprise customer.
    pub customer_type: CustomerType,
    /// Unique document number.
    pub document_number: DocumentNumber,
    /// Full name (meaningful for personal customers).
    pub full_name: Option<String>,
    /// Business name (meaningful for enterprise customers).
    pub business_name: Option<String>,
    /// Normalized contact email.
    pub email: Option<Email>,
    /// Normalized, de-duplicated phone numbers.
    pub phones: Vec<String>,
}

/// Raw create input, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub customer_type: CustomerType,
    pub document_number: String,
    pub full_name: Option<String>,
    pub business_name: Option<String>,
    pub email: Option<String>,
    pub phones: Vec<String>,
}

/// Validated create input: everything a store needs to insert a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDraft {
    pub customer_type: CustomerType,
    pub document_number: DocumentNumber,
    pub full_name: Option<String>,
    pub business_name: Option<String>,
    pub email: Option<Email>,
    pub phones: Vec<String>,
}

/// Partial update. `None` means "leave the field as it is".
///
/// There is no way to clear a field through a patch, except `email`, where a
/// blank value normalizes to no email.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerPatch {
    pub customer_type: Option<CustomerType>,
    pub document_number: Option<String>,
    pub full_name: Option<String>,
    pub business_name: Option<String>,
    pub email: Option<String>,
    pub phones: Option<Vec<String>>,
}

impl NewCustomer {
    /// Validate the document number and normalize email and phones.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentNumberError::Blank`] if the document number is blank.
    pub fn into_draft(self) -> Result<CustomerDraft, DocumentNumberError> {
        let document_number = DocumentNumber::parse(&self.document_number)?;

        Ok(CustomerDraft {
            customer_type: self.customer_type,
            document_number,
            full_name: self.full_name,
            business_name: self.business_name,
            email: self.email.as_deref().and_then(Email::normalize),
            phones: normalize_phones(&self.phones),
        })
    }
}

impl CustomerDraft {
    /// Attach a store-assigned id, producing the persisted record.
    #[must_use]
    pub fn with_id(self, id: CustomerId) -> Customer {
        Customer {
            id,
            customer_type: self.customer_type,
            document_number: self.document_number,
            full_name: self.full_name,
            business_name: self.business_name,
            email: self.email,
            phones: self.phones,
        }
    }
}

impl Customer {
    /// Merge a patch into this customer.
    ///
    /// Every field present in `patch` overwrites the current value; absent
    /// fields are left untouched. `email` and `phones` are normalized. A blank
    /// document number counts as absent.
    ///
    /// ```
    /// use customer_core::{Customer, CustomerId, CustomerPatch, CustomerType, DocumentNumber};
    ///
    /// let existing = Customer {
    ///     id: CustomerId::generate(),
    ///     customer_type: CustomerType::Personal,
    ///     document_number: DocumentNumber::parse("DOC-1").unwrap(),
    ///     full_name: Some("Alice".into()),
    ///     business_name: Some("Acme".into()),
    ///     email: None,
    ///     phones: vec![],
    /// };
    ///
    /// let merged = existing.apply_patch(CustomerPatch {
    ///     customer_type: Some(CustomerType::Enterprise),
    ///     ..CustomerPatch::default()
    /// });
    ///
    /// assert_eq!(merged.customer_type, CustomerType::Enterprise);
    /// assert_eq!(merged.full_name.as_deref(), Some("Alice"));
    /// assert_eq!(merged.business_name.as_deref(), Some("Acme"));
    /// ```
    #[must_use]
    pub fn apply_patch(mut self, patch: CustomerPatch) -> Self {
        let CustomerPatch {
            customer_type,
            document_number,
            full_name,
            business_name,
            email,
            phones,
        } = patch;

        if let Some(customer_type) = customer_type {
            self.customer_type = customer_type;
        }
        if let Some(document_number) = DocumentNumber::normalize(document_number.as_deref()) {
            self.document_number = document_number;
        }
        if let Some(full_name) = full_name {
            self.full_name = Some(full_name);
        }
        if let Some(business_name) = business_name {
            self.business_name = Some(business_name);
        }
        if let Some(email) = email {
            self.email = Email::normalize(&email);
        }
        if let Some(phones) = phones {
            self.phones = normalize_phones(phones);
        }

        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn existing() -> Customer {
        Customer {
            id: CustomerId::generate(),
            customer_type: CustomerType::Personal,
            document_number: DocumentNumber::parse("DOC-1").unwrap(),
            full_name: Some("Alice".to_string()),
            business_name: Some("Acme".to_string()),
            email: Email::normalize("alice@acme.com"),
            phones: vec!["111".to_string(), "222".to_string()],
        }
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let before = existing();
        let after = before.clone().apply_patch(CustomerPatch::default());
        assert_eq!(before, after);
    }

    #[test]
    fn test_type_only_patch_keeps_names() {
        let merged = existing().apply_patch(CustomerPatch {
            customer_type: Some(CustomerType::Enterprise),
            ..CustomerPatch::default()
        });

        assert_eq!(merged.customer_type, CustomerType::Enterprise);
        assert_eq!(merged.full_name.as_deref(), Some("Alice"));
        assert_eq!(merged.business_name.as_deref(), Some("Acme"));
        assert_eq!(merged.phones, vec!["111", "222"]);
    }

    #[test]
    fn test_phones_are_normalized() {
        let merged = existing().apply_patch(CustomerPatch {
            phones: Some(vec![" 111 ".to_string(), "111".to_string(), String::new()]),
            ..CustomerPatch::default()
        });

        assert_eq!(merged.phones, vec!["111"]);
    }

    #[test]
    fn test_email_is_normalized_and_blank_clears_it() {
        let merged = existing().apply_patch(CustomerPatch {
            email: Some("  NEW@Acme.COM ".to_string()),
            ..CustomerPatch::default()
        });
        assert_eq!(merged.email.as_ref().map(Email::as_str), Some("new@acme.com"));

        let cleared = merged.apply_patch(CustomerPatch {
            email: Some("   ".to_string()),
            ..CustomerPatch::default()
        });
        assert_eq!(cleared.email, None);
    }

    #[test]
    fn test_document_number_trimmed_and_blank_ignored() {
        let merged = existing().apply_patch(CustomerPatch {
            document_number: Some("  DOC-2 ".to_string()),
            ..CustomerPatch::default()
        });
        assert_eq!(merged.document_number.as_str(), "DOC-2");

        let unchanged = merged.apply_patch(CustomerPatch {
            document_number: Some("  ".to_string()),
            ..CustomerPatch::default()
        });
        assert_eq!(unchanged.document_number.as_str(), "DOC-2");
    }

    #[test]
    fn test_into_draft_normalizes() {
        let draft = NewCustomer {
            customer_type: CustomerType::Enterprise,
            document_number: " 20-123 ".to_string(),
            full_name: None,
            business_name: Some("Acme".to_string()),
            email: Some(" Sales@Acme.com".to_string()),
            phones: vec!["1".to_string(), " 1 ".to_string(), " ".to_string(), "2".to_string()],
        }
        .into_draft()
        .unwrap();

        assert_eq!(draft.document_number.as_str(), "20-123");
        assert_eq!(draft.email.as_ref().map(Email::as_str), Some("sales@acme.com"));
        assert_eq!(draft.phones, vec!["1", "2"]);
    }

    #[test]
    fn test_into_draft_requires_document_number() {
        let result = NewCustomer {
            customer_type: CustomerType::Personal,
            document_number: "   ".to_string(),
            full_name: Some("Bob".to_string()),
            business_name: None,
            email: None,
            phones: vec![],
        }
        .into_draft();

        assert_eq!(result, Err(DocumentNumberError::Blank));
    }

    #[test]
    fn test_with_id_keeps_fields() {
        let id = CustomerId::generate();
        let draft = existing();
        let customer = CustomerDraft {
            customer_type: draft.customer_type,
            document_number: draft.document_number.clone(),
            full_name: draft.full_name.clone(),
            business_name: draft.business_name.clone(),
            email: draft.email.clone(),
            phones: draft.phones.clone(),
        }
        .with_id(id);

        assert_eq!(customer.id, id);
        assert_eq!(customer.document_number, draft.document_number);
    }
}
