//! Core types for the customer domain.
//!
//! This module provides type-safe wrappers for identifiers and for the
//! normalized fields of a customer record.

pub mod customer;
pub mod customer_type;
pub mod document;
pub mod email;
pub mod id;
pub mod phones;

pub use customer::{Customer, CustomerDraft, CustomerPatch, NewCustomer};
pub use customer_type::{CustomerType, CustomerTypeError};
pub use document::{DocumentNumber, DocumentNumberError};
pub use email::Email;
pub use id::{CustomerId, CustomerIdError};
pub use phones::normalize_phones;
