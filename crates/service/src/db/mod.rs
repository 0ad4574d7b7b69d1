//! Persistence for customer records.
//!
//! # Database
//!
//! ## Tables
//!
//! - `customers` - Customer records, unique index on `document_number`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/service/migrations/` and run via:
//! ```bash
//! cargo run -p customer-cli -- migrate
//! ```
//!
//! They are never run on service startup.

pub mod customers;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use customer_core::{Customer, CustomerDraft, CustomerId, CustomerType, DocumentNumber};

pub use customers::PgCustomerRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique document number).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store could not be reached or the load running against it died.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable customer storage.
///
/// Implementations must enforce document-number uniqueness themselves and
/// report violations as [`RepositoryError::Conflict`]. Timeouts are the
/// implementation's concern; callers never retry.
pub trait CustomerStore: Send + Sync + 'static {
    /// Every customer.
    fn find_all(&self) -> impl Future<Output = Result<Vec<Customer>, RepositoryError>> + Send;

    /// Every customer of the given type.
    fn find_by_type(
        &self,
        customer_type: CustomerType,
    ) -> impl Future<Output = Result<Vec<Customer>, RepositoryError>> + Send;

    /// Look a customer up by id.
    fn find_by_id(
        &self,
        id: CustomerId,
    ) -> impl Future<Output = Result<Option<Customer>, RepositoryError>> + Send;

    /// Look a customer up by document number.
    fn find_by_document_number(
        &self,
        document_number: &DocumentNumber,
    ) -> impl Future<Output = Result<Option<Customer>, RepositoryError>> + Send;

    /// Save a customer that has no id yet. The store assigns one.
    fn insert(
        &self,
        draft: &CustomerDraft,
    ) -> impl Future<Output = Result<Customer, RepositoryError>> + Send;

    /// Save a customer that already has an id, replacing every stored field.
    ///
    /// Returns [`RepositoryError::NotFound`] if the id does not exist.
    fn replace(
        &self,
        customer: &Customer,
    ) -> impl Future<Output = Result<Customer, RepositoryError>> + Send;

    /// Delete a customer.
    ///
    /// Returns [`RepositoryError::NotFound`] if the id does not exist.
    fn delete_by_id(&self, id: CustomerId) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
