//! Customer service: cached reads, cache-maintaining writes.
//!
//! Three caches sit in front of the store:
//!
//! - `by_id` - id → customer
//! - `by_document` - document number → customer
//! - `in_flight` - id → [`LoadHandle`] (the coalescing cache)
//!
//! # Reads
//!
//! `find_by_id` answers from `by_id` when it can. On a miss it joins the load
//! registered in `in_flight` for that id, or registers a new one. A load
//! fetches once and is shared by every caller that arrives while it is
//! registered. On success it fills both value caches, but only if it is still
//! the registered load for its id. Not-found and failed loads unregister
//! themselves, so the next call starts fresh.
//!
//! `find_by_document_number` answers from `by_document` when it can and
//! otherwise goes straight to the store, retiring any coalesced load for the
//! id it found before filling both value caches.
//!
//! # Writes
//!
//! Writes hit the store first and only touch caches after the store accepted
//! them. The create-time uniqueness check and the update-time merge both read
//! the store, never a cache. Every write retires the coalesced load for its
//! id before it writes the value caches, so a load that read the store
//! earlier cannot overwrite the newer value.
//!
//! Deleting a customer does not evict its `by_document` entry; the document
//! number is not known at delete time. That entry expires with its TTL.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::future::Cache;
use moka::ops::compute::Op;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, info, instrument};

use customer_core::{
    Customer, CustomerId, CustomerPatch, CustomerType, DocumentNumber, NewCustomer,
};

use crate::cache::{CacheConfig, LoadHandle, Ticket, bounded_cache};
use crate::db::{CustomerStore, RepositoryError};

/// Errors surfaced by [`CustomerService`].
///
/// `Clone` so a coalesced load can hand the same failure to every waiter.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// Input failed validation (e.g. blank document number on create).
    #[error("validation error: {0}")]
    Validation(String),

    /// Another customer already has this document number.
    #[error("documentNumber already exists: {0}")]
    Conflict(DocumentNumber),

    /// Update or delete target does not exist.
    #[error("customer not found: {0}")]
    NotFound(CustomerId),

    /// The store failed. Never retried here.
    #[error("backend unavailable: {0}")]
    Backend(#[source] Arc<RepositoryError>),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        Self::Backend(Arc::new(err))
    }
}

impl From<JoinError> for ServiceError {
    fn from(err: JoinError) -> Self {
        Self::Backend(Arc::new(RepositoryError::Unavailable(format!(
            "customer load task failed: {err}"
        ))))
    }
}

/// Point-in-time usage of one value cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheUsage {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Usage of the customer caches, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub by_id: CacheUsage,
    pub by_document: CacheUsage,
    /// Loads currently registered in the coalescing cache.
    pub in_flight: u64,
}

#[derive(Debug, Default)]
struct LookupCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LookupCounters {
    fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn usage(&self, entries: u64) -> CacheUsage {
        CacheUsage {
            entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

type CustomerLoad = LoadHandle<Option<Customer>, ServiceError>;

#[derive(Clone)]
struct Caches {
    by_id: Cache<CustomerId, Customer>,
    by_document: Cache<DocumentNumber, Customer>,
    in_flight: Cache<CustomerId, CustomerLoad>,
    id_lookups: Arc<LookupCounters>,
    document_lookups: Arc<LookupCounters>,
}

impl Caches {
    fn new(config: &CacheConfig) -> Self {
        Self {
            by_id: bounded_cache("customers.by_id", &config.by_id),
            by_document: bounded_cache("customers.by_document", &config.by_document),
            in_flight: bounded_cache("customers.in_flight", &config.in_flight),
            id_lookups: Arc::default(),
            document_lookups: Arc::default(),
        }
    }

    /// Put a customer into both value caches.
    async fn remember(&self, customer: &Customer) {
        self.by_id.insert(customer.id, customer.clone()).await;
        self.by_document
            .insert(customer.document_number.clone(), customer.clone())
            .await;
    }

    /// Publish a finished load for `id`.
    ///
    /// Only a load still registered under `ticket` may fill the value caches.
    /// Loads that found nothing unregister themselves.
    async fn settle_load(&self, id: CustomerId, ticket: Ticket, found: Option<&Customer>) {
        self.in_flight
            .entry(id)
            .and_compute_with(|entry| async move {
                match entry {
                    Some(entry) if entry.value().ticket() == ticket => match found {
                        Some(customer) => {
                            self.remember(customer).await;
                            Op::Nop
                        }
                        None => Op::Remove,
                    },
                    _ => {
                        debug!(%id, ?ticket, "Discarding superseded customer load");
                        Op::Nop
                    }
                }
            })
            .await;
    }

    /// Unregister whatever load is coalesced under `id`.
    ///
    /// Runs under the same per-key lock as [`Caches::settle_load`]: once this
    /// returns, no load registered before it can write the value caches.
    async fn retire_load(&self, id: CustomerId) {
        self.in_flight
            .entry(id)
            .and_compute_with(|entry| async move {
                match entry {
                    Some(_) => Op::Remove,
                    None => Op::Nop,
                }
            })
            .await;
    }
}

/// Customer reads and writes with coalesced, cross-indexed caching.
///
/// Cheap to clone; clones share the store and all caches.
pub struct CustomerService<S> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    store: Arc<S>,
    caches: Caches,
}

impl<S> Clone for CustomerService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: CustomerStore> CustomerService<S> {
    /// Create a service over `store` with freshly built caches.
    #[must_use]
    pub fn new(store: S, config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: Arc::new(store),
                caches: Caches::new(config),
            }),
        }
    }

    /// Entry counts and lookup hit/miss counts of the caches.
    pub async fn cache_stats(&self) -> CacheStats {
        let caches = &self.inner.caches;
        caches.by_id.run_pending_tasks().await;
        caches.by_document.run_pending_tasks().await;
        caches.in_flight.run_pending_tasks().await;

        CacheStats {
            by_id: caches.id_lookups.usage(caches.by_id.entry_count()),
            by_document: caches
                .document_lookups
                .usage(caches.by_document.entry_count()),
            in_flight: caches.in_flight.entry_count(),
        }
    }

    /// List customers, optionally of one type. Always reads the store.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Backend`] if the store fails.
    #[instrument(skip(self))]
    pub async fn find_all(
        &self,
        customer_type: Option<CustomerType>,
    ) -> Result<Vec<Customer>, ServiceError> {
        let customers = match customer_type {
            Some(customer_type) => self.inner.store.find_by_type(customer_type).await?,
            None => self.inner.store.find_all().await?,
        };
        Ok(customers)
    }

    /// Find a customer by id.
    ///
    /// Concurrent misses for the same id share a single store fetch.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Backend`] if the (shared) fetch failed.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, ServiceError> {
        let caches = &self.inner.caches;
        let cached = caches.by_id.get(&id).await;
        caches.id_lookups.record(cached.is_some());
        if let Some(customer) = cached {
            debug!("Cache hit for customer");
            return Ok(Some(customer));
        }

        let load = caches
            .in_flight
            .get_with(id, async { self.load_by_id(id) })
            .await;
        debug!(ticket = ?load.ticket(), resolved = load.is_resolved(), "Joining customer load");

        load.wait().await
    }

    /// Build the coalesced load for `id`.
    fn load_by_id(&self, id: CustomerId) -> CustomerLoad {
        let store = Arc::clone(&self.inner.store);
        let caches = self.inner.caches.clone();

        LoadHandle::new(move |ticket| async move {
            debug!(%id, "Loading customer from store");
            let outcome = store.find_by_id(id).await.map_err(ServiceError::from);

            let found = outcome.as_ref().ok().and_then(Option::as_ref);
            caches.settle_load(id, ticket, found).await;
            outcome
        })
    }

    /// Find a customer by document number.
    ///
    /// A blank document number finds nothing and touches neither caches nor
    /// store.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Backend`] if the store fails.
    #[instrument(skip(self))]
    pub async fn find_by_document_number(
        &self,
        document_number: &str,
    ) -> Result<Option<Customer>, ServiceError> {
        let Some(key) = DocumentNumber::normalize(Some(document_number)) else {
            debug!("Blank document number");
            return Ok(None);
        };

        let caches = &self.inner.caches;
        let cached = caches.by_document.get(&key).await;
        caches.document_lookups.record(cached.is_some());
        if let Some(customer) = cached {
            debug!("Cache hit for customer document");
            return Ok(Some(customer));
        }

        let found = self.inner.store.find_by_document_number(&key).await?;
        if let Some(customer) = &found {
            caches.retire_load(customer.id).await;
            caches.by_document.insert(key, customer.clone()).await;
            caches.by_id.insert(customer.id, customer.clone()).await;
        }
        Ok(found)
    }

    /// Create a customer.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Validation`] if the document number is blank
    /// - [`ServiceError::Conflict`] if the document number is taken
    /// - [`ServiceError::Backend`] if the store fails
    #[instrument(skip_all, fields(document_number = %customer.document_number.trim()))]
    pub async fn create(&self, customer: NewCustomer) -> Result<Customer, ServiceError> {
        let draft = customer
            .into_draft()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let store = &self.inner.store;
        if store
            .find_by_document_number(&draft.document_number)
            .await?
            .is_some()
        {
            debug!("Document number already taken");
            return Err(ServiceError::Conflict(draft.document_number));
        }

        let saved = match store.insert(&draft).await {
            Ok(saved) => saved,
            Err(RepositoryError::Conflict(_)) => {
                return Err(ServiceError::Conflict(draft.document_number));
            }
            Err(err) => return Err(err.into()),
        };

        let caches = &self.inner.caches;
        caches.retire_load(saved.id).await;
        caches.remember(&saved).await;

        info!(id = %saved.id, "Customer created");
        Ok(saved)
    }

    /// Merge `patch` into the stored customer and save it.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the customer does not exist
    /// - [`ServiceError::Conflict`] if the new document number is taken
    /// - [`ServiceError::Backend`] if the store fails
    #[instrument(skip_all, fields(id = %id))]
    pub async fn update(&self, id: CustomerId, patch: CustomerPatch) -> Result<Customer, ServiceError> {
        let store = &self.inner.store;
        let existing = store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;

        let previous_document = existing.document_number.clone();
        let merged = existing.apply_patch(patch);

        let updated = match store.replace(&merged).await {
            Ok(updated) => updated,
            Err(RepositoryError::NotFound) => return Err(ServiceError::NotFound(id)),
            Err(RepositoryError::Conflict(_)) => {
                return Err(ServiceError::Conflict(merged.document_number));
            }
            Err(err) => return Err(err.into()),
        };

        let caches = &self.inner.caches;
        caches.retire_load(updated.id).await;
        caches.by_id.insert(updated.id, updated.clone()).await;
        if previous_document != updated.document_number {
            caches.by_document.invalidate(&previous_document).await;
        }
        caches
            .by_document
            .insert(updated.document_number.clone(), updated.clone())
            .await;

        info!("Customer updated");
        Ok(updated)
    }

    /// Delete a customer.
    ///
    /// The customer's document-number cache entry is left to expire.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if the customer does not exist
    /// - [`ServiceError::Backend`] if the store fails
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete(&self, id: CustomerId) -> Result<(), ServiceError> {
        match self.inner.store.delete_by_id(id).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(ServiceError::NotFound(id)),
            Err(err) => return Err(err.into()),
        }

        let caches = &self.inner.caches;
        caches.retire_load(id).await;
        caches.by_id.invalidate(&id).await;

        info!("Customer deleted");
        Ok(())
    }
}
