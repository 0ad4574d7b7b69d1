//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServiceConfig;
use crate::db::PgCustomerRepository;
use crate::services::CustomerService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    customers: CustomerService<PgCustomerRepository>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Builds the customer service (and its caches) over `pool`, sized by
    /// `config`.
    #[must_use]
    pub fn new(config: &ServiceConfig, pool: PgPool) -> Self {
        let customers = CustomerService::new(PgCustomerRepository::new(pool.clone()), &config.cache);

        Self {
            inner: Arc::new(AppStateInner {
                pool,
                customers,
            }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the customer service.
    #[must_use]
    pub fn customers(&self) -> &CustomerService<PgCustomerRepository> {
        &self.inner.customers
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    #[tokio::test]
    async fn test_new_starts_with_empty_caches() {
        let config = ServiceConfig::from_lookup(|key| {
            (key == "CUSTOMER_DATABASE_URL").then(|| "postgres://localhost/customers".to_string())
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/customers")
            .unwrap();

        let state = AppState::new(&config, pool);
        let stats = state.customers().cache_stats().await;

        assert_eq!(stats.by_id.entries, 0);
        assert_eq!(stats.by_document.entries, 0);
        assert_eq!(stats.in_flight, 0);
    }
}
