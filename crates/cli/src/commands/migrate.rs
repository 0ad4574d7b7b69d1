//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! customer-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CUSTOMER_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Embedded at build time from `crates/service/migrations/`.

use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

const DATABASE_URL_VAR: &str = "CUSTOMER_DATABASE_URL";
const FALLBACK_DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Errors raised while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the customer database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is not set, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let _ = dotenvy::dotenv();

    let database_url = database_url(|key| std::env::var(key).ok())?;

    tracing::info!("Connecting to customer database...");
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url.expose_secret())
        .await?;

    tracing::info!("Running customer migrations...");
    sqlx::migrate!("../service/migrations").run(&pool).await?;

    tracing::info!("Customer migrations complete");
    Ok(())
}

/// Resolve the database URL, preferring the service-specific variable.
fn database_url<F>(lookup: F) -> Result<SecretString, MigrationError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |key: &str| lookup(key).filter(|url| !url.trim().is_empty());

    non_blank(DATABASE_URL_VAR)
        .or_else(|| non_blank(FALLBACK_DATABASE_URL_VAR))
        .map(SecretString::from)
        .ok_or(MigrationError::MissingEnvVar(DATABASE_URL_VAR))
}
