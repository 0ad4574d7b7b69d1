//! Customer repository backed by `PostgreSQL`.

use sqlx::PgPool;
use tracing::instrument;

use customer_core::{
    Customer, CustomerDraft, CustomerId, CustomerType, DocumentNumber, Email,
};

use super::{CustomerStore, RepositoryError};

const CUSTOMER_COLUMNS: &str =
    "id, customer_type, document_number, full_name, business_name, email, phones";

/// Row shape of the `customers` table.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    customer_type: CustomerType,
    document_number: String,
    full_name: Option<String>,
    business_name: Option<String>,
    email: Option<String>,
    phones: Vec<String>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let document_number = DocumentNumber::parse(&row.document_number).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid document number for customer {}: {e}",
                row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            customer_type: row.customer_type,
            document_number,
            full_name: row.full_name,
            business_name: row.business_name,
            email: row.email.as_deref().and_then(Email::normalize),
            phones: row.phones,
        })
    }
}

/// Map a unique-index violation to [`RepositoryError::Conflict`].
fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict("documentNumber already exists".to_owned());
    }
    RepositoryError::Database(e)
}

fn into_customers(rows: Vec<CustomerRow>) -> Result<Vec<Customer>, RepositoryError> {
    rows.into_iter().map(Customer::try_from).collect()
}

/// Repository for customer database operations.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CustomerStore for PgCustomerRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_customers(rows)
    }

    #[instrument(skip(self))]
    async fn find_by_type(
        &self,
        customer_type: CustomerType,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE customer_type = $1 ORDER BY created_at, id"
        ))
        .bind(customer_type)
        .fetch_all(&self.pool)
        .await?;

        into_customers(rows)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    #[instrument(skip(self), fields(document_number = %document_number))]
    async fn find_by_document_number(
        &self,
        document_number: &DocumentNumber,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE document_number = $1"
        ))
        .bind(document_number.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    #[instrument(skip(self, draft), fields(document_number = %draft.document_number))]
    async fn insert(&self, draft: &CustomerDraft) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            INSERT INTO customers
                (id, customer_type, document_number, full_name, business_name, email, phones)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(CustomerId::generate())
        .bind(draft.customer_type)
        .bind(draft.document_number.as_str())
        .bind(draft.full_name.as_deref())
        .bind(draft.business_name.as_deref())
        .bind(draft.email.as_ref().map(Email::as_str))
        .bind(&draft.phones)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Customer::try_from(row)
    }

    #[instrument(skip(self, customer), fields(id = %customer.id))]
    async fn replace(&self, customer: &Customer) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r"
            UPDATE customers
            SET customer_type = $2,
                document_number = $3,
                full_name = $4,
                business_name = $5,
                email = $6,
                phones = $7,
                updated_at = now()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(customer.id)
        .bind(customer.customer_type)
        .bind(customer.document_number.as_str())
        .bind(customer.full_name.as_deref())
        .bind(customer.business_name.as_deref())
        .bind(customer.email.as_ref().map(Email::as_str))
        .bind(&customer.phones)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.map_or(Err(RepositoryError::NotFound), Customer::try_from)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete_by_id(&self, id: CustomerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
