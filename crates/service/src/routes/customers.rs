//! Customer JSON API.
//!
//! Handlers translate between the camelCase wire format and the domain types
//! and delegate everything else to [`CustomerService`](crate::services::CustomerService).

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use customer_core::{Customer, CustomerId, CustomerPatch, CustomerType, NewCustomer};

use crate::error::{AppError, Result};
use crate::state::AppState;

// =============================================================================
// Wire types
// =============================================================================

/// Customer as exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: CustomerId,
    #[serde(rename = "type")]
    pub customer_type: CustomerType,
    pub document_number: String,
    pub full_name: Option<String>,
    pub business_name: Option<String>,
    pub email: Option<String>,
    pub phones: Vec<String>,
}

impl From<Customer> for CustomerDto {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            customer_type: customer.customer_type,
            document_number: customer.document_number.as_str().to_owned(),
            full_name: customer.full_name,
            business_name: customer.business_name,
            email: customer.email.map(customer_core::Email::into_inner),
            phones: customer.phones,
        }
    }
}

/// `POST /api/customers` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    #[serde(rename = "type")]
    pub customer_type: Option<CustomerType>,
    pub document_number: Option<String>,
    pub full_name: Option<String>,
    pub business_name: Option<String>,
    pub email: Option<String>,
    pub phones: Option<Vec<Option<String>>>,
}

impl TryFrom<CreateCustomerRequest> for NewCustomer {
    type Error = AppError;

    fn try_from(req: CreateCustomerRequest) -> Result<Self> {
        let customer_type = req
            .customer_type
            .ok_or_else(|| AppError::BadRequest("type required".to_string()))?;

        Ok(Self {
            customer_type,
            document_number: req.document_number.unwrap_or_default(),
            full_name: req.full_name,
            business_name: req.business_name,
            email: req.email,
            phones: flatten_phones(req.phones.unwrap_or_default()),
        })
    }
}

/// `PUT /api/customers/{id}` body. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    #[serde(rename = "type")]
    pub customer_type: Option<CustomerType>,
    pub document_number: Option<String>,
    pub full_name: Option<String>,
    pub business_name: Option<String>,
    pub email: Option<String>,
    pub phones: Option<Vec<Option<String>>>,
}

impl From<UpdateCustomerRequest> for CustomerPatch {
    fn from(req: UpdateCustomerRequest) -> Self {
        Self {
            customer_type: req.customer_type,
            document_number: req.document_number,
            full_name: req.full_name,
            business_name: req.business_name,
            email: req.email,
            phones: req.phones.map(flatten_phones),
        }
    }
}

/// `GET /api/customers` query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub customer_type: Option<String>,
}

/// Drop `null` entries; the rest is normalized by the domain layer.
fn flatten_phones(phones: Vec<Option<String>>) -> Vec<String> {
    phones.into_iter().flatten().collect()
}

fn parse_id(raw: &str) -> Result<CustomerId> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid customer id: {raw}")))
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

// =============================================================================
// Handlers
// =============================================================================

/// List customers, optionally filtered by type.
///
/// GET /api/customers?type=PERSONAL
#[instrument(skip_all, fields(customer_type = ?query.customer_type))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CustomerDto>>> {
    let customer_type = query
        .customer_type
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| raw.parse::<CustomerType>())
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let customers = state.customers().find_all(customer_type).await?;
    Ok(Json(customers.into_iter().map(CustomerDto::from).collect()))
}

/// Fetch one customer.
///
/// GET /api/customers/{id}
#[instrument(skip_all, fields(id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomerDto>> {
    let id = parse_id(&id)?;

    state
        .customers()
        .find_by_id(id)
        .await?
        .map(|customer| Json(customer.into()))
        .ok_or_else(|| AppError::NotFound(format!("customer {id}")))
}

/// Create a customer.
///
/// POST /api/customers
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerDto>)> {
    let customer = NewCustomer::try_from(json_body(payload)?)?;
    let created = state.customers().create(customer).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Merge the given fields into a customer.
///
/// PUT /api/customers/{id}
#[instrument(skip_all, fields(id = %id))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateCustomerRequest>, JsonRejection>,
) -> Result<Json<CustomerDto>> {
    let id = parse_id(&id)?;
    let patch = CustomerPatch::from(json_body(payload)?);
    let updated = state.customers().update(id, patch).await?;
    Ok(Json(updated.into()))
}

/// Delete a customer.
///
/// DELETE /api/customers/{id}
#[instrument(skip_all, fields(id = %id))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    let id = parse_id(&id)?;
    state.customers().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
