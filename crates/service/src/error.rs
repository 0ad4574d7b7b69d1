//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is written; clients get a JSON
//! body of the form `{"error": "..."}`.

use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::ServiceError;

/// Application-level error type for the customer service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or invalid request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Document number already in use.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The customer store failed.
    #[error("Backend error: {0}")]
    Backend(#[source] Arc<RepositoryError>),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::BadRequest(msg),
            ServiceError::Conflict(document_number) => {
                Self::Conflict(format!("documentNumber already exists: {document_number}"))
            }
            ServiceError::NotFound(id) => Self::NotFound(format!("customer {id}")),
            ServiceError::Backend(source) => match source.as_ref() {
                RepositoryError::Conflict(msg) => Self::Conflict(msg.clone()),
                RepositoryError::NotFound => Self::NotFound("customer".to_string()),
                _ => Self::Backend(source),
            },
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Backend(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Backend(_) => "Customer store unavailable".to_string(),
            Self::BadRequest(msg) | Self::Conflict(msg) | Self::NotFound(msg) => msg.clone(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use customer_core::{CustomerId, DocumentNumber};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("customer 42".to_string());
        assert_eq!(err.to_string(), "Not found: customer 42");

        let err = AppError::BadRequest("type required".to_string());
        assert_eq!(err.to_string(), "Bad request: type required");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Backend(Arc::new(RepositoryError::Unavailable(
                "down".to_string()
            )))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_service_error_mapping() {
        let doc = DocumentNumber::parse("DOC-1").unwrap();

        assert_eq!(
            AppError::from(ServiceError::Validation("documentNumber required".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ServiceError::Conflict(doc)).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(ServiceError::NotFound(CustomerId::generate())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ServiceError::from(RepositoryError::Unavailable("down".to_string())))
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_store_conflict_through_backend_is_conflict() {
        let err = ServiceError::from(RepositoryError::Conflict(
            "documentNumber already exists".to_string(),
        ));
        assert_eq!(AppError::from(err).status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let response = AppError::Conflict("documentNumber already exists: DOC-1".to_string())
            .into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "documentNumber already exists: DOC-1");
    }

    #[tokio::test]
    async fn test_backend_details_hidden() {
        let response = AppError::Backend(Arc::new(RepositoryError::Unavailable(
            "password authentication failed".to_string(),
        )))
        .into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("password"));
    }
}
