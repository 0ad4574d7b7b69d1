//! Integration tests for the customer service.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations and start the service
//! cargo run -p customer-cli -- migrate
//! cargo run -p customer-service
//!
//! # Run the ignored HTTP tests against it
//! CUSTOMER_BASE_URL=http://localhost:8080 cargo test -p customer-integration-tests -- --ignored
//! ```

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;

/// Customer as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBody {
    pub id: String,
    #[serde(rename = "type")]
    pub customer_type: String,
    pub document_number: String,
    pub full_name: Option<String>,
    pub business_name: Option<String>,
    pub email: Option<String>,
    pub phones: Vec<String>,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Base URL of the running service (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("CUSTOMER_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// A document number no other test run will use.
#[must_use]
pub fn unique_document_number() -> String {
    format!("IT-{}", uuid::Uuid::new_v4().simple())
}

/// Thin client for `/api/customers`.
#[derive(Debug, Clone)]
pub struct CustomerApi {
    client: Client,
    base_url: String,
}

impl Default for CustomerApi {
    fn default() -> Self {
        Self::new(base_url())
    }
}

impl CustomerApi {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// # Errors
    ///
    /// Returns the transport error if the service is unreachable.
    pub async fn list(&self, customer_type: Option<&str>) -> reqwest::Result<Response> {
        let path = customer_type.map_or_else(
            || "/api/customers".to_string(),
            |customer_type| format!("/api/customers?type={customer_type}"),
        );
        self.client.get(self.url(&path)).send().await
    }

    /// # Errors
    ///
    /// Returns the transport error if the service is unreachable.
    pub async fn get(&self, id: &str) -> reqwest::Result<Response> {
        self.client
            .get(self.url(&format!("/api/customers/{id}")))
            .send()
            .await
    }

    /// # Errors
    ///
    /// Returns the transport error if the service is unreachable.
    pub async fn create(&self, body: &Value) -> reqwest::Result<Response> {
        self.client
            .post(self.url("/api/customers"))
            .json(body)
            .send()
            .await
    }

    /// # Errors
    ///
    /// Returns the transport error if the service is unreachable.
    pub async fn update(&self, id: &str, body: &Value) -> reqwest::Result<Response> {
        self.client
            .put(self.url(&format!("/api/customers/{id}")))
            .json(body)
            .send()
            .await
    }

    /// # Errors
    ///
    /// Returns the transport error if the service is unreachable.
    pub async fn delete(&self, id: &str) -> reqwest::Result<Response> {
        self.client
            .delete(self.url(&format!("/api/customers/{id}")))
            .send()
            .await
    }
}
