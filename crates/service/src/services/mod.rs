//! Business logic services.
//!
//! # Services
//!
//! - `customers` - Customer reads and writes behind the id, document-number
//!   and coalescing caches

pub mod customers;

pub use customers::{CacheStats, CacheUsage, CustomerService, ServiceError};
