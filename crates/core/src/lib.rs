//! Customer Core - Domain types for the customer service.
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no caches. The service crate builds its orchestrator,
//! persistence adapter and HTTP layer on top of these types.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, normalized value types, the customer entity and
//!   its patch-merge rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
