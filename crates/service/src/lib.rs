//! Customer service library.
//!
//! Customer records behind a JSON API, with cross-indexed caching and
//! coalesced id lookups in front of `PostgreSQL`.
//!
//! # Layers
//!
//! - [`routes`] - axum handlers and the application router
//! - [`services`] - cache orchestration over a [`db::CustomerStore`]
//! - [`cache`] - bounded TTL caches and the single-flight load cell
//! - [`db`] - the `PostgreSQL` store

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
