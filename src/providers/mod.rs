//! Catalog Provider Integration Module
//!
//! This module provides the fetch pipeline for the ITscope catalog API.
//!
//! # Architecture
//!
//! ```text
//!   ids ──► batch ──► query groups ──┐
//!                                    ▼
//!                         ┌────────────────────┐
//!                         │    ItscopeClient   │  fan-out (sequential or
//!                         └─────────┬──────────┘  bounded-concurrent)
//!                                   │ one query
//!                         ┌─────────▼──────────┐
//!                         │ RateLimitedClient  │  token bucket + retry
//!                         └────────────────────┘
//! ```

pub mod context;
pub mod http_client;
pub mod itscope;
pub mod traits;

// Re-export commonly used types
pub use context::RequestContext;
pub use http_client::{RateLimitedClient, RetryPolicy};
pub use itscope::ItscopeClient;
pub use traits::{CatalogError, CatalogResult, Credentials, ProductCatalog, ResultExt};
