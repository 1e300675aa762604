//! ITscope Provider Module
//!
//! Provides integration with the ITscope product search API: batched id
//! lookups, single-SKU lookups and the product type catalog.

pub mod batch;
pub mod client;

pub use client::ItscopeClient;
