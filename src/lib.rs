//! ITscope Client
//!
//! Client for the ITscope product catalog search API. Large id lists are
//! split into bounded search queries, executed under a shared token-bucket
//! rate limit with bounded retries, and merged into one result.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod providers;

pub use catalog::ProductAssembler;
pub use config::{FetchStrategy, Settings};
pub use domain::{Language, Product, ProductType};
pub use providers::{CatalogError, CatalogResult, Credentials, ItscopeClient, ProductCatalog, RequestContext};
