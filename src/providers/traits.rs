//! Catalog provider trait and error definitions
//!
//! This module defines the contract a product catalog backend must follow,
//! along with the error taxonomy shared by the whole fetch pipeline.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::product::{Product, ProductType, ProductsContainer};
use crate::providers::context::RequestContext;

// ============================================================================
// Error Types
// ============================================================================

/// Catalog error types
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no username or password set")]
    MissingCredentials,

    #[error("context done while waiting for a rate limiter permit")]
    LimiterTimeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status code: {status}")]
    UnexpectedStatusCode { status: StatusCode },

    #[error("could not decode response body: {0}")]
    DecodeFailure(#[from] serde_json::Error),

    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{operation}: {source}")]
    Context {
        operation: &'static str,
        #[source]
        source: Box<CatalogError>,
    },
}

impl CatalogError {
    /// Wrap this error with the name of the operation that produced it
    pub fn context(self, operation: &'static str) -> Self {
        CatalogError::Context {
            operation,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any context layers
    pub fn root(&self) -> &CatalogError {
        let mut current = self;
        while let CatalogError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self.root() {
            CatalogError::UnexpectedStatusCode { status } => Some(*status),
            CatalogError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Whether the error came from a cancelled or expired context
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self.root(),
            CatalogError::LimiterTimeout | CatalogError::Cancelled
        )
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Extension for attaching operation context to catalog results
pub trait ResultExt<T> {
    fn context(self, operation: &'static str) -> CatalogResult<T>;
}

impl<T> ResultExt<T> for CatalogResult<T> {
    fn context(self, operation: &'static str) -> CatalogResult<T> {
        self.map_err(|e| e.context(operation))
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Basic auth credentials for the catalog API
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both username and password are set
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Read access to a product catalog
///
/// The accessory resolution in [`crate::catalog`] is written against this
/// trait, so it works with the live ITscope client as well as with any
/// in-memory catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Run a single raw search query (`id=a;id=b`, `distpid=sku`, ...)
    async fn get_products_from_query(
        &self,
        ctx: &RequestContext,
        query: &str,
    ) -> CatalogResult<ProductsContainer>;

    /// Look up one product by its distributor SKU
    async fn get_product_data(&self, ctx: &RequestContext, sku: &str) -> CatalogResult<Option<Product>>;

    /// Fetch every product referenced by `ids`, batching as needed
    async fn get_products_by_ids(&self, ctx: &RequestContext, ids: &[String]) -> CatalogResult<Vec<Product>>;

    /// Fetch the full product type catalog
    async fn get_all_product_types(&self, ctx: &RequestContext) -> CatalogResult<Vec<ProductType>>;
}
