//! ITscope API Client Implementation
//!
//! This module implements the ProductCatalog trait for ITscope: product
//! search by query, batched lookups of large id lists and the product type
//! catalog. Every request goes through the shared rate limiter and retry loop
//! of [`RateLimitedClient`].

use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, FutureExt, StreamExt};
use parking_lot::RwLock;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::batch::{build_id_queries, sku_query};
use crate::config::{FetchStrategy, Settings};
use crate::domain::product::{Language, Product, ProductType, ProductTypesContainer, ProductsContainer};
use crate::providers::context::RequestContext;
use crate::providers::http_client::{RateLimitedClient, RetryPolicy};
use crate::providers::traits::{CatalogError, CatalogResult, Credentials, ProductCatalog, ResultExt};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.itscope.com/2.0";

/// Characters left unescaped in a search query (same set as a URL query component)
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Fixed query parameters of the standard search projection
const SEARCH_PARAMS: [(&str, &str); 5] = [
    ("realtime", "false"),
    ("plzproducts", "false"),
    ("page", "1"),
    ("item", "0"),
    ("sort", "DEFAULT"),
];

/// ITscope API client
pub struct ItscopeClient {
    /// Rate-limited HTTP client
    client: RateLimitedClient,

    credentials: Credentials,

    /// Sent in the `UserAgent` header
    user_agent: String,

    /// Response language, changeable on a live client
    language: RwLock<Language>,

    /// API base URL, without trailing slash
    base_url: String,

    batch_length: NonZeroUsize,

    strategy: FetchStrategy,

    max_concurrency: NonZeroUsize,
}

impl ItscopeClient {
    /// Create a client with the default limits against the public API
    pub fn new(company_name: &str, credentials: Credentials, language: Language) -> CatalogResult<Self> {
        let settings = Settings {
            api: crate::config::ApiSettings {
                company_name: company_name.to_string(),
                username: credentials.username,
                password: credentials.password,
                language,
                ..Default::default()
            },
            ..Default::default()
        };
        Self::from_settings(&settings)
    }

    /// Create a client from loaded settings
    pub fn from_settings(settings: &Settings) -> CatalogResult<Self> {
        let api = &settings.api;
        let fetch = &settings.fetch;

        let base_url = api.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        let user_agent = user_agent_for(&api.company_name);

        let http = Client::builder()
            .timeout(Duration::from_secs(fetch.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(fetch.max_concurrency.get())
            .user_agent(user_agent.clone())
            .build()?;

        let retry = RetryPolicy {
            max_attempts: fetch.max_attempts,
            backoff: Duration::from_millis(fetch.retry_backoff_ms),
        };

        Ok(ItscopeClient {
            client: RateLimitedClient::with_quota(http, fetch.rate_limit_per_second, fetch.rate_limit_burst, retry),
            credentials: Credentials::new(api.username.clone(), api.password.clone()),
            user_agent,
            language: RwLock::new(api.language.clone()),
            base_url,
            batch_length: fetch.batch_length,
            strategy: fetch.strategy,
            max_concurrency: fetch.max_concurrency,
        })
    }

    pub fn set_language(&self, language: Language) {
        *self.language.write() = language;
    }

    pub fn language(&self) -> Language {
        self.language.read().clone()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search URL for a raw query
    ///
    /// The query is escaped the way a URL query component is, spaces
    /// included (`+`).
    fn search_url(&self, query: &str) -> CatalogResult<Url> {
        let encoded = query
            .split(' ')
            .map(|part| utf8_percent_encode(part, QUERY_COMPONENT).to_string())
            .collect::<Vec<_>>()
            .join("+");
        let mut url = Url::parse(&format!("{}/products/search/{}/standard.json", self.base_url, encoded))?;
        url.query_pairs_mut().extend_pairs(SEARCH_PARAMS);
        Ok(url)
    }

    fn product_types_url(&self) -> CatalogResult<Url> {
        Ok(Url::parse(&format!("{}/products/producttypes/producttype.json", self.base_url))?)
    }

    /// Attach basic auth and the headers the API expects
    fn authenticate(&self, builder: RequestBuilder, language: &Language) -> RequestBuilder {
        builder
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .header(ACCEPT, "application/json")
            .header("UserAgent", &self.user_agent)
            .header(ACCEPT_LANGUAGE, language.as_str())
    }

    /// Authenticated GET with retries; `None` on 404
    async fn get<T: DeserializeOwned>(&self, ctx: &RequestContext, url: Url) -> CatalogResult<Option<T>> {
        if !self.credentials.is_configured() {
            return Err(CatalogError::MissingCredentials);
        }

        let language = self.language();
        debug!(url = %url, "ITscope API request");

        self.client
            .fetch_json(ctx, || self.authenticate(self.client.http().get(url.clone()), &language))
            .await
    }

    /// One group at a time, stopping at the first error
    async fn fetch_sequential(&self, ctx: &RequestContext, queries: &[String]) -> CatalogResult<Vec<Product>> {
        let mut products = Vec::new();
        for query in queries {
            products.extend(self.get_products_from_query(ctx, query).await?.product);
        }
        Ok(products)
    }

    /// Up to `max_concurrency` groups in flight
    ///
    /// Results are collected here as they complete. The first error cancels
    /// the group context: groups not yet started then fail in the limiter
    /// before any I/O, and in-flight ones stop at their next wait. All of
    /// them are drained before returning.
    async fn fetch_concurrent(&self, ctx: &RequestContext, queries: &[String]) -> CatalogResult<Vec<Product>> {
        let group_ctx = ctx.child();
        let shared_ctx = &group_ctx;

        let mut results = stream::iter(queries.to_vec())
            .map(move |query: String| {
                async move { self.get_products_from_query(shared_ctx, &query).await }.boxed()
            })
            .buffer_unordered(self.max_concurrency.get());

        let mut products = Vec::new();
        let mut first_error = None;

        while let Some(result) = results.next().await {
            match result {
                Ok(container) if first_error.is_none() => products.extend(container.product),
                Ok(_) => {}
                Err(e) if first_error.is_none() => {
                    warn!(error = %e, "Batch query failed, cancelling remaining groups");
                    group_ctx.cancel();
                    first_error = Some(e);
                }
                Err(e) => debug!(error = %e, "Batch query ended after cancellation"),
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(products),
        }
    }
}

/// `UserAgent` header value derived from the company name
pub fn user_agent_for(company_name: &str) -> String {
    format!("{}-ITS_ApiModule-0.1", company_name)
}

#[async_trait]
impl ProductCatalog for ItscopeClient {
    async fn get_products_from_query(&self, ctx: &RequestContext, query: &str) -> CatalogResult<ProductsContainer> {
        let url = self.search_url(query).context("product query")?;

        let products: Option<ProductsContainer> = self.get(ctx, url).await.context("product query")?;
        Ok(products.unwrap_or_default())
    }

    async fn get_product_data(&self, ctx: &RequestContext, sku: &str) -> CatalogResult<Option<Product>> {
        let container = self
            .get_products_from_query(ctx, &sku_query(sku))
            .await
            .context("could not retrieve product data")?;

        Ok(container.product.into_iter().next())
    }

    #[instrument(skip(self, ctx, ids), fields(id_count = ids.len()))]
    async fn get_products_by_ids(&self, ctx: &RequestContext, ids: &[String]) -> CatalogResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let queries = build_id_queries(ids, self.batch_length);
        debug!(groups = queries.len(), strategy = ?self.strategy, "Fetching products in batches");

        match self.strategy {
            FetchStrategy::Sequential => self.fetch_sequential(ctx, &queries).await,
            FetchStrategy::Concurrent => self.fetch_concurrent(ctx, &queries).await,
        }
    }

    async fn get_all_product_types(&self, ctx: &RequestContext) -> CatalogResult<Vec<ProductType>> {
        let url = self.product_types_url().context("product types")?;

        let container: Option<ProductTypesContainer> = self.get(ctx, url).await.context("product types")?;
        Ok(container.map(|c| c.product_types).unwrap_or_default())
    }
}

impl std::fmt::Debug for ItscopeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItscopeClient")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("language", &self.language())
            .field("batch_length", &self.batch_length)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
