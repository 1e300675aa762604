//! Rate-Limited HTTP Client for the catalog API
//!
//! This module wraps `reqwest` with a shared token-bucket limiter and a
//! bounded, fixed-backoff retry loop. A request is retried on transport
//! failures and on any status other than 200 or 404; a 404 is reported as an
//! empty result and a 200 body is decoded as JSON.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::providers::context::RequestContext;
use crate::providers::traits::{CatalogError, CatalogResult};

/// Retry policy for a single request
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Fixed wait between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_secs(4),
        }
    }
}

/// Retry-eligible failure observed inside the retry loop
#[derive(Debug)]
enum TransientFailure {
    Transport(reqwest::Error),
    Status(StatusCode),
}

/// Classified result of one attempt
enum Attempt<T> {
    Success(T),
    Empty,
    Transient(TransientFailure),
    Fatal(CatalogError),
}

/// Rate-limited HTTP client for API requests
///
/// Cloning is cheap and clones share the same limiter, so every caller of one
/// client draws from one token bucket.
#[derive(Clone)]
pub struct RateLimitedClient {
    /// Inner HTTP client
    client: Client,

    /// Token bucket shared by all clones
    limiter: Arc<DefaultDirectRateLimiter>,

    retry: RetryPolicy,
}

impl RateLimitedClient {
    /// Create a client with the default bucket (capacity 6, refill 6/s) and
    /// retry policy
    pub fn new(client: Client) -> Self {
        Self::with_quota(client, nonzero!(6u32), nonzero!(6u32), RetryPolicy::default())
    }

    /// Create a client with a custom refill rate, bucket capacity and retry policy
    pub fn with_quota(
        client: Client,
        rate_per_second: NonZeroU32,
        burst: NonZeroU32,
        retry: RetryPolicy,
    ) -> Self {
        let quota = Quota::per_second(rate_per_second).allow_burst(burst);

        RateLimitedClient {
            client,
            limiter: Arc::new(RateLimiter::direct(quota)),
            retry,
        }
    }

    /// Inner HTTP client, for building requests
    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Wait for a rate limit permit
    ///
    /// Fails with [`CatalogError::LimiterTimeout`] if the context is done
    /// before a token becomes available.
    pub async fn acquire(&self, ctx: &RequestContext) -> CatalogResult<()> {
        tokio::select! {
            biased;
            _ = ctx.done() => Err(CatalogError::LimiterTimeout),
            _ = self.limiter.until_ready() => Ok(()),
        }
    }

    /// Send a request with retries and decode a JSON body
    ///
    /// `build` is called once per attempt. Returns `Ok(None)` for a 404
    /// response.
    pub async fn fetch_json<T, F>(&self, ctx: &RequestContext, build: F) -> CatalogResult<Option<T>>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempts_left = self.retry.max_attempts.max(1);
        let mut last_failure = None;

        while attempts_left > 0 {
            self.acquire(ctx).await?;

            match self.attempt(ctx, build()).await {
                Attempt::Success(value) => return Ok(Some(value)),
                Attempt::Empty => return Ok(None),
                Attempt::Fatal(e) => return Err(e),
                Attempt::Transient(failure) => {
                    attempts_left -= 1;
                    match &failure {
                        TransientFailure::Transport(e) => {
                            warn!(error = %e, attempts_left, "Catalog request failed")
                        }
                        TransientFailure::Status(status) => {
                            warn!(status = status.as_u16(), attempts_left, "Unexpected catalog response status")
                        }
                    }
                    last_failure = Some(failure);

                    if attempts_left > 0 {
                        self.backoff(ctx).await?;
                    }
                }
            }
        }

        Err(match last_failure {
            Some(TransientFailure::Status(status)) => CatalogError::UnexpectedStatusCode { status },
            Some(TransientFailure::Transport(e)) => CatalogError::Transport(e),
            None => CatalogError::Cancelled,
        })
    }

    /// Send one request and classify the outcome
    async fn attempt<T: DeserializeOwned>(&self, ctx: &RequestContext, request: RequestBuilder) -> Attempt<T> {
        debug!("Executing rate-limited request");

        let response = tokio::select! {
            biased;
            _ = ctx.done() => return Attempt::Fatal(CatalogError::Cancelled),
            result = request.send() => result,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => return Attempt::Transient(TransientFailure::Transport(e)),
        };

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Attempt::Empty,
            status => return Attempt::Transient(TransientFailure::Status(status)),
        }

        let body = tokio::select! {
            biased;
            _ = ctx.done() => return Attempt::Fatal(CatalogError::Cancelled),
            body = response.bytes() => body,
        };

        match body {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => Attempt::Success(value),
                Err(e) => Attempt::Fatal(CatalogError::DecodeFailure(e)),
            },
            Err(e) => Attempt::Fatal(CatalogError::Transport(e)),
        }
    }

    /// Fixed wait between attempts, cut short by the context
    async fn backoff(&self, ctx: &RequestContext) -> CatalogResult<()> {
        debug!(backoff = ?self.retry.backoff, "Retrying request");

        tokio::select! {
            biased;
            _ = ctx.done() => Err(CatalogError::Cancelled),
            _ = tokio::time::sleep(self.retry.backoff) => Ok(()),
        }
    }
}
