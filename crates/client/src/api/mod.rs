//! Biblio REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`; the backend is the source of truth
//! - One shared connection pool per process, cloned cheaply via `Arc`
//! - Catalogue listings cached in memory via `moka`; carts, items and single
//!   products are never cached
//! - Bearer token attached to every request once a session exists
//!
//! # Endpoints
//!
//! Store base URL: `cart`, `cart_item`, `product`, `order`, `user`.
//! Auth base URL: `auth/login`, `auth/me`, `auth/signup`.
//!
//! # Example
//!
//! ```rust,ignore
//! use biblio_client::{ApiClient, ClientConfig, CartGateway};
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::new(&config)?;
//!
//! let carts = api.list_carts(None).await?;
//! ```

mod auth;
mod cache;
mod carts;
mod orders;
mod products;
pub mod types;
mod users;

pub use types::*;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::ClientConfig;
use cache::{CacheKey, CacheValue};

/// Longest response-body excerpt carried in an error.
const ERROR_BODY_EXCERPT: usize = 200;

/// Longest response-body excerpt written to logs.
const LOG_BODY_EXCERPT: usize = 500;

/// Errors that can occur when talking to the Biblio backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Missing or rejected bearer token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the backend reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Biblio store and auth APIs.
///
/// Cloning is cheap: the connection pool and cache are shared.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
    token: Option<Arc<SecretString>>,
}

struct ApiClientInner {
    http: reqwest::Client,
    store_base_url: Url,
    auth_base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("store_base_url", &self.inner.store_base_url.as_str())
            .field("auth_base_url", &self.inner.auth_base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// Uses `config.api_token` as the initial bearer token, if set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(config.http_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(config.product_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                store_base_url: config.store_base_url.clone(),
                auth_base_url: config.auth_base_url.clone(),
                cache,
            }),
            token: config.api_token.clone().map(Arc::new),
        })
    }

    /// Return a client sharing this one's pool and cache but sending `token`.
    #[must_use]
    pub fn with_token(&self, token: SecretString) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            token: Some(Arc::new(token)),
        }
    }

    /// Whether a bearer token will be sent.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Store API base URL.
    #[must_use]
    pub fn store_base_url(&self) -> &Url {
        &self.inner.store_base_url
    }

    /// Resolve a path against the store base URL.
    fn store_url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.store_base_url.join(path)?)
    }

    /// Resolve a path against the auth base URL.
    fn auth_url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.auth_base_url.join(path)?)
    }

    /// Start a request, attaching the bearer token when present.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and decode a JSON body.
    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let (status, url, body) = Self::send(request).await?;

        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    status = %status,
                    url = %url,
                    body = %excerpt(&body, LOG_BODY_EXCERPT),
                    "Failed to parse Biblio API response"
                );
                Err(ApiError::Parse(e.to_string()))
            }
        }
    }

    /// Send a request whose response body is ignored.
    async fn send_empty(request: RequestBuilder) -> Result<(), ApiError> {
        Self::send(request).await.map(|_| ())
    }

    /// Send a request and map failure statuses to [`ApiError`].
    async fn send(request: RequestBuilder) -> Result<(StatusCode, Url, String), ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            return Ok((status, url, body));
        }

        tracing::warn!(
            status = %status,
            url = %url,
            body = %excerpt(&body, LOG_BODY_EXCERPT),
            "Biblio API returned non-success status"
        );

        Err(match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::NOT_FOUND => ApiError::NotFound(url.path().to_string()),
            _ => ApiError::Api {
                status: status.as_u16(),
                message: excerpt(&body, ERROR_BODY_EXCERPT),
            },
        })
    }
}

/// First `max` characters of a response body.
fn excerpt(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}
