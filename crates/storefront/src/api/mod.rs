//! Stock and catalog oracles.
//!
//! # Architecture
//!
//! - The store talks to two oracles through the [`StockOracle`] and
//!   [`CatalogOracle`] traits so tests can substitute in-memory fakes
//! - [`ApiClient`] implements both over HTTP with `reqwest`
//! - Catalog metadata is cached via `moka` (5 minute TTL); stock never is
//!
//! # Endpoints
//!
//! ```text
//! GET {base}/stock/{id}     -> { "id": 1, "amount": 3 }
//! GET {base}/products/{id}  -> { "id": 1, "title": "...", "price": 179.9, "image": "..." }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_storefront::api::{ApiClient, StockOracle};
//!
//! let client = ApiClient::new(&config.api)?;
//! let stock = client.stock(ProductId::new(1)).await?;
//! ```

mod client;

pub use client::ApiClient;

use async_trait::async_trait;
use rocketshoes_core::{CatalogProduct, ProductId, Stock};
use thiserror::Error;

/// Errors that can occur when querying the stock or catalog API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Base URL cannot carry path segments.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Authority for how many units of a product remain available.
#[async_trait]
pub trait StockOracle: Send + Sync {
    /// Fetch the current stock level of a product.
    async fn stock(&self, product_id: ProductId) -> Result<Stock, ApiError>;
}

/// Source of product metadata for items entering the cart.
#[async_trait]
pub trait CatalogOracle: Send + Sync {
    /// Fetch a product's catalog entry.
    async fn product(&self, product_id: ProductId) -> Result<CatalogProduct, ApiError>;
}
