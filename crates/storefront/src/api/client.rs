//! HTTP client for the stock and catalog API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use rocketshoes_core::{CatalogProduct, ProductId, Stock};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, CatalogOracle, StockOracle};
use crate::config::ApiConfig;

/// Body of `GET /stock/{id}`. Only the amount is trusted; the id comes from the request.
#[derive(Debug, Deserialize)]
struct StockResponse {
    amount: i64,
}

/// Client for the stock and catalog API.
///
/// Cheaply cloneable. Catalog entries are cached for 5 minutes; stock is
/// always fetched fresh because it is the ceiling for every cart change.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    catalog: Cache<ProductId, CatalogProduct>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry path segments or the
    /// HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        if config.base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(config.base_url.to_string()));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let catalog = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                token: config.token.clone(),
                catalog,
            }),
        })
    }

    /// Resolve `{base}/{resource}/{id}`, keeping any path prefix on the base.
    fn endpoint(&self, resource: &str, product_id: ProductId) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .push(resource)
            .push(&product_id.to_string());
        Ok(url)
    }

    /// Issue a GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let path = url.path().to_string();

        let mut request = self.inner.client.get(url);
        if let Some(token) = &self.inner.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "API returned non-success status"
            );
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }
}

#[async_trait]
impl StockOracle for ApiClient {
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn stock(&self, product_id: ProductId) -> Result<Stock, ApiError> {
        let url = self.endpoint("stock", product_id)?;
        let response: StockResponse = self.get_json(url).await?;
        debug!(amount = response.amount, "Fetched stock");
        Ok(Stock::new(product_id, response.amount))
    }
}

#[async_trait]
impl CatalogOracle for ApiClient {
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn product(&self, product_id: ProductId) -> Result<CatalogProduct, ApiError> {
        if let Some(product) = self.inner.catalog.get(&product_id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let url = self.endpoint("products", product_id)?;
        let product: CatalogProduct = self.get_json(url).await?;

        self.inner.catalog.insert(product_id, product.clone()).await;

        Ok(product)
    }
}
