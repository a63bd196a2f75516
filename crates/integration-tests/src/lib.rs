//! Integration tests for RocketShoes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `api_client` - HTTP oracle client against a mock API
//! - `cart_flow` - Cart store over a real blob file and the mock API
//! - `storefront_http` - The storefront router served on a real socket
//!
//! Every test talks to a [`MockApi`] bound to an ephemeral port, so no
//! external services are needed.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use rocketshoes_core::{CatalogProduct, Price, ProductId, Stock};
use rocketshoes_storefront::config::ApiConfig;
use tokio::net::TcpListener;
use url::Url;

/// In-process stand-in for the stock and catalog API.
///
/// Serves `GET /stock/{id}` and `GET /products/{id}` from shared state.
/// Dropping the last clone does not stop the server; it lives as long as
/// the test runtime.
#[derive(Clone)]
pub struct MockApi {
    addr: SocketAddr,
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    products: Mutex<HashMap<ProductId, CatalogProduct>>,
    stock: Mutex<HashMap<ProductId, i64>>,
    failing: Mutex<Option<StatusCode>>,
    last_authorization: Mutex<Option<String>>,
    stock_hits: AtomicUsize,
    catalog_hits: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockApi {
    /// Bind to `127.0.0.1:0` and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::unwrap_used)]
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/stock/{id}", get(stock))
            .route("/products/{id}", get(product))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Register a catalog product with its stock level.
    #[must_use]
    pub fn with_product(self, id: i32, title: &str, price_cents: i64, stock: i64) -> Self {
        let product_id = ProductId::new(id);
        lock(&self.state.products).insert(
            product_id,
            CatalogProduct {
                id: product_id,
                title: title.to_string(),
                price: Price::from_cents(price_cents),
                image: format!("https://cdn.example.com/{id}.jpg"),
            },
        );
        self.set_stock(id, stock);
        self
    }

    /// Register a stock level without a catalog entry.
    pub fn set_stock(&self, id: i32, amount: i64) {
        lock(&self.state.stock).insert(ProductId::new(id), amount);
    }

    /// Answer every request with `status` until cleared with `None`.
    pub fn set_failing(&self, status: Option<StatusCode>) {
        *lock(&self.state.failing) = status;
    }

    /// Base URL of the mock API.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).unwrap()
    }

    /// API configuration pointing at the mock.
    #[must_use]
    pub fn config(&self) -> ApiConfig {
        ApiConfig::new(self.base_url())
    }

    /// Number of stock requests served.
    #[must_use]
    pub fn stock_hits(&self) -> usize {
        self.state.stock_hits.load(Ordering::SeqCst)
    }

    /// Number of catalog requests served.
    #[must_use]
    pub fn catalog_hits(&self) -> usize {
        self.state.catalog_hits.load(Ordering::SeqCst)
    }

    /// `Authorization` header of the most recent request.
    #[must_use]
    pub fn last_authorization(&self) -> Option<String> {
        lock(&self.state.last_authorization).clone()
    }
}

fn record(state: &MockState, headers: &HeaderMap) -> Option<Response> {
    *lock(&state.last_authorization) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let failing = *lock(&state.failing);
    failing.map(|status| (status, "mock failure").into_response())
}

async fn stock(
    State(state): State<Arc<MockState>>,
    Path(id): Path<ProductId>,
    headers: HeaderMap,
) -> Response {
    state.stock_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = record(&state, &headers) {
        return response;
    }

    let amount = lock(&state.stock).get(&id).copied();
    match amount {
        Some(amount) => Json(Stock::new(id, amount)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn product(
    State(state): State<Arc<MockState>>,
    Path(id): Path<ProductId>,
    headers: HeaderMap,
) -> Response {
    state.catalog_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = record(&state, &headers) {
        return response;
    }

    let product = lock(&state.products).get(&id).cloned();
    // The live catalog names the image field `imageUrl`
    match product {
        Some(product) => Json(serde_json::json!({
            "id": product.id,
            "title": product.title,
            "price": product.price,
            "imageUrl": product.image,
        }))
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
