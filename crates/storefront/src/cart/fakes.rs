//! In-memory oracles and blob stores for store tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rocketshoes_core::{CatalogProduct, Price, ProductId, Stock};

use crate::api::{ApiError, CatalogOracle, StockOracle};
use crate::storage::{BlobStore, MemoryBlobStore, StorageError};

#[derive(Default)]
struct FakeOracleState {
    stock: HashMap<ProductId, i64>,
    catalog: HashMap<ProductId, CatalogProduct>,
    failing: bool,
    stock_calls: usize,
    catalog_calls: usize,
}

/// Stock and catalog oracle backed by maps. Clones share state.
#[derive(Clone, Default)]
pub struct FakeOracle {
    state: Arc<Mutex<FakeOracleState>>,
}

#[allow(clippy::unwrap_used)]
impl FakeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a catalog product with the given stock.
    pub fn with_product(self, id: i32, title: &str, cents: i64, stock: i64) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let product_id = ProductId::new(id);
            state.catalog.insert(
                product_id,
                CatalogProduct {
                    id: product_id,
                    title: title.to_string(),
                    price: Price::from_cents(cents),
                    image: format!("https://cdn.rocketshoes.dev/{id}.jpg"),
                },
            );
            state.stock.insert(product_id, stock);
        }
        self
    }

    pub fn set_stock(&self, id: i32, amount: i64) {
        self.state
            .lock()
            .unwrap()
            .stock
            .insert(ProductId::new(id), amount);
    }

    /// Make every subsequent request fail with a 503.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    pub fn stock_calls(&self) -> usize {
        self.state.lock().unwrap().stock_calls
    }

    pub fn catalog_calls(&self) -> usize {
        self.state.lock().unwrap().catalog_calls
    }

    pub fn stock_oracle(&self) -> Arc<dyn StockOracle> {
        Arc::new(self.clone())
    }

    pub fn catalog_oracle(&self) -> Arc<dyn CatalogOracle> {
        Arc::new(self.clone())
    }
}

fn unavailable() -> ApiError {
    ApiError::Api {
        status: 503,
        message: "unavailable".to_string(),
    }
}

#[async_trait]
#[allow(clippy::unwrap_used)]
impl StockOracle for FakeOracle {
    async fn stock(&self, product_id: ProductId) -> Result<Stock, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.stock_calls += 1;
        if state.failing {
            return Err(unavailable());
        }
        state
            .stock
            .get(&product_id)
            .map(|&amount| Stock::new(product_id, amount))
            .ok_or_else(|| ApiError::NotFound(format!("/stock/{product_id}")))
    }
}

#[async_trait]
#[allow(clippy::unwrap_used)]
impl CatalogOracle for FakeOracle {
    async fn product(&self, product_id: ProductId) -> Result<CatalogProduct, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.catalog_calls += 1;
        if state.failing {
            return Err(unavailable());
        }
        state
            .catalog
            .get(&product_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("/products/{product_id}")))
    }
}

/// Memory blob store whose writes can be switched off.
#[derive(Clone, Default)]
pub struct FlakyBlobStore {
    inner: MemoryBlobStore,
    failing: Arc<AtomicBool>,
}

impl FlakyBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl BlobStore for FlakyBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                path: "flaky".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.set(key, value)
    }
}
