//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::api::ApiClient;
use crate::cart::{CartHandle, CartStore};
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::notify::{Notifier, TracingNotifier};
use crate::storage::{CartPersistence, FileBlobStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The cart handle sits behind
/// an async mutex so cart operations from concurrent requests run one at a
/// time, oracle round trips included.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cart: Mutex<CartHandle>,
}

impl AppState {
    /// Wrap an already-built cart handle.
    #[must_use]
    pub fn new(cart: CartHandle) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cart: Mutex::new(cart),
            }),
        }
    }

    /// Build the API client, open the cart blob file and rehydrate the cart.
    ///
    /// Failures are reported to the shopper through [`TracingNotifier`].
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built or the blob file
    /// cannot be read.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, AppError> {
        let client = Arc::new(ApiClient::new(&config.api)?);
        let blobs = Arc::new(FileBlobStore::open(&config.cart.path)?);
        let persistence = CartPersistence::new(blobs, config.cart.key.clone());

        let store = CartStore::open(persistence, client.clone(), client)?;
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

        Ok(Self::new(CartHandle::new(store, notifier)))
    }

    /// Get the shared cart handle.
    #[must_use]
    pub fn cart(&self) -> &Mutex<CartHandle> {
        &self.inner.cart
    }
}
