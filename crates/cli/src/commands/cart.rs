//! Cart commands working directly on the blob file.
//!
//! # Environment Variables
//!
//! - `ROCKETSHOES_API_URL` - Stock and catalog API base URL (required)
//! - `ROCKETSHOES_API_TOKEN` - Bearer token for the API (optional)
//! - `ROCKETSHOES_CART_PATH` - Cart blob file (default: `.rocketshoes/cart.json`)
//! - `ROCKETSHOES_CART_KEY` - Key of the cart inside the blob file (default: `cart`)

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use rocketshoes_core::{CartState, CartSummary};
use rocketshoes_storefront::api::{ApiClient, ApiError};
use rocketshoes_storefront::cart::{CartHandle, CartStore};
use rocketshoes_storefront::config::{ApiConfig, CartStorageConfig, ConfigError};
use rocketshoes_storefront::notify::Notifier;
use rocketshoes_storefront::storage::{CartPersistence, FileBlobStore, StorageError};
use thiserror::Error;
use url::Url;

/// Errors that keep a cart command from starting.
#[derive(Debug, Error)]
pub enum CartCommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    #[error("Cart storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Prints shopper-facing notices to stderr.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    #[allow(clippy::print_stderr)]
    fn notify(&self, message: &str) {
        eprintln!("! {message}");
    }
}

fn storage_config(cart_path: Option<PathBuf>) -> CartStorageConfig {
    let _ = dotenvy::dotenv();

    let mut storage = CartStorageConfig::from_env();
    if let Some(path) = cart_path {
        storage.path = path;
    }
    storage
}

/// Read the persisted cart without touching the API.
///
/// `cart_path` overrides `ROCKETSHOES_CART_PATH`.
///
/// # Errors
///
/// Returns an error if the blob file exists but cannot be read.
pub fn load(cart_path: Option<PathBuf>) -> Result<CartState, CartCommandError> {
    let storage = storage_config(cart_path);
    let blobs = Arc::new(FileBlobStore::open(&storage.path)?);
    Ok(CartPersistence::new(blobs, storage.key).load()?)
}

/// Open the cart described by the environment for editing.
///
/// `cart_path` overrides `ROCKETSHOES_CART_PATH` and `api_url` overrides
/// `ROCKETSHOES_API_URL`.
///
/// # Errors
///
/// Returns an error if configuration is missing or the blob file cannot be read.
pub fn open(
    cart_path: Option<PathBuf>,
    api_url: Option<Url>,
) -> Result<CartHandle, CartCommandError> {
    let storage = storage_config(cart_path);
    let api = match api_url {
        Some(url) => ApiConfig::from_env_with_base_url(url)?,
        None => ApiConfig::from_env()?,
    };

    tracing::debug!(path = %storage.path.display(), key = %storage.key, "Opening cart");

    let client = Arc::new(ApiClient::new(&api)?);
    let blobs = Arc::new(FileBlobStore::open(&storage.path)?);
    let store = CartStore::open(
        CartPersistence::new(blobs, storage.key),
        client.clone(),
        client,
    )?;

    Ok(CartHandle::new(store, Arc::new(ConsoleNotifier)))
}

/// Print the cart to stdout.
#[allow(clippy::print_stdout)]
pub fn print(cart: &CartState) {
    print!("{}", render(cart, &cart.summary()));
}

/// Render line items and totals as a plain text table.
#[must_use]
pub fn render(cart: &CartState, summary: &CartSummary) -> String {
    let mut out = String::new();

    if cart.is_empty() {
        out.push_str("Cart is empty\n");
        return out;
    }

    for product in cart.items() {
        let _ = writeln!(
            out,
            "{:>6}  {:<32} {:>4} x {:>14} = {:>14}",
            product.id,
            product.title,
            product.quantity(),
            product.price.to_string(),
            product.line_total().to_string(),
        );
    }

    let _ = writeln!(
        out,
        "{} ({} units), subtotal {}",
        summary.label, summary.total_units, summary.subtotal
    );
    out
}
