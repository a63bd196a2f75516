//! Cart state management.
//!
//! [`CartStore`] is the sole owner of the shopper's cart. Its operations
//! validate against the stock oracle, persist the new cart, and only then
//! commit it in memory and publish it to subscribers. Failures are returned
//! as [`CartError`] values and leave both memory and storage untouched.
//!
//! [`CartHandle`] is what UI bindings hold: it runs a store operation and
//! routes any failure's fixed message to a [`Notifier`](crate::notify::Notifier).

mod handle;
mod store;

#[cfg(test)]
pub(crate) mod fakes;

pub use handle::{CartHandle, OperationOutcome};
pub use store::CartStore;

use std::fmt;

use rocketshoes_core::ProductId;
use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Shown whenever a requested amount exceeds the available stock.
pub const OUT_OF_STOCK_MESSAGE: &str = "Quantidade solicitada fora de estoque";
/// Shown when adding a product fails for any other reason.
pub const ADD_FAILED_MESSAGE: &str = "Erro na adição do produto";
/// Shown when removing a product fails.
pub const REMOVE_FAILED_MESSAGE: &str = "Erro na remoção do produto";
/// Shown when changing a product's amount fails for any reason but stock.
pub const UPDATE_FAILED_MESSAGE: &str = "Erro na alteração de quantidade do produto";

/// The three cart mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    Add,
    Remove,
    Update,
}

impl CartOperation {
    /// Fixed message reported when this operation fails (stock aside).
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => ADD_FAILED_MESSAGE,
            Self::Remove => REMOVE_FAILED_MESSAGE,
            Self::Update => UPDATE_FAILED_MESSAGE,
        }
    }
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Update => "update",
        })
    }
}

/// Why a cart operation did not apply.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested amount exceeds the oracle's reported stock.
    #[error("requested {requested} of product {product_id}, only {available} in stock")]
    OutOfStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// Operation target is not in the cart.
    #[error("{operation}: product {product_id} is not in the cart")]
    NotFound {
        operation: CartOperation,
        product_id: ProductId,
    },

    /// Non-positive (or unrepresentable) quantity requested.
    #[error("invalid amount {amount} for product {product_id}")]
    InvalidAmount { product_id: ProductId, amount: i64 },

    /// Stock or catalog oracle call failed.
    #[error("{operation}: oracle request failed: {source}")]
    Transport {
        operation: CartOperation,
        #[source]
        source: ApiError,
    },

    /// Persisting the new cart failed.
    #[error("{operation}: failed to persist cart: {source}")]
    Storage {
        operation: CartOperation,
        #[source]
        source: StorageError,
    },
}

impl CartError {
    /// Fixed human-readable message for the notification sink.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::OutOfStock { .. } => OUT_OF_STOCK_MESSAGE,
            Self::InvalidAmount { .. } => UPDATE_FAILED_MESSAGE,
            Self::NotFound { operation, .. }
            | Self::Transport { operation, .. }
            | Self::Storage { operation, .. } => operation.failure_message(),
        }
    }

    /// Whether the failure came from infrastructure rather than the request.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Storage { .. })
    }
}
