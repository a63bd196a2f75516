//! Notifying wrapper around the cart store for UI bindings.

use std::sync::Arc;

use rocketshoes_core::{CartState, CartSummary, ProductId};
use serde::Serialize;
use tokio::sync::watch;

use super::{CartError, CartStore};
use crate::notify::Notifier;

/// What a UI binding learns from a cart operation.
///
/// Only whether it applied and, if not, the text shown to the shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
    pub applied: bool,
    pub notice: Option<&'static str>,
}

impl OperationOutcome {
    /// Outcome of a successful operation.
    pub const APPLIED: Self = Self {
        applied: true,
        notice: None,
    };
}

/// A cart store plus the sink its failures are reported to.
pub struct CartHandle {
    store: CartStore,
    notifier: Arc<dyn Notifier>,
}

impl CartHandle {
    pub fn new(store: CartStore, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Current cart snapshot.
    #[must_use]
    pub const fn cart(&self) -> &CartState {
        self.store.cart()
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.store.summary()
    }

    /// Receiver that always holds the latest committed cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.store.subscribe()
    }

    pub async fn add_product(&mut self, product_id: ProductId) -> OperationOutcome {
        let result = self.store.add_product(product_id).await;
        self.report(result)
    }

    pub fn remove_product(&mut self, product_id: ProductId) -> OperationOutcome {
        let result = self.store.remove_product(product_id);
        self.report(result)
    }

    pub async fn update_product_amount(
        &mut self,
        product_id: ProductId,
        amount: i64,
    ) -> OperationOutcome {
        let result = self.store.update_product_amount(product_id, amount).await;
        self.report(result)
    }

    /// Route a failure to the notifier and collapse it to an outcome.
    fn report(&self, result: Result<(), CartError>) -> OperationOutcome {
        let Err(err) = result else {
            return OperationOutcome::APPLIED;
        };

        if err.is_infrastructure() {
            tracing::error!(error = %err, "Cart operation failed");
        } else {
            tracing::info!(error = %err, "Cart operation rejected");
        }

        let notice = err.message();
        self.notifier.notify(notice);

        OperationOutcome {
            applied: false,
            notice: Some(notice),
        }
    }
}

impl std::fmt::Debug for CartHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartHandle")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
