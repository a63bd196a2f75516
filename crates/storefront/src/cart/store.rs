//! The cart store.

use std::num::NonZeroU32;
use std::sync::Arc;

use rocketshoes_core::{CartState, CartSummary, ProductId};
use tokio::sync::watch;
use tracing::instrument;

use super::{CartError, CartOperation};
use crate::api::{CatalogOracle, StockOracle};
use crate::storage::{CartPersistence, StorageError};

/// Sole owner of the shopper's cart.
///
/// Mutations take `&mut self`, so one operation (oracle round trips
/// included) always finishes before the next one starts.
pub struct CartStore {
    cart: CartState,
    persistence: CartPersistence,
    stock: Arc<dyn StockOracle>,
    catalog: Arc<dyn CatalogOracle>,
    updates: watch::Sender<CartState>,
}

impl CartStore {
    /// Rehydrate the cart from persistence and wire up the oracles.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob store cannot be read. An unreadable or
    /// invalid cart blob is not an error; the store starts empty.
    pub fn open(
        persistence: CartPersistence,
        stock: Arc<dyn StockOracle>,
        catalog: Arc<dyn CatalogOracle>,
    ) -> Result<Self, StorageError> {
        let cart = persistence.load()?;
        tracing::info!(
            key = %persistence.key(),
            items = cart.len(),
            "Cart rehydrated"
        );

        let (updates, _) = watch::channel(cart.clone());

        Ok(Self {
            cart,
            persistence,
            stock,
            catalog,
            updates,
        })
    }

    /// Current cart snapshot.
    #[must_use]
    pub const fn cart(&self) -> &CartState {
        &self.cart
    }

    /// Receiver that always holds the latest committed cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.updates.subscribe()
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.cart.summary()
    }

    /// Add one unit of a product.
    ///
    /// A product already in the cart gains one unit; a new product is fetched
    /// from the catalog and appended with one unit. Either way the resulting
    /// amount must not exceed the product's stock.
    ///
    /// # Errors
    ///
    /// `OutOfStock` when the cart already holds every available unit,
    /// `Transport` when an oracle call fails, `Storage` when persisting fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&mut self, product_id: ProductId) -> Result<(), CartError> {
        const OPERATION: CartOperation = CartOperation::Add;

        let current = self.cart.amount_of(product_id);
        let requested = i64::from(current) + 1;

        let stock = self
            .stock
            .stock(product_id)
            .await
            .map_err(|source| CartError::Transport {
                operation: OPERATION,
                source,
            })?;

        let out_of_stock = || CartError::OutOfStock {
            product_id,
            requested,
            available: stock.amount,
        };
        if !stock.allows(requested) {
            return Err(out_of_stock());
        }

        let mut next = self.cart.clone();
        if current == 0 {
            let mut product = self.catalog.product(product_id).await.map_err(|source| {
                CartError::Transport {
                    operation: OPERATION,
                    source,
                }
            })?;
            if product.id != product_id {
                tracing::warn!(
                    returned_id = %product.id,
                    "Catalog returned a different product id, keeping the requested one"
                );
                product.id = product_id;
            }
            next.insert_new(product);
        } else {
            let amount = u32::try_from(requested)
                .ok()
                .and_then(NonZeroU32::new)
                .ok_or_else(out_of_stock)?;
            next.set_amount(product_id, amount);
        }

        self.commit(OPERATION, next)
    }

    /// Remove a product and all its units.
    ///
    /// # Errors
    ///
    /// `NotFound` when the product is not in the cart, `Storage` when
    /// persisting fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn remove_product(&mut self, product_id: ProductId) -> Result<(), CartError> {
        const OPERATION: CartOperation = CartOperation::Remove;

        let mut next = self.cart.clone();
        if next.remove(product_id).is_none() {
            return Err(CartError::NotFound {
                operation: OPERATION,
                product_id,
            });
        }

        self.commit(OPERATION, next)
    }

    /// Set a product's amount.
    ///
    /// Validation happens before anything changes; a rejected update never
    /// leaves a partial write behind.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` when `amount < 1`, `NotFound` when the product is not
    /// in the cart, `OutOfStock` when `amount` exceeds stock, `Transport`
    /// when the stock oracle fails, `Storage` when persisting fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_product_amount(
        &mut self,
        product_id: ProductId,
        amount: i64,
    ) -> Result<(), CartError> {
        const OPERATION: CartOperation = CartOperation::Update;

        if amount < 1 {
            return Err(CartError::InvalidAmount { product_id, amount });
        }
        if !self.cart.contains(product_id) {
            return Err(CartError::NotFound {
                operation: OPERATION,
                product_id,
            });
        }

        let stock = self
            .stock
            .stock(product_id)
            .await
            .map_err(|source| CartError::Transport {
                operation: OPERATION,
                source,
            })?;
        if !stock.allows(amount) {
            return Err(CartError::OutOfStock {
                product_id,
                requested: amount,
                available: stock.amount,
            });
        }

        // Cart amounts are bounded by u32.
        let new_amount = u32::try_from(amount)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or(CartError::InvalidAmount { product_id, amount })?;

        let mut next = self.cart.clone();
        next.set_amount(product_id, new_amount);

        self.commit(OPERATION, next)
    }

    /// Persist `next`, then make it the current cart and publish it.
    fn commit(&mut self, operation: CartOperation, next: CartState) -> Result<(), CartError> {
        self.persistence
            .save(&next)
            .map_err(|source| CartError::Storage { operation, source })?;

        tracing::debug!(%operation, items = next.len(), "Cart committed");
        self.cart = next;
        self.updates.send_replace(self.cart.clone());
        Ok(())
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("persistence", &self.persistence)
            .finish_non_exhaustive()
    }
}
