//! The shopper's cart and its derived summary.
//!
//! [`CartState`] is an ordered list of line items, unique by product id.
//! Every constructor and mutator keeps that invariant, including
//! deserialization, so a persisted cart that was tampered with is rejected
//! instead of silently loaded.

use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CatalogProduct, Price, Product, ProductId};

/// Errors raised when a list of line items violates cart invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CartStateError {
    /// Two line items share the same product id.
    #[error("duplicate product in cart: {0}")]
    DuplicateProduct(ProductId),
}

/// Ordered cart contents, unique by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Product>", into = "Vec<Product>")]
pub struct CartState {
    items: Vec<Product>,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find the line item for a product.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&Product> {
        self.items.iter().find(|item| item.id == product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    /// Units of a product in the cart, `0` when absent.
    #[must_use]
    pub fn amount_of(&self, product_id: ProductId) -> u32 {
        self.get(product_id).map_or(0, Product::quantity)
    }

    /// Append a catalog product with a single unit.
    ///
    /// Returns `false` and leaves the cart untouched if the product is
    /// already present.
    pub fn insert_new(&mut self, product: CatalogProduct) -> bool {
        if self.contains(product.id) {
            return false;
        }
        self.items.push(product.into_line_item());
        true
    }

    /// Set the amount of an existing line item.
    ///
    /// Returns `false` if the product is not in the cart.
    pub fn set_amount(&mut self, product_id: ProductId, amount: NonZeroU32) -> bool {
        match self.items.iter_mut().find(|item| item.id == product_id) {
            Some(item) => {
                item.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Remove a line item, returning it if it was present.
    pub fn remove(&mut self, product_id: ProductId) -> Option<Product> {
        let index = self.items.iter().position(|item| item.id == product_id)?;
        Some(self.items.remove(index))
    }

    /// Summarize the cart for headers and totals.
    ///
    /// The subtotal saturates at the largest representable price.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        let distinct_items = self.items.len();
        CartSummary {
            distinct_items,
            total_units: self.items.iter().map(|item| u64::from(item.quantity())).sum(),
            subtotal: self.items.iter().map(Product::line_total).sum(),
            label: cart_size_label(distinct_items),
        }
    }
}

impl TryFrom<Vec<Product>> for CartState {
    type Error = CartStateError;

    fn try_from(items: Vec<Product>) -> Result<Self, Self::Error> {
        for (i, item) in items.iter().enumerate() {
            if items.iter().skip(i + 1).any(|other| other.id == item.id) {
                return Err(CartStateError::DuplicateProduct(item.id));
            }
        }
        Ok(Self { items })
    }
}

impl From<CartState> for Vec<Product> {
    fn from(cart: CartState) -> Self {
        cart.items
    }
}

/// Derived view of a cart, as shown in the storefront header and cart page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    /// Number of distinct products.
    pub distinct_items: usize,
    /// Sum of all line item amounts.
    pub total_units: u64,
    /// Sum of all line totals.
    pub subtotal: Price,
    /// Header badge text ("1 item", "3 itens").
    pub label: String,
}

/// Header badge text for a number of distinct products.
#[must_use]
pub fn cart_size_label(distinct_items: usize) -> String {
    if distinct_items == 1 {
        "1 item".to_string()
    } else {
        format!("{distinct_items} itens")
    }
}
