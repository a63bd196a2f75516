//! Catalog products, cart line items and stock levels.

use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product as served by the catalog, before it enters a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    /// Catalog product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Product image URL.
    #[serde(alias = "imageUrl")]
    pub image: String,
}

impl CatalogProduct {
    /// Turn this product into a cart line item with a single unit.
    #[must_use]
    pub fn into_line_item(self) -> Product {
        Product {
            id: self.id,
            title: self.title,
            price: self.price,
            image: self.image,
            amount: NonZeroU32::MIN,
        }
    }
}

/// A cart line item: a catalog product plus the quantity selected.
///
/// The amount is never zero; a product with no units is simply not in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Product image URL.
    #[serde(alias = "imageUrl")]
    pub image: String,
    /// Units in the cart.
    pub amount: NonZeroU32,
}

impl Product {
    /// Units in the cart as a plain integer.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.amount.get()
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity())
    }
}

/// Available stock for a product, as reported by the stock oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    /// Product this stock level belongs to.
    #[serde(rename = "id")]
    pub product_id: ProductId,
    /// Units available.
    pub amount: i64,
}

impl Stock {
    /// Create a stock level.
    #[must_use]
    pub const fn new(product_id: ProductId, amount: i64) -> Self {
        Self { product_id, amount }
    }

    /// Whether a cart may hold `requested` units of this product.
    #[must_use]
    pub const fn allows(&self, requested: i64) -> bool {
        requested <= self.amount
    }
}
