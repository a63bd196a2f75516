//! HTTP route handlers for storefront UI bindings.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check (registered in main)
//!
//! # Cart (JSON)
//! GET  /cart                   - Cart contents and summary
//! GET  /cart/count             - Header badge (distinct products + label)
//! GET  /cart/items/{id}        - Single line item (404 when absent)
//! POST /cart/add               - Add one unit       { product_id }
//! POST /cart/update            - Set amount         { product_id, amount }
//! POST /cart/remove            - Remove line item   { product_id }
//! ```
//!
//! Mutations always answer `200 OK`; a rejected operation carries
//! `applied: false` and the shopper-facing `notice`.

pub mod cart;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/items/{product_id}", get(cart::item))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/cart", cart_routes())
}
