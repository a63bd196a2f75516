//! Cart route handlers.
//!
//! Each mutation locks the shared cart handle for its whole duration, so
//! concurrent requests are applied one after another.

use axum::{
    Json,
    extract::{Path, State},
};
use rocketshoes_core::{CartSummary, Product, ProductId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cart::{CartHandle, OperationOutcome};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Cart contents as returned to UI bindings.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<Product>,
    pub summary: CartSummary,
}

impl From<&CartHandle> for CartView {
    fn from(handle: &CartHandle) -> Self {
        Self {
            items: handle.cart().items().to_vec(),
            summary: handle.summary(),
        }
    }
}

/// Response to a cart mutation.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    #[serde(flatten)]
    pub outcome: OperationOutcome,
    #[serde(flatten)]
    pub cart: CartView,
}

/// Header badge data.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
    pub label: String,
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
}

/// Update amount request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub amount: i64,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

fn respond(handle: &CartHandle, outcome: OperationOutcome) -> Json<MutationResponse> {
    Json(MutationResponse {
        outcome,
        cart: CartView::from(handle),
    })
}

/// Display cart contents.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<CartView> {
    let cart = state.cart().lock().await;
    Json(CartView::from(&*cart))
}

/// Get the header badge.
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> Json<CountResponse> {
    let summary = state.cart().lock().await.summary();
    Json(CountResponse {
        count: summary.distinct_items,
        label: summary.label,
    })
}

/// Get a single line item.
#[instrument(skip(state))]
pub async fn item(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Product>> {
    let cart = state.cart().lock().await;
    cart.cart()
        .get(product_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {product_id} is not in the cart")))
}

/// Add one unit of a product.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Json<MutationResponse> {
    let product_id = request.product_id.to_string();
    add_breadcrumb("cart", "Add product", Some(&[("product_id", product_id.as_str())]));

    let mut cart = state.cart().lock().await;
    let outcome = cart.add_product(request.product_id).await;
    respond(&cart, outcome)
}

/// Set a product's amount.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<UpdateCartRequest>,
) -> Json<MutationResponse> {
    let product_id = request.product_id.to_string();
    let amount = request.amount.to_string();
    add_breadcrumb(
        "cart",
        "Update product amount",
        Some(&[("product_id", product_id.as_str()), ("amount", amount.as_str())]),
    );

    let mut cart = state.cart().lock().await;
    let outcome = cart
        .update_product_amount(request.product_id, request.amount)
        .await;
    respond(&cart, outcome)
}

/// Remove a product from the cart.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Json(request): Json<RemoveFromCartRequest>,
) -> Json<MutationResponse> {
    let product_id = request.product_id.to_string();
    add_breadcrumb("cart", "Remove product", Some(&[("product_id", product_id.as_str())]));

    let mut cart = state.cart().lock().await;
    let outcome = cart.remove_product(request.product_id);
    respond(&cart, outcome)
}
