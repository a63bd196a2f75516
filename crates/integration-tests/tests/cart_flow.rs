//! Integration tests for the cart store over a real blob file.
//!
//! Each test wires a [`CartHandle`] to the mock API and a `FileBlobStore`
//! in a temporary directory, the same way the storefront does at startup.

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use axum::http::StatusCode;
use rocketshoes_core::{CartState, ProductId};
use rocketshoes_integration_tests::MockApi;
use rocketshoes_storefront::api::ApiClient;
use rocketshoes_storefront::cart::{
    ADD_FAILED_MESSAGE, CartHandle, CartStore, OUT_OF_STOCK_MESSAGE, REMOVE_FAILED_MESSAGE,
    UPDATE_FAILED_MESSAGE,
};
use rocketshoes_storefront::notify::CollectingNotifier;
use rocketshoes_storefront::storage::{CartPersistence, FileBlobStore};
use tempfile::TempDir;

fn open_cart(api: &MockApi, path: &Path) -> (CartHandle, CollectingNotifier) {
    let client = Arc::new(ApiClient::new(&api.config()).unwrap());
    let blobs = Arc::new(FileBlobStore::open(path).unwrap());
    let store = CartStore::open(CartPersistence::new(blobs, "cart"), client.clone(), client)
        .unwrap();
    let notifier = CollectingNotifier::new();
    (CartHandle::new(store, Arc::new(notifier.clone())), notifier)
}

fn stored_cart(path: &Path) -> CartState {
    let raw = std::fs::read_to_string(path).unwrap();
    let entries: serde_json::Value = serde_json::from_str(&raw).unwrap();
    serde_json::from_str(entries["cart"].as_str().unwrap()).unwrap()
}

fn amounts(cart: &CartHandle) -> Vec<(i32, u32)> {
    cart.cart()
        .items()
        .iter()
        .map(|item| (item.id.as_i32(), item.quantity()))
        .collect()
}

// =============================================================================
// Adding
// =============================================================================

#[tokio::test]
async fn test_add_new_product_uses_catalog_metadata() {
    let api = MockApi::start().await.with_product(5, "Shoe", 13990, 10);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cart.json");
    let (mut cart, notifier) = open_cart(&api, &path);

    let outcome = cart.add_product(ProductId::new(5)).await;

    assert!(outcome.applied);
    let item = cart.cart().get(ProductId::new(5)).unwrap();
    assert_eq!(item.title, "Shoe");
    assert_eq!(item.image, "https://cdn.example.com/5.jpg");
    assert_eq!(item.quantity(), 1);
    assert!(notifier.messages().is_empty());
    assert_eq!(&stored_cart(&path), cart.cart());
}

#[tokio::test]
async fn test_add_existing_product_skips_catalog() {
    let api = MockApi::start().await.with_product(1, "Tenis", 17990, 5);
    let dir = TempDir::new().unwrap();
    let (mut cart, _) = open_cart(&api, &dir.path().join("cart.json"));

    cart.add_product(ProductId::new(1)).await;
    cart.add_product(ProductId::new(1)).await;
    cart.add_product(ProductId::new(1)).await;

    assert_eq!(amounts(&cart), vec![(1, 3)]);
    assert_eq!(api.catalog_hits(), 1);
    assert_eq!(api.stock_hits(), 3);
}

#[tokio::test]
async fn test_add_beyond_stock_is_rejected() {
    let api = MockApi::start().await.with_product(1, "Tenis", 17990, 2);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cart.json");
    let (mut cart, notifier) = open_cart(&api, &path);
    cart.add_product(ProductId::new(1)).await;
    cart.add_product(ProductId::new(1)).await;

    let outcome = cart.add_product(ProductId::new(1)).await;

    assert!(!outcome.applied);
    assert_eq!(outcome.notice, Some(OUT_OF_STOCK_MESSAGE));
    assert_eq!(amounts(&cart), vec![(1, 2)]);
    assert_eq!(notifier.messages(), vec![OUT_OF_STOCK_MESSAGE.to_string()]);
    assert_eq!(&stored_cart(&path), cart.cart());
}

#[tokio::test]
async fn test_add_unknown_product_reports_add_failure() {
    let api = MockApi::start().await;
    api.set_stock(9, 4);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cart.json");
    let (mut cart, notifier) = open_cart(&api, &path);

    let outcome = cart.add_product(ProductId::new(9)).await;

    assert!(!outcome.applied);
    assert_eq!(notifier.messages(), vec![ADD_FAILED_MESSAGE.to_string()]);
    assert!(cart.cart().is_empty());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_add_while_api_is_down_reports_add_failure() {
    let api = MockApi::start().await.with_product(1, "Tenis", 17990, 2);
    api.set_failing(Some(StatusCode::BAD_GATEWAY));
    let dir = TempDir::new().unwrap();
    let (mut cart, notifier) = open_cart(&api, &dir.path().join("cart.json"));

    let outcome = cart.add_product(ProductId::new(1)).await;

    assert_eq!(outcome.notice, Some(ADD_FAILED_MESSAGE));
    assert_eq!(notifier.take(), vec![ADD_FAILED_MESSAGE.to_string()]);

    api.set_failing(None);
    assert!(cart.add_product(ProductId::new(1)).await.applied);
    assert!(notifier.messages().is_empty());
}

// =============================================================================
// Updating and removing
// =============================================================================

#[tokio::test]
async fn test_update_within_and_beyond_stock() {
    let api = MockApi::start().await.with_product(1, "Tenis", 17990, 4);
    let dir = TempDir::new().unwrap();
    let (mut cart, notifier) = open_cart(&api, &dir.path().join("cart.json"));
    cart.add_product(ProductId::new(1)).await;

    assert!(cart.update_product_amount(ProductId::new(1), 4).await.applied);
    assert_eq!(amounts(&cart), vec![(1, 4)]);

    let outcome = cart.update_product_amount(ProductId::new(1), 5).await;
    assert_eq!(outcome.notice, Some(OUT_OF_STOCK_MESSAGE));
    assert_eq!(amounts(&cart), vec![(1, 4)]);

    let outcome = cart.update_product_amount(ProductId::new(1), 0).await;
    assert_eq!(outcome.notice, Some(UPDATE_FAILED_MESSAGE));

    let outcome = cart.update_product_amount(ProductId::new(2), 1).await;
    assert_eq!(outcome.notice, Some(UPDATE_FAILED_MESSAGE));

    assert_eq!(
        notifier.messages(),
        vec![
            OUT_OF_STOCK_MESSAGE.to_string(),
            UPDATE_FAILED_MESSAGE.to_string(),
            UPDATE_FAILED_MESSAGE.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_update_while_api_is_down_reports_update_failure() {
    let api = MockApi::start().await.with_product(1, "Tenis", 17990, 4);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cart.json");
    let (mut cart, notifier) = open_cart(&api, &path);
    cart.add_product(ProductId::new(1)).await;
    cart.update_product_amount(ProductId::new(1), 2).await;
    api.set_failing(Some(StatusCode::SERVICE_UNAVAILABLE));

    let outcome = cart.update_product_amount(ProductId::new(1), 3).await;

    assert!(!outcome.applied);
    assert_eq!(outcome.notice, Some(UPDATE_FAILED_MESSAGE));
    assert_eq!(notifier.messages(), vec![UPDATE_FAILED_MESSAGE.to_string()]);
    assert_eq!(amounts(&cart), vec![(1, 2)]);
    assert_eq!(stored_cart(&path).amount_of(ProductId::new(1)), 2);
}

#[tokio::test]
async fn test_invalid_amount_never_reaches_the_api() {
    let api = MockApi::start().await.with_product(1, "Tenis", 17990, 4);
    let dir = TempDir::new().unwrap();
    let (mut cart, _) = open_cart(&api, &dir.path().join("cart.json"));
    cart.add_product(ProductId::new(1)).await;
    let hits = api.stock_hits();

    cart.update_product_amount(ProductId::new(1), -3).await;

    assert_eq!(api.stock_hits(), hits);
}

#[tokio::test]
async fn test_remove_present_and_absent() {
    let api = MockApi::start()
        .await
        .with_product(1, "Tenis", 17990, 4)
        .with_product(2, "Bota", 25990, 4);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cart.json");
    let (mut cart, notifier) = open_cart(&api, &path);
    cart.add_product(ProductId::new(1)).await;
    cart.add_product(ProductId::new(2)).await;

    assert!(cart.remove_product(ProductId::new(1)).applied);
    assert_eq!(amounts(&cart), vec![(2, 1)]);
    assert_eq!(&stored_cart(&path), cart.cart());

    let outcome = cart.remove_product(ProductId::new(1));
    assert_eq!(outcome.notice, Some(REMOVE_FAILED_MESSAGE));
    assert_eq!(notifier.messages(), vec![REMOVE_FAILED_MESSAGE.to_string()]);
}

// =============================================================================
// Persistence and subscriptions
// =============================================================================

#[tokio::test]
async fn test_cart_survives_restart() {
    let api = MockApi::start()
        .await
        .with_product(1, "Tenis", 17990, 4)
        .with_product(2, "Bota", 25990, 4);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("cart.json");

    {
        let (mut cart, _) = open_cart(&api, &path);
        cart.add_product(ProductId::new(2)).await;
        cart.add_product(ProductId::new(1)).await;
        cart.update_product_amount(ProductId::new(1), 3).await;
    }

    let (cart, _) = open_cart(&api, &path);
    assert_eq!(amounts(&cart), vec![(2, 1), (1, 3)]);
    assert_eq!(cart.summary().label, "2 itens");
    assert_eq!(cart.summary().total_units, 4);
}

#[tokio::test]
async fn test_corrupt_blob_file_starts_empty() {
    let api = MockApi::start().await.with_product(1, "Tenis", 17990, 4);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cart.json");
    std::fs::write(&path, "{ not json").unwrap();

    let (mut cart, _) = open_cart(&api, &path);
    assert!(cart.cart().is_empty());

    assert!(cart.add_product(ProductId::new(1)).await.applied);
    assert_eq!(stored_cart(&path).len(), 1);
}

#[tokio::test]
async fn test_subscribers_see_only_committed_carts() {
    let api = MockApi::start().await.with_product(1, "Tenis", 17990, 1);
    let dir = TempDir::new().unwrap();
    let (mut cart, _) = open_cart(&api, &dir.path().join("cart.json"));
    let mut updates = cart.subscribe();

    cart.add_product(ProductId::new(1)).await;
    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().len(), 1);

    cart.add_product(ProductId::new(1)).await;
    assert!(!updates.has_changed().unwrap());
}
