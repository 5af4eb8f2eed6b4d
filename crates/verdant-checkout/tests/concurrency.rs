//! Concurrent placements against the in-memory store.

use std::sync::Arc;

use chrono::Utc;
use verdant_checkout::{
    CheckoutConfig, CheckoutService, ErrorKind, InMemoryStore, InventoryMutator,
    PlaceOrderRequest,
};
use verdant_core::{
    OrderLineRequest, Product, ProductCategory, ProductStatus, ShippingAddress, User, UserRole,
};

fn user(id: &str) -> User {
    let now = Utc::now();
    User {
        id: id.to_string(),
        name: format!("Customer {id}"),
        email: format!("{id}@verdant.test"),
        role: UserRole::Customer,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn bonsai(stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: "BONSAI".to_string(),
        sku: "PLT-BONSAI".to_string(),
        name: "Juniper Bonsai".to_string(),
        description: "Ten year old juniper".to_string(),
        category: ProductCategory::Plants,
        price_cents: 24990,
        currency: "BRL".to_string(),
        stock,
        status: ProductStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

fn request(user_id: &str, quantity: i64) -> PlaceOrderRequest {
    PlaceOrderRequest {
        user_id: user_id.to_string(),
        items: vec![OrderLineRequest::new("BONSAI", quantity)],
        shipping_address: ShippingAddress {
            street: "Av. Paulista".to_string(),
            number: "1000".to_string(),
            complement: Some("apto 12".to_string()),
            neighborhood: "Bela Vista".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            zip_code: "01310-100".to_string(),
            country: "Brasil".to_string(),
        },
        notes: None,
    }
}

async fn setup(stock: i64, customers: usize) -> (Arc<InMemoryStore>, CheckoutService) {
    let store = Arc::new(InMemoryStore::new());
    store.add_product(bonsai(stock)).await;
    for i in 0..customers {
        store.add_user(user(&format!("U{i}"))).await;
    }
    let service = CheckoutService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        CheckoutConfig::default(),
    );
    (store, service)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_unit_sells_exactly_once() {
    let (store, service) = setup(1, 2).await;

    let a = tokio::spawn({
        let service = service.clone();
        async move { service.place_order(request("U0", 1)).await }
    });
    let b = tokio::spawn({
        let service = service.clone();
        async move { service.place_order(request("U1", 1)).await }
    });

    let results = vec![a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let failures: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();

    assert_eq!(successes, 1);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind(), ErrorKind::InsufficientStock);
    assert_eq!(store.stock_of("BONSAI").await, Some(0));
    assert_eq!(store.order_writes().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stock_never_goes_negative_under_load() {
    let (store, service) = setup(7, 20).await;

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move { service.place_order(request(&format!("U{i}"), 2)).await })
        })
        .collect();

    let mut sold = 0;
    for handle in handles {
        if let Ok(order) = handle.await.unwrap() {
            sold += order.unit_count();
        }
    }

    assert_eq!(sold, 6);
    assert_eq!(store.stock_of("BONSAI").await, Some(1));
    assert_eq!(store.orders().await.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_direct_decrements_race_safely() {
    let store = Arc::new(InMemoryStore::new());
    store.add_product(bonsai(5)).await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.commit_decrement("BONSAI", 1).await })
        })
        .collect();

    let mut committed = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            committed += 1;
        }
    }

    assert_eq!(committed, 5);
    assert_eq!(store.stock_of("BONSAI").await, Some(0));
}
