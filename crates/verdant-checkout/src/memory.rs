//! # In-Memory Collaborators
//!
//! A process-local implementation of every checkout port, for tests and
//! local development.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InMemoryStore { state: Mutex<State> }                                  │
//! │                                                                         │
//! │  place_order(draft, decrements)                                         │
//! │     lock ──► check every decrement ──► apply all ──► insert order      │
//! │       │              │                                                  │
//! │       │              └─ any stock < qty ──► StockCommitFailed (no write)│
//! │       └─ held for the whole unit, so concurrent placements serialize   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;
use verdant_core::validation::validate_quantity;
use verdant_core::{generate_order_id, CoreError, Order, OrderDraft, Product, StockDecrement, User};

use crate::error::{CheckoutError, CheckoutResult};
use crate::ports::{InventoryMutator, OrderStore, ProductLookup, UserLookup};

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, User>,
    products: HashMap<String, Product>,
    orders: Vec<Order>,
    order_writes: usize,
    stock_mutations: usize,
    unavailable: bool,
}

impl State {
    fn check_available(&self) -> CheckoutResult<()> {
        if self.unavailable {
            return Err(CheckoutError::PersistenceFailed(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    /// Why `decrement` cannot be applied, if it can't.
    fn refuse(&self, decrement: &StockDecrement) -> Option<CheckoutError> {
        if validate_quantity(decrement.quantity).is_err() {
            return Some(CheckoutError::Rejected(CoreError::InvalidQuantity {
                product_id: decrement.product_id.clone(),
                quantity: decrement.quantity,
            }));
        }

        let available = self
            .products
            .get(&decrement.product_id)
            .map(|p| p.stock)
            .unwrap_or(0);

        (available < decrement.quantity).then(|| CheckoutError::StockCommitFailed {
            product_id: decrement.product_id.clone(),
            available,
            requested: decrement.quantity,
        })
    }

    fn apply(&mut self, decrement: &StockDecrement) {
        if let Some(product) = self.products.get_mut(&decrement.product_id) {
            product.stock -= decrement.quantity;
            product.updated_at = Utc::now();
            self.stock_mutations += 1;
        }
    }
}

/// Shared in-memory users, catalog and orders.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: User) {
        self.state.lock().await.users.insert(user.id.clone(), user);
    }

    pub async fn add_product(&self, product: Product) {
        self.state
            .lock()
            .await
            .products
            .insert(product.id.clone(), product);
    }

    /// Current stock of a product, `None` if unknown.
    pub async fn stock_of(&self, product_id: &str) -> Option<i64> {
        self.state
            .lock()
            .await
            .products
            .get(product_id)
            .map(|p| p.stock)
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.state.lock().await.orders.clone()
    }

    /// Number of successful order store writes.
    pub async fn order_writes(&self) -> usize {
        self.state.lock().await.order_writes
    }

    /// Number of stock decrements applied.
    pub async fn stock_mutations(&self) -> usize {
        self.state.lock().await.stock_mutations
    }

    /// Makes every subsequent write fail with `PersistenceFailed`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }
}

#[async_trait]
impl UserLookup for InMemoryStore {
    async fn find_user(&self, user_id: &str) -> CheckoutResult<Option<User>> {
        Ok(self.state.lock().await.users.get(user_id).cloned())
    }
}

#[async_trait]
impl ProductLookup for InMemoryStore {
    async fn find_products(&self, ids: &[String]) -> CheckoutResult<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl InventoryMutator for InMemoryStore {
    async fn commit_decrement(&self, product_id: &str, quantity: i64) -> CheckoutResult<()> {
        let mut state = self.state.lock().await;
        state.check_available()?;

        let decrement = StockDecrement {
            product_id: product_id.to_string(),
            quantity,
        };
        if let Some(err) = state.refuse(&decrement) {
            return Err(err);
        }
        state.apply(&decrement);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn place_order(
        &self,
        draft: OrderDraft,
        decrements: &[StockDecrement],
    ) -> CheckoutResult<Order> {
        let mut state = self.state.lock().await;
        state.check_available()?;

        if let Some(err) = decrements.iter().find_map(|d| state.refuse(d)) {
            return Err(err);
        }
        for decrement in decrements {
            state.apply(decrement);
        }

        let order = Order::from_draft(draft, generate_order_id(), Utc::now());
        state.orders.push(order.clone());
        state.order_writes += 1;

        debug!(order_id = %order.id, decrements = decrements.len(), "Stored order in memory");
        Ok(order)
    }
}
