//! # Collaborator Ports
//!
//! The storage operations the checkout workflow needs, as async traits.
//!
//! ## Who Implements What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Port              │ verdant-db                │ in-memory (tests/dev) │
//! │  ──────────────────┼───────────────────────────┼────────────────────── │
//! │  UserLookup        │ UserRepository            │ InMemoryStore         │
//! │  ProductLookup     │ ProductRepository         │ InMemoryStore         │
//! │  InventoryMutator  │ ProductRepository         │ InMemoryStore         │
//! │  OrderStore        │ OrderRepository (1 txn)   │ InMemoryStore (lock)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity Contract
//! `OrderStore::place_order` receives the order draft together with every
//! stock decrement. An implementation must apply all of them or none:
//! each decrement is "subtract N if and only if stock >= N", evaluated and
//! applied as one step, and a failing decrement undoes the order insert.
//! A separate read-then-write of stock is never acceptable.

use async_trait::async_trait;
use verdant_core::{Order, OrderDraft, Product, StockDecrement, User};

use crate::error::CheckoutResult;

/// Resolves users by id.
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// `Ok(None)` when the user does not exist.
    async fn find_user(&self, user_id: &str) -> CheckoutResult<Option<User>>;
}

/// Bulk-resolves catalog products.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    /// Returns only the products that exist; missing ids are simply absent.
    async fn find_products(&self, ids: &[String]) -> CheckoutResult<Vec<Product>>;
}

/// Atomic conditional stock decrement.
#[async_trait]
pub trait InventoryMutator: Send + Sync {
    /// Subtracts `quantity` from the product's stock only if the stock is at
    /// least `quantity`, as one indivisible step.
    ///
    /// Fails with `CheckoutError::StockCommitFailed` when the condition does
    /// not hold; stock is left untouched in that case.
    async fn commit_decrement(&self, product_id: &str, quantity: i64) -> CheckoutResult<()>;
}

/// Persists orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Stores the order and applies every decrement as one all-or-nothing
    /// unit. Assigns the id and timestamps.
    async fn place_order(
        &self,
        draft: OrderDraft,
        decrements: &[StockDecrement],
    ) -> CheckoutResult<Order>;
}
