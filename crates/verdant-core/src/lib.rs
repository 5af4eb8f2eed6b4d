//! # verdant-core: Pure Business Logic for Verdant Checkout
//!
//! This crate is the **heart** of order placement. It contains the money
//! type, the catalog/order records and every pricing and validation rule as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Verdant Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              HTTP layer (out of this workspace)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ PlaceOrderRequest                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 verdant-checkout (workflow)                     │   │
//! │  │   user lookup ─► product lookup ─► price ─► totals ─► place    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ verdant-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   order   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ OrderItem │  │  address  │  │   │
//! │  │   │   Order   │  │ rounding  │  │  totals   │  │  quantity │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    verdant-db (Database Layer)                  │   │
//! │  │        SQLite queries, migrations, atomic order placement       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Currency-aware `Money` stored as integer cents
//! - [`types`] - Domain records (Product, User, Order, ShippingAddress, ...)
//! - [`order`] - Line item builder, order totals, stock decrements
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use verdant_core::money::Money;
//!
//! let price = Money::new(Decimal::new(1999, 2), "brl").unwrap(); // BRL 19.99
//! let line = price.multiply_quantity(3).unwrap();
//!
//! assert_eq!(line.cents(), 5997);
//! assert_eq!(line.to_string(), "BRL 59.97");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod order;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{price_order_lines, stock_decrements, OrderTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency used when no currency is configured.
pub const DEFAULT_CURRENCY: &str = "BRL";

/// Flat shipping charge applied to every order, in cents (10.00).
///
/// ## Business Reason
/// Shipping is not yet computed from weight or destination. The checkout
/// configuration can override it per deployment.
pub const DEFAULT_SHIPPING_COST_CENTS: i64 = 1000;
