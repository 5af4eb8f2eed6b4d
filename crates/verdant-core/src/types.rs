//! # Domain Types
//!
//! Core domain records used throughout Verdant checkout.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id (UUID)      │   │  product_id     │       │
//! │  │  name, sku      │   │  user_id        │   │  product_name   │       │
//! │  │  price_cents    │   │  items[]        │   │  quantity       │       │
//! │  │  stock, status  │   │  totals, status │   │  unit/total     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     User        │   │  OrderStatus    │   │ PaymentStatus   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, email      │   │  PENDING ...    │   │  PENDING        │       │
//! │  │  is_active      │   │  DELIVERED      │   │  PAID/FAILED    │       │
//! │  └─────────────────┘   │  CANCELLED      │   │  REFUNDED       │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! An [`OrderItem`] copies the product name and price at order time. It is
//! never re-read from the catalog afterward, so later price edits do not
//! change placed orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// User
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Customer,
    Admin,
}

/// A shop account. Credentials live with the auth layer, not here.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Deactivated accounts cannot place orders.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    Plants,
    Tools,
    Pots,
    Fertilizers,
    Seeds,
    Accessories,
}

/// Catalog availability of a product.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    /// Listed and sellable.
    #[default]
    Active,
    /// Hidden from the catalog.
    Inactive,
    /// Listed but flagged as not restocked.
    OutOfStock,
}

/// A product in the catalog.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name, copied into order items at order time.
    pub name: String,

    pub description: String,

    pub category: ProductCategory,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// ISO currency code of `price_cents`.
    pub currency: String,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub status: ProductStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as Money.
    pub fn price(&self) -> CoreResult<Money> {
        Money::from_cents(self.price_cents, &self.currency)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Fulfilment lifecycle of an order.
///
/// ```text
/// PENDING ──► CONFIRMED ──► PROCESSING ──► SHIPPED ──► DELIVERED
///    │            │             │             │
///    └────────────┴─────────────┴─────────────┴──────► CANCELLED
/// ```
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Delivered and cancelled orders never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// One step forward, or cancellation from any non-terminal state.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (from, Cancelled) => !from.is_terminal(),
            (Pending, Confirmed)
            | (Confirmed, Processing)
            | (Processing, Shipped)
            | (Shipped, Delivered) => true,
            _ => false,
        }
    }

    /// Returns `next` if the lifecycle allows it.
    pub fn transition_to(self, next: OrderStatus) -> CoreResult<OrderStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStatusTransition {
                entity: "order",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Payment lifecycle, independent of [`OrderStatus`].
///
/// ```text
/// PENDING ──► PAID ──► REFUNDED
///    │
///    └──────► FAILED
/// ```
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Failed) | (Paid, Refunded)
        )
    }

    pub fn transition_to(self, next: PaymentStatus) -> CoreResult<PaymentStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStatusTransition {
                entity: "payment",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Shipping Address
// =============================================================================

/// Delivery address. Every field except `complement` is required.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    /// `12345-678` or `12345678`.
    pub zip_code: String,
    pub country: String,
}

// =============================================================================
// Order Request
// =============================================================================

/// One `(product, quantity)` pair as requested by the customer.
///
/// `quantity` is signed so that a zero or negative request reaches the
/// pricing rules and is rejected there with `InvalidQuantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl OrderLineRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        OrderLineRequest {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A priced line of an order.
///
/// Invariant: `total_price == unit_price × quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    /// Product name at time of order (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at time of order (frozen).
    pub unit_price: Money,
    pub total_price: Money,
}

// =============================================================================
// Stock Decrement
// =============================================================================

/// A stock reduction to apply atomically with the order insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDecrement {
    pub product_id: String,
    pub quantity: i64,
}

// =============================================================================
// Order
// =============================================================================

/// A validated, fully priced order that has not been stored yet.
///
/// The workflow hands ownership of the draft to the order store, which
/// assigns the id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub total_amount: Money,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
}

/// A stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: ShippingAddress,
    pub tracking_code: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Turns a draft into a new `PENDING` order.
    pub fn from_draft(draft: OrderDraft, id: String, now: DateTime<Utc>) -> Self {
        Order {
            id,
            user_id: draft.user_id,
            items: draft.items,
            subtotal: draft.subtotal,
            shipping_cost: draft.shipping_cost,
            total_amount: draft.total_amount,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_address: draft.shipping_address,
            tracking_code: None,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total number of units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// Generates a new order ID.
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Listing
// =============================================================================

/// Filters for listing stored orders. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub user_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        OrderFilter {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.user_id.as_deref().map_or(true, |u| order.user_id == u)
            && self.status.map_or(true, |s| order.status == s)
            && self.created_from.map_or(true, |t| order.created_at >= t)
            && self.created_to.map_or(true, |t| order.created_at <= t)
    }
}

/// One page of results. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_forward_steps() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));

        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_order_cancellation() {
        for from in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            assert!(from.can_transition_to(OrderStatus::Cancelled), "{from}");
        }
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = OrderStatus::Delivered
            .transition_to(OrderStatus::Pending)
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot move order from DELIVERED to PENDING");
    }

    #[test]
    fn test_payment_status_lifecycle() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Paid));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
        assert!(PaymentStatus::Paid.can_transition_to(PaymentStatus::Refunded));

        assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Paid));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Refunded));
        assert!(PaymentStatus::Refunded
            .transition_to(PaymentStatus::Paid)
            .is_err());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            r#""PROCESSING""#
        );
        assert_eq!(
            serde_json::to_string(&ProductStatus::OutOfStock).unwrap(),
            r#""OUT_OF_STOCK""#
        );
        let status: PaymentStatus = serde_json::from_str(r#""REFUNDED""#).unwrap();
        assert_eq!(status, PaymentStatus::Refunded);
        assert_eq!(OrderStatus::Processing.to_string(), "PROCESSING");
    }

    #[test]
    fn test_shipping_address_uses_camel_case() {
        let json = r#"{
            "street": "Rua das Flores",
            "number": "42",
            "neighborhood": "Jardim",
            "city": "Curitiba",
            "state": "PR",
            "zipCode": "80000-000",
            "country": "BR"
        }"#;
        let address: ShippingAddress = serde_json::from_str(json).unwrap();
        assert_eq!(address.zip_code, "80000-000");
        assert_eq!(address.complement, None);
    }

    #[test]
    fn test_order_filter_matches() {
        let now = Utc::now();
        let order = Order {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            items: vec![],
            subtotal: Money::zero("BRL").unwrap(),
            shipping_cost: Money::zero("BRL").unwrap(),
            total_amount: Money::zero("BRL").unwrap(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_address: ShippingAddress::default(),
            tracking_code: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };

        assert!(OrderFilter::default().matches(&order));
        assert!(OrderFilter::for_user("u1").matches(&order));
        assert!(!OrderFilter::for_user("u2").matches(&order));

        let shipped = OrderFilter {
            status: Some(OrderStatus::Shipped),
            ..Default::default()
        };
        assert!(!shipped.matches(&order));
    }
}
