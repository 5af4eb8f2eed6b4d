//! # Order Pricing
//!
//! Turns requested `(product, quantity)` pairs into priced order items and
//! computes the order totals.
//!
//! ## Pricing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For each requested line, in input order (first failure wins):         │
//! │                                                                         │
//! │   1. product exists?           ── no ──► ProductNotFound               │
//! │   2. product.status == ACTIVE? ── no ──► ProductUnavailable            │
//! │   3. quantity > 0?             ── no ──► InvalidQuantity               │
//! │   4. stock >= quantity?        ── no ──► InsufficientStock             │
//! │            │                                                            │
//! │            ▼                                                            │
//! │   OrderItem { unit_price = price, total_price = price × quantity }     │
//! │                                                                         │
//! │  Then:  subtotal = Σ total_price          (left to right)              │
//! │         total    = subtotal + shipping                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock check here is advisory: it reads a catalog snapshot. The
//! authoritative check is the conditional decrement done by the order store.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{OrderItem, OrderLineRequest, Product, StockDecrement};
use crate::validation::validate_quantity;

// =============================================================================
// Order Item Builder
// =============================================================================

/// Prices one requested line against its catalog snapshot.
///
/// `already_requested` is the quantity of the same product requested by
/// earlier lines of the same order; the stock check covers the sum so that
/// splitting a request across lines cannot bypass it.
///
/// ## Example
/// ```rust,ignore
/// let item = build_order_item("P1", 2, Some(&fern), 0)?;
/// assert_eq!(item.total_price.cents(), 2 * fern.price_cents);
/// ```
pub fn build_order_item(
    product_id: &str,
    quantity: i64,
    product: Option<&Product>,
    already_requested: i64,
) -> CoreResult<OrderItem> {
    let product = product.ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

    if !product.is_active() {
        return Err(CoreError::ProductUnavailable {
            product_id: product.id.clone(),
            name: product.name.clone(),
            status: product.status,
        });
    }

    if validate_quantity(quantity).is_err() {
        return Err(CoreError::InvalidQuantity {
            product_id: product.id.clone(),
            quantity,
        });
    }

    // saturates past i64::MAX, which no stock level can cover
    let requested = already_requested.saturating_add(quantity);
    if product.stock < requested {
        return Err(CoreError::InsufficientStock {
            product_id: product.id.clone(),
            available: product.stock,
            requested,
        });
    }

    let unit_price = product.price()?;
    let total_price = unit_price.multiply_quantity(quantity)?;

    Ok(OrderItem {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        quantity,
        unit_price,
        total_price,
    })
}

/// Prices every requested line, in input order.
///
/// Lines naming the same product are priced from the same catalog snapshot.
/// With `merge_duplicates` they are folded into the first occurrence;
/// otherwise each stays its own line.
pub fn price_order_lines(
    requests: &[OrderLineRequest],
    catalog: &HashMap<String, Product>,
    merge_duplicates: bool,
) -> CoreResult<Vec<OrderItem>> {
    let mut requested_so_far: HashMap<&str, i64> = HashMap::new();
    let mut items: Vec<OrderItem> = Vec::with_capacity(requests.len());

    for request in requests {
        let already = requested_so_far
            .get(request.product_id.as_str())
            .copied()
            .unwrap_or(0);

        let item = build_order_item(
            &request.product_id,
            request.quantity,
            catalog.get(&request.product_id),
            already,
        )?;

        requested_so_far.insert(
            request.product_id.as_str(),
            already.saturating_add(item.quantity),
        );
        items.push(item);
    }

    if merge_duplicates {
        items = merge_lines(items)?;
    }

    Ok(items)
}

fn merge_lines(items: Vec<OrderItem>) -> CoreResult<Vec<OrderItem>> {
    let mut merged: Vec<OrderItem> = Vec::with_capacity(items.len());
    let mut position: HashMap<String, usize> = HashMap::new();

    for item in items {
        match position.get(&item.product_id).copied() {
            Some(idx) => {
                let line = &mut merged[idx];
                line.quantity += item.quantity;
                line.total_price = line.unit_price.multiply_quantity(line.quantity)?;
            }
            None => {
                position.insert(item.product_id.clone(), merged.len());
                merged.push(item);
            }
        }
    }

    Ok(merged)
}

// =============================================================================
// Totals
// =============================================================================

/// Subtotal, shipping and grand total of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub total_amount: Money,
}

impl OrderTotals {
    /// Sums the line totals left to right and adds shipping.
    ///
    /// The subtotal starts at zero in the shipping currency, so a line priced
    /// in another currency fails with `CurrencyMismatch`.
    pub fn compute(items: &[OrderItem], shipping_cost: Money) -> CoreResult<Self> {
        let subtotal = items
            .iter()
            .try_fold(Money::zero(shipping_cost.currency())?, |acc, item| {
                acc.add(&item.total_price)
            })?;
        let total_amount = subtotal.add(&shipping_cost)?;

        Ok(OrderTotals {
            subtotal,
            shipping_cost,
            total_amount,
        })
    }
}

// =============================================================================
// Stock Decrements
// =============================================================================

/// One decrement per distinct product, summing duplicate lines, in order of
/// first appearance.
pub fn stock_decrements(items: &[OrderItem]) -> Vec<StockDecrement> {
    let mut decrements: Vec<StockDecrement> = Vec::new();

    for item in items {
        match decrements.iter_mut().find(|d| d.product_id == item.product_id) {
            Some(existing) => existing.quantity += item.quantity,
            None => decrements.push(StockDecrement {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            }),
        }
    }

    decrements
}

// =============================================================================
// Unit Tests
// =============================================================================
