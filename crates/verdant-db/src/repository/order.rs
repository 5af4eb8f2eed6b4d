//! # Order Repository
//!
//! Orders and order items. Implements the checkout `OrderStore` port.
//!
//! ## Placement Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT INTO orders ...                                               │
//! │    INSERT INTO order_items ...          (one row per line)              │
//! │    UPDATE products SET stock = stock - n                                │
//! │      WHERE id = ? AND stock >= n        (one per distinct product)      │
//! │        └─ 0 rows ─► ROLLBACK ─► StockConflict                          │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first statement is a write, so the transaction takes SQLite's write
//! lock up front and concurrent placements queue behind it.
//!
//! ## Status Updates
//! Compare-and-set on the current status: the `UPDATE` only matches if the
//! row still has the status the transition was validated against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};
use verdant_checkout::{CheckoutResult, OrderStore};
use verdant_core::validation::validate_required;
use verdant_core::{
    generate_order_id, CoreError, Money, Order, OrderDraft, OrderFilter, OrderItem, OrderStatus,
    Page, PaymentStatus, ShippingAddress, StockDecrement,
};

use crate::error::{DbError, DbResult};
use crate::repository::product::conditional_decrement;

/// Largest page `list_orders` will return.
pub const MAX_PAGE_SIZE: u32 = 100;

const ORDER_COLUMNS: &str = r#"
    id, user_id, currency, subtotal_cents, shipping_cost_cents, total_cents,
    status, payment_status,
    shipping_street, shipping_number, shipping_complement, shipping_neighborhood,
    shipping_city, shipping_state, shipping_zip_code, shipping_country,
    tracking_code, notes, created_at, updated_at
"#;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    currency: String,
    subtotal_cents: i64,
    shipping_cost_cents: i64,
    total_cents: i64,
    status: OrderStatus,
    payment_status: PaymentStatus,
    shipping_street: String,
    shipping_number: String,
    shipping_complement: Option<String>,
    shipping_neighborhood: String,
    shipping_city: String,
    shipping_state: String,
    shipping_zip_code: String,
    shipping_country: String,
    tracking_code: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    product_id: String,
    product_name: String,
    quantity: i64,
    unit_price_cents: i64,
    total_price_cents: i64,
    currency: String,
}

impl OrderItemRow {
    fn into_item(self) -> DbResult<OrderItem> {
        Ok(OrderItem {
            unit_price: stored_money(self.unit_price_cents, &self.currency)?,
            total_price: stored_money(self.total_price_cents, &self.currency)?,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
        })
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> DbResult<Order> {
        Ok(Order {
            subtotal: stored_money(self.subtotal_cents, &self.currency)?,
            shipping_cost: stored_money(self.shipping_cost_cents, &self.currency)?,
            total_amount: stored_money(self.total_cents, &self.currency)?,
            id: self.id,
            user_id: self.user_id,
            items,
            status: self.status,
            payment_status: self.payment_status,
            shipping_address: ShippingAddress {
                street: self.shipping_street,
                number: self.shipping_number,
                complement: self.shipping_complement,
                neighborhood: self.shipping_neighborhood,
                city: self.shipping_city,
                state: self.shipping_state,
                zip_code: self.shipping_zip_code,
                country: self.shipping_country,
            },
            tracking_code: self.tracking_code,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn stored_money(cents: i64, currency: &str) -> DbResult<Money> {
    Money::from_cents(cents, currency)
        .map_err(|e| DbError::Internal(format!("corrupt amount in orders table: {e}")))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Stores the order and applies every stock decrement in one transaction.
    ///
    /// Any failure rolls the whole unit back: no order row, no item rows,
    /// no stock change.
    pub async fn create(
        &self,
        draft: OrderDraft,
        decrements: &[StockDecrement],
    ) -> DbResult<Order> {
        let order = Order::from_draft(draft, generate_order_id(), Utc::now());
        let currency = order.total_amount.currency().to_string();

        debug!(
            id = %order.id,
            user_id = %order.user_id,
            lines = order.items.len(),
            decrements = decrements.len(),
            "Placing order"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let address = &order.shipping_address;
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, currency, subtotal_cents, shipping_cost_cents, total_cents,
                status, payment_status,
                shipping_street, shipping_number, shipping_complement, shipping_neighborhood,
                shipping_city, shipping_state, shipping_zip_code, shipping_country,
                tracking_code, notes, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(&currency)
        .bind(order.subtotal.cents())
        .bind(order.shipping_cost.cents())
        .bind(order.total_amount.cents())
        .bind(order.status)
        .bind(order.payment_status)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.complement)
        .bind(&address.neighborhood)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(&address.country)
        .bind(&order.tracking_code)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (line_no, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, line_no, product_id, product_name, quantity,
                    unit_price_cents, total_price_cents, currency
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&order.id)
            .bind(line_no as i64)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price.cents())
            .bind(item.total_price.cents())
            .bind(item.total_price.currency())
            .execute(&mut *tx)
            .await?;
        }

        for decrement in decrements {
            let committed = conditional_decrement(
                &mut *tx,
                &decrement.product_id,
                decrement.quantity,
                order.created_at,
            )
            .await;

            if let Err(err) = committed {
                tx.rollback()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                warn!(id = %order.id, error = %err, "Order placement rolled back");
                return Err(err);
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %order.id, total = %order.total_amount, "Order stored");
        Ok(order)
    }

    /// Gets an order with its items.
    pub async fn get_order(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let items = self.load_items(&row.id).await?;
                Ok(Some(row.into_order(items)?))
            }
            None => Ok(None),
        }
    }

    /// Lists orders matching `filter`, newest first. `page` is 1-based;
    /// `limit` is clamped to `1..=MAX_PAGE_SIZE`.
    pub async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: u32,
        limit: u32,
    ) -> DbResult<Page<Order>> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = i64::from(page - 1) * i64::from(limit);

        let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM orders");
        push_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb.build_query_as::<OrderRow>().fetch_all(&self.pool).await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = self.load_items(&row.id).await?;
            items.push(row.into_order(lines)?);
        }

        debug!(total, page, limit, returned = items.len(), "Listed orders");

        Ok(Page {
            items,
            total,
            page,
            limit,
        })
    }

    /// Moves an order along its fulfilment lifecycle.
    pub async fn update_status(&self, id: &str, next: OrderStatus) -> DbResult<Order> {
        let current = self.require(id).await?;
        current.status.transition_to(next)?;

        debug!(id = %id, from = %current.status, to = %next, "Updating order status");

        let result = sqlx::query(
            "UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(id)
        .bind(next)
        .bind(Utc::now())
        .bind(current.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::TransactionFailed(format!(
                "order {id} changed status concurrently"
            )));
        }

        self.require(id).await
    }

    /// Moves an order along its payment lifecycle.
    pub async fn update_payment_status(&self, id: &str, next: PaymentStatus) -> DbResult<Order> {
        let current = self.require(id).await?;
        current.payment_status.transition_to(next)?;

        debug!(id = %id, from = %current.payment_status, to = %next, "Updating payment status");

        let result = sqlx::query(
            "UPDATE orders SET payment_status = ?2, updated_at = ?3 WHERE id = ?1 AND payment_status = ?4",
        )
        .bind(id)
        .bind(next)
        .bind(Utc::now())
        .bind(current.payment_status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::TransactionFailed(format!(
                "order {id} changed payment status concurrently"
            )));
        }

        self.require(id).await
    }

    pub async fn set_tracking_code(&self, id: &str, code: &str) -> DbResult<Order> {
        validate_required("trackingCode", code).map_err(CoreError::from)?;

        let result =
            sqlx::query("UPDATE orders SET tracking_code = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(code.trim())
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        self.require(id).await
    }

    async fn require(&self, id: &str) -> DbResult<Order> {
        self.get_order(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    async fn load_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT product_id, product_name, quantity, unit_price_cents, total_price_cents, currency
            FROM order_items
            WHERE order_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderItemRow::into_item).collect()
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &OrderFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(user_id) = &filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id.clone());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(from) = filter.created_from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        qb.push(" AND created_at <= ").push_bind(to);
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn place_order(
        &self,
        draft: OrderDraft,
        decrements: &[StockDecrement],
    ) -> CheckoutResult<Order> {
        self.create(draft, decrements)
            .await
            .map_err(DbError::into_persistence_failure)
    }
}
