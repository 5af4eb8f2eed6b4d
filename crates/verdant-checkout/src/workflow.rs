//! # Order Placement Workflow
//!
//! Turns a `PlaceOrderRequest` into a stored `Order`.
//!
//! ## Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. UserLookup.find_user           ─► UserNotFound / UserInactive      │
//! │  2. items empty?                   ─► EmptyOrder                       │
//! │  3. ProductLookup.find_products    ─► ProductNotFound (first missing)  │
//! │     (distinct ids, one call)                                            │
//! │  4. price_order_lines              ─► ProductUnavailable /             │
//! │                                       InvalidQuantity /                 │
//! │                                       InsufficientStock                 │
//! │  5. subtotal = Σ line totals                                            │
//! │  6. total = subtotal + shipping    ─► CurrencyMismatch                 │
//! │  7. validate_shipping_address      ─► InvalidShippingAddress           │
//! │  ───────────────── nothing written before this line ─────────────────  │
//! │  8+9. OrderStore.place_order(draft, decrements)                        │
//! │       one all-or-nothing unit      ─► InsufficientStock (commit time)  │
//! │                                       PersistenceFailed                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use verdant_core::validation::validate_shipping_address;
use verdant_core::{
    price_order_lines, stock_decrements, CoreError, Order, OrderDraft, OrderLineRequest,
    OrderTotals, Product, ShippingAddress,
};

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, CheckoutResult};
use crate::ports::{OrderStore, ProductLookup, UserLookup};

/// Inbound order placement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub user_id: String,
    pub items: Vec<OrderLineRequest>,
    pub shipping_address: ShippingAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Order placement over injected collaborators.
///
/// Built once at startup and cloned into request handlers; clones share
/// the same collaborators.
#[derive(Clone)]
pub struct CheckoutService {
    users: Arc<dyn UserLookup>,
    products: Arc<dyn ProductLookup>,
    orders: Arc<dyn OrderStore>,
    config: CheckoutConfig,
}

impl CheckoutService {
    pub fn new(
        users: Arc<dyn UserLookup>,
        products: Arc<dyn ProductLookup>,
        orders: Arc<dyn OrderStore>,
        config: CheckoutConfig,
    ) -> Self {
        CheckoutService {
            users,
            products,
            orders,
            config,
        }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Places an order. The first violated rule aborts the workflow.
    #[instrument(
        name = "place_order",
        skip_all,
        fields(user_id = %request.user_id, items = request.items.len())
    )]
    pub async fn place_order(&self, request: PlaceOrderRequest) -> CheckoutResult<Order> {
        match self.run(request).await {
            Ok(order) => {
                info!(
                    order_id = %order.id,
                    total = %order.total_amount,
                    lines = order.items.len(),
                    "Order placed"
                );
                Ok(order)
            }
            Err(err) if err.is_business_rule() => {
                warn!(kind = ?err.kind(), error = %err, "Order rejected");
                Err(err)
            }
            Err(err) => {
                warn!(error = %err, "Order placement failed");
                Err(err)
            }
        }
    }

    async fn run(&self, request: PlaceOrderRequest) -> CheckoutResult<Order> {
        let PlaceOrderRequest {
            user_id,
            items,
            shipping_address,
            notes,
        } = request;

        let user = self
            .users
            .find_user(&user_id)
            .await?
            .ok_or_else(|| CheckoutError::UserNotFound(user_id.clone()))?;
        if !user.is_active {
            return Err(CheckoutError::UserInactive(user.id));
        }

        if items.is_empty() {
            return Err(CheckoutError::EmptyOrder);
        }

        let catalog = self.resolve_products(&items).await?;

        let priced = price_order_lines(&items, &catalog, self.config.merge_duplicate_lines)?;
        let totals = OrderTotals::compute(&priced, self.config.shipping_cost()?)?;

        validate_shipping_address(&shipping_address).map_err(CoreError::InvalidShippingAddress)?;

        let decrements = stock_decrements(&priced);
        let draft = OrderDraft {
            user_id: user.id,
            items: priced,
            subtotal: totals.subtotal,
            shipping_cost: totals.shipping_cost,
            total_amount: totals.total_amount,
            shipping_address,
            notes,
        };

        self.orders.place_order(draft, &decrements).await
    }

    /// Bulk lookup of every distinct product id, keyed by id.
    async fn resolve_products(
        &self,
        items: &[OrderLineRequest],
    ) -> CheckoutResult<HashMap<String, Product>> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = items
            .iter()
            .filter(|item| seen.insert(item.product_id.as_str()))
            .map(|item| item.product_id.clone())
            .collect();

        let catalog: HashMap<String, Product> = self
            .products
            .find_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        if let Some(missing) = ids.iter().find(|id| !catalog.contains_key(*id)) {
            return Err(CoreError::ProductNotFound(missing.clone()).into());
        }

        Ok(catalog)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::memory::InMemoryStore;
    use chrono::Utc;
    use verdant_core::{
        OrderStatus, ProductCategory, ProductStatus, User, UserRole, ValidationError,
    };

    fn user(id: &str, is_active: bool) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            name: "Ana".to_string(),
            email: format!("{id}@verdant.test"),
            role: UserRole::Customer,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn product(id: &str, price_cents: i64, stock: i64, status: ProductStatus) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            sku: format!("SKU-{id}"),
            name: format!("Product {id}"),
            description: String::new(),
            category: ProductCategory::Plants,
            price_cents,
            currency: "BRL".to_string(),
            stock,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "Rua das Flores".to_string(),
            number: "42".to_string(),
            complement: None,
            neighborhood: "Jardim".to_string(),
            city: "Curitiba".to_string(),
            state: "PR".to_string(),
            zip_code: "80000-000".to_string(),
            country: "Brasil".to_string(),
        }
    }

    fn request(items: Vec<OrderLineRequest>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            user_id: "U1".to_string(),
            items,
            shipping_address: address(),
            notes: None,
        }
    }

    async fn setup(config: CheckoutConfig) -> (Arc<InMemoryStore>, CheckoutService) {
        let store = Arc::new(InMemoryStore::new());
        store.add_user(user("U1", true)).await;
        store.add_user(user("U2", false)).await;
        store
            .add_product(product("P1", 1000, 5, ProductStatus::Active))
            .await;
        store
            .add_product(product("P2", 350, 10, ProductStatus::Active))
            .await;
        store
            .add_product(product("P3", 800, 4, ProductStatus::Inactive))
            .await;

        let service = CheckoutService::new(store.clone(), store.clone(), store.clone(), config);
        (store, service)
    }

    #[tokio::test]
    async fn test_reference_scenario_totals() {
        let (store, service) = setup(CheckoutConfig::default()).await;

        let order = service
            .place_order(request(vec![OrderLineRequest::new("P1", 2)]))
            .await
            .unwrap();

        assert_eq!(order.subtotal.to_string(), "BRL 20.00");
        assert_eq!(order.shipping_cost.to_string(), "BRL 10.00");
        assert_eq!(order.total_amount.to_string(), "BRL 30.00");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items[0].product_name, "Product P1");
        assert_eq!(store.stock_of("P1").await, Some(3));
        assert_eq!(store.order_writes().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_users() {
        let (_, service) = setup(CheckoutConfig::default()).await;

        let mut req = request(vec![OrderLineRequest::new("P1", 1)]);
        req.user_id = "nobody".to_string();
        let err = service.place_order(req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UserNotFound);

        // user checks run before the empty-order check
        let mut req = request(vec![]);
        req.user_id = "U2".to_string();
        let err = service.place_order(req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UserInactive);
    }

    #[tokio::test]
    async fn test_empty_order() {
        let (_, service) = setup(CheckoutConfig::default()).await;
        let err = service.place_order(request(vec![])).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyOrder));
    }

    #[tokio::test]
    async fn test_missing_product_names_first_missing_id() {
        let (store, service) = setup(CheckoutConfig::default()).await;

        let err = service
            .place_order(request(vec![
                OrderLineRequest::new("P1", 1),
                OrderLineRequest::new("X7", 1),
                OrderLineRequest::new("X8", 1),
            ]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Rejected(CoreError::ProductNotFound(ref id)) if id == "X7"
        ));
        assert_eq!(store.order_writes().await, 0);
    }

    #[tokio::test]
    async fn test_inactive_product_mutates_nothing() {
        let (store, service) = setup(CheckoutConfig::default()).await;

        let err = service
            .place_order(request(vec![
                OrderLineRequest::new("P1", 1),
                OrderLineRequest::new("P3", 1),
            ]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ProductUnavailable);
        assert_eq!(store.stock_mutations().await, 0);
        assert_eq!(store.stock_of("P1").await, Some(5));
    }

    #[tokio::test]
    async fn test_quantity_and_stock_rules() {
        let (_, service) = setup(CheckoutConfig::default()).await;

        let err = service
            .place_order(request(vec![OrderLineRequest::new("P1", 0)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuantity);

        let err = service
            .place_order(request(vec![OrderLineRequest::new("P1", 6)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Rejected(CoreError::InsufficientStock { available: 5, requested: 6, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_zip_code_fails_before_persistence() {
        let (store, service) = setup(CheckoutConfig::default()).await;

        let mut req = request(vec![OrderLineRequest::new("P1", 1)]);
        req.shipping_address.zip_code = "  ".to_string();
        let err = service.place_order(req).await.unwrap_err();

        match err {
            CheckoutError::Rejected(CoreError::InvalidShippingAddress(v)) => {
                assert_eq!(v.field(), "zipCode");
                assert!(matches!(v, ValidationError::Required { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.order_writes().await, 0);
        assert_eq!(store.stock_mutations().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_lines_stay_separate_by_default() {
        let (store, service) = setup(CheckoutConfig::default()).await;

        let order = service
            .place_order(request(vec![
                OrderLineRequest::new("P1", 2),
                OrderLineRequest::new("P2", 1),
                OrderLineRequest::new("P1", 1),
            ]))
            .await
            .unwrap();

        assert_eq!(order.items.len(), 3);
        assert_eq!(order.items[0].unit_price, order.items[2].unit_price);
        assert_eq!(order.subtotal.cents(), 3 * 1000 + 350);
        assert_eq!(store.stock_of("P1").await, Some(2));
        // one decrement per distinct product
        assert_eq!(store.stock_mutations().await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_lines_merge_when_configured() {
        let config = CheckoutConfig {
            merge_duplicate_lines: true,
            ..CheckoutConfig::default()
        };
        let (store, service) = setup(config).await;

        let order = service
            .place_order(request(vec![
                OrderLineRequest::new("P1", 2),
                OrderLineRequest::new("P1", 1),
            ]))
            .await
            .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 3);
        assert_eq!(order.items[0].total_price.cents(), 3000);
        assert_eq!(store.stock_of("P1").await, Some(2));
    }

    #[tokio::test]
    async fn test_duplicate_lines_checked_against_summed_quantity() {
        let (store, service) = setup(CheckoutConfig::default()).await;

        let err = service
            .place_order(request(vec![
                OrderLineRequest::new("P1", 3),
                OrderLineRequest::new("P1", 3),
            ]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert_eq!(store.stock_of("P1").await, Some(5));
    }

    #[tokio::test]
    async fn test_persistence_failure_writes_nothing() {
        let (store, service) = setup(CheckoutConfig::default()).await;
        store.set_unavailable(true).await;

        let err = service
            .place_order(request(vec![OrderLineRequest::new("P1", 1)]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PersistenceFailed);
        assert!(!err.is_business_rule());
        assert_eq!(store.stock_of("P1").await, Some(5));
        assert!(store.orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_shipping_currency_must_match_catalog() {
        let config = CheckoutConfig {
            currency: "USD".to_string(),
            ..CheckoutConfig::default()
        };
        let (_, service) = setup(config).await;

        let err = service
            .place_order(request(vec![OrderLineRequest::new("P1", 1)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CurrencyMismatch);
    }

    #[test]
    fn test_request_wire_format() {
        let json = r#"{
            "userId": "U1",
            "items": [{ "productId": "P1", "quantity": 2 }],
            "shippingAddress": {
                "street": "Rua A", "number": "1", "neighborhood": "Centro",
                "city": "Curitiba", "state": "PR", "zipCode": "80000000",
                "country": "Brasil"
            }
        }"#;

        let req: PlaceOrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.items, vec![OrderLineRequest::new("P1", 2)]);
        assert_eq!(req.shipping_address.zip_code, "80000000");
        assert!(req.notes.is_none());
    }
}
