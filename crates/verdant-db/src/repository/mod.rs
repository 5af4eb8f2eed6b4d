//! # Repository Module
//!
//! SQLite repositories for Verdant, each also implementing the checkout
//! port(s) it backs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutService                                                        │
//! │       │ find_user          │ find_products        │ place_order         │
//! │       ▼                    ▼                      ▼                     │
//! │  UserRepository      ProductRepository      OrderRepository             │
//! │  ├── insert          ├── insert             ├── create (1 txn)          │
//! │  ├── get_by_id       ├── get_by_id          ├── get_order               │
//! │  └── set_active      ├── find_by_ids        ├── list_orders             │
//! │                      ├── restock            ├── update_status           │
//! │                      ├── set_status         ├── update_payment_status   │
//! │                      └── decrement_stock    └── set_tracking_code       │
//! │       │                    │                      │                     │
//! │       └────────────────────┴──────────────────────┘                     │
//! │                            ▼                                            │
//! │                     SQLite Database                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod order;
pub mod product;
pub mod user;
