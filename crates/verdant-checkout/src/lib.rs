//! # verdant-checkout: Order Placement Workflow
//!
//! Orchestrates order placement over four collaborator ports. Pricing and
//! validation rules come from `verdant-core`; storage comes from whoever
//! implements the ports (`verdant-db` in production, [`memory`] in tests).
//!
//! ## Wiring
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   CheckoutConfig::load()                                                │
//! │          │                                                              │
//! │          ▼                                                              │
//! │   CheckoutService::new(users, products, orders, config)                 │
//! │          │            Arc<dyn UserLookup>                               │
//! │          │            Arc<dyn ProductLookup>                            │
//! │          │            Arc<dyn OrderStore>                               │
//! │          ▼                                                              │
//! │   service.place_order(PlaceOrderRequest) ──► Order | CheckoutError      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`ports`] - Collaborator traits
//! - [`workflow`] - `CheckoutService::place_order`
//! - [`config`] - Environment-driven checkout settings
//! - [`memory`] - In-memory implementation of every port
//! - [`error`] - `CheckoutError` and `ErrorKind`

pub mod config;
pub mod error;
pub mod memory;
pub mod ports;
pub mod workflow;

pub use config::{CheckoutConfig, ConfigError};
pub use error::{CheckoutError, CheckoutResult, ErrorKind};
pub use memory::InMemoryStore;
pub use ports::{InventoryMutator, OrderStore, ProductLookup, UserLookup};
pub use workflow::{CheckoutService, PlaceOrderRequest};
