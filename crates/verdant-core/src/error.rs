//! # Error Types
//!
//! Domain-specific error types for verdant-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  verdant-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule and Money invariant violations   │
//! │  └── ValidationError  - Input validation failures (field-level)        │
//! │                                                                         │
//! │  verdant-checkout errors                                               │
//! │  └── CheckoutError    - Workflow failures (user, storage, CoreError)   │
//! │                                                                         │
//! │  verdant-db errors                                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → HTTP layer        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, field name, counts)
//! 3. Errors are enum variants, never String
//! 4. The first violated rule is reported; nothing is collected or retried

use thiserror::Error;

use crate::types::ProductStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A requested product id is absent from the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The product exists but is not sellable (inactive or out of stock).
    #[error("Product {name} ({product_id}) is not available: {status:?}")]
    ProductUnavailable {
        product_id: String,
        name: String,
        status: ProductStatus,
    },

    /// Requested quantity is zero or negative.
    #[error("Invalid quantity {quantity} for product {product_id}: must be greater than zero")]
    InvalidQuantity { product_id: String, quantity: i64 },

    /// Requested quantity exceeds the stock seen when the order was priced.
    ///
    /// ## User Workflow
    /// ```text
    /// Place order (P1 × 5)
    ///      │
    ///      ▼
    /// Catalog snapshot: stock=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: "P1", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// A shipping address field is blank or malformed.
    #[error("Invalid shipping address: {0}")]
    InvalidShippingAddress(ValidationError),

    /// Two Money values with different currencies were combined.
    #[error("Cannot operate with different currencies: {left} and {right}")]
    CurrencyMismatch { left: String, right: String },

    /// Money construction or arithmetic produced an invalid amount.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Money was multiplied by a negative factor.
    #[error("Invalid multiplier {multiplier}: cannot be negative")]
    InvalidMultiplier { multiplier: String },

    /// A status change that the lifecycle does not allow.
    #[error("Cannot move {entity} from {from} to {to}")]
    InvalidStatusTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub(crate) fn invalid_amount(reason: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Every variant names the offending field so callers can point at it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. malformed zip code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Name of the field that failed validation.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
