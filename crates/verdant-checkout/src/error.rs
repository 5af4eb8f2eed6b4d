//! # Checkout Error Types
//!
//! The failure taxonomy of order placement.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  CoreError (pricing, Money, address)  ─┐                               │
//! │  user lookup outcome                   ├──► CheckoutError ──► caller   │
//! │  DbError (converted by verdant-db)    ─┘         │                      │
//! │                                                  ▼                      │
//! │                                        kind() → ErrorKind               │
//! │                                        (drives HTTP status mapping)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is retried or swallowed: every error propagates to the
//! caller of `place_order` as soon as it is detected.

use thiserror::Error;
use verdant_core::CoreError;

/// Order placement errors.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User account is inactive: {0}")]
    UserInactive(String),

    #[error("Order must have at least one item")]
    EmptyOrder,

    /// A pricing, Money or address rule was violated.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// The conditional stock decrement failed at commit time: stock changed
    /// after the order was priced. Nothing was written.
    #[error("Stock for {product_id} changed during checkout: available {available}, requested {requested}")]
    StockCommitFailed {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// The order store or inventory mutation failed; nothing was written.
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    /// A user or product lookup failed (storage unreachable, timeout).
    #[error("Lookup failed: {0}")]
    LookupFailed(String),
}

/// Flat error kinds, precise enough to drive a presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UserNotFound,
    UserInactive,
    EmptyOrder,
    ProductNotFound,
    ProductUnavailable,
    InvalidQuantity,
    InsufficientStock,
    InvalidShippingAddress,
    CurrencyMismatch,
    InvalidAmount,
    InvalidMultiplier,
    InvalidStatusTransition,
    InvalidInput,
    PersistenceFailed,
    LookupFailed,
}

impl CheckoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::UserNotFound(_) => ErrorKind::UserNotFound,
            CheckoutError::UserInactive(_) => ErrorKind::UserInactive,
            CheckoutError::EmptyOrder => ErrorKind::EmptyOrder,
            CheckoutError::StockCommitFailed { .. } => ErrorKind::InsufficientStock,
            CheckoutError::PersistenceFailed(_) => ErrorKind::PersistenceFailed,
            CheckoutError::LookupFailed(_) => ErrorKind::LookupFailed,
            CheckoutError::Rejected(core) => match core {
                CoreError::ProductNotFound(_) => ErrorKind::ProductNotFound,
                CoreError::ProductUnavailable { .. } => ErrorKind::ProductUnavailable,
                CoreError::InvalidQuantity { .. } => ErrorKind::InvalidQuantity,
                CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
                CoreError::InvalidShippingAddress(_) => ErrorKind::InvalidShippingAddress,
                CoreError::CurrencyMismatch { .. } => ErrorKind::CurrencyMismatch,
                CoreError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
                CoreError::InvalidMultiplier { .. } => ErrorKind::InvalidMultiplier,
                CoreError::InvalidStatusTransition { .. } => ErrorKind::InvalidStatusTransition,
                CoreError::Validation(_) => ErrorKind::InvalidInput,
            },
        }
    }

    /// `false` for infrastructure failures (storage unreachable), `true`
    /// for rejections caused by the request or the catalog state.
    pub fn is_business_rule(&self) -> bool {
        !matches!(
            self,
            CheckoutError::PersistenceFailed(_) | CheckoutError::LookupFailed(_)
        )
    }
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_time_stock_failure_is_insufficient_stock() {
        let err = CheckoutError::StockCommitFailed {
            product_id: "P1".to_string(),
            available: 0,
            requested: 1,
        };
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert!(err.is_business_rule());
    }

    #[test]
    fn test_core_errors_keep_their_kind() {
        let err: CheckoutError = CoreError::ProductNotFound("P9".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::ProductNotFound);
        assert_eq!(err.to_string(), "Product not found: P9");
    }

    #[test]
    fn test_infrastructure_errors_are_not_business_rules() {
        assert!(!CheckoutError::PersistenceFailed("disk".into()).is_business_rule());
        assert!(!CheckoutError::LookupFailed("timeout".into()).is_business_rule());
    }
}
