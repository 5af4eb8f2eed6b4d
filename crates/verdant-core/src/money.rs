//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Cents?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Decimal in, integer cents inside                         │
//! │    Decimal 19.995 ──round half away from zero──► 2000 cents             │
//! │    Every later operation works on exact integers                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - The amount is never negative
//! - The amount is always a whole number of cents (2 decimal places)
//! - The currency code is non-empty and uppercase
//! - Arithmetic between different currencies fails with `CurrencyMismatch`
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use verdant_core::money::Money;
//!
//! let price = Money::new(Decimal::new(1000, 2), "BRL").unwrap(); // BRL 10.00
//! let shipping = Money::from_cents(1000, "BRL").unwrap();
//!
//! let total = price.multiply_quantity(2).unwrap().add(&shipping).unwrap();
//! assert_eq!(total.to_string(), "BRL 30.00");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Money Type
// =============================================================================

/// An immutable, non-negative amount of a single currency.
///
/// ## Design Decisions
/// - **i64 cents**: exact arithmetic; rounding happens only at construction
///   from a `Decimal` and after a decimal multiplication
/// - **Currency carried along**: every binary operation checks it
/// - **No `Add`/`Mul` operator impls**: every operation can fail, so they
///   return `CoreResult` instead of panicking
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► OrderItem.unit_price ──► OrderItem.total_price
///                                                        │
///                           Σ total_price ──► subtotal ──┤
///                                                        ▼
///                             subtotal + shipping_cost = total_amount
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MoneyRepr", into = "MoneyRepr")]
pub struct Money {
    cents: i64,
    currency: String,
}

impl Money {
    /// Creates Money from a decimal amount, rounding half away from zero to
    /// two decimal places.
    ///
    /// ## Errors
    /// - `InvalidAmount` if `amount` is negative or the currency is blank
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use verdant_core::money::Money;
    ///
    /// let m = Money::new(Decimal::new(10005, 3), "brl").unwrap(); // 10.005
    /// assert_eq!(m.cents(), 1001);
    /// assert_eq!(m.currency(), "BRL");
    /// ```
    pub fn new(amount: Decimal, currency: &str) -> CoreResult<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(CoreError::invalid_amount(format!(
                "amount cannot be negative: {amount}"
            )));
        }
        let currency = normalize_currency(currency)?;

        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let cents = rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|c| c.to_i64())
            .ok_or_else(|| CoreError::invalid_amount(format!("amount out of range: {amount}")))?;

        Ok(Money { cents, currency })
    }

    /// Creates Money from a whole number of cents.
    ///
    /// ## Example
    /// ```rust
    /// use verdant_core::money::Money;
    ///
    /// let price = Money::from_cents(1099, "BRL").unwrap();
    /// assert_eq!(price.to_string(), "BRL 10.99");
    /// assert!(Money::from_cents(-1, "BRL").is_err());
    /// ```
    pub fn from_cents(cents: i64, currency: &str) -> CoreResult<Self> {
        if cents < 0 {
            return Err(CoreError::invalid_amount(format!(
                "amount cannot be negative: {cents} cents"
            )));
        }
        Ok(Money {
            cents,
            currency: normalize_currency(currency)?,
        })
    }

    /// Zero in the given currency.
    pub fn zero(currency: &str) -> CoreResult<Self> {
        Money::from_cents(0, currency)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the amount as a two-place decimal.
    #[inline]
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.cents, 2)
    }

    /// Returns the normalized (uppercase) currency code.
    #[inline]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Adds two amounts of the same currency.
    pub fn add(&self, other: &Money) -> CoreResult<Money> {
        self.ensure_same_currency(other)?;
        let cents = self
            .cents
            .checked_add(other.cents)
            .ok_or_else(|| CoreError::invalid_amount("addition overflowed"))?;
        Ok(self.with_cents(cents))
    }

    /// Subtracts `other` from `self`.
    ///
    /// ## Errors
    /// - `CurrencyMismatch` if the currencies differ
    /// - `InvalidAmount` if the result would be negative
    pub fn subtract(&self, other: &Money) -> CoreResult<Money> {
        self.ensure_same_currency(other)?;
        let cents = self.cents - other.cents;
        if cents < 0 {
            return Err(CoreError::invalid_amount(format!(
                "{self} minus {other} would be negative"
            )));
        }
        Ok(self.with_cents(cents))
    }

    /// Multiplies by a decimal factor and rounds the result to cents.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use verdant_core::money::Money;
    ///
    /// let price = Money::from_cents(1000, "BRL").unwrap();
    /// let half = price.multiply(Decimal::new(5, 1)).unwrap();
    /// assert_eq!(half.cents(), 500);
    /// assert!(price.multiply(Decimal::new(-1, 0)).is_err());
    /// ```
    pub fn multiply(&self, factor: Decimal) -> CoreResult<Money> {
        if factor.is_sign_negative() && !factor.is_zero() {
            return Err(CoreError::InvalidMultiplier {
                multiplier: factor.to_string(),
            });
        }
        let product = self
            .amount()
            .checked_mul(factor)
            .ok_or_else(|| CoreError::invalid_amount("multiplication overflowed"))?;
        Money::new(product, &self.currency)
    }

    /// Multiplies by a whole quantity. Exact: no rounding is involved.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Fern BRL 19.90
    /// Quantity: 3
    ///      │
    ///      ▼
    /// multiply_quantity(3) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line Total: BRL 59.70
    /// ```
    pub fn multiply_quantity(&self, quantity: i64) -> CoreResult<Money> {
        if quantity < 0 {
            return Err(CoreError::InvalidMultiplier {
                multiplier: quantity.to_string(),
            });
        }
        let cents = self
            .cents
            .checked_mul(quantity)
            .ok_or_else(|| CoreError::invalid_amount("multiplication overflowed"))?;
        Ok(self.with_cents(cents))
    }

    /// `self > other`, for amounts of the same currency.
    pub fn is_greater_than(&self, other: &Money) -> CoreResult<bool> {
        self.ensure_same_currency(other)?;
        Ok(self.cents > other.cents)
    }

    /// `self < other`, for amounts of the same currency.
    pub fn is_less_than(&self, other: &Money) -> CoreResult<bool> {
        self.ensure_same_currency(other)?;
        Ok(self.cents < other.cents)
    }

    fn ensure_same_currency(&self, other: &Money) -> CoreResult<()> {
        if self.currency != other.currency {
            return Err(CoreError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        Ok(())
    }

    fn with_cents(&self, cents: i64) -> Money {
        Money {
            cents,
            currency: self.currency.clone(),
        }
    }
}

fn normalize_currency(currency: &str) -> CoreResult<String> {
    let code = currency.trim();
    if code.is_empty() {
        return Err(CoreError::invalid_amount("currency is required"));
    }
    Ok(code.to_uppercase())
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `"BRL 10.99"`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{:02}",
            self.currency,
            self.cents / 100,
            self.cents % 100
        )
    }
}

/// Wire shape of [`Money`]. Deserializing goes back through the
/// constructor so a payload cannot smuggle in a negative amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MoneyRepr {
    amount_cents: i64,
    currency: String,
}

impl TryFrom<MoneyRepr> for Money {
    type Error = CoreError;

    fn try_from(repr: MoneyRepr) -> Result<Self, Self::Error> {
        Money::from_cents(repr.amount_cents, &repr.currency)
    }
}

impl From<Money> for MoneyRepr {
    fn from(money: Money) -> Self {
        MoneyRepr {
            amount_cents: money.cents,
            currency: money.currency,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
