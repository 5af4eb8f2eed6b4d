//! # Validation Module
//!
//! Input validation rules for order placement and catalog records.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP layer                                                   │
//! │  └── Request schema (types, presence of keys)                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Blank-after-trim checks on address fields                         │
//! │  ├── Zip code format                                                   │
//! │  └── Quantity / SKU / name rules                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK (stock >= 0) constraints                         │
//! │  └── UNIQUE / foreign key constraints                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every validator stops at the first violated rule.

use crate::error::ValidationError;
use crate::types::ShippingAddress;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Shipping Address
// =============================================================================

/// Validates a shipping address.
///
/// ## Rules
/// 1. `street, number, neighborhood, city, state, zipCode, country` are
///    non-blank after trimming, checked in that order
/// 2. `zipCode` is five digits, an optional hyphen, then three digits
///
/// `complement` is optional and never checked.
///
/// ## Example
/// ```rust
/// use verdant_core::types::ShippingAddress;
/// use verdant_core::validation::validate_shipping_address;
///
/// let mut address = ShippingAddress {
///     street: "Rua das Palmeiras".into(),
///     number: "100".into(),
///     complement: None,
///     neighborhood: "Centro".into(),
///     city: "Campinas".into(),
///     state: "SP".into(),
///     zip_code: "13010-000".into(),
///     country: "BR".into(),
/// };
/// assert!(validate_shipping_address(&address).is_ok());
///
/// address.city = "   ".into();
/// let err = validate_shipping_address(&address).unwrap_err();
/// assert_eq!(err.field(), "city");
/// ```
pub fn validate_shipping_address(address: &ShippingAddress) -> ValidationResult<()> {
    let required = [
        ("street", &address.street),
        ("number", &address.number),
        ("neighborhood", &address.neighborhood),
        ("city", &address.city),
        ("state", &address.state),
        ("zipCode", &address.zip_code),
        ("country", &address.country),
    ];

    for (field, value) in required {
        validate_required(field, value)?;
    }

    validate_zip_code(&address.zip_code)
}

/// Validates a zip code: `12345-678` or `12345678`.
pub fn validate_zip_code(zip_code: &str) -> ValidationResult<()> {
    let bytes = zip_code.as_bytes();
    let digits = |s: &[u8]| s.iter().all(u8::is_ascii_digit);

    let valid = match bytes.len() {
        8 => digits(bytes),
        9 => bytes[5] == b'-' && digits(&bytes[..5]) && digits(&bytes[6..]),
        _ => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "zipCode".to_string(),
            reason: "expected 12345-678 or 12345678".to_string(),
        });
    }

    Ok(())
}

/// Fails with `Required` when `value` is blank after trimming.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested quantity.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a catalog price in cents. Catalog prices are strictly positive.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be blank
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();
    validate_required("sku", sku)?;

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: non-blank, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();
    validate_required("name", name)?;

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
