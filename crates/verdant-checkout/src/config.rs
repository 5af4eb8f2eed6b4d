//! Checkout configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;

use verdant_core::{CoreResult, Money, DEFAULT_CURRENCY, DEFAULT_SHIPPING_COST_CENTS};

const CURRENCY_VAR: &str = "VERDANT_CURRENCY";
const SHIPPING_COST_VAR: &str = "VERDANT_SHIPPING_COST_CENTS";
const MERGE_LINES_VAR: &str = "VERDANT_MERGE_DUPLICATE_LINES";

/// Checkout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Currency of the shipping charge and order totals.
    pub currency: String,

    /// Flat shipping charge in cents.
    pub shipping_cost_cents: i64,

    /// Fold repeated lines for the same product into one line.
    pub merge_duplicate_lines: bool,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            currency: DEFAULT_CURRENCY.to_string(),
            shipping_cost_cents: DEFAULT_SHIPPING_COST_CENTS,
            merge_duplicate_lines: false,
        }
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                        | Default |
    /// |---------------------------------|---------|
    /// | `VERDANT_CURRENCY`              | `BRL`   |
    /// | `VERDANT_SHIPPING_COST_CENTS`   | `1000`  |
    /// | `VERDANT_MERGE_DUPLICATE_LINES` | `false` |
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = CheckoutConfig::default();

        let currency = lookup(CURRENCY_VAR)
            .map(|c| c.trim().to_uppercase())
            .unwrap_or(defaults.currency);
        if currency.is_empty() {
            return Err(ConfigError::InvalidValue(CURRENCY_VAR.to_string()));
        }

        let shipping_cost_cents = match lookup(SHIPPING_COST_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|c| *c >= 0)
                .ok_or_else(|| ConfigError::InvalidValue(SHIPPING_COST_VAR.to_string()))?,
            None => defaults.shipping_cost_cents,
        };

        let merge_duplicate_lines = match lookup(MERGE_LINES_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidValue(MERGE_LINES_VAR.to_string()))?,
            None => defaults.merge_duplicate_lines,
        };

        Ok(CheckoutConfig {
            currency,
            shipping_cost_cents,
            merge_duplicate_lines,
        })
    }

    /// The shipping charge as Money.
    pub fn shipping_cost(&self) -> CoreResult<Money> {
        Money::from_cents(self.shipping_cost_cents, &self.currency)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CheckoutConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CheckoutConfig::default());
        assert_eq!(config.shipping_cost().unwrap().to_string(), "BRL 10.00");
    }

    #[test]
    fn test_overrides() {
        let config = CheckoutConfig::from_lookup(lookup(&[
            ("VERDANT_CURRENCY", "usd"),
            ("VERDANT_SHIPPING_COST_CENTS", "1599"),
            ("VERDANT_MERGE_DUPLICATE_LINES", "true"),
        ]))
        .unwrap();

        assert_eq!(config.currency, "USD");
        assert_eq!(config.shipping_cost_cents, 1599);
        assert!(config.merge_duplicate_lines);
    }

    #[test]
    fn test_invalid_values() {
        let err = CheckoutConfig::from_lookup(lookup(&[("VERDANT_SHIPPING_COST_CENTS", "-1")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for VERDANT_SHIPPING_COST_CENTS");

        for (key, value) in [
            (SHIPPING_COST_VAR, "ten"),
            (MERGE_LINES_VAR, "yes"),
            (CURRENCY_VAR, "  "),
        ] {
            assert!(CheckoutConfig::from_lookup(lookup(&[(key, value)])).is_err(), "{key}");
        }
    }
}
