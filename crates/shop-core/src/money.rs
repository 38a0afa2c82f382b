//! # Money Normalization
//!
//! Converts user-facing decimal amounts into integer minor-unit amounts.
//! All monetary arithmetic downstream of checkout is integer-only; floats
//! never survive past this module.

use serde::{Deserialize, Serialize};

/// Currency normalization rules.
///
/// The factor is 100 for every currency except a configured zero-decimal
/// set (currencies with no fractional subunit), which use factor 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyConfig {
    /// Currency used when the request carries an empty or missing code
    #[serde(default = "default_fallback")]
    pub fallback_currency: String,

    /// ISO 4217 codes with no minor unit (e.g. JPY)
    #[serde(default = "default_zero_decimal")]
    pub zero_decimal: Vec<String>,
}

fn default_fallback() -> String {
    "USD".to_string()
}

fn default_zero_decimal() -> Vec<String> {
    vec!["JPY".to_string(), "KRW".to_string()]
}

impl Default for MoneyConfig {
    fn default() -> Self {
        Self {
            fallback_currency: default_fallback(),
            zero_decimal: default_zero_decimal(),
        }
    }
}

impl MoneyConfig {
    /// Load rules from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Uppercase and trim a currency code, falling back when empty
    pub fn normalize_currency(&self, raw: &str) -> String {
        let code = raw.trim().to_uppercase();
        if code.is_empty() {
            self.fallback_currency.clone()
        } else {
            code
        }
    }

    /// Decimal-to-minor-unit factor for a normalized currency code
    pub fn minor_unit_factor(&self, currency: &str) -> i64 {
        if self.zero_decimal.iter().any(|c| c == currency) {
            1
        } else {
            100
        }
    }

    /// Convert a decimal amount to minor units, rounding half away from
    /// zero. `None` when the scaled amount does not fit in `i64`.
    pub fn to_minor_units(&self, amount_major: f64, currency: &str) -> Option<i64> {
        let factor = self.minor_unit_factor(currency);
        let scaled = (amount_major * factor as f64).round();
        if !scaled.is_finite() || scaled < i64::MIN as f64 || scaled >= i64::MAX as f64 {
            return None;
        }
        Some(scaled as i64)
    }
}
