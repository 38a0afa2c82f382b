//! # Checkout Service
//!
//! Validates a guest cart submission and creates an order in a pending
//! state. Validation fails fast; no partial order is ever persisted.

use crate::code::{generate_unique_code, CODE_LENGTH};
use crate::error::{ShopError, ShopResult};
use crate::money::MoneyConfig;
use crate::order::{Order, OrderItem, OrderSummary, ShippingAddress};
use crate::store::OrderStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// A guest cart submission, as received on the wire.
///
/// Everything is optional at the type level so validation can produce
/// field-specific errors instead of opaque deserialization failures.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub guest_email: Option<String>,
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<CheckoutAddress>,
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutAddress {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Cart line as submitted: decimal unit price, not yet minor units
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
}

/// Creates pending orders from validated cart submissions
pub struct CheckoutService {
    store: Arc<dyn OrderStore>,
    money: MoneyConfig,
}

impl CheckoutService {
    pub fn new(store: Arc<dyn OrderStore>, money: MoneyConfig) -> Self {
        Self { store, money }
    }

    /// Validate the submission, compute the frozen charge amount, obtain a
    /// unique public code, and persist the order.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn create_checkout(&self, request: CheckoutRequest) -> ShopResult<OrderSummary> {
        let guest_email = match request.guest_email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => return Err(ShopError::MissingField { field: "guestEmail" }),
        };

        let address = request
            .shipping_address
            .ok_or(ShopError::MissingField {
                field: "shippingAddress",
            })?;
        let shipping_address = validate_address(address)?;

        if request.items.is_empty() {
            return Err(ShopError::MissingItems);
        }

        let currency = self
            .money
            .normalize_currency(request.currency.as_deref().unwrap_or(""));

        let items = request
            .items
            .into_iter()
            .map(|item| validate_item(item, &self.money, &currency))
            .collect::<ShopResult<Vec<OrderItem>>>()?;

        let code = generate_unique_code(self.store.as_ref(), CODE_LENGTH).await?;

        let order = Order::new(
            code,
            guest_email,
            request.guest_name,
            shipping_address,
            currency,
            items,
        )?;
        let summary = order.summary();

        self.store.insert(order).await?;

        info!(
            order_id = %summary.id,
            code = %summary.code,
            amount_minor = summary.amount_minor,
            currency = %summary.currency,
            "Order created"
        );

        Ok(summary)
    }
}

fn validate_address(address: CheckoutAddress) -> ShopResult<ShippingAddress> {
    let required = |value: Option<String>, field: &'static str| -> ShopResult<String> {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(ShopError::MissingField { field }),
        }
    };

    Ok(ShippingAddress {
        line1: required(address.line1, "shippingAddress.line1")?,
        line2: address.line2.filter(|s| !s.trim().is_empty()),
        city: required(address.city, "shippingAddress.city")?,
        region: address.region.filter(|s| !s.trim().is_empty()),
        postal_code: address.postal_code.filter(|s| !s.trim().is_empty()),
        country: required(address.country, "shippingAddress.country")?,
    })
}

fn validate_item(
    item: CheckoutItem,
    money: &MoneyConfig,
    currency: &str,
) -> ShopResult<OrderItem> {
    let name = item
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ShopError::InvalidItem {
            reason: "each item.name is required".to_string(),
        })?
        .to_string();

    let quantity = item.quantity.unwrap_or(f64::NAN);
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(ShopError::InvalidItem {
            reason: "each item.quantity must be > 0".to_string(),
        });
    }
    if quantity.fract() != 0.0 || quantity > u32::MAX as f64 {
        return Err(ShopError::InvalidItem {
            reason: "each item.quantity must be a whole number".to_string(),
        });
    }

    let unit_price = item.unit_price.unwrap_or(f64::NAN);
    if !unit_price.is_finite() || unit_price < 0.0 {
        return Err(ShopError::InvalidItem {
            reason: "each item.unitPrice must be >= 0".to_string(),
        });
    }

    let unit_price_minor = money
        .to_minor_units(unit_price, currency)
        .ok_or_else(|| ShopError::InvalidItem {
            reason: "each item.unitPrice is out of range".to_string(),
        })?;

    Ok(OrderItem {
        name,
        quantity: quantity as u32,
        unit_price_minor,
    })
}
