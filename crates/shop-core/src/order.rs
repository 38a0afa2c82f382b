//! # Order Types
//!
//! The order is the central entity of the checkout engine: a guest
//! purchase, its line items, shipping destination, and two decoupled
//! lifecycle states (order status vs. payment-attempt status).

use crate::error::{ShopError, ShopResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of the commercial transaction.
///
/// Transitions only move forward: `PendingPayment` -> {`Paid`, `Cancelled`};
/// `Paid` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states admit no further transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }
}

/// Lifecycle state of the payment attempt.
///
/// Kept separate from [`OrderStatus`]: a payment can fail and be retried
/// while the order itself remains open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    RequiresPayment,
    Processing,
    Paid,
    Failed,
    Cancelled,
}

/// The closed set of payment providers.
///
/// Modeled as a tagged union rather than an open plugin trait: the set is
/// small and fixed, and each variant's response shape differs materially
/// (client secret vs. redirect URL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentProvider {
    #[serde(rename = "card-processor")]
    CardProcessor,
    #[serde(rename = "bank-a", alias = "bank-A")]
    BankA,
    #[serde(rename = "bank-b", alias = "bank-B")]
    BankB,
}

impl PaymentProvider {
    /// Wire name, also used as the webhook route segment
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::CardProcessor => "card-processor",
            PaymentProvider::BankA => "bank-a",
            PaymentProvider::BankB => "bank-b",
        }
    }

    /// Parse a webhook route segment into a provider
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card-processor" => Some(PaymentProvider::CardProcessor),
            "bank-a" | "bank-A" => Some(PaymentProvider::BankA),
            "bank-b" | "bank-B" => Some(PaymentProvider::BankB),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line item in an order. Prices are integer minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    /// Quantity, always >= 1
    pub quantity: u32,
    /// Unit price in minor units, always >= 0
    pub unit_price_minor: i64,
}

impl OrderItem {
    /// Line total in minor units, `None` if it exceeds `i64`
    pub fn total_minor(&self) -> Option<i64> {
        self.unit_price_minor.checked_mul(self.quantity as i64)
    }
}

/// Shipping destination for a guest order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub country: String,
}

/// A persisted guest order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// System-generated unique identifier
    pub id: Uuid,

    /// Short human-facing reference, 6 chars from A-Z0-9, globally unique
    pub code: String,

    /// Always `None` for this subsystem (guest checkout only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,

    /// Guest contact email, stored lowercased
    pub guest_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,

    pub shipping_address: ShippingAddress,

    /// 3-letter uppercase code
    pub currency: String,

    /// Sum of `unit_price_minor * quantity` over all items.
    /// Frozen at creation; the authoritative charge amount.
    pub amount_minor: i64,

    /// Non-empty, ordered
    pub items: Vec<OrderItem>,

    pub status: OrderStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_provider: Option<PaymentProvider>,
    pub payment_status: PaymentStatus,

    /// Card-processor intent id, used to correlate webhook events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,

    /// Redirect-bank reference, used to correlate callback events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_reference: Option<String>,

    /// Set exactly once, when payment is confirmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new pending guest order.
    ///
    /// `amount_minor` is computed from the items here and never recomputed
    /// afterwards. Fails when the total does not fit in `i64`; nothing is
    /// allowed to wrap the authoritative charge amount.
    pub fn new(
        code: String,
        guest_email: String,
        guest_name: Option<String>,
        shipping_address: ShippingAddress,
        currency: String,
        items: Vec<OrderItem>,
    ) -> ShopResult<Self> {
        let amount_minor = items
            .iter()
            .try_fold(0i64, |acc, item| {
                item.total_minor().and_then(|total| acc.checked_add(total))
            })
            .ok_or_else(|| ShopError::InvalidItem {
                reason: "items total exceeds the representable amount".to_string(),
            })?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            code,
            user_id: None,
            guest_email: guest_email.to_lowercase(),
            guest_name,
            shipping_address,
            currency,
            amount_minor,
            items,
            status: OrderStatus::PendingPayment,
            payment_provider: None,
            payment_status: PaymentStatus::RequiresPayment,
            payment_intent_id: None,
            provider_reference: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// True once either lifecycle field has reached `Paid`
    pub fn is_paid(&self) -> bool {
        self.status == OrderStatus::Paid || self.payment_status == PaymentStatus::Paid
    }

    /// Public projection returned by the checkout endpoint
    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id,
            code: self.code.clone(),
            currency: self.currency.clone(),
            amount_minor: self.amount_minor,
            status: self.status,
        }
    }
}

/// What the checkout endpoint exposes about a freshly created order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: Uuid,
    pub code: String,
    pub currency: String,
    pub amount_minor: i64,
    pub status: OrderStatus,
}
