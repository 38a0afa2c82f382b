//! # Order Store
//!
//! The only shared mutable resource in the subsystem. Each component owns
//! a specific field group: checkout creates, the payment gateway writes
//! provider/reference/processing fields, the webhook reconciler writes the
//! terminal payment truth. Updates are single-shot conditional writes, not
//! read-modify-write across await points.

use crate::code::CodeLookup;
use crate::error::{ShopError, ShopResult};
use crate::order::{Order, OrderStatus, PaymentProvider, PaymentStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Provider-side handle recorded when a payment attempt starts
#[derive(Debug, Clone)]
pub enum PaymentAttempt {
    /// Card-processor intent id (correlates the asynchronous webhook)
    CardIntent { intent_id: String },
    /// Redirect-bank reference (the order id echoed back by the bank)
    Redirect { reference: String },
}

/// Persistence seam for orders.
///
/// The in-memory implementation below is the one this crate ships; a
/// database-backed store plugs in behind the same trait.
#[async_trait]
pub trait OrderStore: CodeLookup + Send + Sync {
    /// Persist a freshly created order. The order's code must be unique.
    async fn insert(&self, order: Order) -> ShopResult<()>;

    /// Fetch an order by id
    async fn find(&self, id: Uuid) -> ShopResult<Option<Order>>;

    /// Gateway-owned update: record the provider and its handle, move the
    /// payment attempt to `Processing`. Errors if the order is missing.
    /// Returns the order unchanged when it has already reached `Paid`: a
    /// success webhook may land between the gateway's read and this write,
    /// and a stale attempt must never pull a paid order back to processing.
    async fn begin_payment(
        &self,
        id: Uuid,
        provider: PaymentProvider,
        attempt: PaymentAttempt,
    ) -> ShopResult<Order>;

    /// Reconciler-owned update: confirm payment. Applied conditionally;
    /// re-applying to an already-paid order is a harmless repeat and
    /// `paid_at` is stamped exactly once. Unknown orders are a no-op.
    async fn mark_paid(&self, id: Uuid, intent_id: Option<String>) -> ShopResult<Option<Order>>;

    /// Reconciler-owned update: record a failed attempt. Leaves the order
    /// `status` untouched (retry remains possible) and never downgrades an
    /// order that already reached `Paid`. Unknown orders are a no-op.
    async fn mark_payment_failed(
        &self,
        id: Uuid,
        intent_id: Option<String>,
    ) -> ShopResult<Option<Order>>;
}

/// In-memory order store backed by a `tokio` RwLock.
///
/// Every mutation happens atomically under the write lock, which gives the
/// conditional-write semantics the reconciler relies on under concurrent
/// delivery.
#[derive(Default)]
pub struct MemoryOrderStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    orders: HashMap<Uuid, Order>,
    /// Unique-index stand-in for public codes
    codes: HashSet<String>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: seed codes as taken without creating orders
    pub async fn seed_codes<I: IntoIterator<Item = String>>(&self, codes: I) {
        let mut inner = self.inner.write().await;
        inner.codes.extend(codes);
    }
}

#[async_trait]
impl CodeLookup for MemoryOrderStore {
    async fn code_exists(&self, code: &str) -> ShopResult<bool> {
        Ok(self.inner.read().await.codes.contains(code))
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: Order) -> ShopResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.codes.insert(order.code.clone()) {
            return Err(ShopError::Internal(format!(
                "duplicate order code: {}",
                order.code
            )));
        }
        inner.orders.insert(order.id, order);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> ShopResult<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn begin_payment(
        &self,
        id: Uuid,
        provider: PaymentProvider,
        attempt: PaymentAttempt,
    ) -> ShopResult<Order> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(&id)
            .ok_or_else(|| ShopError::OrderNotFound {
                order_id: id.to_string(),
            })?;

        // Conditional write: paid is terminal, even against a racing
        // start-payment that read the order before the webhook landed.
        if order.is_paid() {
            return Ok(order.clone());
        }

        order.payment_provider = Some(provider);
        match attempt {
            PaymentAttempt::CardIntent { intent_id } => {
                order.payment_intent_id = Some(intent_id);
            }
            PaymentAttempt::Redirect { reference } => {
                order.provider_reference = Some(reference);
            }
        }
        order.payment_status = PaymentStatus::Processing;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn mark_paid(&self, id: Uuid, intent_id: Option<String>) -> ShopResult<Option<Order>> {
        let mut inner = self.inner.write().await;
        let Some(order) = inner.orders.get_mut(&id) else {
            return Ok(None);
        };

        // Monotonic terminal write: a repeat delivery re-applies the same
        // assignment but never re-stamps paid_at.
        if order.status != OrderStatus::Paid {
            order.paid_at = Some(Utc::now());
        }
        order.status = OrderStatus::Paid;
        order.payment_status = PaymentStatus::Paid;
        if let Some(intent_id) = intent_id {
            order.payment_intent_id = Some(intent_id);
        }
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn mark_payment_failed(
        &self,
        id: Uuid,
        intent_id: Option<String>,
    ) -> ShopResult<Option<Order>> {
        let mut inner = self.inner.write().await;
        let Some(order) = inner.orders.get_mut(&id) else {
            return Ok(None);
        };

        // A failure event racing a success never un-pays the order.
        if order.status == OrderStatus::Paid {
            return Ok(Some(order.clone()));
        }

        order.payment_status = PaymentStatus::Failed;
        if let Some(intent_id) = intent_id {
            order.payment_intent_id = Some(intent_id);
        }
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderItem, ShippingAddress};

    fn sample_order(code: &str) -> Order {
        Order::new(
            code.to_string(),
            "guest@example.com".to_string(),
            None,
            ShippingAddress {
                line1: "1 Main St".to_string(),
                line2: None,
                city: "Tbilisi".to_string(),
                region: None,
                postal_code: None,
                country: "GE".to_string(),
            },
            "USD".to_string(),
            vec![OrderItem {
                name: "Mug".to_string(),
                quantity: 2,
                unit_price_minor: 950,
            }],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryOrderStore::new();
        let order = sample_order("AAAAAA");
        let id = order.id;

        store.insert(order).await.unwrap();
        let found = store.find(id).await.unwrap().unwrap();
        assert_eq!(found.amount_minor, 1900);
        assert!(store.code_exists("AAAAAA").await.unwrap());
        assert!(!store.code_exists("BBBBBB").await.unwrap());
    }

    #[tokio::test]
    async fn test_seeded_codes_count_as_taken() {
        let store = MemoryOrderStore::new();
        store
            .seed_codes(["TAKEN1".to_string(), "TAKEN2".to_string()])
            .await;

        assert!(store.code_exists("TAKEN1").await.unwrap());
        assert!(!store.code_exists("FREE01").await.unwrap());

        // The generator must terminate with a code outside the seeded set.
        let code = crate::code::generate_unique_code(&store, 6).await.unwrap();
        assert!(!["TAKEN1", "TAKEN2"].contains(&code.as_str()));
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let store = MemoryOrderStore::new();
        store.insert(sample_order("SAME01")).await.unwrap();
        let err = store.insert(sample_order("SAME01")).await.unwrap_err();
        assert!(matches!(err, ShopError::Internal(_)));
    }

    #[tokio::test]
    async fn test_begin_payment_sets_gateway_fields() {
        let store = MemoryOrderStore::new();
        let order = sample_order("CCCCCC");
        let id = order.id;
        store.insert(order).await.unwrap();

        let updated = store
            .begin_payment(
                id,
                PaymentProvider::CardProcessor,
                PaymentAttempt::CardIntent {
                    intent_id: "pi_123".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.payment_provider, Some(PaymentProvider::CardProcessor));
        assert_eq!(updated.payment_intent_id.as_deref(), Some("pi_123"));
        assert_eq!(updated.payment_status, PaymentStatus::Processing);
        assert_eq!(updated.status, OrderStatus::PendingPayment);
        // Charge amount untouched by the gateway.
        assert_eq!(updated.amount_minor, 1900);
    }

    #[tokio::test]
    async fn test_begin_payment_never_downgrades_paid() {
        let store = MemoryOrderStore::new();
        let order = sample_order("GGGGGG");
        let id = order.id;
        store.insert(order).await.unwrap();

        store.mark_paid(id, Some("pi_done".to_string())).await.unwrap();

        // A start-payment that read the order before the webhook landed.
        let after = store
            .begin_payment(
                id,
                PaymentProvider::CardProcessor,
                PaymentAttempt::CardIntent {
                    intent_id: "pi_stale".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(after.status, OrderStatus::Paid);
        assert_eq!(after.payment_status, PaymentStatus::Paid);
        assert_eq!(after.payment_intent_id.as_deref(), Some("pi_done"));
        assert!(after.payment_provider.is_none());
    }

    #[tokio::test]
    async fn test_begin_payment_unknown_order() {
        let store = MemoryOrderStore::new();
        let err = store
            .begin_payment(
                Uuid::new_v4(),
                PaymentProvider::BankA,
                PaymentAttempt::Redirect {
                    reference: "ref".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::OrderNotFound { .. }));
    }

    #[tokio::test]
    async fn test_mark_paid_is_idempotent() {
        let store = MemoryOrderStore::new();
        let order = sample_order("DDDDDD");
        let id = order.id;
        store.insert(order).await.unwrap();

        let first = store
            .mark_paid(id, Some("pi_1".to_string()))
            .await
            .unwrap()
            .unwrap();
        let first_paid_at = first.paid_at.unwrap();
        assert_eq!(first.status, OrderStatus::Paid);
        assert_eq!(first.payment_status, PaymentStatus::Paid);

        let second = store
            .mark_paid(id, Some("pi_1".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.paid_at.unwrap(), first_paid_at);
        assert_eq!(second.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_mark_failed_keeps_order_open() {
        let store = MemoryOrderStore::new();
        let order = sample_order("EEEEEE");
        let id = order.id;
        store.insert(order).await.unwrap();

        let updated = store
            .mark_payment_failed(id, Some("pi_9".to_string()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.payment_status, PaymentStatus::Failed);
        assert_eq!(updated.status, OrderStatus::PendingPayment);
        assert!(updated.paid_at.is_none());
    }

    #[tokio::test]
    async fn test_mark_failed_never_downgrades_paid() {
        let store = MemoryOrderStore::new();
        let order = sample_order("FFFFFF");
        let id = order.id;
        store.insert(order).await.unwrap();

        store.mark_paid(id, None).await.unwrap();
        let after = store
            .mark_payment_failed(id, Some("pi_stale".to_string()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(after.status, OrderStatus::Paid);
        assert_eq!(after.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_terminal_writes_on_unknown_order_are_noops() {
        let store = MemoryOrderStore::new();
        assert!(store.mark_paid(Uuid::new_v4(), None).await.unwrap().is_none());
        assert!(store
            .mark_payment_failed(Uuid::new_v4(), None)
            .await
            .unwrap()
            .is_none());
    }
}
