//! # Payment Gateway
//!
//! Dispatch over the closed set of payment providers, in one place. Each
//! call records exactly one persisted update (provider, handle,
//! payment_status=processing) and never touches the order amount.

use crate::card::CardClient;
use crate::config::GatewayConfig;
use shop_core::{
    Order, OrderStore, PaymentAttempt, PaymentProvider, ShopError, ShopResult,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// What the client needs to complete the payment.
///
/// The card flow hands back a client secret for an in-page SDK; the bank
/// flows hand back a hosted-checkout URL to redirect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentHandle {
    ClientSecret {
        client_secret: String,
        publishable_key: String,
    },
    RedirectUrl { redirect_url: String },
    /// Idempotent short-circuit: the order was already paid, nothing was
    /// re-initiated
    AlreadyPaid,
}

/// Starts payments against the order store
pub struct PaymentGateway {
    store: Arc<dyn OrderStore>,
    card: Option<CardClient>,
    config: GatewayConfig,
}

impl PaymentGateway {
    pub fn new(store: Arc<dyn OrderStore>, config: GatewayConfig) -> Self {
        let card = config.card.clone().map(CardClient::new);
        Self {
            store,
            card,
            config,
        }
    }

    /// Begin a payment for a fixed minor-unit amount and currency.
    ///
    /// Returns the handle plus the updated order. The order amount is read,
    /// never written. A provider-side timeout surfaces as a retryable error
    /// without assuming the provider call failed; the webhook is the
    /// ultimate source of truth.
    #[instrument(skip(self), fields(provider = %provider, order_id = %order_id))]
    pub async fn start_payment(
        &self,
        provider: PaymentProvider,
        order_id: Uuid,
    ) -> ShopResult<(PaymentHandle, Order)> {
        let order = self
            .store
            .find(order_id)
            .await?
            .ok_or_else(|| ShopError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;

        if order.is_paid() {
            info!("Order already paid, skipping payment initiation");
            return Ok((PaymentHandle::AlreadyPaid, order));
        }

        match provider {
            PaymentProvider::CardProcessor => self.start_card_payment(order).await,
            PaymentProvider::BankA => {
                self.start_redirect_payment(
                    order,
                    PaymentProvider::BankA,
                    self.config.bank_a.redirect_base_url.as_deref(),
                    "BANK_A_REDIRECT_URL",
                )
                .await
            }
            PaymentProvider::BankB => {
                self.start_redirect_payment(
                    order,
                    PaymentProvider::BankB,
                    self.config.bank_b.redirect_base_url.as_deref(),
                    "BANK_B_REDIRECT_URL",
                )
                .await
            }
        }
    }

    async fn start_card_payment(&self, order: Order) -> ShopResult<(PaymentHandle, Order)> {
        let card = self.card.as_ref().ok_or_else(|| ShopError::ProviderNotConfigured {
            provider: "card-processor".to_string(),
            message: "set CARD_SECRET_KEY, CARD_PUBLISHABLE_KEY and CARD_WEBHOOK_SECRET"
                .to_string(),
        })?;

        let intent = card.create_payment_intent(&order).await?;

        let updated = self
            .store
            .begin_payment(
                order.id,
                PaymentProvider::CardProcessor,
                PaymentAttempt::CardIntent {
                    intent_id: intent.id,
                },
            )
            .await?;

        Ok((
            PaymentHandle::ClientSecret {
                client_secret: intent.client_secret,
                publishable_key: card.publishable_key().to_string(),
            },
            updated,
        ))
    }

    /// Redirect-bank flow. The concrete bank API integration plugs in
    /// behind the configured base URL later; until then an unset URL is a
    /// not-configured-yet condition.
    async fn start_redirect_payment(
        &self,
        order: Order,
        provider: PaymentProvider,
        base_url: Option<&str>,
        env_hint: &str,
    ) -> ShopResult<(PaymentHandle, Order)> {
        let base = base_url.ok_or_else(|| ShopError::ProviderNotConfigured {
            provider: provider.to_string(),
            message: format!("set {env_hint} and add the real API integration"),
        })?;

        let redirect_url = format!("{}?orderId={}", base, order.id);

        let updated = self
            .store
            .begin_payment(
                order.id,
                provider,
                PaymentAttempt::Redirect {
                    reference: order.id.to_string(),
                },
            )
            .await?;

        info!(redirect_url = %redirect_url, "Redirecting to hosted checkout");

        Ok((PaymentHandle::RedirectUrl { redirect_url }, updated))
    }
}
