//! # Webhook Reconciler
//!
//! The sole writer of terminal payment truth, invoked by an untrusted
//! network caller. Signature verification gates everything; once a
//! delivery verifies, processing failures are logged and acknowledged
//! anyway, because providers redeliver on non-2xx and a retry storm is
//! worse than a missed log line.

use crate::config::GatewayConfig;
use crate::webhook::{parse_event, verify_signature, PaymentEvent};
use shop_core::{OrderStore, PaymentProvider, ShopError, ShopResult};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Applies verified provider events to the order store
pub struct Reconciler {
    store: Arc<dyn OrderStore>,
    config: GatewayConfig,
}

impl Reconciler {
    pub fn new(store: Arc<dyn OrderStore>, config: GatewayConfig) -> Self {
        Self { store, config }
    }

    /// Verify and apply one provider delivery.
    ///
    /// Errors out only on missing/invalid signature or missing provider
    /// configuration; everything after verification acknowledges, including
    /// no-op branches and redeliveries.
    #[instrument(skip(self, payload, signature), fields(provider = %provider))]
    pub async fn handle_event(
        &self,
        provider: PaymentProvider,
        payload: &[u8],
        signature: Option<&str>,
    ) -> ShopResult<()> {
        let signature = signature.ok_or(ShopError::MissingSignature)?;
        let secret = self.config.webhook_secret(provider)?;

        verify_signature(secret, payload, signature)?;

        // Verified from here on: always acknowledge.
        let event = match parse_event(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!("Acknowledging unparseable verified webhook: {e}");
                return Ok(());
            }
        };

        match event {
            PaymentEvent::Succeeded {
                order_id: Some(order_id),
                intent_id,
            } => match self.store.mark_paid(order_id, intent_id).await {
                Ok(Some(_)) => info!(%order_id, "Order marked paid"),
                Ok(None) => warn!(%order_id, "Success event for unknown order, ignoring"),
                Err(e) => warn!(%order_id, "Failed to apply success event: {e}"),
            },
            PaymentEvent::Failed {
                order_id: Some(order_id),
                intent_id,
            } => match self.store.mark_payment_failed(order_id, intent_id).await {
                Ok(Some(_)) => info!(%order_id, "Payment attempt marked failed"),
                Ok(None) => warn!(%order_id, "Failure event for unknown order, ignoring"),
                Err(e) => warn!(%order_id, "Failed to apply failure event: {e}"),
            },
            PaymentEvent::Succeeded { order_id: None, .. }
            | PaymentEvent::Failed { order_id: None, .. } => {
                warn!("Payment event without order correlation, ignoring");
            }
            PaymentEvent::Ignored { event_type } => {
                info!(%event_type, "Ignoring unhandled event type");
            }
        }

        Ok(())
    }
}
