//! # Card-Processor Client
//!
//! HTTP client for the card processor's PaymentIntents API. The intent is
//! created for the order's frozen minor-unit amount and tagged with the
//! order id as correlation metadata; the asynchronous webhook echoes that
//! metadata back.

use crate::config::CardConfig;
use reqwest::Client;
use serde::Deserialize;
use shop_core::{Order, ShopError, ShopResult};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Outbound timeout for provider calls. A timeout here does not mean the
/// intent was not created; the webhook remains the source of truth.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// A provider-side payment intent
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Client for the card processor's REST API
pub struct CardClient {
    config: CardConfig,
    client: Client,
}

impl CardClient {
    pub fn new(config: CardConfig) -> Self {
        let client = Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Publishable key for the client-side SDK
    pub fn publishable_key(&self) -> &str {
        &self.config.publishable_key
    }

    /// Create a payment intent for the order's amount and currency.
    ///
    /// The order id rides along as `metadata[order_id]` so the webhook
    /// reconciler can correlate the asynchronous outcome.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn create_payment_intent(&self, order: &Order) -> ShopResult<PaymentIntent> {
        let form_params: Vec<(String, String)> = vec![
            ("amount".to_string(), order.amount_minor.to_string()),
            ("currency".to_string(), order.currency.to_lowercase()),
            ("receipt_email".to_string(), order.guest_email.clone()),
            ("metadata[order_id]".to_string(), order.id.to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];

        debug!(
            amount_minor = order.amount_minor,
            currency = %order.currency,
            "Creating payment intent"
        );

        let url = format!("{}/v1/payment_intents", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .form(&form_params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ShopError::Network("card processor request timed out".to_string())
                } else {
                    ShopError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Card processor API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(ShopError::Provider {
                    provider: "card-processor".to_string(),
                    message: error_response.error.message,
                });
            }

            return Err(ShopError::Provider {
                provider: "card-processor".to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let intent: PaymentIntent = serde_json::from_str(&body).map_err(|e| {
            ShopError::Serialization(format!("Failed to parse payment intent response: {e}"))
        })?;

        info!(intent_id = %intent.id, "Created payment intent");

        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_core::{Order, OrderItem, ShippingAddress};
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_order() -> Order {
        Order::new(
            "AB12CD".to_string(),
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
    async fn test_create_payment_intent() {
        let server = MockServer::start().await;
        let order = sample_order();

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("Authorization", "Bearer sk_test_abc"))
            .and(body_string_contains("amount=1900"))
            .and(body_string_contains("currency=usd"))
            .and(body_string_contains(
                format!("metadata%5Border_id%5D={}", order.id).as_str(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_test_123",
                "client_secret": "pi_test_123_secret_xyz",
                "status": "requires_payment_method"
            })))
            .mount(&server)
            .await;

        let config = CardConfig::new("sk_test_abc", "pk_test_xyz", "whsec_test")
            .with_api_base_url(server.uri());
        let client = CardClient::new(config);

        let intent = client.create_payment_intent(&order).await.unwrap();
        assert_eq!(intent.id, "pi_test_123");
        assert_eq!(intent.client_secret, "pi_test_123_secret_xyz");
    }

    #[tokio::test]
    async fn test_provider_error_message_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
                "error": { "message": "Your card was declined." }
            })))
            .mount(&server)
            .await;

        let config =
            CardConfig::new("sk_test_abc", "pk_test_xyz", "whsec_test").with_api_base_url(server.uri());
        let client = CardClient::new(config);

        let err = client
            .create_payment_intent(&sample_order())
            .await
            .unwrap_err();
        match err {
            ShopError::Provider { provider, message } => {
                assert_eq!(provider, "card-processor");
                assert_eq!(message, "Your card was declined.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_network_error_is_retryable() {
        // Port with nothing listening.
        let config = CardConfig::new("sk_test_abc", "pk_test_xyz", "whsec_test")
            .with_api_base_url("http://127.0.0.1:1");
        let client = CardClient::new(config);

        let err = client
            .create_payment_intent(&sample_order())
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::Network(_)));
        assert!(err.is_retryable());
    }
}
