//! # Gateway Configuration
//!
//! Provider credentials and redirect URLs. All secrets come from the
//! environment; every struct is also constructible directly for tests.

use shop_core::{PaymentProvider, ShopError, ShopResult};
use std::env;

/// Card-processor API configuration (Stripe-compatible PaymentIntents API)
#[derive(Debug, Clone)]
pub struct CardConfig {
    /// Secret API key
    pub secret_key: String,

    /// Publishable key handed to the client SDK alongside the client secret
    pub publishable_key: String,

    /// Webhook signing secret
    pub webhook_secret: String,

    /// API base URL (overridable for testing/mocking)
    pub api_base_url: String,
}

impl CardConfig {
    /// Load from environment variables.
    ///
    /// Returns `Ok(None)` when `CARD_SECRET_KEY` is unset (provider simply
    /// not configured); errors when the key is set but its companions are
    /// missing, since a half-configured processor is an operator mistake.
    pub fn from_env() -> ShopResult<Option<Self>> {
        let Ok(secret_key) = env::var("CARD_SECRET_KEY") else {
            return Ok(None);
        };

        let publishable_key = env::var("CARD_PUBLISHABLE_KEY").map_err(|_| {
            ShopError::Configuration("CARD_PUBLISHABLE_KEY is not set".to_string())
        })?;

        let webhook_secret = env::var("CARD_WEBHOOK_SECRET").map_err(|_| {
            ShopError::Configuration("CARD_WEBHOOK_SECRET is not set".to_string())
        })?;

        let api_base_url = env::var("CARD_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.stripe.com".to_string());

        Ok(Some(Self {
            secret_key,
            publishable_key,
            webhook_secret,
            api_base_url,
        }))
    }

    /// Create config with explicit values (for testing)
    pub fn new(
        secret_key: impl Into<String>,
        publishable_key: impl Into<String>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            secret_key: secret_key.into(),
            publishable_key: publishable_key.into(),
            webhook_secret: webhook_secret.into(),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }
}

/// Redirect-bank configuration.
///
/// Banks here are hosted-checkout stubs: the contract is fixed, the real
/// API integration plugs in later without changing it.
#[derive(Debug, Clone, Default)]
pub struct BankConfig {
    /// Base URL of the bank's hosted checkout page
    pub redirect_base_url: Option<String>,

    /// Shared secret for callback signature verification
    pub webhook_secret: Option<String>,
}

impl BankConfig {
    fn from_env(prefix: &str) -> Self {
        Self {
            redirect_base_url: env::var(format!("{prefix}_REDIRECT_URL")).ok(),
            webhook_secret: env::var(format!("{prefix}_WEBHOOK_SECRET")).ok(),
        }
    }
}

/// Everything the gateway and reconciler need about providers
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub card: Option<CardConfig>,
    pub bank_a: BankConfig,
    pub bank_b: BankConfig,
}

impl GatewayConfig {
    /// Load all provider configuration from the environment (`.env` honored)
    pub fn from_env() -> ShopResult<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            card: CardConfig::from_env()?,
            bank_a: BankConfig::from_env("BANK_A"),
            bank_b: BankConfig::from_env("BANK_B"),
        })
    }

    /// Webhook signing secret for a provider.
    ///
    /// A webhook arriving for a provider with no configured secret is an
    /// operator problem, not a caller problem.
    pub fn webhook_secret(&self, provider: PaymentProvider) -> ShopResult<&str> {
        let secret = match provider {
            PaymentProvider::CardProcessor => {
                self.card.as_ref().map(|c| c.webhook_secret.as_str())
            }
            PaymentProvider::BankA => self.bank_a.webhook_secret.as_deref(),
            PaymentProvider::BankB => self.bank_b.webhook_secret.as_deref(),
        };

        secret.ok_or_else(|| {
            ShopError::Configuration(format!("webhook secret for {provider} is not configured"))
        })
    }
}
