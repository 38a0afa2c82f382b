//! # shop-pay
//!
//! Payment gateway and webhook reconciliation for the guest checkout
//! engine.
//!
//! This crate provides:
//! - `PaymentGateway` — dispatch over the closed provider set
//!   (card-processor, bank-a, bank-b)
//! - `CardClient` — HTTP client for the card processor's PaymentIntents API
//! - `Reconciler` — verifies inbound provider events and writes terminal
//!   payment truth to the order store
//! - `GatewayConfig` — provider credentials and redirect URLs
//!
//! ## Flow
//!
//! ```rust,ignore
//! use shop_pay::{GatewayConfig, PaymentGateway, PaymentHandle, Reconciler};
//!
//! let config = GatewayConfig::from_env()?;
//! let gateway = PaymentGateway::new(store.clone(), config.clone());
//!
//! // Client asks to pay:
//! let (handle, order) = gateway.start_payment(provider, order_id).await?;
//!
//! // Later, out of band, the provider delivers a signed event:
//! let reconciler = Reconciler::new(store, config);
//! reconciler.handle_event(provider, &raw_body, signature).await?;
//! ```

pub mod card;
pub mod config;
pub mod gateway;
pub mod reconcile;
pub mod webhook;

// Re-exports
pub use card::{CardClient, PaymentIntent};
pub use config::{BankConfig, CardConfig, GatewayConfig};
pub use gateway::{PaymentGateway, PaymentHandle};
pub use reconcile::Reconciler;
pub use webhook::{parse_event, sign_payload, verify_signature, PaymentEvent};
