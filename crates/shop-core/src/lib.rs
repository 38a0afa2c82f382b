//! # shop-core
//!
//! Core domain for the guest checkout engine.
//!
//! This crate provides:
//! - `MoneyConfig` for decimal-to-minor-unit normalization
//! - `Order` and its two decoupled lifecycle states
//! - `CheckoutService` for validated cart submissions
//! - `generate_unique_code` for short public order references
//! - `OrderStore` persistence seam with an in-memory implementation
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{CheckoutService, MemoryOrderStore, MoneyConfig};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryOrderStore::new());
//! let checkout = CheckoutService::new(store.clone(), MoneyConfig::default());
//!
//! let summary = checkout.create_checkout(request).await?;
//! // summary.amount_minor is frozen; payment happens against it.
//! ```

pub mod checkout;
pub mod code;
pub mod error;
pub mod money;
pub mod order;
pub mod store;

// Re-exports for convenience
pub use checkout::{CheckoutAddress, CheckoutItem, CheckoutRequest, CheckoutService};
pub use code::{generate_code, generate_unique_code, CodeLookup, CODE_ALPHABET, CODE_LENGTH};
pub use error::{ShopError, ShopResult};
pub use money::MoneyConfig;
pub use order::{
    Order, OrderItem, OrderStatus, OrderSummary, PaymentProvider, PaymentStatus, ShippingAddress,
};
pub use store::{MemoryOrderStore, OrderStore, PaymentAttempt};
