//! # Error Types
//!
//! Typed error handling for the checkout engine.
//! All fallible operations return `Result<T, ShopError>`.

use thiserror::Error;

/// Core error type for checkout and payment operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// A required request field is absent or empty
    #[error("{field} is required")]
    MissingField { field: &'static str },

    /// Checkout request carried no line items
    #[error("items[] is required")]
    MissingItems,

    /// A line item failed validation (first offending item surfaces)
    #[error("Invalid item: {reason}")]
    InvalidItem { reason: String },

    /// Ran out of attempts while generating a unique public code
    #[error("Failed to generate a unique code. Please try again.")]
    CodeGenerationExhausted,

    /// Order lookup failed
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    /// Provider name is not one of the known variants
    #[error("provider must be card-processor|bank-a|bank-b")]
    InvalidProvider { provider: String },

    /// Provider credentials or redirect URL absent (deliberate stub boundary)
    #[error("{provider} is not configured yet: {message}")]
    ProviderNotConfigured { provider: String, message: String },

    /// Payment provider API rejected the request
    #[error("Provider error [{provider}]: {message}")]
    Provider { provider: String, message: String },

    /// Network/timeout talking to an external provider
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration errors (missing secrets, malformed config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Webhook delivery without a signature header
    #[error("Missing signature header")]
    MissingSignature,

    /// Webhook signature did not verify against the raw body
    #[error("Webhook verification failed: {0}")]
    InvalidSignature(String),

    /// Webhook payload parsing error (after successful verification)
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    /// Returns true if the caller may safely retry the whole operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ShopError::Network(_)
                | ShopError::Provider { .. }
                | ShopError::CodeGenerationExhausted
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::MissingField { .. } => 400,
            ShopError::MissingItems => 400,
            ShopError::InvalidItem { .. } => 400,
            ShopError::CodeGenerationExhausted => 503,
            ShopError::OrderNotFound { .. } => 404,
            ShopError::InvalidProvider { .. } => 400,
            ShopError::ProviderNotConfigured { .. } => 501,
            ShopError::Provider { .. } => 500,
            ShopError::Network(_) => 503,
            ShopError::Configuration(_) => 500,
            ShopError::MissingSignature => 400,
            ShopError::InvalidSignature(_) => 400,
            ShopError::WebhookParse(_) => 400,
            ShopError::Serialization(_) => 500,
            ShopError::Internal(_) => 500,
        }
    }
}

/// Result type alias for checkout and payment operations
pub type ShopResult<T> = Result<T, ShopError>;
