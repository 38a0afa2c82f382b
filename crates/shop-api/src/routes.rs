//! # Routes
//!
//! Axum router configuration.
//!
//! The webhook route takes the raw request body (`Bytes`) instead of a
//! JSON extractor: signature verification must see the exact bytes the
//! provider signed, so no body-parsing middleware may run ahead of it.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health - Health check
/// - POST /checkout - Create a guest order
/// - POST /payments/create - Start a payment for an order
/// - POST /payments/webhook/{provider} - Provider webhook (raw body)
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let payment_routes = Router::new()
        .route("/create", post(handlers::create_payment))
        .route("/webhook/{provider}", post(handlers::provider_webhook));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/checkout", post(handlers::create_checkout))
        .nest("/payments", payment_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
