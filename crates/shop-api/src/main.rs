//! # Shop Checkout
//!
//! Guest checkout and payment processing service.
//!
//! ## Usage
//!
//! ```bash
//! # Card processor credentials (omit to leave the provider unconfigured)
//! export CARD_SECRET_KEY=sk_test_...
//! export CARD_PUBLISHABLE_KEY=pk_test_...
//! export CARD_WEBHOOK_SECRET=whsec_...
//!
//! # Optional redirect-bank configuration
//! export BANK_A_REDIRECT_URL=https://bank-a.example/pay
//! export BANK_B_REDIRECT_URL=https://bank-b.example/pay
//!
//! # Run the server
//! shop-checkout
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::from_env()?;

    let addr = state.config.socket_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("Shop checkout starting on http://{}", addr);

    if !is_prod {
        info!("Checkout: POST http://{}/checkout", addr);
        info!("Payments: POST http://{}/payments/create", addr);
        info!("Webhook:  POST http://{}/payments/webhook/{{provider}}", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
