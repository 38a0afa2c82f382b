//! # shop-api
//!
//! HTTP API layer for the guest checkout engine.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/checkout` | Create a guest order |
//! | POST | `/payments/create` | Start a payment for an order |
//! | POST | `/payments/webhook/{provider}` | Provider webhook (raw body) |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
