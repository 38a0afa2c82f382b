//! # Application State
//!
//! Shared state for the axum application: the order store and the three
//! services that own disjoint field groups on it (checkout creates,
//! gateway starts payments, reconciler finalizes).

use shop_core::{CheckoutService, MemoryOrderStore, MoneyConfig, OrderStore};
use shop_pay::{GatewayConfig, PaymentGateway, Reconciler};
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub checkout: Arc<CheckoutService>,
    pub gateway: Arc<PaymentGateway>,
    pub reconciler: Arc<Reconciler>,
    pub config: AppConfig,
}

impl AppState {
    /// Build state from explicit configuration (used by tests and `main`)
    pub fn with_config(
        config: AppConfig,
        gateway_config: GatewayConfig,
        money: MoneyConfig,
    ) -> Self {
        let store: Arc<dyn OrderStore> = Arc::new(MemoryOrderStore::new());

        Self {
            checkout: Arc::new(CheckoutService::new(store.clone(), money)),
            gateway: Arc::new(PaymentGateway::new(store.clone(), gateway_config.clone())),
            reconciler: Arc::new(Reconciler::new(store.clone(), gateway_config)),
            store,
            config,
        }
    }

    /// Build state entirely from the environment
    pub fn from_env() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let gateway_config = GatewayConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load provider configuration: {e}"))?;
        let money = load_money_config();

        Ok(Self::with_config(config, gateway_config, money))
    }
}

/// Load currency rules from config file, falling back to defaults
fn load_money_config() -> MoneyConfig {
    let config_paths = [
        "config/money.toml",
        "../config/money.toml",
        "../../config/money.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            match MoneyConfig::from_toml(&content) {
                Ok(money) => {
                    tracing::info!("Loaded money config from {}", path);
                    return money;
                }
                Err(e) => {
                    tracing::warn!("Ignoring malformed {}: {}", path, e);
                }
            }
        }
    }

    MoneyConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "test".to_string(),
        };

        let addr = config.socket_addr();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
        assert!(!config.is_production());
    }

    #[test]
    fn test_with_config_builds_services() {
        let state = AppState::with_config(
            AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                environment: "test".to_string(),
            },
            GatewayConfig::default(),
            MoneyConfig::default(),
        );

        assert_eq!(state.config.environment, "test");
    }
}
