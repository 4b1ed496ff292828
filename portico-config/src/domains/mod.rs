//! Domain-specific configuration modules

pub mod auth;
pub mod database;
pub mod email;
pub mod embeddings;
pub mod gateway;
pub mod logging;
pub mod server;
pub mod stripe;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Portico configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PorticoConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: server::ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: database::DatabaseConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: auth::AuthConfig,

    /// Gateway request-path configuration
    #[serde(default)]
    pub gateway: gateway::GatewayConfig,

    /// Email provider configuration
    #[serde(default)]
    pub email: email::EmailConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embeddings: embeddings::EmbeddingsConfig,

    /// Stripe configuration
    #[serde(default)]
    pub stripe: stripe::StripeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl PorticoConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.gateway.validate()?;
        self.email.validate()?;
        self.embeddings.validate()?;
        self.stripe.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
