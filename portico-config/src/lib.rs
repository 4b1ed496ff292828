//! Domain-driven configuration management for Portico
//!
//! Configuration is split by functional domain with serde defaults, YAML file
//! loading, `PORTICO_`-prefixed environment variable overrides and per-domain
//! validation.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    auth::AuthConfig, database::DatabaseConfig, email::EmailConfig, embeddings::EmbeddingsConfig,
    gateway::GatewayConfig, logging::LoggingConfig, server::ServerConfig, stripe::StripeConfig,
    PorticoConfig,
};
