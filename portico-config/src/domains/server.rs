//! HTTP server configuration

use crate::error::ConfigResult;
use crate::validation::{validate_url, Validatable};
use serde::{Deserialize, Serialize};

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL of the control plane (used in OAuth2 redirect URIs
    /// and verification links)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the web frontend (used for verify/checkout redirects)
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            base_url: default_base_url(),
            frontend_url: default_frontend_url(),
        }
    }
}

impl Validatable for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.base_url, "server.base_url")?;
        validate_url(&self.frontend_url, "server.frontend_url")?;
        Ok(())
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}
