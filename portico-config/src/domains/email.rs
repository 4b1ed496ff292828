//! Email provider configuration

use crate::error::ConfigResult;
use crate::validation::{validate_url, Validatable};
use serde::{Deserialize, Serialize};

/// Outbound email provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Provider REST endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Provider API key (empty disables outbound email; sends are logged)
    #[serde(default)]
    pub api_key: String,

    /// From address for transactional mail
    #[serde(default = "default_from_address")]
    pub from_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            from_address: default_from_address(),
        }
    }
}

impl Validatable for EmailConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.api_url, "email.api_url")?;
        Ok(())
    }
}

fn default_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_from_address() -> String {
    "no-reply@portico.dev".to_string()
}
