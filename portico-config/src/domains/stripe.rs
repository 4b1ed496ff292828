//! Stripe configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Stripe API and webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StripeConfig {
    /// Secret API key (empty disables billing endpoints)
    #[serde(default)]
    pub secret_key: String,

    /// Webhook signing secret
    #[serde(default)]
    pub webhook_secret: String,
}

impl Validatable for StripeConfig {
    fn validate(&self) -> ConfigResult<()> {
        // Both keys may be empty in deployments without billing.
        Ok(())
    }
}
