//! Authentication configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// Authentication and token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret for signing access, state and verification JWTs
    #[serde(default)]
    pub jwt_signing_key: String,

    /// Separate key for HMAC-hashing refresh/verification/invitation tokens
    #[serde(default)]
    pub refresh_token_hmac_key: String,

    /// Access token lifetime in minutes
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: u64,

    /// Refresh token (and cookie) lifetime in days
    #[serde(default = "default_refresh_token_days")]
    pub refresh_token_days: u64,

    /// Email verification token lifetime in hours
    #[serde(default = "default_verification_token_hours")]
    pub verification_token_hours: u64,

    /// Organization invitation lifetime in days
    #[serde(default = "default_invitation_days")]
    pub invitation_days: u64,

    /// bcrypt cost factor for password hashing
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Google OIDC client id (empty disables Google login)
    #[serde(default)]
    pub google_client_id: String,

    /// Google OIDC client secret
    #[serde(default)]
    pub google_client_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_signing_key: String::new(),
            refresh_token_hmac_key: String::new(),
            access_token_minutes: default_access_token_minutes(),
            refresh_token_days: default_refresh_token_days(),
            verification_token_hours: default_verification_token_hours(),
            invitation_days: default_invitation_days(),
            bcrypt_cost: default_bcrypt_cost(),
            google_client_id: String::new(),
            google_client_secret: String::new(),
        }
    }
}

impl Validatable for AuthConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.jwt_signing_key, "auth.jwt_signing_key")?;
        validate_required_string(&self.refresh_token_hmac_key, "auth.refresh_token_hmac_key")?;
        validate_positive(self.access_token_minutes, "auth.access_token_minutes")?;
        validate_positive(self.refresh_token_days, "auth.refresh_token_days")?;
        if self.bcrypt_cost < 12 {
            return Err(crate::error::ConfigError::ValidationError(
                "auth.bcrypt_cost must be at least 12".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_access_token_minutes() -> u64 {
    15
}

fn default_refresh_token_days() -> u64 {
    30
}

fn default_verification_token_hours() -> u64 {
    24
}

fn default_invitation_days() -> u64 {
    7
}

fn default_bcrypt_cost() -> u32 {
    12
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcrypt_cost_floor_enforced() {
        let config = AuthConfig {
            jwt_signing_key: "k".to_string(),
            refresh_token_hmac_key: "k".to_string(),
            bcrypt_cost: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_signing_key_rejected() {
        let config = AuthConfig::default();
        assert!(config.validate().is_err());
    }
}
