//! Tagged auth-config and credential variants
//!
//! Both families persist as one JSON column plus the `type` discriminator
//! stored separately as an enum for indexability. Adding a variant means
//! extending [`AuthType`] and the matching serde enum here; there is no open
//! subclassing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{AuthType, HttpLocation};

/// One auth-config variant of an MCP server. A server carries an ordered
/// list of these; a configuration picks exactly one by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    NoAuth,
    ApiKey {
        /// Where the key is injected on the upstream request
        location: HttpLocation,
        /// Header/query/cookie name carrying the key
        name: String,
    },
    Oauth2(OAuth2AuthConfig),
}

impl AuthConfig {
    pub fn auth_type(&self) -> AuthType {
        match self {
            AuthConfig::NoAuth => AuthType::NoAuth,
            AuthConfig::ApiKey { .. } => AuthType::ApiKey,
            AuthConfig::Oauth2(_) => AuthType::Oauth2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth2AuthConfig {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub scopes: Vec<String>,
    pub authorize_url: String,
    pub access_token_url: String,
    pub refresh_token_url: String,
    pub token_endpoint_auth_method: String,
    /// Absent when the provider does not support dynamic client registration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_url: Option<String>,
}

/// Materialized credential of a connected account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthCredentials {
    NoAuth,
    ApiKey { secret_key: String },
    Oauth2(OAuth2Credentials),
}

impl AuthCredentials {
    pub fn auth_type(&self) -> AuthType {
        match self {
            AuthCredentials::NoAuth => AuthType::NoAuth,
            AuthCredentials::ApiKey { .. } => AuthType::ApiKey,
            AuthCredentials::Oauth2(_) => AuthType::Oauth2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuth2Credentials {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl OAuth2Credentials {
    /// Whether the access token is expired or within `margin_secs` of expiry.
    /// Tokens without an expiry never report near-expiry.
    pub fn is_near_expiry(&self, now: DateTime<Utc>, margin_secs: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => (expires_at - now).num_seconds() <= margin_secs,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn auth_config_round_trips_with_type_tag() {
        let config = AuthConfig::ApiKey {
            location: HttpLocation::Header,
            name: "X-Api-Key".to_string(),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "api_key");
        assert_eq!(json["location"], "header");
        let back: AuthConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn oauth2_near_expiry_uses_margin() {
        let now = Utc::now();
        let creds = OAuth2Credentials {
            access_token: "tok".to_string(),
            refresh_token: Some("ref".to_string()),
            expires_at: Some(now + Duration::seconds(30)),
            scope: None,
        };
        assert!(creds.is_near_expiry(now, 60));
        assert!(!creds.is_near_expiry(now, 10));

        let no_expiry = OAuth2Credentials {
            expires_at: None,
            ..creds
        };
        assert!(!no_expiry.is_near_expiry(now, 60));
    }

    #[test]
    fn credentials_discriminator_matches_auth_type() {
        let creds = AuthCredentials::ApiKey {
            secret_key: "sk".to_string(),
        };
        assert_eq!(creds.auth_type(), AuthType::ApiKey);
        assert_eq!(AuthCredentials::NoAuth.auth_type(), AuthType::NoAuth);
    }
}
