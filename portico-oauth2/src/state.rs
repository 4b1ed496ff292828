//! Signed OAuth2 state
//!
//! The `state` query parameter round-trips everything the callback needs as
//! a short-lived signed JWT, so the callback is stateless on our side.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OAuth2Error, OAuth2Result};

const STATE_LIFETIME_MINUTES: i64 = 15;

/// Payload carried through the authorization redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2State {
    pub client_id: String,
    pub code_verifier: String,
    pub redirect_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url_after_account_creation: Option<String>,
    /// Exactly one of these identifies what the callback completes:
    /// an end-user connected account or an operational account on a server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_server_id: Option<Uuid>,
    pub user_id: Uuid,
    #[serde(default)]
    pub exp: i64,
}

#[derive(Clone)]
pub struct StateCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl StateCodec {
    pub fn new(signing_key: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_key.as_bytes()),
        }
    }

    pub fn encode(&self, mut state: OAuth2State) -> OAuth2Result<String> {
        state.exp = (Utc::now() + Duration::minutes(STATE_LIFETIME_MINUTES)).timestamp();
        encode(&Header::new(Algorithm::HS256), &state, &self.encoding_key)
            .map_err(|_| OAuth2Error::StateInvalid)
    }

    pub fn decode(&self, token: &str) -> OAuth2Result<OAuth2State> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<OAuth2State>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| OAuth2Error::StateInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips() {
        let codec = StateCodec::new("state-secret");
        let config_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let token = codec
            .encode(OAuth2State {
                client_id: "client".to_string(),
                code_verifier: "verifier".to_string(),
                redirect_uri: "https://cp.example/callback".to_string(),
                redirect_url_after_account_creation: None,
                configuration_id: Some(config_id),
                mcp_server_id: None,
                user_id,
                exp: 0,
            })
            .unwrap();

        let state = codec.decode(&token).unwrap();
        assert_eq!(state.configuration_id, Some(config_id));
        assert_eq!(state.user_id, user_id);
        assert_eq!(state.code_verifier, "verifier");
    }

    #[test]
    fn tampered_state_rejected() {
        let codec = StateCodec::new("state-secret");
        let other = StateCodec::new("other-secret");
        let token = codec
            .encode(OAuth2State {
                client_id: "client".to_string(),
                code_verifier: "v".to_string(),
                redirect_uri: "https://cp.example/callback".to_string(),
                redirect_url_after_account_creation: None,
                configuration_id: None,
                mcp_server_id: Some(Uuid::new_v4()),
                user_id: Uuid::new_v4(),
                exp: 0,
            })
            .unwrap();
        assert!(other.decode(&token).is_err());
    }
}
