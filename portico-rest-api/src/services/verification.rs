//! Email verification tokens
//!
//! The token itself is a 24-hour JWT; only its HMAC digest is persisted, in
//! a single-use verification record.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct VerificationClaims {
    #[serde(rename = "type")]
    pub token_type: String,
    pub email: String,
    pub user_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

pub const EMAIL_VERIFICATION_TYPE: &str = "email_verification";

/// Issue a verification JWT. Returns `(token, expires_at)`; the caller
/// hashes the token and persists the digest.
pub fn generate_verification_token(
    signing_key: &str,
    user_id: Uuid,
    email: &str,
    lifetime_hours: u64,
) -> Result<(String, DateTime<Utc>), jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(lifetime_hours as i64);
    let claims = VerificationClaims {
        token_type: EMAIL_VERIFICATION_TYPE.to_string(),
        email: email.to_string(),
        user_id,
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key.as_bytes()),
    )?;
    Ok((token, expires_at))
}

/// Decode and validate a verification JWT.
pub fn validate_verification_token(signing_key: &str, token: &str) -> Option<VerificationClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<VerificationClaims>(
        token,
        &DecodingKey::from_secret(signing_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .ok()
    .filter(|claims| claims.token_type == EMAIL_VERIFICATION_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips() {
        let user_id = Uuid::new_v4();
        let (token, expires_at) =
            generate_verification_token("secret", user_id, "ada@example.com", 24).unwrap();
        assert!(expires_at > Utc::now());

        let claims = validate_verification_token("secret", &token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "ada@example.com");
    }

    #[test]
    fn wrong_key_rejected() {
        let (token, _) =
            generate_verification_token("secret", Uuid::new_v4(), "a@b.c", 24).unwrap();
        assert!(validate_verification_token("other", &token).is_none());
    }
}
