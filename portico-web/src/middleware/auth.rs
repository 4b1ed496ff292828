//! JWT issuing and verification
//!
//! Access tokens are JWTs over a shared secret. The optional `act_as` claim
//! pins the bearer to one organization and role for the request; whether a
//! missing `act_as` is acceptable depends on the endpoint (strict vs. lax
//! resolution, decided by the request-context layer).

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use portico_api_types::OrganizationRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{WebError, WebResult};

/// Organization/role the bearer is operating under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActAs {
    pub organization_id: Uuid,
    pub role: OrganizationRole,
}

/// Claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub act_as: Option<ActAs>,
}

/// Claims extracted from the `Authorization` header, before any database
/// validation of the act-as membership.
#[derive(Debug, Clone)]
pub struct BearerClaims(pub AuthClaims);

/// JWT token manager
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_lifetime: Duration,
}

impl JwtManager {
    pub fn new(signing_key: &str, token_lifetime_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_key.as_bytes()),
            token_lifetime: Duration::minutes(token_lifetime_minutes),
        }
    }

    /// Issue an access token for a user, optionally pinned to an act-as.
    pub fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        name: &str,
        act_as: Option<ActAs>,
    ) -> WebResult<String> {
        let now = Utc::now();
        let claims = AuthClaims {
            sub: user_id,
            email: email.to_string(),
            name: name.to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_lifetime).timestamp(),
            act_as,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| WebError::TokenInvalid)
    }

    pub fn verify(&self, token: &str) -> WebResult<AuthClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<AuthClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => WebError::TokenExpired,
                _ => WebError::TokenInvalid,
            })
    }

    /// Extract and verify the bearer token from request headers.
    pub fn claims_from_headers(&self, headers: &HeaderMap) -> WebResult<AuthClaims> {
        let header = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(WebError::MissingBearer)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(WebError::MissingBearer)?;
        self.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> JwtManager {
        JwtManager::new("test-secret", 15)
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let token = manager()
            .issue(
                user_id,
                "ada@example.com",
                "Ada",
                Some(ActAs {
                    organization_id: org_id,
                    role: OrganizationRole::Admin,
                }),
            )
            .unwrap();

        let claims = manager().verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "ada@example.com");
        let act_as = claims.act_as.unwrap();
        assert_eq!(act_as.organization_id, org_id);
        assert_eq!(act_as.role, OrganizationRole::Admin);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = manager()
            .issue(Uuid::new_v4(), "a@b.c", "A", None)
            .unwrap();
        let other = JwtManager::new("different-secret", 15);
        assert!(matches!(other.verify(&token), Err(WebError::TokenInvalid)));
    }

    #[test]
    fn headers_without_bearer_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            manager().claims_from_headers(&headers),
            Err(WebError::MissingBearer)
        ));
    }
}
