//! Authentication endpoints
//!
//! Email-password registration with verification, login, refresh-cookie
//! token issuing, logout and Google OIDC login.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use chrono::{Duration, Utc};
use portico_api_types::ErrorCode;
use serde_json::json;
use tracing::{info, warn};

use portico_storage::entities::users::IdentityProvider;
use portico_storage::repositories::{OrganizationRepository, TokenRepository, UserRepository};
use portico_web::{clear_refresh_token_cookie, refresh_token_cookie};

use crate::context::AppContext;
use crate::errors::{RestError, RestResult};
use crate::models::auth::{
    GoogleCallbackQuery, LoginEmailRequest, ProfileMembership, ProfileResponse,
    RegisterEmailRequest, TokenRequest, TokenResponse, VerifyEmailQuery,
};
use crate::services::verification::{
    generate_verification_token, validate_verification_token,
};

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// `POST /auth/register/email`
pub async fn register_email(
    State(ctx): State<AppContext>,
    Json(request): Json<RegisterEmailRequest>,
) -> RestResult<Response> {
    if request.password.len() < 8 {
        return Err(RestError::validation("Password must be at least 8 characters"));
    }
    let email = request.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(RestError::validation("Invalid email address"));
    }

    let txn = ctx.begin().await?;
    let users = UserRepository::new(&txn);

    let password_hash = bcrypt::hash(&request.password, ctx.config.auth.bcrypt_cost)
        .map_err(|_| RestError::api(ErrorCode::InternalError, "Internal server error"))?;

    let user = match users.find_by_email(&email).await? {
        Some(existing) => {
            if existing.deleted_at.is_some() {
                return Err(RestError::api(
                    ErrorCode::AccountDeletionInProgress,
                    "Account deletion in progress",
                ));
            }
            if existing.email_verified {
                return Err(RestError::api(
                    ErrorCode::EmailAlreadyExists,
                    "Email already exists",
                ));
            }
            if existing.identity_provider != IdentityProvider::Email {
                return Err(RestError::api(
                    ErrorCode::EmailAlreadyExists,
                    "Email already exists",
                ));
            }
            // Unverified email-provider user re-registering: overwrite and
            // invalidate the earlier verification tokens
            TokenRepository::new(&txn)
                .delete_unused_verifications(existing.id)
                .await?;
            users
                .overwrite_unverified(existing, &request.name, password_hash)
                .await?
        }
        None => {
            users
                .create(
                    &email,
                    &request.name,
                    IdentityProvider::Email,
                    Some(password_hash),
                    false,
                )
                .await?
        }
    };

    let (token, expires_at) = generate_verification_token(
        &ctx.config.auth.jwt_signing_key,
        user.id,
        &user.email,
        ctx.config.auth.verification_token_hours,
    )
    .map_err(|_| RestError::api(ErrorCode::InternalError, "Internal server error"))?;
    TokenRepository::new(&txn)
        .create_verification(user.id, &user.email, &ctx.token_hasher.hash(&token), expires_at)
        .await?;

    let (refresh_token, refresh_hash) = ctx.token_hasher.generate();
    TokenRepository::new(&txn)
        .create_refresh_token(
            user.id,
            &refresh_hash,
            Utc::now() + Duration::days(ctx.config.auth.refresh_token_days as i64),
        )
        .await?;

    txn.commit().await?;

    // Verification email failures are logged, never fatal to registration
    let verify_url = format!(
        "{}/auth/verify-email?token={}",
        ctx.config.server.base_url, token
    );
    if let Err(err) = ctx
        .email
        .send(portico_http::EmailClient::verification_email(
            &user.email,
            &user.name,
            &verify_url,
        ))
        .await
    {
        warn!(%err, "failed to send verification email");
    }

    info!(user_id = %user.id, "registered email user");
    Ok((
        StatusCode::CREATED,
        [(
            header::SET_COOKIE,
            refresh_token_cookie(&refresh_token, ctx.config.auth.refresh_token_days),
        )],
        Json(json!({ "id": user.id, "email": user.email })),
    )
        .into_response())
}

/// `POST /auth/login/email`
pub async fn login_email(
    State(ctx): State<AppContext>,
    Json(request): Json<LoginEmailRequest>,
) -> RestResult<Response> {
    let email = request.email.trim().to_lowercase();
    let txn = ctx.begin().await?;

    let invalid = || RestError::api(ErrorCode::TokenInvalid, "Invalid credentials");

    let user = UserRepository::new(&txn)
        .find_by_email(&email)
        .await?
        .filter(|user| user.deleted_at.is_none())
        .ok_or_else(invalid)?;

    let password_hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !bcrypt::verify(&request.password, password_hash).unwrap_or(false) {
        return Err(invalid());
    }
    if user.identity_provider == IdentityProvider::Email && !user.email_verified {
        return Err(RestError::api(ErrorCode::EmailNotVerified, "Email not verified"));
    }

    let (refresh_token, refresh_hash) = ctx.token_hasher.generate();
    TokenRepository::new(&txn)
        .create_refresh_token(
            user.id,
            &refresh_hash,
            Utc::now() + Duration::days(ctx.config.auth.refresh_token_days as i64),
        )
        .await?;
    txn.commit().await?;

    Ok((
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            refresh_token_cookie(&refresh_token, ctx.config.auth.refresh_token_days),
        )],
        Json(json!({ "id": user.id, "email": user.email })),
    )
        .into_response())
}

/// `GET /auth/verify-email?token=...`: redirects to the frontend either
/// way; the error tag rides the query string.
pub async fn verify_email(
    State(ctx): State<AppContext>,
    Query(query): Query<VerifyEmailQuery>,
) -> RestResult<Redirect> {
    let error_redirect = |tag: &str| {
        Redirect::to(&format!(
            "{}/auth/verify-error?error={}",
            ctx.config.server.frontend_url, tag
        ))
    };

    let Some(claims) =
        validate_verification_token(&ctx.config.auth.jwt_signing_key, &query.token)
    else {
        return Ok(error_redirect("invalid_token"));
    };

    let txn = ctx.begin().await?;
    let tokens = TokenRepository::new(&txn);
    let Some(record) = tokens
        .find_verification_by_hash(&ctx.token_hasher.hash(&query.token))
        .await?
    else {
        return Ok(error_redirect("invalid_token"));
    };
    if record.used_at.is_some() {
        return Ok(error_redirect("token_already_used"));
    }
    if record.expires_at <= Utc::now() {
        return Ok(error_redirect("token_expired"));
    }

    tokens.mark_verification_used(record).await?;
    UserRepository::new(&txn)
        .mark_email_verified(claims.user_id)
        .await?;
    txn.commit().await?;

    Ok(Redirect::to(&format!(
        "{}/auth/verify-success",
        ctx.config.server.frontend_url
    )))
}

/// `POST /auth/token`: trade the refresh cookie for an access token,
/// optionally pinned to an `act_as`.
pub async fn token(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(request): Json<TokenRequest>,
) -> RestResult<Json<TokenResponse>> {
    let refresh_token = refresh_token_from_cookies(&headers)
        .ok_or_else(|| RestError::api(ErrorCode::TokenInvalid, "Missing refresh token"))?;

    let txn = ctx.begin().await?;
    let record = TokenRepository::new(&txn)
        .find_valid_refresh_token(&ctx.token_hasher.hash(&refresh_token))
        .await?
        .ok_or_else(|| RestError::api(ErrorCode::TokenInvalid, "Invalid refresh token"))?;

    let user = UserRepository::new(&txn)
        .find_by_id(record.user_id)
        .await?
        .filter(|user| user.deleted_at.is_none())
        .ok_or_else(|| RestError::api(ErrorCode::TokenInvalid, "Unknown user"))?;

    let token = ctx.issue_token(&txn, &user, request.act_as).await?;
    txn.commit().await?;
    Ok(Json(TokenResponse { token }))
}

/// `POST /auth/logout`: deletes only the presented refresh token.
pub async fn logout(State(ctx): State<AppContext>, headers: HeaderMap) -> RestResult<Response> {
    if let Some(refresh_token) = refresh_token_from_cookies(&headers) {
        let txn = ctx.begin().await?;
        TokenRepository::new(&txn)
            .delete_refresh_token(&ctx.token_hasher.hash(&refresh_token))
            .await?;
        txn.commit().await?;
    }
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_refresh_token_cookie())],
    )
        .into_response())
}

/// `GET /auth/me`: lax mode, no act_as required.
pub async fn me(State(ctx): State<AppContext>, headers: HeaderMap) -> RestResult<Json<ProfileResponse>> {
    let txn = ctx.begin().await?;
    let lax = ctx.lax_context(&txn, &headers).await?;
    let memberships = OrganizationRepository::new(&txn)
        .list_memberships_for_user(lax.user.id)
        .await?;
    txn.commit().await?;

    Ok(Json(ProfileResponse {
        id: lax.user.id,
        email: lax.user.email,
        name: lax.user.name,
        email_verified: lax.user.email_verified,
        organizations: memberships
            .into_iter()
            .map(|membership| ProfileMembership {
                organization_id: membership.organization_id,
                role: membership.role.into(),
            })
            .collect(),
    }))
}

/// `GET /auth/google/authorize`
pub async fn google_authorize(State(ctx): State<AppContext>) -> RestResult<Redirect> {
    if ctx.config.auth.google_client_id.is_empty() {
        return Err(RestError::api(ErrorCode::ValidationFailed, "Google login disabled"));
    }
    let redirect_uri = format!("{}/auth/google/callback", ctx.config.server.base_url);
    let url = format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope=openid%20email%20profile",
        GOOGLE_AUTHORIZE_URL,
        urlencoding::encode(&ctx.config.auth.google_client_id),
        urlencoding::encode(&redirect_uri),
    );
    Ok(Redirect::to(&url))
}

/// `GET /auth/google/callback`: exchanges the code, provisions a verified
/// google-provider user on first login and sets the refresh cookie.
pub async fn google_callback(
    State(ctx): State<AppContext>,
    Query(query): Query<GoogleCallbackQuery>,
) -> RestResult<Response> {
    let redirect_uri = format!("{}/auth/google/callback", ctx.config.server.base_url);

    let token_response: serde_json::Value = ctx
        .http
        .post(GOOGLE_TOKEN_URL)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", query.code.as_str()),
            ("client_id", ctx.config.auth.google_client_id.as_str()),
            ("client_secret", ctx.config.auth.google_client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|_| RestError::api(ErrorCode::Oauth2TokenExchangeFailed, "Google exchange failed"))?
        .json()
        .await
        .map_err(|_| RestError::api(ErrorCode::Oauth2TokenExchangeFailed, "Google exchange failed"))?;

    let access_token = token_response["access_token"]
        .as_str()
        .ok_or_else(|| RestError::api(ErrorCode::Oauth2TokenExchangeFailed, "Google exchange failed"))?;

    let userinfo: serde_json::Value = ctx
        .http
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|_| RestError::api(ErrorCode::Oauth2TokenExchangeFailed, "Google userinfo failed"))?
        .json()
        .await
        .map_err(|_| RestError::api(ErrorCode::Oauth2TokenExchangeFailed, "Google userinfo failed"))?;

    let email = userinfo["email"]
        .as_str()
        .ok_or_else(|| RestError::api(ErrorCode::Oauth2TokenExchangeFailed, "Google userinfo failed"))?
        .to_lowercase();
    let name = userinfo["name"].as_str().unwrap_or(&email).to_string();

    let txn = ctx.begin().await?;
    let users = UserRepository::new(&txn);
    let user = match users.find_by_email(&email).await? {
        Some(existing) => {
            if existing.deleted_at.is_some() {
                return Err(RestError::api(
                    ErrorCode::AccountDeletionInProgress,
                    "Account deletion in progress",
                ));
            }
            existing
        }
        None => {
            users
                .create(&email, &name, IdentityProvider::Google, None, true)
                .await?
        }
    };

    let (refresh_token, refresh_hash) = ctx.token_hasher.generate();
    TokenRepository::new(&txn)
        .create_refresh_token(
            user.id,
            &refresh_hash,
            Utc::now() + Duration::days(ctx.config.auth.refresh_token_days as i64),
        )
        .await?;
    txn.commit().await?;

    Ok((
        [(
            header::SET_COOKIE,
            refresh_token_cookie(&refresh_token, ctx.config.auth.refresh_token_days),
        )],
        Redirect::to(&ctx.config.server.frontend_url),
    )
        .into_response())
}

fn refresh_token_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "refresh_token")
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_token_extracted_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; refresh_token=tok-123; other=1".parse().unwrap(),
        );
        assert_eq!(refresh_token_from_cookies(&headers).as_deref(), Some("tok-123"));

        let empty = HeaderMap::new();
        assert_eq!(refresh_token_from_cookies(&empty), None);
    }
}
