//! Authorization URL construction, code exchange and token refresh

use chrono::{Duration, Utc};
use portico_api_types::{OAuth2AuthConfig, OAuth2Credentials};
use serde::Deserialize;
use tracing::warn;

use crate::error::{OAuth2Error, OAuth2Result};
use crate::pkce::PkcePair;

/// Refresh when the access token is within this many seconds of expiry.
pub const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Fold a token response into stored credentials, keeping the previous
    /// refresh token when the provider does not rotate it.
    pub fn into_credentials(self, previous_refresh_token: Option<String>) -> OAuth2Credentials {
        OAuth2Credentials {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh_token),
            expires_at: self
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
            scope: self.scope,
        }
    }
}

#[derive(Clone)]
pub struct OAuth2Manager {
    http: reqwest::Client,
}

impl OAuth2Manager {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Build the authorization URL for the code+PKCE flow.
    pub fn authorization_url(
        config: &OAuth2AuthConfig,
        redirect_uri: &str,
        state: &str,
        pkce: &PkcePair,
    ) -> String {
        let mut url = format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&state={}&code_challenge={}&code_challenge_method=S256",
            config.authorize_url,
            urlencoding::encode(&config.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
            urlencoding::encode(&pkce.challenge),
        );
        if !config.scopes.is_empty() {
            url.push_str("&scope=");
            url.push_str(&urlencoding::encode(&config.scopes.join(" ")).into_owned());
        }
        url
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        config: &OAuth2AuthConfig,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> OAuth2Result<TokenResponse> {
        let mut form = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", redirect_uri.to_string()),
            ("code_verifier", code_verifier.to_string()),
            ("client_id", config.client_id.clone()),
        ];
        if config.token_endpoint_auth_method == "client_secret_post" {
            if let Some(secret) = &config.client_secret {
                form.push(("client_secret", secret.clone()));
            }
        }

        let mut request = self.http.post(&config.access_token_url).form(&form);
        if config.token_endpoint_auth_method == "client_secret_basic" {
            request = request.basic_auth(&config.client_id, config.client_secret.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OAuth2Error::TokenExchangeFailed(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }
        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuth2Error::TokenExchangeFailed(e.to_string()))
    }

    /// Refresh an access token. Failures surface as errors and never revoke
    /// the stored account.
    pub async fn refresh(
        &self,
        config: &OAuth2AuthConfig,
        credentials: &OAuth2Credentials,
    ) -> OAuth2Result<TokenResponse> {
        let Some(refresh_token) = &credentials.refresh_token else {
            return Err(OAuth2Error::RefreshFailed(
                "no refresh token stored for this account".to_string(),
            ));
        };

        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.clone()),
            ("client_id", config.client_id.clone()),
        ];
        if config.token_endpoint_auth_method == "client_secret_post" {
            if let Some(secret) = &config.client_secret {
                form.push(("client_secret", secret.clone()));
            }
        }

        let mut request = self.http.post(&config.refresh_token_url).form(&form);
        if config.token_endpoint_auth_method == "client_secret_basic" {
            request = request.basic_auth(&config.client_id, config.client_secret.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "oauth2 token refresh rejected");
            return Err(OAuth2Error::RefreshFailed(format!(
                "refresh endpoint returned {}: {}",
                status, body
            )));
        }
        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuth2Error::RefreshFailed(e.to_string()))
    }

    /// Whether stored credentials should be refreshed before use.
    pub fn needs_refresh(credentials: &OAuth2Credentials) -> bool {
        credentials.is_near_expiry(Utc::now(), REFRESH_MARGIN_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OAuth2AuthConfig {
        OAuth2AuthConfig {
            client_id: "client id".to_string(),
            client_secret: None,
            scopes: vec!["read".to_string(), "write".to_string()],
            authorize_url: "https://auth.example.com/authorize".to_string(),
            access_token_url: "https://auth.example.com/token".to_string(),
            refresh_token_url: "https://auth.example.com/token".to_string(),
            token_endpoint_auth_method: "none".to_string(),
            registration_url: None,
        }
    }

    #[test]
    fn authorization_url_carries_pkce_and_scopes() {
        let pkce = PkcePair::generate();
        let url = OAuth2Manager::authorization_url(
            &config(),
            "https://cp.example/callback",
            "signed-state",
            &pkce,
        );
        assert!(url.starts_with("https://auth.example.com/authorize?response_type=code"));
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&format!("code_challenge={}", pkce.challenge)));
        assert!(url.contains("scope=read%20write"));
    }

    #[test]
    fn token_response_keeps_previous_refresh_token() {
        let response = TokenResponse {
            access_token: "new-access".to_string(),
            refresh_token: None,
            expires_in: Some(3600),
            scope: None,
        };
        let creds = response.into_credentials(Some("old-refresh".to_string()));
        assert_eq!(creds.refresh_token.as_deref(), Some("old-refresh"));
        assert!(creds.expires_at.is_some());
    }

    #[test]
    fn refresh_without_stored_token_is_an_error() {
        let creds = OAuth2Credentials {
            access_token: "tok".to_string(),
            refresh_token: None,
            expires_at: Some(Utc::now()),
            scope: None,
        };
        assert!(OAuth2Manager::needs_refresh(&creds));
        // refresh() requires a refresh_token; verified via the error path in
        // the credentials store tests.
    }
}
