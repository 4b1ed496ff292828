//! Dynamic client registration (RFC 7591)

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{OAuth2Error, OAuth2Result};

/// Client credentials returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRegistration {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// POST the registration endpoint with our client metadata. Only 200/201
/// count as success.
pub async fn register_client(
    http: &reqwest::Client,
    registration_url: &str,
    client_name: &str,
    redirect_uri: &str,
    token_endpoint_auth_method: &str,
) -> OAuth2Result<ClientRegistration> {
    let response = http
        .post(registration_url)
        .json(&json!({
            "client_name": client_name,
            "redirect_uris": [redirect_uri],
            "grant_types": ["authorization_code", "refresh_token"],
            "response_types": ["code"],
            "token_endpoint_auth_method": token_endpoint_auth_method,
        }))
        .send()
        .await?;

    let status = response.status().as_u16();
    if status != 200 && status != 201 {
        let body = response.text().await.unwrap_or_default();
        return Err(OAuth2Error::RegistrationFailed(format!(
            "registration endpoint returned {}: {}",
            status, body
        )));
    }

    response
        .json::<ClientRegistration>()
        .await
        .map_err(|e| OAuth2Error::RegistrationFailed(format!("invalid registration response: {}", e)))
}
