//! Connected account and ops account endpoint types

use chrono::{DateTime, Utc};
use portico_api_types::ConnectedAccountOwnership;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Create request, discriminated by the configuration's auth type. The
/// `api_key` field is required for api-key configurations; OAuth2 creates
/// return an authorization URL instead of a finished account.
#[derive(Debug, Deserialize)]
pub struct CreateConnectedAccountRequest {
    pub mcp_server_configuration_id: Uuid,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub redirect_url_after_account_creation: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CreateConnectedAccountResponse {
    Created(ConnectedAccountResponse),
    OAuth2Redirect { authorization_url: String },
}

#[derive(Debug, Serialize)]
pub struct ConnectedAccountResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mcp_server_configuration_id: Uuid,
    pub ownership: ConnectedAccountOwnership,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct OAuth2CallbackQuery {
    pub code: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateOpsAccountRequest {
    pub mcp_server_id: Uuid,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListOpsAccountsQuery {
    #[serde(default)]
    pub mcp_server_id: Option<Uuid>,
}
