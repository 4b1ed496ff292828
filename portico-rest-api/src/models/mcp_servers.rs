//! MCP server endpoint types

use chrono::{DateTime, Utc};
use portico_api_types::{AuthConfig, AuthType, McpServerTransport};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateCustomServerRequest {
    pub name: String,
    pub url: String,
    pub transport: McpServerTransport,
    pub description: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub auth_configs: Vec<AuthConfig>,
    /// Must name one of the variants in `auth_configs`
    pub operational_account_auth_type: AuthType,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServerRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ServerResponse {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub transport: McpServerTransport,
    pub description: String,
    pub logo: String,
    pub categories: Vec<String>,
    pub organization_id: Option<Uuid>,
    pub supported_auth_types: Vec<AuthType>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ToolSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ServerDetailResponse {
    #[serde(flatten)]
    pub server: ServerResponse,
    pub tools: Vec<ToolSummary>,
}

#[derive(Debug, Deserialize)]
pub struct OAuth2DiscoveryRequest {
    pub mcp_server_url: String,
}

#[derive(Debug, Serialize)]
pub struct OAuth2DiscoveryResponse {
    pub authorize_url: Option<String>,
    pub access_token_url: Option<String>,
    pub refresh_token_url: Option<String>,
    pub registration_url: Option<String>,
    pub token_endpoint_auth_method_supported: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct OAuth2DcrRequest {
    pub mcp_server_url: String,
    pub registration_url: String,
    #[serde(default)]
    pub token_endpoint_auth_method_supported: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct OAuth2DcrResponse {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}
