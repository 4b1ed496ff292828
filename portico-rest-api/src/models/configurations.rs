//! MCP server configuration endpoint types

use chrono::{DateTime, Utc};
use portico_api_types::{AuthType, ConnectedAccountOwnership};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateConfigurationRequest {
    pub mcp_server_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub auth_type: AuthType,
    pub connected_account_ownership: ConnectedAccountOwnership,
    #[serde(default = "default_all_tools_enabled")]
    pub all_tools_enabled: bool,
    #[serde(default)]
    pub enabled_tools: Vec<Uuid>,
    #[serde(default)]
    pub allowed_teams: Vec<Uuid>,
}

fn default_all_tools_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateConfigurationRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub all_tools_enabled: Option<bool>,
    #[serde(default)]
    pub enabled_tools: Option<Vec<Uuid>>,
    #[serde(default)]
    pub allowed_teams: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize)]
pub struct ConfigurationResponse {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub mcp_server_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub auth_type: AuthType,
    pub connected_account_ownership: ConnectedAccountOwnership,
    pub all_tools_enabled: bool,
    pub enabled_tools: Vec<Uuid>,
    pub allowed_teams: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListConfigurationsQuery {
    #[serde(default)]
    pub mcp_server_id: Option<Uuid>,
}
