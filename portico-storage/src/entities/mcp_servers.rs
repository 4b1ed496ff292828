//! MCP server entity
//!
//! `organization_id = NULL` marks a public server; custom servers belong to
//! one org. The `embedding` pgvector column is intentionally not mapped here
//! (see the repository layer).

use sea_orm::entity::prelude::*;
use sea_query::StringLen;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mcp_servers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Canonical name: upper snake-case, no adjacent underscores, unique
    #[sea_orm(unique)]
    pub name: String,
    pub url: String,
    pub transport: McpServerTransport,
    pub description: String,
    pub logo: String,
    /// Category tags, stored as a JSON array of strings
    pub categories: Json,
    /// Ordered list of auth-config variants (tagged JSON)
    pub auth_configs: Json,
    pub organization_id: Option<Uuid>,
    /// Monotonic; bumped by every completed catalog sync
    pub last_synced_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::mcp_tools::Entity")]
    Tools,
    #[sea_orm(has_many = "super::mcp_server_configurations::Entity")]
    Configurations,
}

impl Related<super::mcp_tools::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tools.def()
    }
}

impl Related<super::mcp_server_configurations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Configurations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_public(&self) -> bool {
        self.organization_id.is_none()
    }

    /// Deserialize the stored auth-config variants.
    pub fn auth_configs(&self) -> Result<Vec<portico_api_types::AuthConfig>, serde_json::Error> {
        serde_json::from_value(self.auth_configs.clone())
    }

    pub fn categories(&self) -> Vec<String> {
        serde_json::from_value(self.categories.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum McpServerTransport {
    #[sea_orm(string_value = "streamable_http")]
    StreamableHttp,
    #[sea_orm(string_value = "sse")]
    Sse,
}

impl From<McpServerTransport> for portico_api_types::McpServerTransport {
    fn from(value: McpServerTransport) -> Self {
        match value {
            McpServerTransport::StreamableHttp => portico_api_types::McpServerTransport::StreamableHttp,
            McpServerTransport::Sse => portico_api_types::McpServerTransport::Sse,
        }
    }
}

impl From<portico_api_types::McpServerTransport> for McpServerTransport {
    fn from(value: portico_api_types::McpServerTransport) -> Self {
        match value {
            portico_api_types::McpServerTransport::StreamableHttp => McpServerTransport::StreamableHttp,
            portico_api_types::McpServerTransport::Sse => McpServerTransport::Sse,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum AuthType {
    #[sea_orm(string_value = "no_auth")]
    NoAuth,
    #[sea_orm(string_value = "api_key")]
    ApiKey,
    #[sea_orm(string_value = "oauth2")]
    Oauth2,
}

impl From<AuthType> for portico_api_types::AuthType {
    fn from(value: AuthType) -> Self {
        match value {
            AuthType::NoAuth => portico_api_types::AuthType::NoAuth,
            AuthType::ApiKey => portico_api_types::AuthType::ApiKey,
            AuthType::Oauth2 => portico_api_types::AuthType::Oauth2,
        }
    }
}

impl From<portico_api_types::AuthType> for AuthType {
    fn from(value: portico_api_types::AuthType) -> Self {
        match value {
            portico_api_types::AuthType::NoAuth => AuthType::NoAuth,
            portico_api_types::AuthType::ApiKey => AuthType::ApiKey,
            portico_api_types::AuthType::Oauth2 => AuthType::Oauth2,
        }
    }
}
