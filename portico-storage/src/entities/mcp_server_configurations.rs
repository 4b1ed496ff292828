//! MCP server configuration entity
//!
//! Invariants enforced around this table:
//! - `auth_type` must be one of the server's `auth_configs` variants
//! - `all_tools_enabled = true` implies `enabled_tools` is empty
//! - at most one configuration with `operational` ownership per server
//!   (partial unique index)

use sea_orm::entity::prelude::*;
use sea_query::StringLen;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mcp_server_configurations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub mcp_server_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub auth_type: super::mcp_servers::AuthType,
    pub connected_account_ownership: ConnectedAccountOwnership,
    pub all_tools_enabled: bool,
    /// Explicit tool-id whitelist, JSON array of UUIDs; empty when
    /// `all_tools_enabled`
    pub enabled_tools: Json,
    /// Team ids allowed to use this configuration, JSON array of UUIDs
    pub allowed_teams: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id",
        on_delete = "Cascade"
    )]
    Organization,
    #[sea_orm(
        belongs_to = "super::mcp_servers::Entity",
        from = "Column::McpServerId",
        to = "super::mcp_servers::Column::Id",
        on_delete = "Cascade"
    )]
    Server,
    #[sea_orm(has_many = "super::connected_accounts::Entity")]
    ConnectedAccounts,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::mcp_servers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Server.def()
    }
}

impl Related<super::connected_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConnectedAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn enabled_tools(&self) -> Vec<Uuid> {
        serde_json::from_value(self.enabled_tools.clone()).unwrap_or_default()
    }

    pub fn allowed_teams(&self) -> Vec<Uuid> {
        serde_json::from_value(self.allowed_teams.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ConnectedAccountOwnership {
    #[sea_orm(string_value = "individual")]
    Individual,
    #[sea_orm(string_value = "shared")]
    Shared,
    #[sea_orm(string_value = "operational")]
    Operational,
}

impl From<ConnectedAccountOwnership> for portico_api_types::ConnectedAccountOwnership {
    fn from(value: ConnectedAccountOwnership) -> Self {
        match value {
            ConnectedAccountOwnership::Individual => {
                portico_api_types::ConnectedAccountOwnership::Individual
            }
            ConnectedAccountOwnership::Shared => portico_api_types::ConnectedAccountOwnership::Shared,
            ConnectedAccountOwnership::Operational => {
                portico_api_types::ConnectedAccountOwnership::Operational
            }
        }
    }
}

impl From<portico_api_types::ConnectedAccountOwnership> for ConnectedAccountOwnership {
    fn from(value: portico_api_types::ConnectedAccountOwnership) -> Self {
        match value {
            portico_api_types::ConnectedAccountOwnership::Individual => {
                ConnectedAccountOwnership::Individual
            }
            portico_api_types::ConnectedAccountOwnership::Shared => ConnectedAccountOwnership::Shared,
            portico_api_types::ConnectedAccountOwnership::Operational => {
                ConnectedAccountOwnership::Operational
            }
        }
    }
}
