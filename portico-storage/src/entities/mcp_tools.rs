//! MCP tool entity
//!
//! `name` is the platform-unique `{SERVER}__{SANITIZED_CANONICAL}` form. The
//! canonical upstream name and the content hashes used by the catalog-sync
//! diff live in `tool_metadata`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mcp_tools")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub mcp_server_id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub description: String,
    /// JSON-schema object describing the tool input
    pub input_schema: Json,
    pub tool_metadata: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mcp_servers::Entity",
        from = "Column::McpServerId",
        to = "super::mcp_servers::Column::Id",
        on_delete = "Cascade"
    )]
    Server,
}

impl Related<super::mcp_servers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Server.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Canonical-name and content-hash metadata carried by every tool row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub canonical_tool_name: String,
    pub canonical_tool_description_hash: String,
    pub canonical_tool_input_schema_hash: String,
}

impl Model {
    pub fn tool_metadata(&self) -> Result<ToolMetadata, serde_json::Error> {
        serde_json::from_value(self.tool_metadata.clone())
    }
}
