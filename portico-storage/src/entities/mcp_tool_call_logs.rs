//! Tool-call audit log entity
//!
//! Append-only and deliberately free of foreign keys: rows must survive
//! deletion of every entity they name, so ids and names are denormalized.

use sea_orm::entity::prelude::*;
use sea_query::StringLen;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mcp_tool_call_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub request_id: String,
    pub session_id: Uuid,
    pub bundle_id: Uuid,
    pub bundle_name: String,
    pub mcp_server_id: Option<Uuid>,
    pub mcp_server_name: Option<String>,
    pub mcp_tool_id: Option<Uuid>,
    pub mcp_tool_name: Option<String>,
    pub mcp_server_configuration_id: Option<Uuid>,
    pub mcp_server_configuration_name: Option<String>,
    /// Raw argument text exactly as received (LLMs send non-JSON)
    pub arguments: Option<String>,
    pub result: Json,
    pub status: ToolCallStatus,
    pub via_execute_tool: bool,
    pub jsonrpc_payload: Json,
    pub started_at: DateTimeUtc,
    pub ended_at: DateTimeUtc,
    pub duration_ms: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum ToolCallStatus {
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "error")]
    Error,
}

impl From<ToolCallStatus> for portico_api_types::ToolCallStatus {
    fn from(value: ToolCallStatus) -> Self {
        match value {
            ToolCallStatus::Success => portico_api_types::ToolCallStatus::Success,
            ToolCallStatus::Error => portico_api_types::ToolCallStatus::Error,
        }
    }
}

impl From<portico_api_types::ToolCallStatus> for ToolCallStatus {
    fn from(value: portico_api_types::ToolCallStatus) -> Self {
        match value {
            portico_api_types::ToolCallStatus::Success => ToolCallStatus::Success,
            portico_api_types::ToolCallStatus::Error => ToolCallStatus::Error,
        }
    }
}
