//! Tool-call log endpoint types

use chrono::{DateTime, Utc};
use portico_api_types::ToolCallStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ToolCallLogQuery {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub mcp_tool_name: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ToolCallLogResponse {
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
    pub arguments: Option<String>,
    pub result: serde_json::Value,
    pub status: ToolCallStatus,
    pub via_execute_tool: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: i64,
}
