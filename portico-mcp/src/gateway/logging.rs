//! Tool-call audit logging
//!
//! One row per `EXECUTE_TOOL` invocation. Writes are fire-and-forget inside
//! the request transaction: a storage failure is logged and swallowed so it
//! cannot flip the user-visible outcome, while a commit failure invalidates
//! the row together with everything else the request did.

use chrono::{DateTime, Utc};
use sea_orm::DatabaseTransaction;
use tracing::error;

use portico_storage::entities::{
    mcp_server_bundles, mcp_server_configurations, mcp_servers, mcp_sessions,
    mcp_tool_call_logs::ToolCallStatus, mcp_tools,
};
use portico_storage::repositories::tool_call_log_repository::NewToolCallLog;
use portico_storage::repositories::ToolCallLogRepository;

pub struct ToolCallRecord<'a> {
    pub bundle: &'a mcp_server_bundles::Model,
    pub session: &'a mcp_sessions::Model,
    pub server: Option<&'a mcp_servers::Model>,
    pub tool: Option<&'a mcp_tools::Model>,
    pub configuration: Option<&'a mcp_server_configurations::Model>,
    pub request_id: &'a str,
    pub arguments: Option<String>,
    pub jsonrpc_payload: serde_json::Value,
    pub result: serde_json::Value,
    pub success: bool,
    pub via_execute_tool: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Append one audit row. Failures are logged, never raised.
pub async fn record_tool_call(txn: &DatabaseTransaction, record: ToolCallRecord<'_>) {
    let log = NewToolCallLog {
        organization_id: record.bundle.organization_id,
        user_id: record.bundle.user_id,
        request_id: record.request_id.to_string(),
        session_id: record.session.id,
        bundle_id: record.bundle.id,
        bundle_name: record.bundle.name.clone(),
        mcp_server_id: record.server.map(|server| server.id),
        mcp_server_name: record.server.map(|server| server.name.clone()),
        mcp_tool_id: record.tool.map(|tool| tool.id),
        mcp_tool_name: record.tool.map(|tool| tool.name.clone()),
        mcp_server_configuration_id: record.configuration.map(|config| config.id),
        mcp_server_configuration_name: record.configuration.map(|config| config.name.clone()),
        arguments: record.arguments,
        result: record.result,
        status: if record.success {
            ToolCallStatus::Success
        } else {
            ToolCallStatus::Error
        },
        via_execute_tool: record.via_execute_tool,
        jsonrpc_payload: record.jsonrpc_payload,
        started_at: record.started_at,
        ended_at: record.ended_at,
    };

    if let Err(err) = ToolCallLogRepository::new(txn).append(log).await {
        error!(%err, "failed to append tool-call log row");
    }
}
