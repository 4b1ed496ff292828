//! Tool-call log endpoints

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use portico_api_types::pagination::{CursorPage, LogCursor};
use portico_api_types::ErrorCode;

use portico_storage::repositories::tool_call_log_repository::{LogFilters, LogScope};
use portico_storage::repositories::ToolCallLogRepository;

use crate::context::AppContext;
use crate::errors::{RestError, RestResult};
use crate::models::logs::{ToolCallLogQuery, ToolCallLogResponse};
use crate::services::entitlement::get_organization_entitlement;

/// `GET /logs/tool-calls`: cursor-paginated; members see their own rows,
/// admins the whole organization. Retention is applied at query time.
pub async fn list_tool_call_logs(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Query(query): Query<ToolCallLogQuery>,
) -> RestResult<Json<CursorPage<ToolCallLogResponse>>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let cursor = match &query.cursor {
        Some(cursor) => Some(
            LogCursor::decode(cursor)
                .map_err(|_| RestError::api(ErrorCode::ValidationFailed, "Invalid cursor"))?,
        ),
        None => None,
    };
    let limit = portico_api_types::CursorPaginationParams {
        cursor: None,
        limit: query.limit,
    }
    .effective_limit();

    let scope = if context.is_admin() {
        LogScope::Organization(context.organization_id())
    } else {
        LogScope::User(context.user.id)
    };
    let filters = LogFilters {
        mcp_tool_name: query.mcp_tool_name.clone(),
        start_time: query.start_time,
        end_time: query.end_time,
    };

    let entitlement = get_organization_entitlement(&txn, context.organization_id()).await?;
    let retention_days = entitlement.log_retention_days.map(i64::from);

    let (rows, next_cursor) = ToolCallLogRepository::new(&txn)
        .paginate(scope, &filters, cursor, limit, retention_days)
        .await?;
    txn.commit().await?;

    Ok(Json(CursorPage {
        data: rows
            .into_iter()
            .map(|row| ToolCallLogResponse {
                id: row.id,
                organization_id: row.organization_id,
                user_id: row.user_id,
                request_id: row.request_id,
                session_id: row.session_id,
                bundle_id: row.bundle_id,
                bundle_name: row.bundle_name,
                mcp_server_id: row.mcp_server_id,
                mcp_server_name: row.mcp_server_name,
                mcp_tool_id: row.mcp_tool_id,
                mcp_tool_name: row.mcp_tool_name,
                mcp_server_configuration_id: row.mcp_server_configuration_id,
                mcp_server_configuration_name: row.mcp_server_configuration_name,
                arguments: row.arguments,
                result: row.result,
                status: row.status.into(),
                via_execute_tool: row.via_execute_tool,
                started_at: row.started_at,
                ended_at: row.ended_at,
                duration_ms: row.duration_ms,
            })
            .collect(),
        next_cursor: next_cursor.map(|cursor| cursor.encode()),
    }))
}
