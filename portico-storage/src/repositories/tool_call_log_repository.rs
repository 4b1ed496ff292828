//! Tool-call log repository
//!
//! Append-only writes plus keyset pagination. The page query fetches
//! `limit + 1` rows; the caller derives the next cursor from the overflow
//! row. Retention is enforced here with a query-time cutoff.

use chrono::{DateTime, Duration, Utc};
use portico_api_types::pagination::LogCursor;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::{mcp_tool_call_logs, McpToolCallLogs};
use crate::error::StorageResult;

pub struct ToolCallLogRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

/// Everything a log row denormalizes. Assembled by the gateway at call time.
pub struct NewToolCallLog {
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
    pub status: mcp_tool_call_logs::ToolCallStatus,
    pub via_execute_tool: bool,
    pub jsonrpc_payload: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct LogFilters {
    /// Case-insensitive substring match on the platform tool name
    pub mcp_tool_name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
pub enum LogScope {
    Organization(Uuid),
    User(Uuid),
}

impl<'a, C: ConnectionTrait> ToolCallLogRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn append(&self, log: NewToolCallLog) -> StorageResult<mcp_tool_call_logs::Model> {
        let duration_ms = (log.ended_at - log.started_at).num_milliseconds();
        Ok(mcp_tool_call_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(log.organization_id),
            user_id: Set(log.user_id),
            request_id: Set(log.request_id),
            session_id: Set(log.session_id),
            bundle_id: Set(log.bundle_id),
            bundle_name: Set(log.bundle_name),
            mcp_server_id: Set(log.mcp_server_id),
            mcp_server_name: Set(log.mcp_server_name),
            mcp_tool_id: Set(log.mcp_tool_id),
            mcp_tool_name: Set(log.mcp_tool_name),
            mcp_server_configuration_id: Set(log.mcp_server_configuration_id),
            mcp_server_configuration_name: Set(log.mcp_server_configuration_name),
            arguments: Set(log.arguments),
            result: Set(log.result),
            status: Set(log.status),
            via_execute_tool: Set(log.via_execute_tool),
            jsonrpc_payload: Set(log.jsonrpc_payload),
            started_at: Set(log.started_at),
            ended_at: Set(log.ended_at),
            duration_ms: Set(duration_ms),
            created_at: Set(Utc::now()),
        }
        .insert(self.db)
        .await?)
    }

    /// One page in `(started_at DESC, id DESC)` order. Returns the page rows
    /// and the cursor of the next page, if one exists.
    ///
    /// `retention_days = None` means unlimited retention.
    pub async fn paginate(
        &self,
        scope: LogScope,
        filters: &LogFilters,
        cursor: Option<LogCursor>,
        limit: u64,
        retention_days: Option<i64>,
    ) -> StorageResult<(Vec<mcp_tool_call_logs::Model>, Option<LogCursor>)> {
        let mut query = McpToolCallLogs::find();

        query = match scope {
            LogScope::Organization(org_id) => {
                query.filter(mcp_tool_call_logs::Column::OrganizationId.eq(org_id))
            }
            LogScope::User(user_id) => query.filter(mcp_tool_call_logs::Column::UserId.eq(user_id)),
        };

        if let Some(name) = &filters.mcp_tool_name {
            let escaped = name.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
            query = query.filter(
                Expr::col(mcp_tool_call_logs::Column::McpToolName)
                    .ilike(format!("%{}%", escaped)),
            );
        }
        if let Some(start) = filters.start_time {
            query = query.filter(mcp_tool_call_logs::Column::StartedAt.gte(start));
        }
        if let Some(end) = filters.end_time {
            query = query.filter(mcp_tool_call_logs::Column::StartedAt.lte(end));
        }

        if let Some(days) = retention_days {
            let cutoff = Utc::now() - Duration::days(days);
            query = query.filter(mcp_tool_call_logs::Column::StartedAt.gte(cutoff));
        }

        // Strict keyset predicate: rows after the cursor in DESC order
        if let Some(cursor) = cursor {
            query = query.filter(
                Condition::any()
                    .add(mcp_tool_call_logs::Column::StartedAt.lt(cursor.started_at))
                    .add(
                        Condition::all()
                            .add(mcp_tool_call_logs::Column::StartedAt.eq(cursor.started_at))
                            .add(mcp_tool_call_logs::Column::Id.lt(cursor.id)),
                    ),
            );
        }

        let mut rows = query
            .order_by_desc(mcp_tool_call_logs::Column::StartedAt)
            .order_by_desc(mcp_tool_call_logs::Column::Id)
            .limit(limit + 1)
            .all(self.db)
            .await?;

        let next_cursor = if rows.len() as u64 > limit {
            rows.truncate(limit as usize);
            rows.last()
                .map(|row| LogCursor::new(row.started_at, row.id))
        } else {
            None
        };

        Ok((rows, next_cursor))
    }
}
