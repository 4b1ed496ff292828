//! Gateway session repository
//!
//! Sessions expire after an idle TTL; an expired session is lazily
//! soft-deleted when next touched and treated as missing by the gateway.

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::entities::{mcp_sessions, McpSessions};
use crate::error::{StorageError, StorageResult};

pub struct SessionRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> SessionRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(&self, bundle_id: Uuid) -> StorageResult<mcp_sessions::Model> {
        let now = Utc::now();
        Ok(mcp_sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            bundle_id: Set(bundle_id),
            external_mcp_sessions: Set(serde_json::json!({})),
            deleted: Set(false),
            last_accessed_at: Set(now),
            created_at: Set(now),
        }
        .insert(self.db)
        .await?)
    }

    /// Find a live session and touch `last_accessed_at`. Returns `None` for
    /// unknown, deleted or idle-expired sessions; an expired one is marked
    /// deleted on the way out.
    pub async fn find_active_and_touch(
        &self,
        session_id: Uuid,
        idle_ttl_seconds: i64,
    ) -> StorageResult<Option<mcp_sessions::Model>> {
        let Some(session) = McpSessions::find_by_id(session_id).one(self.db).await? else {
            return Ok(None);
        };
        if session.deleted {
            return Ok(None);
        }

        let now = Utc::now();
        if now - session.last_accessed_at > Duration::seconds(idle_ttl_seconds) {
            let mut active: mcp_sessions::ActiveModel = session.into();
            active.deleted = Set(true);
            active.update(self.db).await?;
            return Ok(None);
        }

        let mut active: mcp_sessions::ActiveModel = session.clone().into();
        active.last_accessed_at = Set(now);
        let touched = active.update(self.db).await?;
        Ok(Some(touched))
    }

    /// Record the upstream session id negotiated for one MCP server.
    pub async fn set_external_session(
        &self,
        session: mcp_sessions::Model,
        mcp_server_id: Uuid,
        external_session_id: &str,
    ) -> StorageResult<mcp_sessions::Model> {
        let mut sessions = session.external_sessions();
        sessions.insert(mcp_server_id, external_session_id.to_string());
        let mut active: mcp_sessions::ActiveModel = session.into();
        active.external_mcp_sessions = Set(serde_json::to_value(&sessions)
            .map_err(|e| StorageError::corrupt(e.to_string()))?);
        Ok(active.update(self.db).await?)
    }

    /// Drop a stale upstream session id so the next call re-initializes.
    pub async fn clear_external_session(
        &self,
        session: mcp_sessions::Model,
        mcp_server_id: Uuid,
    ) -> StorageResult<mcp_sessions::Model> {
        let mut sessions = session.external_sessions();
        sessions.remove(&mcp_server_id);
        let mut active: mcp_sessions::ActiveModel = session.into();
        active.external_mcp_sessions = Set(serde_json::to_value(&sessions)
            .map_err(|e| StorageError::corrupt(e.to_string()))?);
        Ok(active.update(self.db).await?)
    }
}
