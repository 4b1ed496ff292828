//! Tool catalog sync
//!
//! Connects to an upstream MCP server with its operational credentials,
//! lists tools, diffs against the stored catalog and applies the result in
//! the caller's transaction. Embeddings are recomputed only for tools whose
//! embedding-relevant content changed.

use chrono::{Duration, Utc};
use portico_http::EmbeddingClient;
use portico_oauth2::OAuth2Manager;
use sea_orm::ConnectionTrait;
use tracing::{info, warn};
use uuid::Uuid;

use portico_api_types::AuthConfig;
use portico_storage::entities::mcp_servers;
use portico_storage::repositories::mcp_tool_repository::ToolUpsert;
use portico_storage::repositories::{ConfigurationRepository, McpServerRepository, McpToolRepository};

use crate::client::{UpstreamClient, UpstreamTarget};
use crate::credentials::CredentialsStore;
use crate::error::{GatewayError, GatewayResult};
use crate::tool_utils::{diff_tools, platform_tool_name, tool_metadata};

/// Counts of the applied diff, returned to the admin caller.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SyncOutcome {
    pub created: usize,
    pub deleted: usize,
    pub embedding_updated: usize,
    pub metadata_updated: usize,
    pub unchanged: usize,
}

/// Run a catalog sync for one server. Must be called inside a transaction;
/// the advisory lock and all writes share it.
pub async fn sync_tool_catalog<C: ConnectionTrait>(
    db: &C,
    upstream: &UpstreamClient,
    oauth2: &OAuth2Manager,
    embeddings: &EmbeddingClient,
    mcp_server_id: Uuid,
    min_interval_seconds: i64,
) -> GatewayResult<SyncOutcome> {
    let servers = McpServerRepository::new(db);
    let server = servers
        .find_by_id(mcp_server_id)
        .await?
        .ok_or_else(|| GatewayError::Storage(portico_storage::StorageError::not_found(
            "MCPServer",
            mcp_server_id,
        )))?;

    // A concurrent sync holds the lock; surface the same 429 as the rate
    // limit rather than queueing behind it.
    if !servers.try_advisory_lock(server.id).await? {
        return Err(GatewayError::SyncTooFrequent);
    }

    if let Some(last_synced_at) = server.last_synced_at {
        if Utc::now() - last_synced_at < Duration::seconds(min_interval_seconds) {
            return Err(GatewayError::SyncTooFrequent);
        }
    }

    // Operational configuration + account are required to talk upstream
    let configuration = ConfigurationRepository::new(db)
        .find_operational_by_server(server.id)
        .await?
        .ok_or(GatewayError::OperationalAccountMissing)?;

    // Operational accounts are singletons; the acting user is irrelevant
    let credentials_store = CredentialsStore::new(db, oauth2);
    let (_account, credentials) = credentials_store
        .get_auth_credentials(&server, &configuration, Uuid::nil())
        .await
        .map_err(|err| match err {
            GatewayError::CredentialsNotFound => GatewayError::OperationalAccountMissing,
            other => other,
        })?;

    let mut target = UpstreamTarget {
        url: server.url.clone(),
        credentials,
        api_key_location: api_key_location(&server)?,
        session_id: None,
    };
    target.session_id = upstream.initialize(&target).await?;

    let upstream_tools = upstream.list_all_tools(&target).await?;
    info!(server = %server.name, count = upstream_tools.len(), "fetched upstream tool listing");

    // Build the desired catalog, skipping tools whose names collapse to
    // nothing under sanitization.
    let mut desired: Vec<ToolUpsert> = Vec::with_capacity(upstream_tools.len());
    for tool in upstream_tools {
        let name = match platform_tool_name(&server.name, &tool.name) {
            Ok(name) => name,
            Err(err) => {
                warn!(server = %server.name, tool = %tool.name, %err, "skipping unsanitizable tool");
                continue;
            }
        };
        desired.push(ToolUpsert {
            name,
            description: tool.description.clone(),
            input_schema: tool.input_schema.clone(),
            metadata: tool_metadata(&tool.name, &tool.description, &tool.input_schema),
        });
    }

    let tools_repo = McpToolRepository::new(db);
    let existing = tools_repo.list_by_server(server.id).await?;
    let mut existing_by_name = std::collections::HashMap::new();
    let mut old_upserts = Vec::with_capacity(existing.len());
    for model in existing {
        let metadata = model.tool_metadata().map_err(|err| {
            GatewayError::Internal(format!("stored tool metadata malformed: {}", err))
        })?;
        old_upserts.push(ToolUpsert {
            name: model.name.clone(),
            description: model.description.clone(),
            input_schema: model.input_schema.clone(),
            metadata,
        });
        existing_by_name.insert(model.name.clone(), model);
    }

    let diff = diff_tools(&old_upserts, desired);

    for tool in &diff.to_create {
        let embedding = embeddings
            .embed(&EmbeddingClient::tool_embedding_input(&tool.name, &tool.description))
            .await
            .map_err(GatewayError::Embedding)?;
        tools_repo.create(server.id, tool, &embedding).await?;
    }

    for tool in &diff.embedding_updated {
        let model = existing_by_name
            .get(&tool.name)
            .cloned()
            .ok_or_else(|| GatewayError::Internal("diff referenced unknown tool".to_string()))?;
        let embedding = embeddings
            .embed(&EmbeddingClient::tool_embedding_input(&tool.name, &tool.description))
            .await
            .map_err(GatewayError::Embedding)?;
        tools_repo.update_with_embedding(model, tool, &embedding).await?;
    }

    for tool in &diff.metadata_updated {
        let model = existing_by_name
            .get(&tool.name)
            .cloned()
            .ok_or_else(|| GatewayError::Internal("diff referenced unknown tool".to_string()))?;
        tools_repo.update_metadata(model, tool).await?;
    }

    let deleted = tools_repo.delete_by_names(server.id, &diff.to_delete).await?;

    servers.touch_last_synced(server.id, Utc::now()).await?;

    Ok(SyncOutcome {
        created: diff.to_create.len(),
        deleted: deleted as usize,
        embedding_updated: diff.embedding_updated.len(),
        metadata_updated: diff.metadata_updated.len(),
        unchanged: diff.unchanged.len(),
    })
}

/// The api-key injection point from the server's auth configs, if the
/// server has an api_key variant.
pub fn api_key_location(
    server: &mcp_servers::Model,
) -> GatewayResult<Option<(portico_api_types::HttpLocation, String)>> {
    let configs = server
        .auth_configs()
        .map_err(|err| GatewayError::Internal(format!("stored auth configs malformed: {}", err)))?;
    Ok(configs.into_iter().find_map(|config| match config {
        AuthConfig::ApiKey { location, name } => Some((location, name)),
        _ => None,
    }))
}
