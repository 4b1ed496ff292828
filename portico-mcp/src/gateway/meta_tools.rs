//! The two meta-tools every bundle exposes
//!
//! `SEARCH_TOOLS` enumerates and ranks the tools the caller can reach
//! through the bundle; `EXECUTE_TOOL` proxies one call to the owning
//! upstream server. Everything else an agent sees goes through these two.

use chrono::Utc;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

use portico_api_types::pagination::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use portico_rbac::access::check_configuration_accessibility;
use portico_storage::entities::{
    mcp_server_bundles, mcp_server_configurations, mcp_sessions, mcp_tools,
};
use portico_storage::repositories::{
    ConfigurationRepository, McpServerRepository, McpToolRepository, SessionRepository,
};

use crate::client::UpstreamTarget;
use crate::credentials::CredentialsStore;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{logging, GatewayState};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::sync::api_key_location;

pub const SEARCH_TOOLS_NAME: &str = "SEARCH_TOOLS";
pub const EXECUTE_TOOL_NAME: &str = "EXECUTE_TOOL";

/// Static definitions served from `tools/list`.
pub fn meta_tool_definitions() -> Value {
    json!([
        {
            "name": SEARCH_TOOLS_NAME,
            "description": "Search the tools available through this endpoint. \
                Provide an intent to rank results by relevance; omit it for an \
                alphabetical listing.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "intent": {
                        "type": "string",
                        "description": "Natural-language description of what you want to do"
                    },
                    "mcp_server_ids": {
                        "type": "array",
                        "items": {"type": "string", "format": "uuid"},
                        "description": "Restrict results to these MCP servers"
                    },
                    "limit": {"type": "integer", "default": 20, "maximum": 100},
                    "offset": {"type": "integer", "default": 0}
                }
            }
        },
        {
            "name": EXECUTE_TOOL_NAME,
            "description": "Execute a tool previously discovered via SEARCH_TOOLS.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "tool_name": {"type": "string"},
                    "arguments": {"type": "object"}
                },
                "required": ["tool_name"]
            }
        }
    ])
}

#[derive(Debug, Default, Deserialize)]
struct SearchToolsArgs {
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    mcp_server_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    limit: Option<u64>,
    #[serde(default)]
    offset: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ExecuteToolArgs {
    tool_name: String,
    #[serde(default)]
    arguments: Value,
}

/// The set of tool ids visible to the bundle owner, with the configuration
/// that exposes each (first exposing configuration in bundle order wins).
async fn accessible_tools(
    txn: &DatabaseTransaction,
    bundle: &mcp_server_bundles::Model,
) -> GatewayResult<HashMap<Uuid, mcp_server_configurations::Model>> {
    let configurations = ConfigurationRepository::new(txn)
        .find_by_ids(&bundle.configuration_ids())
        .await?;
    let by_id: HashMap<Uuid, _> = configurations
        .into_iter()
        .map(|config| (config.id, config))
        .collect();

    let mut exposed: HashMap<Uuid, mcp_server_configurations::Model> = HashMap::new();

    // Preserve bundle order so the first exposing configuration wins
    for config_id in bundle.configuration_ids() {
        let Some(config) = by_id.get(&config_id) else {
            continue;
        };
        if !check_configuration_accessibility(txn, bundle.user_id, config)
            .await
            .map_err(|err| GatewayError::Internal(err.to_string()))?
        {
            debug!(configuration_id = %config.id, "bundle owner lost access, skipping");
            continue;
        }

        let tool_ids: Vec<Uuid> = if config.all_tools_enabled {
            McpToolRepository::new(txn)
                .list_by_server(config.mcp_server_id)
                .await?
                .into_iter()
                .map(|tool| tool.id)
                .collect()
        } else {
            config.enabled_tools()
        };

        for tool_id in tool_ids {
            exposed.entry(tool_id).or_insert_with(|| config.clone());
        }
    }

    Ok(exposed)
}

/// `SEARCH_TOOLS` implementation.
pub async fn handle_search_tools(
    state: &GatewayState,
    txn: &DatabaseTransaction,
    bundle: &mcp_server_bundles::Model,
    arguments: &Value,
) -> GatewayResult<Value> {
    let args: SearchToolsArgs = if arguments.is_null() {
        SearchToolsArgs::default()
    } else {
        serde_json::from_value(arguments.clone())
            .map_err(|err| GatewayError::InvalidParams(err.to_string()))?
    };
    let limit = args.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let offset = args.offset.unwrap_or(0);

    let exposed = accessible_tools(txn, bundle).await?;

    // Optional server filter applies before ranking
    let candidate_ids: Vec<Uuid> = match &args.mcp_server_ids {
        Some(server_ids) => {
            let allowed: HashSet<Uuid> = server_ids.iter().copied().collect();
            exposed
                .iter()
                .filter(|(_, config)| allowed.contains(&config.mcp_server_id))
                .map(|(tool_id, _)| *tool_id)
                .collect()
        }
        None => exposed.keys().copied().collect(),
    };

    let tools_repo = McpToolRepository::new(txn);
    let page: Vec<mcp_tools::Model> = match &args.intent {
        Some(intent) if !intent.trim().is_empty() => {
            let embedding = state
                .embeddings
                .embed(intent)
                .await
                .map_err(GatewayError::Embedding)?;
            let ranked_ids = tools_repo
                .rank_by_similarity(&candidate_ids, &embedding, limit, offset)
                .await?;
            let mut models: HashMap<Uuid, mcp_tools::Model> = tools_repo
                .find_by_ids(&ranked_ids)
                .await?
                .into_iter()
                .map(|tool| (tool.id, tool))
                .collect();
            ranked_ids
                .iter()
                .filter_map(|id| models.remove(id))
                .collect()
        }
        _ => tools_repo.page_by_name(&candidate_ids, limit, offset).await?,
    };

    // The meta-tools themselves never appear in results
    let listing: Vec<Value> = page
        .into_iter()
        .filter(|tool| tool.name != SEARCH_TOOLS_NAME && tool.name != EXECUTE_TOOL_NAME)
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.input_schema,
                "mcp_server_id": tool.mcp_server_id,
            })
        })
        .collect();

    Ok(json!({
        "content": [{
            "type": "text",
            "text": serde_json::to_string(&listing).expect("listing serializes"),
        }]
    }))
}

/// `EXECUTE_TOOL` implementation. Returns the full JSON-RPC response so
/// upstream errors pass through verbatim.
#[allow(clippy::too_many_arguments)]
pub async fn handle_execute_tool(
    state: &GatewayState,
    txn: &DatabaseTransaction,
    bundle: &mcp_server_bundles::Model,
    session: &mcp_sessions::Model,
    request: &JsonRpcRequest,
    arguments: &Value,
    request_id: &str,
) -> GatewayResult<JsonRpcResponse> {
    let args: ExecuteToolArgs = serde_json::from_value(arguments.clone())
        .map_err(|err| GatewayError::InvalidParams(err.to_string()))?;

    // Resolve the platform name inside the accessible set
    let tool = McpToolRepository::new(txn)
        .find_by_name(&args.tool_name)
        .await?
        .ok_or(GatewayError::ToolNotFoundOrForbidden)?;

    let exposed = accessible_tools(txn, bundle).await?;
    let configuration = exposed
        .get(&tool.id)
        .cloned()
        .ok_or(GatewayError::ToolNotFoundOrForbidden)?;

    let server = McpServerRepository::new(txn)
        .get_by_id(tool.mcp_server_id)
        .await?;

    let metadata = tool
        .tool_metadata()
        .map_err(|err| GatewayError::Internal(format!("stored tool metadata malformed: {}", err)))?;

    // Credentials honor the configuration's ownership mode
    let credentials_store = CredentialsStore::new(txn, &state.oauth2);
    let (account, credentials) = credentials_store
        .get_auth_credentials(&server, &configuration, bundle.user_id)
        .await?;

    // Reuse the upstream session when one is pinned for this server
    let mut target = UpstreamTarget {
        url: server.url.clone(),
        credentials,
        api_key_location: api_key_location(&server)?,
        session_id: session.external_sessions().get(&server.id).cloned(),
    };

    let mut current_session = session.clone();
    if target.session_id.is_none() {
        let upstream_session = state.upstream.initialize(&target).await?;
        if let Some(upstream_session_id) = &upstream_session {
            current_session = SessionRepository::new(txn)
                .set_external_session(current_session, server.id, upstream_session_id)
                .await?;
        }
        target.session_id = upstream_session;
    }

    // Forward with the canonical (un-prefixed) name
    let upstream_request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: "tools/call".to_string(),
        params: Some(json!({
            "name": metadata.canonical_tool_name,
            "arguments": args.arguments,
        })),
        id: request.id.clone(),
    };

    let started_at = Utc::now();
    let call_result = call_with_auth_retry(
        state,
        &credentials_store,
        &server,
        &configuration,
        account,
        &mut target,
        &upstream_request,
    )
    .await;
    let ended_at = Utc::now();

    // One audit row per invocation, whatever happened upstream
    let (success, result_value) = match &call_result {
        Ok(outcome) => (
            !outcome.response.is_error(),
            outcome
                .response
                .result
                .clone()
                .or_else(|| {
                    outcome
                        .response
                        .error
                        .as_ref()
                        .map(|err| json!({"error": err.message}))
                })
                .unwrap_or_default(),
        ),
        Err(err) => (false, json!({"error": err.public_message()})),
    };
    logging::record_tool_call(
        txn,
        logging::ToolCallRecord {
            bundle,
            session: &current_session,
            server: Some(&server),
            tool: Some(&tool),
            configuration: Some(&configuration),
            request_id,
            arguments: Some(arguments_as_text(&args.arguments)),
            jsonrpc_payload: serde_json::to_value(request).unwrap_or_default(),
            result: result_value,
            success,
            via_execute_tool: true,
            started_at,
            ended_at,
        },
    )
    .await;

    let outcome = call_result?;

    // Stale upstream session: drop the pin so the next call renegotiates
    if outcome.http_status == 404 && target.session_id.is_some() {
        let _ = SessionRepository::new(txn)
            .clear_external_session(current_session.clone(), server.id)
            .await;
    }

    Ok(outcome.response)
}

/// One upstream attempt, plus a single refresh-and-retry when the upstream
/// rejects the credentials outright.
async fn call_with_auth_retry(
    state: &GatewayState,
    credentials_store: &CredentialsStore<'_, sea_orm::DatabaseTransaction>,
    server: &portico_storage::entities::mcp_servers::Model,
    configuration: &mcp_server_configurations::Model,
    account: portico_storage::entities::connected_accounts::Model,
    target: &mut UpstreamTarget,
    upstream_request: &JsonRpcRequest,
) -> GatewayResult<crate::client::UpstreamResponse> {
    let outcome = state.upstream.request(target, upstream_request).await?;
    if outcome.http_status != 401 && outcome.http_status != 403 {
        return Ok(outcome);
    }

    warn!(server = %server.name, status = outcome.http_status, "upstream auth failure, refreshing once");
    let (_refreshed_account, refreshed_credentials) = credentials_store
        .force_refresh(server, configuration, account)
        .await?;
    target.credentials = refreshed_credentials;
    state.upstream.request(target, upstream_request).await
}

/// Arguments are logged exactly as received; agents routinely send strings
/// that are not valid JSON.
fn arguments_as_text(arguments: &Value) -> String {
    match arguments {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_tool_definitions_are_stable() {
        let definitions = meta_tool_definitions();
        let names: Vec<&str> = definitions
            .as_array()
            .unwrap()
            .iter()
            .map(|tool| tool["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec![SEARCH_TOOLS_NAME, EXECUTE_TOOL_NAME]);
        assert_eq!(
            definitions[1]["inputSchema"]["required"],
            json!(["tool_name"])
        );
    }

    #[test]
    fn string_arguments_logged_verbatim() {
        assert_eq!(arguments_as_text(&json!("not { json")), "not { json");
        assert_eq!(arguments_as_text(&json!({"a": 1})), "{\"a\":1}");
    }
}
