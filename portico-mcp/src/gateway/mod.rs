//! Gateway dispatcher
//!
//! Front door for `POST /mcp/{bundle_key}`. Parses JSON-RPC, correlates the
//! session, dispatches `initialize`/`tools/list`/`tools/call` and surfaces
//! every failure as a JSON-RPC error object over HTTP 200. Only an
//! unparseable body or an unknown bundle key produce HTTP errors.

pub mod logging;
pub mod meta_tools;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use sea_orm::TransactionTrait;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

use portico_config::GatewayConfig;
use portico_http::EmbeddingClient;
use portico_oauth2::OAuth2Manager;
use portico_storage::entities::{mcp_server_bundles, mcp_sessions};
use portico_storage::repositories::{BundleRepository, SessionRepository};
use portico_storage::DatabaseConnection;

use crate::client::{UpstreamClient, MCP_SESSION_HEADER};
use crate::error::GatewayError;
use crate::protocol::messages::{
    InitializeParams, InitializeResult, ServerCapabilities, ServerInfo, ToolsCapability,
    SUPPORTED_PROTOCOL_VERSION,
};
use crate::protocol::{error_codes, JsonRpcRequest, JsonRpcResponse};

/// Everything the gateway request path needs, shared across requests.
#[derive(Clone)]
pub struct GatewayState {
    pub db: DatabaseConnection,
    pub upstream: UpstreamClient,
    pub oauth2: OAuth2Manager,
    pub embeddings: EmbeddingClient,
    pub config: GatewayConfig,
}

/// Axum handler for `POST /mcp/{bundle_key}`.
pub async fn handle_mcp_request(
    State(state): State<Arc<GatewayState>>,
    Path(bundle_key): Path<String>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // Unparseable body is the one case that earns an HTTP error
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    "body is not valid JSON-RPC",
                )),
            )
                .into_response();
        }
    };

    let span = info_span!("mcp_request", %request_id, method = %request.method);
    dispatch(state, bundle_key, headers, request, request_id)
        .instrument(span)
        .await
}

async fn dispatch(
    state: Arc<GatewayState>,
    bundle_key: String,
    headers: HeaderMap,
    request: JsonRpcRequest,
    request_id: String,
) -> Response {
    let txn = match state
        .db
        .begin_with_config(Some(sea_orm::IsolationLevel::RepeatableRead), None)
        .await
    {
        Ok(txn) => txn,
        Err(err) => {
            error!(%err, "failed to open transaction");
            return internal_error_response(&request);
        }
    };

    let bundle = match BundleRepository::new(&txn).find_by_key(&bundle_key).await {
        Ok(Some(bundle)) => bundle,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, Json(json!({"error": "bundle_not_found"})))
                .into_response();
        }
        Err(err) => {
            error!(%err, "bundle lookup failed");
            return internal_error_response(&request);
        }
    };

    // Notifications get an empty 202; nothing to persist
    if request.is_notification() {
        let _ = txn.commit().await;
        return StatusCode::ACCEPTED.into_response();
    }

    let outcome = match request.method.as_str() {
        "initialize" => handle_initialize(&state, &txn, &bundle, &request).await,
        "tools/list" => Ok(ResponseParts {
            response: JsonRpcResponse::success(
                request.id.clone(),
                json!({ "tools": meta_tools::meta_tool_definitions() }),
            ),
            session_header: None,
        }),
        "tools/call" => {
            handle_tools_call(&state, &txn, &bundle, &headers, &request, &request_id).await
        }
        _ => Ok(ResponseParts {
            response: JsonRpcResponse::error(
                request.id.clone(),
                error_codes::METHOD_NOT_FOUND,
                format!("method '{}' is not supported", request.method),
            ),
            session_header: None,
        }),
    };

    let parts = match outcome {
        Ok(parts) => parts,
        Err(err) => ResponseParts {
            response: JsonRpcResponse::error(
                request.id.clone(),
                err.jsonrpc_code(),
                err.public_message(),
            ),
            session_header: None,
        },
    };

    if let Err(err) = txn.commit().await {
        error!(%err, "transaction commit failed");
        return internal_error_response(&request);
    }

    let mut response = (StatusCode::OK, Json(parts.response)).into_response();
    if let Some(session_id) = parts.session_header {
        if let Ok(value) = HeaderValue::from_str(&session_id) {
            response.headers_mut().insert(MCP_SESSION_HEADER, value);
        }
    }
    response
}

struct ResponseParts {
    response: JsonRpcResponse,
    session_header: Option<String>,
}

fn internal_error_response(request: &JsonRpcRequest) -> Response {
    (
        StatusCode::OK,
        Json(JsonRpcResponse::error(
            request.id.clone(),
            error_codes::INTERNAL_ERROR,
            "internal error",
        )),
    )
        .into_response()
}

/// `initialize`: bind a fresh session to the bundle and point the client at
/// the meta-tools.
async fn handle_initialize(
    _state: &GatewayState,
    txn: &sea_orm::DatabaseTransaction,
    bundle: &mcp_server_bundles::Model,
    request: &JsonRpcRequest,
) -> Result<ResponseParts, GatewayError> {
    let params: InitializeParams = match &request.params {
        Some(params) => serde_json::from_value(params.clone())
            .map_err(|err| GatewayError::InvalidParams(err.to_string()))?,
        None => InitializeParams {
            protocol_version: None,
            capabilities: json!({}),
            client_info: None,
        },
    };

    let session = SessionRepository::new(txn).create(bundle.id).await?;

    let protocol_version = params
        .protocol_version
        .unwrap_or_else(|| SUPPORTED_PROTOCOL_VERSION.to_string());

    let result = InitializeResult {
        protocol_version,
        capabilities: ServerCapabilities {
            tools: ToolsCapability { list_changed: false },
        },
        server_info: ServerInfo {
            name: "Portico MCP Gateway".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        instructions: Some(format!(
            "use {} and {} to discover and execute tools",
            meta_tools::SEARCH_TOOLS_NAME,
            meta_tools::EXECUTE_TOOL_NAME
        )),
    };

    Ok(ResponseParts {
        response: JsonRpcResponse::success(
            request.id.clone(),
            serde_json::to_value(result).expect("initialize result serializes"),
        ),
        session_header: Some(session.id.to_string()),
    })
}

/// `tools/call`: correlate the session, then dispatch to the named
/// meta-tool.
async fn handle_tools_call(
    state: &GatewayState,
    txn: &sea_orm::DatabaseTransaction,
    bundle: &mcp_server_bundles::Model,
    headers: &HeaderMap,
    request: &JsonRpcRequest,
    request_id: &str,
) -> Result<ResponseParts, GatewayError> {
    let session = resolve_session(state, txn, bundle, headers).await?;

    let params: crate::protocol::messages::ToolsCallParams = request
        .params
        .clone()
        .ok_or_else(|| GatewayError::InvalidParams("missing params".to_string()))
        .and_then(|value| {
            serde_json::from_value(value).map_err(|err| GatewayError::InvalidParams(err.to_string()))
        })?;

    let response = match params.name.as_str() {
        meta_tools::SEARCH_TOOLS_NAME => {
            let result =
                meta_tools::handle_search_tools(state, txn, bundle, &params.arguments).await?;
            JsonRpcResponse::success(request.id.clone(), result)
        }
        meta_tools::EXECUTE_TOOL_NAME => {
            meta_tools::handle_execute_tool(
                state,
                txn,
                bundle,
                &session,
                request,
                &params.arguments,
                request_id,
            )
            .await?
        }
        other => JsonRpcResponse::error(
            request.id.clone(),
            error_codes::INVALID_PARAMS,
            format!("unknown tool: {}", other),
        ),
    };

    Ok(ResponseParts {
        response,
        session_header: Some(session.id.to_string()),
    })
}

async fn resolve_session(
    state: &GatewayState,
    txn: &sea_orm::DatabaseTransaction,
    bundle: &mcp_server_bundles::Model,
    headers: &HeaderMap,
) -> Result<mcp_sessions::Model, GatewayError> {
    let session_id = headers
        .get(MCP_SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or(GatewayError::SessionNotFound)?;

    let session = SessionRepository::new(txn)
        .find_active_and_touch(session_id, state.config.session_idle_ttl_seconds)
        .await?
        .ok_or(GatewayError::SessionNotFound)?;

    if session.bundle_id != bundle.id {
        return Err(GatewayError::SessionNotFound);
    }
    Ok(session)
}
