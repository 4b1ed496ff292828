//! MCP server registry endpoints

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use portico_api_types::{AuthConfig, ErrorCode};
use tracing::info;
use uuid::Uuid;

use portico_http::EmbeddingClient;
use portico_oauth2::{discover_metadata, register_client};
use portico_rbac::access::resource_from_server;
use portico_rbac::{is_action_permitted, Action};
use portico_storage::entities::mcp_server_configurations::ConnectedAccountOwnership;
use portico_storage::repositories::configuration_repository::NewConfiguration;
use portico_storage::repositories::mcp_server_repository::NewMcpServer;
use portico_storage::repositories::{
    ConfigurationRepository, McpServerRepository, McpToolRepository,
};

use crate::context::AppContext;
use crate::errors::{RestError, RestResult};
use crate::models::mcp_servers::{
    CreateCustomServerRequest, OAuth2DcrRequest, OAuth2DcrResponse, OAuth2DiscoveryRequest,
    OAuth2DiscoveryResponse, ServerDetailResponse, ServerResponse, ToolSummary,
    UpdateServerRequest,
};
use crate::services::entitlement::get_organization_entitlement;
use crate::services::orphan_reaper;

/// Base32 alphabet (RFC 4648, lowercase) for custom-server name suffixes.
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";
const SUFFIX_LEN: usize = 8;
const NAME_RETRIES: usize = 10;

fn random_suffix() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())].to_ascii_uppercase() as char)
        .collect()
}

fn server_response(server: portico_storage::entities::mcp_servers::Model) -> RestResult<ServerResponse> {
    let supported_auth_types = server
        .auth_configs()
        .map_err(|_| RestError::api(ErrorCode::InternalError, "Internal server error"))?
        .iter()
        .map(AuthConfig::auth_type)
        .collect();
    Ok(ServerResponse {
        id: server.id,
        name: server.name,
        url: server.url,
        transport: server.transport.into(),
        description: server.description,
        logo: server.logo,
        categories: serde_json::from_value(server.categories).unwrap_or_default(),
        organization_id: server.organization_id,
        supported_auth_types,
        last_synced_at: server.last_synced_at,
        created_at: server.created_at,
    })
}

/// `GET /mcp-servers`
pub async fn list_servers(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> RestResult<Json<Vec<ServerResponse>>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if !is_action_permitted(&ctx.acl, &context.principal, Action::McpServerList, None) {
        return Err(RestError::not_permitted());
    }

    let servers = McpServerRepository::new(&txn)
        .list_visible(context.organization_id())
        .await?;
    txn.commit().await?;

    servers.into_iter().map(server_response).collect::<RestResult<Vec<_>>>().map(Json)
}

/// `GET /mcp-servers/{id}`
pub async fn get_server(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(server_id): Path<Uuid>,
) -> RestResult<Json<ServerDetailResponse>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let server = McpServerRepository::new(&txn).get_by_id(server_id).await?;
    let resource = resource_from_server(&server);
    if !is_action_permitted(&ctx.acl, &context.principal, Action::McpServerRead, Some(&resource)) {
        return Err(RestError::not_permitted());
    }

    let tools = McpToolRepository::new(&txn).list_by_server(server.id).await?;
    txn.commit().await?;

    Ok(Json(ServerDetailResponse {
        server: server_response(server)?,
        tools: tools
            .into_iter()
            .map(|tool| ToolSummary {
                id: tool.id,
                name: tool.name,
                description: tool.description,
            })
            .collect(),
    }))
}

/// `POST /mcp-servers`: create a custom server: entitlement-gated, named
/// `<NAME>_<8-char suffix>` with uniqueness retries, embedded, and seeded
/// with its operational configuration.
pub async fn create_custom_server(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(request): Json<CreateCustomServerRequest>,
) -> RestResult<(StatusCode, Json<ServerResponse>)> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if !is_action_permitted(&ctx.acl, &context.principal, Action::McpServerCreate, None) {
        return Err(RestError::not_permitted());
    }

    if !request
        .auth_configs
        .iter()
        .any(|config| config.auth_type() == request.operational_account_auth_type)
    {
        return Err(RestError::api(
            ErrorCode::InvalidAuthTypeForServer,
            "operational_account_auth_type must be one of the auth_configs",
        ));
    }

    let servers = McpServerRepository::new(&txn);

    let entitlement = get_organization_entitlement(&txn, context.organization_id()).await?;
    let custom_count = servers.count_custom(context.organization_id()).await? as i32;
    if let Some(max_custom) = entitlement.max_custom_mcp_servers {
        if custom_count + 1 > max_custom {
            return Err(RestError::api(
                ErrorCode::RequestedSubscriptionInvalid,
                "Organization is at its custom server limit",
            ));
        }
    }

    let base_name = portico_mcp::tool_utils::sanitize_canonical_tool_name(&request.name)
        .map_err(|_| RestError::validation("Server name is empty after sanitization"))?;

    let mut name = None;
    for _ in 0..NAME_RETRIES {
        let candidate = format!("{}_{}", base_name, random_suffix());
        if servers.find_by_name(&candidate).await?.is_none() {
            name = Some(candidate);
            break;
        }
    }
    let name = name.ok_or_else(|| {
        RestError::api(ErrorCode::InternalError, "Could not allocate a unique server name")
    })?;

    let embedding = ctx
        .embeddings
        .embed(&EmbeddingClient::server_embedding_input(
            &name,
            &request.url,
            &request.description,
            &request.categories,
        ))
        .await?;

    let server = servers
        .create(
            NewMcpServer {
                name,
                url: request.url,
                transport: request.transport.into(),
                description: request.description,
                logo: request.logo,
                categories: request.categories,
                auth_configs: request.auth_configs,
                organization_id: Some(context.organization_id()),
            },
            &embedding,
        )
        .await?;

    // Every custom server carries its operational configuration from birth;
    // the catalog sync path depends on it.
    ConfigurationRepository::new(&txn)
        .create(NewConfiguration {
            organization_id: context.organization_id(),
            mcp_server_id: server.id,
            name: format!("{} (operational)", server.name),
            description: None,
            auth_type: request.operational_account_auth_type.into(),
            connected_account_ownership: ConnectedAccountOwnership::Operational,
            all_tools_enabled: true,
            enabled_tools: Vec::new(),
            allowed_teams: Vec::new(),
        })
        .await?;

    txn.commit().await?;
    info!(server_id = %server.id, "custom MCP server created");
    Ok((StatusCode::CREATED, Json(server_response(server)?)))
}

/// `PATCH /mcp-servers/{id}`
pub async fn update_server(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(server_id): Path<Uuid>,
    Json(request): Json<UpdateServerRequest>,
) -> RestResult<Json<ServerResponse>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let servers = McpServerRepository::new(&txn);
    let server = servers.get_by_id(server_id).await?;
    let resource = resource_from_server(&server);
    if !is_action_permitted(&ctx.acl, &context.principal, Action::McpServerUpdate, Some(&resource)) {
        return Err(RestError::not_permitted());
    }

    let updated = servers
        .update_details(server, request.description, request.logo, request.categories)
        .await?;
    txn.commit().await?;
    Ok(Json(server_response(updated)?))
}

/// `DELETE /mcp-servers/{id}`: custom servers only; cascades take
/// configurations, accounts and tools, the reaper sweeps bundle refs.
pub async fn delete_server(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(server_id): Path<Uuid>,
) -> RestResult<StatusCode> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let servers = McpServerRepository::new(&txn);
    let server = servers.get_by_id(server_id).await?;
    if server.organization_id.is_none() {
        return Err(RestError::not_permitted());
    }
    let resource = resource_from_server(&server);
    if !is_action_permitted(&ctx.acl, &context.principal, Action::McpServerDelete, Some(&resource)) {
        return Err(RestError::not_permitted());
    }

    let configurations = ConfigurationRepository::new(&txn)
        .list_by_organization(context.organization_id(), Some(server.id))
        .await?;
    servers.delete(server).await?;
    for configuration in configurations {
        orphan_reaper::on_configuration_deleted(&txn, context.organization_id(), configuration.id)
            .await?;
    }
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /mcp-servers/{id}/refresh-tools`: the catalog sync, rate-limited
/// to one run per server per minute.
pub async fn refresh_tools(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(server_id): Path<Uuid>,
) -> RestResult<Json<portico_mcp::SyncOutcome>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let server = McpServerRepository::new(&txn).get_by_id(server_id).await?;
    let resource = resource_from_server(&server);
    if !is_action_permitted(
        &ctx.acl,
        &context.principal,
        Action::McpServerRefreshTools,
        Some(&resource),
    ) {
        return Err(RestError::not_permitted());
    }

    let outcome = portico_mcp::sync_tool_catalog(
        &txn,
        &ctx.upstream,
        &ctx.oauth2,
        &ctx.embeddings,
        server_id,
        ctx.config.gateway.sync_min_interval_seconds,
    )
    .await?;
    txn.commit().await?;
    Ok(Json(outcome))
}

/// `POST /mcp-servers/oauth2-discovery`
pub async fn oauth2_discovery(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(request): Json<OAuth2DiscoveryRequest>,
) -> RestResult<Json<OAuth2DiscoveryResponse>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if !is_action_permitted(&ctx.acl, &context.principal, Action::McpServerOauth2Discovery, None) {
        return Err(RestError::not_permitted());
    }
    txn.commit().await?;

    let metadata = discover_metadata(&ctx.http, &request.mcp_server_url).await?;
    Ok(Json(OAuth2DiscoveryResponse {
        authorize_url: metadata.authorization_endpoint.clone(),
        access_token_url: metadata.token_endpoint.clone(),
        refresh_token_url: metadata.token_endpoint,
        registration_url: metadata.registration_endpoint,
        token_endpoint_auth_method_supported: metadata.token_endpoint_auth_methods_supported,
    }))
}

/// `POST /mcp-servers/oauth2-dcr`
pub async fn oauth2_dcr(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(request): Json<OAuth2DcrRequest>,
) -> RestResult<Json<OAuth2DcrResponse>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if !is_action_permitted(&ctx.acl, &context.principal, Action::McpServerOauth2Discovery, None) {
        return Err(RestError::not_permitted());
    }
    txn.commit().await?;

    let auth_method = request
        .token_endpoint_auth_method_supported
        .first()
        .map(String::as_str)
        .unwrap_or("client_secret_post");
    let redirect_uri = format!(
        "{}/connected-accounts/oauth2/callback",
        ctx.config.server.base_url
    );
    let registration = register_client(
        &ctx.http,
        &request.registration_url,
        "Portico MCP Gateway",
        &redirect_uri,
        auth_method,
    )
    .await?;

    Ok(Json(OAuth2DcrResponse {
        client_id: Some(registration.client_id),
        client_secret: registration.client_secret,
    }))
}
