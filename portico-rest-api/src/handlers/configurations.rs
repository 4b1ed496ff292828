//! MCP server configuration endpoints

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use portico_api_types::ErrorCode;
use tracing::info;
use uuid::Uuid;

use portico_rbac::access::{resource_from_configuration, resource_from_server};
use portico_rbac::{is_action_permitted, Action};
use portico_storage::entities::mcp_server_configurations;
use portico_storage::repositories::configuration_repository::NewConfiguration;
use portico_storage::repositories::{
    ConfigurationRepository, McpServerRepository, McpToolRepository, TeamRepository,
};

use crate::context::{AppContext, RequestContext};
use crate::errors::{RestError, RestResult};
use crate::models::configurations::{
    ConfigurationResponse, CreateConfigurationRequest, ListConfigurationsQuery,
    UpdateConfigurationRequest,
};
use crate::services::orphan_reaper;

fn configuration_response(config: mcp_server_configurations::Model) -> ConfigurationResponse {
    ConfigurationResponse {
        id: config.id,
        organization_id: config.organization_id,
        mcp_server_id: config.mcp_server_id,
        name: config.name.clone(),
        description: config.description.clone(),
        auth_type: config.auth_type.into(),
        connected_account_ownership: config.connected_account_ownership.into(),
        all_tools_enabled: config.all_tools_enabled,
        enabled_tools: config.enabled_tools(),
        allowed_teams: config.allowed_teams(),
        created_at: config.created_at,
    }
}

/// Validate that every listed team belongs to the caller's org.
async fn validate_allowed_teams<C: sea_orm::ConnectionTrait>(
    db: &C,
    context: &RequestContext,
    allowed_teams: &[Uuid],
) -> RestResult<()> {
    let org_teams: std::collections::HashSet<Uuid> = TeamRepository::new(db)
        .list_by_organization(context.organization_id())
        .await?
        .into_iter()
        .map(|team| team.id)
        .collect();
    for team_id in allowed_teams {
        if !org_teams.contains(team_id) {
            return Err(RestError::validation(
                "allowed_teams contains a team outside this organization",
            ));
        }
    }
    Ok(())
}

/// Validate that every enabled tool belongs to the configured server.
async fn validate_enabled_tools<C: sea_orm::ConnectionTrait>(
    db: &C,
    mcp_server_id: Uuid,
    enabled_tools: &[Uuid],
) -> RestResult<()> {
    let tools = McpToolRepository::new(db).find_by_ids(enabled_tools).await?;
    if tools.len() != enabled_tools.len()
        || tools.iter().any(|tool| tool.mcp_server_id != mcp_server_id)
    {
        return Err(RestError::validation(
            "enabled_tools contains a tool outside this server",
        ));
    }
    Ok(())
}

/// `POST /mcp-server-configurations`
pub async fn create_configuration(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(request): Json<CreateConfigurationRequest>,
) -> RestResult<(StatusCode, Json<ConfigurationResponse>)> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let server = McpServerRepository::new(&txn)
        .get_by_id(request.mcp_server_id)
        .await?;
    let server_resource = resource_from_server(&server);
    if !is_action_permitted(
        &ctx.acl,
        &context.principal,
        Action::McpServerCreateConfigurationOn,
        Some(&server_resource),
    ) {
        return Err(RestError::not_permitted());
    }

    // auth_type must name one of the server's auth-config variants
    let supported = server
        .auth_configs()
        .map_err(|_| RestError::api(ErrorCode::InternalError, "Internal server error"))?;
    if !supported
        .iter()
        .any(|config| config.auth_type() == request.auth_type)
    {
        return Err(RestError::api(
            ErrorCode::InvalidAuthTypeForServer,
            "auth_type is not supported by this server",
        ));
    }

    if request.all_tools_enabled && !request.enabled_tools.is_empty() {
        return Err(RestError::validation(
            "enabled_tools must be empty when all_tools_enabled is set",
        ));
    }
    validate_allowed_teams(&txn, &context, &request.allowed_teams).await?;
    validate_enabled_tools(&txn, server.id, &request.enabled_tools).await?;

    let configuration = ConfigurationRepository::new(&txn)
        .create(NewConfiguration {
            organization_id: context.organization_id(),
            mcp_server_id: server.id,
            name: request.name,
            description: request.description,
            auth_type: request.auth_type.into(),
            connected_account_ownership: request.connected_account_ownership.into(),
            all_tools_enabled: request.all_tools_enabled,
            enabled_tools: request.enabled_tools,
            allowed_teams: request.allowed_teams,
        })
        .await?;
    txn.commit().await?;

    info!(configuration_id = %configuration.id, "configuration created");
    Ok((StatusCode::CREATED, Json(configuration_response(configuration))))
}

/// `GET /mcp-server-configurations`
pub async fn list_configurations(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Query(query): Query<ListConfigurationsQuery>,
) -> RestResult<Json<Vec<ConfigurationResponse>>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if !is_action_permitted(&ctx.acl, &context.principal, Action::ConfigurationList, None) {
        return Err(RestError::not_permitted());
    }

    let configurations = ConfigurationRepository::new(&txn)
        .list_by_organization(context.organization_id(), query.mcp_server_id)
        .await?;
    txn.commit().await?;

    Ok(Json(
        configurations
            .into_iter()
            .map(configuration_response)
            .collect(),
    ))
}

/// `GET /mcp-server-configurations/{id}`
pub async fn get_configuration(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(configuration_id): Path<Uuid>,
) -> RestResult<Json<ConfigurationResponse>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let configuration = ConfigurationRepository::new(&txn)
        .get_by_id(configuration_id)
        .await?;
    let resource = resource_from_configuration(&configuration);
    if !is_action_permitted(&ctx.acl, &context.principal, Action::ConfigurationRead, Some(&resource))
    {
        return Err(RestError::not_permitted());
    }
    txn.commit().await?;
    Ok(Json(configuration_response(configuration)))
}

/// `PATCH /mcp-server-configurations/{id}`: an allowed-teams change runs
/// the reaper in the same transaction.
pub async fn update_configuration(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(configuration_id): Path<Uuid>,
    Json(request): Json<UpdateConfigurationRequest>,
) -> RestResult<Json<ConfigurationResponse>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let configurations = ConfigurationRepository::new(&txn);
    let mut configuration = configurations.get_by_id(configuration_id).await?;
    let resource = resource_from_configuration(&configuration);
    if !is_action_permitted(
        &ctx.acl,
        &context.principal,
        Action::ConfigurationUpdate,
        Some(&resource),
    ) {
        return Err(RestError::not_permitted());
    }

    if request.name.is_some() || request.description.is_some() {
        configuration = configurations
            .update_details(configuration, request.name.clone(), request.description.clone())
            .await?;
    }

    if request.all_tools_enabled.is_some() || request.enabled_tools.is_some() {
        let all_tools_enabled = request
            .all_tools_enabled
            .unwrap_or(configuration.all_tools_enabled);
        let enabled_tools = request
            .enabled_tools
            .clone()
            .unwrap_or_else(|| configuration.enabled_tools());
        if all_tools_enabled && !enabled_tools.is_empty() {
            return Err(RestError::validation(
                "enabled_tools must be empty when all_tools_enabled is set",
            ));
        }
        validate_enabled_tools(&txn, configuration.mcp_server_id, &enabled_tools).await?;
        configuration = configurations
            .update_tools(configuration, all_tools_enabled, enabled_tools)
            .await?;
    }

    if let Some(allowed_teams) = request.allowed_teams {
        validate_allowed_teams(&txn, &context, &allowed_teams).await?;
        configuration = configurations
            .update_allowed_teams(configuration, allowed_teams)
            .await?;
        let plan = orphan_reaper::on_configuration_allowed_teams_updated(&txn, &configuration).await?;
        if !plan.is_empty() {
            info!(
                configuration_id = %configuration.id,
                accounts = plan.connected_accounts.len(),
                bundle_refs = plan.bundles_configurations_removed.len(),
                "reaped orphan records after allowed-teams update"
            );
        }
    }

    txn.commit().await?;
    Ok(Json(configuration_response(configuration)))
}

/// `DELETE /mcp-server-configurations/{id}`: the cascade removes connected
/// accounts; the reaper sweeps bundle references.
pub async fn delete_configuration(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(configuration_id): Path<Uuid>,
) -> RestResult<StatusCode> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let configurations = ConfigurationRepository::new(&txn);
    let configuration = configurations.get_by_id(configuration_id).await?;
    let resource = resource_from_configuration(&configuration);
    if !is_action_permitted(
        &ctx.acl,
        &context.principal,
        Action::ConfigurationDelete,
        Some(&resource),
    ) {
        return Err(RestError::not_permitted());
    }

    let organization_id = configuration.organization_id;
    configurations.delete(configuration).await?;
    orphan_reaper::on_configuration_deleted(&txn, organization_id, configuration_id).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
