//! Operational account endpoints
//!
//! Admin-only management of the platform-owned credentials the catalog sync
//! uses. An ops account hangs off the server's operational configuration;
//! servers without one reject ops-account creation.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Redirect;
use axum::Json;
use portico_api_types::{AuthCredentials, AuthType};
use tracing::info;
use uuid::Uuid;

use portico_mcp::credentials::oauth2_config_for;
use portico_oauth2::{OAuth2Manager, OAuth2State, PkcePair};
use portico_storage::entities::mcp_server_configurations::ConnectedAccountOwnership;
use portico_storage::repositories::{
    ConfigurationRepository, ConnectedAccountRepository, McpServerRepository,
};

use crate::context::AppContext;
use crate::errors::{RestError, RestResult};
use crate::models::connected_accounts::{
    ConnectedAccountResponse, CreateConnectedAccountResponse, CreateOpsAccountRequest,
    ListOpsAccountsQuery, OAuth2CallbackQuery,
};

fn account_response(
    account: portico_storage::entities::connected_accounts::Model,
) -> ConnectedAccountResponse {
    ConnectedAccountResponse {
        id: account.id,
        user_id: account.user_id,
        mcp_server_configuration_id: account.mcp_server_configuration_id,
        ownership: account.ownership.into(),
        created_at: account.created_at,
    }
}

/// `POST /ops-accounts`
pub async fn create_ops_account(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(request): Json<CreateOpsAccountRequest>,
) -> RestResult<(StatusCode, Json<CreateConnectedAccountResponse>)> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if !context.is_admin() {
        return Err(RestError::not_permitted());
    }

    let server = McpServerRepository::new(&txn)
        .get_by_id(request.mcp_server_id)
        .await?;
    if server.organization_id != Some(context.organization_id()) {
        return Err(RestError::not_permitted());
    }

    let configuration = ConfigurationRepository::new(&txn)
        .find_operational_by_server(server.id)
        .await?
        .ok_or_else(|| {
            RestError::Storage(portico_storage::StorageError::not_found(
                "MCPServerConfiguration",
                "operational",
            ))
        })?;

    let auth_type: AuthType = configuration.auth_type.into();
    match auth_type {
        AuthType::NoAuth => {
            let account = ConnectedAccountRepository::new(&txn)
                .create(
                    context.user.id,
                    configuration.id,
                    ConnectedAccountOwnership::Operational,
                    &AuthCredentials::NoAuth,
                )
                .await?;
            txn.commit().await?;
            Ok((
                StatusCode::CREATED,
                Json(CreateConnectedAccountResponse::Created(account_response(account))),
            ))
        }
        AuthType::ApiKey => {
            let api_key = request
                .api_key
                .filter(|key| !key.is_empty())
                .ok_or_else(|| RestError::validation("api_key is required"))?;
            let account = ConnectedAccountRepository::new(&txn)
                .create(
                    context.user.id,
                    configuration.id,
                    ConnectedAccountOwnership::Operational,
                    &AuthCredentials::ApiKey { secret_key: api_key },
                )
                .await?;
            txn.commit().await?;
            info!(server = %server.name, "operational account created");
            Ok((
                StatusCode::CREATED,
                Json(CreateConnectedAccountResponse::Created(account_response(account))),
            ))
        }
        AuthType::Oauth2 => {
            let oauth2_config = oauth2_config_for(&server, &configuration)?;
            let pkce = PkcePair::generate();
            let redirect_uri =
                format!("{}/ops-accounts/oauth2/callback", ctx.config.server.base_url);
            let state = ctx.state_codec.encode(OAuth2State {
                client_id: oauth2_config.client_id.clone(),
                code_verifier: pkce.verifier.clone(),
                redirect_uri: redirect_uri.clone(),
                redirect_url_after_account_creation: None,
                configuration_id: None,
                mcp_server_id: Some(server.id),
                user_id: context.user.id,
                exp: 0,
            })?;
            let authorization_url =
                OAuth2Manager::authorization_url(&oauth2_config, &redirect_uri, &state, &pkce);
            txn.commit().await?;
            Ok((
                StatusCode::OK,
                Json(CreateConnectedAccountResponse::OAuth2Redirect { authorization_url }),
            ))
        }
    }
}

/// `GET /ops-accounts`
pub async fn list_ops_accounts(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Query(query): Query<ListOpsAccountsQuery>,
) -> RestResult<Json<Vec<ConnectedAccountResponse>>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if !context.is_admin() {
        return Err(RestError::not_permitted());
    }

    let configurations = ConfigurationRepository::new(&txn)
        .list_by_organization(context.organization_id(), query.mcp_server_id)
        .await?;
    let accounts_repo = ConnectedAccountRepository::new(&txn);

    let mut accounts = Vec::new();
    for configuration in configurations
        .iter()
        .filter(|config| config.connected_account_ownership == ConnectedAccountOwnership::Operational)
    {
        if let Some(account) = accounts_repo
            .find_singleton(configuration.id, ConnectedAccountOwnership::Operational)
            .await?
        {
            accounts.push(account_response(account));
        }
    }
    txn.commit().await?;
    Ok(Json(accounts))
}

/// `DELETE /ops-accounts/{id}`
pub async fn delete_ops_account(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(account_id): Path<Uuid>,
) -> RestResult<StatusCode> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if !context.is_admin() {
        return Err(RestError::not_permitted());
    }

    let accounts = ConnectedAccountRepository::new(&txn);
    let account = accounts.get_by_id(account_id).await?;
    let configuration = ConfigurationRepository::new(&txn)
        .get_by_id(account.mcp_server_configuration_id)
        .await?;
    if configuration.organization_id != context.organization_id()
        || account.ownership != ConnectedAccountOwnership::Operational
    {
        return Err(RestError::not_permitted());
    }

    accounts.delete(account).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /ops-accounts/oauth2/callback`
pub async fn oauth2_callback(
    State(ctx): State<AppContext>,
    Query(query): Query<OAuth2CallbackQuery>,
) -> RestResult<Redirect> {
    let state = ctx.state_codec.decode(&query.state)?;
    let mcp_server_id = state
        .mcp_server_id
        .ok_or(portico_oauth2::OAuth2Error::StateInvalid)?;

    let txn = ctx.begin().await?;
    let server = McpServerRepository::new(&txn).get_by_id(mcp_server_id).await?;
    let configuration = ConfigurationRepository::new(&txn)
        .find_operational_by_server(server.id)
        .await?
        .ok_or_else(|| {
            RestError::Storage(portico_storage::StorageError::not_found(
                "MCPServerConfiguration",
                "operational",
            ))
        })?;
    let oauth2_config = oauth2_config_for(&server, &configuration)?;

    let token = ctx
        .oauth2
        .exchange_code(&oauth2_config, &query.code, &state.code_verifier, &state.redirect_uri)
        .await?;
    let credentials = AuthCredentials::Oauth2(token.into_credentials(None));

    let accounts = ConnectedAccountRepository::new(&txn);
    let account = match accounts
        .find_singleton(configuration.id, ConnectedAccountOwnership::Operational)
        .await?
    {
        Some(existing) => accounts.update_credentials(existing, &credentials).await?,
        None => {
            accounts
                .create(
                    state.user_id,
                    configuration.id,
                    ConnectedAccountOwnership::Operational,
                    &credentials,
                )
                .await?
        }
    };
    txn.commit().await?;
    info!(account_id = %account.id, "operational oauth2 account materialized");

    Ok(Redirect::to(&ctx.config.server.frontend_url))
}
