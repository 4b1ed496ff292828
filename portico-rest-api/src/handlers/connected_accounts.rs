//! Connected account endpoints
//!
//! Creation is discriminated by the configuration's auth type: no-auth and
//! api-key accounts materialize immediately, OAuth2 creates return an
//! authorization URL and the account materializes in the callback.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Redirect;
use axum::Json;
use portico_api_types::{AuthCredentials, AuthType};
use tracing::info;
use uuid::Uuid;

use portico_mcp::credentials::oauth2_config_for;
use portico_oauth2::{OAuth2Manager, OAuth2State, PkcePair};
use portico_rbac::access::{resource_from_configuration, resource_from_connected_account};
use portico_rbac::{is_action_permitted, Action};
use portico_storage::entities::{connected_accounts, mcp_server_configurations::ConnectedAccountOwnership};
use portico_storage::repositories::{
    ConfigurationRepository, ConnectedAccountRepository, McpServerRepository,
};

use crate::context::AppContext;
use crate::errors::{RestError, RestResult};
use crate::models::connected_accounts::{
    ConnectedAccountResponse, CreateConnectedAccountRequest, CreateConnectedAccountResponse,
    OAuth2CallbackQuery,
};

fn account_response(account: connected_accounts::Model) -> ConnectedAccountResponse {
    ConnectedAccountResponse {
        id: account.id,
        user_id: account.user_id,
        mcp_server_configuration_id: account.mcp_server_configuration_id,
        ownership: account.ownership.into(),
        created_at: account.created_at,
    }
}

/// `POST /connected-accounts`
pub async fn create_connected_account(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(request): Json<CreateConnectedAccountRequest>,
) -> RestResult<(StatusCode, Json<CreateConnectedAccountResponse>)> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let configuration = ConfigurationRepository::new(&txn)
        .get_by_id(request.mcp_server_configuration_id)
        .await?;
    let resource = resource_from_configuration(&configuration);
    if !is_action_permitted(
        &ctx.acl,
        &context.principal,
        Action::ConfigurationCreateConnectedAccountOn,
        Some(&resource),
    ) {
        return Err(RestError::not_permitted());
    }
    if configuration.connected_account_ownership == ConnectedAccountOwnership::Operational {
        // Operational accounts go through the ops-accounts surface
        return Err(RestError::not_permitted());
    }

    let auth_type: AuthType = configuration.auth_type.into();
    match auth_type {
        AuthType::NoAuth => {
            let account = ConnectedAccountRepository::new(&txn)
                .create(
                    context.user.id,
                    configuration.id,
                    configuration.connected_account_ownership,
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
                    configuration.connected_account_ownership,
                    &AuthCredentials::ApiKey { secret_key: api_key },
                )
                .await?;
            txn.commit().await?;
            Ok((
                StatusCode::CREATED,
                Json(CreateConnectedAccountResponse::Created(account_response(account))),
            ))
        }
        AuthType::Oauth2 => {
            let server = McpServerRepository::new(&txn)
                .get_by_id(configuration.mcp_server_id)
                .await?;
            let oauth2_config = oauth2_config_for(&server, &configuration)?;

            let pkce = PkcePair::generate();
            let redirect_uri = format!(
                "{}/connected-accounts/oauth2/callback",
                ctx.config.server.base_url
            );
            let state = ctx.state_codec.encode(OAuth2State {
                client_id: oauth2_config.client_id.clone(),
                code_verifier: pkce.verifier.clone(),
                redirect_uri: redirect_uri.clone(),
                redirect_url_after_account_creation: request.redirect_url_after_account_creation,
                configuration_id: Some(configuration.id),
                mcp_server_id: None,
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

/// `GET /connected-accounts`: admins see the org, members see their own.
pub async fn list_connected_accounts(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> RestResult<Json<Vec<ConnectedAccountResponse>>> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;
    if !is_action_permitted(&ctx.acl, &context.principal, Action::ConnectedAccountList, None) {
        return Err(RestError::not_permitted());
    }

    let accounts_repo = ConnectedAccountRepository::new(&txn);
    let configurations = ConfigurationRepository::new(&txn)
        .list_by_organization(context.organization_id(), None)
        .await?;

    let mut accounts = Vec::new();
    for configuration in &configurations {
        for account in accounts_repo.list_by_configuration(configuration.id).await? {
            if account.ownership
                == portico_storage::entities::mcp_server_configurations::ConnectedAccountOwnership::Operational
            {
                continue;
            }
            if context.is_admin() || account.user_id == context.user.id {
                accounts.push(account_response(account));
            }
        }
    }
    txn.commit().await?;
    Ok(Json(accounts))
}

/// `DELETE /connected-accounts/{id}`
pub async fn delete_connected_account(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(account_id): Path<Uuid>,
) -> RestResult<StatusCode> {
    let txn = ctx.begin().await?;
    let context = ctx.request_context(&txn, &headers).await?;

    let accounts = ConnectedAccountRepository::new(&txn);
    let account = accounts.get_by_id(account_id).await?;
    let configuration = ConfigurationRepository::new(&txn)
        .get_by_id(account.mcp_server_configuration_id)
        .await?;
    let resource = resource_from_connected_account(&account, &configuration);
    if !is_action_permitted(
        &ctx.acl,
        &context.principal,
        Action::ConnectedAccountDelete,
        Some(&resource),
    ) {
        return Err(RestError::not_permitted());
    }

    accounts.delete(account).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /connected-accounts/oauth2/callback`: completes the code exchange
/// and materializes the account, then bounces to the frontend.
pub async fn oauth2_callback(
    State(ctx): State<AppContext>,
    Query(query): Query<OAuth2CallbackQuery>,
) -> RestResult<Redirect> {
    let state = ctx.state_codec.decode(&query.state)?;
    let configuration_id = state
        .configuration_id
        .ok_or(portico_oauth2::OAuth2Error::StateInvalid)?;

    let txn = ctx.begin().await?;
    let configuration = ConfigurationRepository::new(&txn)
        .get_by_id(configuration_id)
        .await?;
    let server = McpServerRepository::new(&txn)
        .get_by_id(configuration.mcp_server_id)
        .await?;
    let oauth2_config = oauth2_config_for(&server, &configuration)?;

    let token = ctx
        .oauth2
        .exchange_code(&oauth2_config, &query.code, &state.code_verifier, &state.redirect_uri)
        .await?;
    let credentials = AuthCredentials::Oauth2(token.into_credentials(None));

    let accounts = ConnectedAccountRepository::new(&txn);
    // Re-authorizing replaces the existing account's credentials
    let existing = match configuration.connected_account_ownership {
        ConnectedAccountOwnership::Individual => {
            accounts.find_individual(state.user_id, configuration.id).await?
        }
        ownership => accounts.find_singleton(configuration.id, ownership).await?,
    };
    let account = match existing {
        Some(existing) => accounts.update_credentials(existing, &credentials).await?,
        None => {
            accounts
                .create(
                    state.user_id,
                    configuration.id,
                    configuration.connected_account_ownership,
                    &credentials,
                )
                .await?
        }
    };
    txn.commit().await?;
    info!(account_id = %account.id, "oauth2 connected account materialized");

    let destination = state
        .redirect_url_after_account_creation
        .unwrap_or_else(|| ctx.config.server.frontend_url.clone());
    Ok(Redirect::to(&destination))
}
