//! Credentials store
//!
//! Hands out the auth material a configuration uses to reach its upstream,
//! honoring the configuration's ownership mode. OAuth2 credentials near
//! expiry are refreshed synchronously before being returned; the refresh is
//! serialized per account with a row-level `FOR UPDATE` lock so concurrent
//! requests cannot race a second refresh against a rotating provider.

use portico_api_types::{AuthCredentials, AuthType};
use portico_oauth2::OAuth2Manager;
use sea_orm::ConnectionTrait;
use tracing::{debug, warn};
use uuid::Uuid;

use portico_storage::entities::{
    connected_accounts, mcp_server_configurations,
    mcp_server_configurations::ConnectedAccountOwnership, mcp_servers,
};
use portico_storage::repositories::ConnectedAccountRepository;

use crate::error::{GatewayError, GatewayResult};

pub struct CredentialsStore<'a, C: ConnectionTrait> {
    db: &'a C,
    oauth2: &'a OAuth2Manager,
}

impl<'a, C: ConnectionTrait> CredentialsStore<'a, C> {
    pub fn new(db: &'a C, oauth2: &'a OAuth2Manager) -> Self {
        Self { db, oauth2 }
    }

    /// Resolve the connected account for `(configuration, acting_user)` and
    /// return its credentials, refreshed if needed.
    ///
    /// Must run inside the request transaction: the refresh path takes a
    /// `FOR UPDATE` lock that is held until commit.
    pub async fn get_auth_credentials(
        &self,
        server: &mcp_servers::Model,
        configuration: &mcp_server_configurations::Model,
        acting_user_id: Uuid,
    ) -> GatewayResult<(connected_accounts::Model, AuthCredentials)> {
        let accounts = ConnectedAccountRepository::new(self.db);

        let account = match configuration.connected_account_ownership {
            ConnectedAccountOwnership::Individual => accounts
                .find_individual(acting_user_id, configuration.id)
                .await?,
            ownership => accounts.find_singleton(configuration.id, ownership).await?,
        }
        .ok_or(GatewayError::CredentialsNotFound)?;

        let credentials = account
            .auth_credentials()
            .map_err(|err| GatewayError::Internal(format!("stored credentials malformed: {}", err)))?;

        match &credentials {
            AuthCredentials::Oauth2(oauth2_creds) if OAuth2Manager::needs_refresh(oauth2_creds) => {
                self.refresh_locked(server, configuration, account).await
            }
            _ => Ok((account, credentials)),
        }
    }

    /// Force a refresh regardless of expiry; used by the retry-once path
    /// after an upstream 401/403.
    pub async fn force_refresh(
        &self,
        server: &mcp_servers::Model,
        configuration: &mcp_server_configurations::Model,
        account: connected_accounts::Model,
    ) -> GatewayResult<(connected_accounts::Model, AuthCredentials)> {
        self.refresh_locked(server, configuration, account).await
    }

    async fn refresh_locked(
        &self,
        server: &mcp_servers::Model,
        configuration: &mcp_server_configurations::Model,
        account: connected_accounts::Model,
    ) -> GatewayResult<(connected_accounts::Model, AuthCredentials)> {
        let accounts = ConnectedAccountRepository::new(self.db);

        // Lock, then re-read: a concurrent request may have refreshed while
        // we waited on the lock.
        let locked = accounts.get_for_update(account.id).await?;
        let credentials = locked
            .auth_credentials()
            .map_err(|err| GatewayError::Internal(format!("stored credentials malformed: {}", err)))?;

        let AuthCredentials::Oauth2(oauth2_creds) = &credentials else {
            return Ok((locked, credentials));
        };
        if !OAuth2Manager::needs_refresh(oauth2_creds) {
            debug!(account_id = %locked.id, "credentials already refreshed by concurrent request");
            return Ok((locked, credentials));
        }

        let oauth2_config = oauth2_config_for(server, configuration)?;
        let token = self.oauth2.refresh(&oauth2_config, oauth2_creds).await?;
        let refreshed = AuthCredentials::Oauth2(
            token.into_credentials(oauth2_creds.refresh_token.clone()),
        );

        let updated = accounts.update_credentials(locked, &refreshed).await?;
        Ok((updated, refreshed))
    }
}

/// Pick the OAuth2 auth-config variant the configuration references.
pub fn oauth2_config_for(
    server: &mcp_servers::Model,
    configuration: &mcp_server_configurations::Model,
) -> GatewayResult<portico_api_types::OAuth2AuthConfig> {
    if portico_api_types::AuthType::from(configuration.auth_type) != AuthType::Oauth2 {
        warn!(configuration_id = %configuration.id, "refresh requested for non-oauth2 configuration");
        return Err(GatewayError::Internal(
            "configuration does not use oauth2".to_string(),
        ));
    }
    let configs = server
        .auth_configs()
        .map_err(|err| GatewayError::Internal(format!("stored auth configs malformed: {}", err)))?;
    configs
        .into_iter()
        .find_map(|config| match config {
            portico_api_types::AuthConfig::Oauth2(oauth2) => Some(oauth2),
            _ => None,
        })
        .ok_or_else(|| {
            GatewayError::Internal("server has no oauth2 auth config variant".to_string())
        })
}
