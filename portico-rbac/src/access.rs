//! Storage bindings for the resolver
//!
//! Builds [`Resource`] snapshots from entities, performs the lazy lookup of
//! a resource id for a given action class, and exposes the allowed-team
//! accessibility check used by handlers, the reaper and the gateway.

use sea_orm::ConnectionTrait;
use uuid::Uuid;

use portico_storage::entities::{
    connected_accounts, mcp_server_bundles, mcp_server_configurations, mcp_servers, teams,
};
use portico_storage::repositories::{
    BundleRepository, ConfigurationRepository, ConnectedAccountRepository, McpServerRepository,
    TeamRepository,
};

use crate::definitions::{Action, Resource, ResourceType};
use crate::error::RbacResult;

pub fn resource_from_server(server: &mcp_servers::Model) -> Resource {
    Resource::McpServer {
        organization_id: server.organization_id,
    }
}

pub fn resource_from_configuration(config: &mcp_server_configurations::Model) -> Resource {
    Resource::Configuration {
        id: config.id,
        organization_id: config.organization_id,
        connected_account_ownership: config.connected_account_ownership.into(),
        allowed_teams: config.allowed_teams(),
    }
}

pub fn resource_from_bundle(bundle: &mcp_server_bundles::Model) -> Resource {
    Resource::Bundle {
        organization_id: bundle.organization_id,
        user_id: bundle.user_id,
    }
}

pub fn resource_from_connected_account(
    account: &connected_accounts::Model,
    configuration: &mcp_server_configurations::Model,
) -> Resource {
    Resource::ConnectedAccount {
        organization_id: configuration.organization_id,
        user_id: account.user_id,
        ownership: account.ownership.into(),
        configuration_allowed_teams: configuration.allowed_teams(),
    }
}

pub fn resource_from_team(team: &teams::Model) -> Resource {
    Resource::Team {
        organization_id: team.organization_id,
    }
}

/// Lazy resource lookup by id, keyed on the action's resource family.
/// Returns `None` when the id does not resolve.
pub async fn load_resource<C: ConnectionTrait>(
    db: &C,
    action: Action,
    resource_id: Uuid,
) -> RbacResult<Option<Resource>> {
    let resource = match action.resource_type() {
        ResourceType::McpServer => McpServerRepository::new(db)
            .find_by_id(resource_id)
            .await?
            .map(|server| resource_from_server(&server)),
        ResourceType::Configuration => ConfigurationRepository::new(db)
            .find_by_id(resource_id)
            .await?
            .map(|config| resource_from_configuration(&config)),
        ResourceType::Bundle => BundleRepository::new(db)
            .find_by_id(resource_id)
            .await?
            .map(|bundle| resource_from_bundle(&bundle)),
        ResourceType::ConnectedAccount => {
            match ConnectedAccountRepository::new(db).find_by_id(resource_id).await? {
                Some(account) => ConfigurationRepository::new(db)
                    .find_by_id(account.mcp_server_configuration_id)
                    .await?
                    .map(|config| resource_from_connected_account(&account, &config)),
                None => None,
            }
        }
        ResourceType::Team => TeamRepository::new(db)
            .find_by_id(resource_id)
            .await?
            .map(|team| resource_from_team(&team)),
        ResourceType::Organization => Some(Resource::Organization { id: resource_id }),
    };
    Ok(resource)
}

/// Permission check accepting either a resource snapshot or a resource id.
/// Passing both is ambiguous and rejected; an id is resolved lazily through
/// [`load_resource`], and an id that resolves to nothing denies.
pub async fn is_action_permitted_by_id<C: ConnectionTrait>(
    db: &C,
    acl: &crate::acl::Acl,
    principal: &crate::resolver::Principal,
    action: Action,
    resource: Option<&Resource>,
    resource_id: Option<Uuid>,
) -> RbacResult<bool> {
    if resource.is_some() && resource_id.is_some() {
        return Err(crate::error::RbacError::AmbiguousResource);
    }

    let loaded;
    let resource = match (resource, resource_id) {
        (Some(resource), None) => Some(resource),
        (None, Some(id)) => {
            loaded = load_resource(db, action, id).await?;
            loaded.as_ref()
        }
        _ => None,
    };

    Ok(crate::resolver::is_action_permitted(
        acl, principal, action, resource,
    ))
}

/// Whether a user can reach a configuration at all: their teams must
/// intersect its `allowed_teams`. This is the rule the reaper re-evaluates
/// after team or allowed-team changes.
pub async fn check_configuration_accessibility<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    configuration: &mcp_server_configurations::Model,
) -> RbacResult<bool> {
    let user_teams = TeamRepository::new(db)
        .team_ids_for_user(configuration.organization_id, user_id)
        .await?;
    let allowed = configuration.allowed_teams();
    Ok(user_teams.iter().any(|team| allowed.contains(team)))
}
