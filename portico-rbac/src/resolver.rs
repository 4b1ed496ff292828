//! The `(principal, action, resource)` resolver
//!
//! Pure evaluation over snapshots: no I/O happens here. Callers resolve the
//! resource (directly or via `access::load_resource`) and the principal's
//! team set before asking.

use portico_api_types::OrganizationRole;
use tracing::debug;
use uuid::Uuid;

use crate::acl::Acl;
use crate::definitions::{Action, AllowedResourceCriterion, Resource, ResourceScope};
use crate::error::{RbacError, RbacResult};

/// The acting identity: user, act-as organization/role, and the user's team
/// ids within that organization.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: OrganizationRole,
    pub team_ids: Vec<Uuid>,
}

/// Evaluate whether the principal may perform `action` on `resource`.
///
/// A permission without criteria grants unconditionally. With criteria, the
/// resource must be present and its type must match the permission's
/// declared resource type; any satisfied criterion grants.
pub fn is_action_permitted(
    acl: &Acl,
    principal: &Principal,
    action: Action,
    resource: Option<&Resource>,
) -> bool {
    let Some(permission) = acl.find(principal.role, action) else {
        debug!(?action, role = ?principal.role, "no permission declared for action");
        return false;
    };

    let Some(criteria) = &permission.allowed_resource_criteria else {
        return true;
    };

    let Some(resource) = resource else {
        debug!(?action, "permission has criteria but no resource was supplied");
        return false;
    };

    if let Some(expected) = permission.resource_type {
        if resource.resource_type() != expected {
            return false;
        }
    }

    criteria
        .iter()
        .any(|criterion| criterion_matches(principal, resource, criterion))
}

/// Same check, raising `NotPermitted` instead of returning false.
pub fn require_action_permitted(
    acl: &Acl,
    principal: &Principal,
    action: Action,
    resource: Option<&Resource>,
) -> RbacResult<()> {
    if is_action_permitted(acl, principal, action, resource) {
        Ok(())
    } else {
        Err(RbacError::NotPermitted(format!(
            "user {} (acting as {:?}) may not perform {:?}",
            principal.user_id, principal.role, action
        )))
    }
}

fn criterion_matches(
    principal: &Principal,
    resource: &Resource,
    criterion: &AllowedResourceCriterion,
) -> bool {
    if let Some(scope) = criterion.resource_scope {
        if !scope_matches(principal, resource, scope) {
            return false;
        }
    }

    if let Some(expect_public) = criterion.is_public {
        match resource {
            Resource::McpServer { organization_id } => {
                if organization_id.is_none() != expect_public {
                    return false;
                }
            }
            _ => return false,
        }
    }

    if let Some(expected) = criterion.connected_account_ownership {
        match resource {
            Resource::Configuration {
                connected_account_ownership,
                ..
            } => {
                if *connected_account_ownership != expected {
                    return false;
                }
            }
            _ => return false,
        }
    }

    if let Some(expected) = criterion.ownership {
        match resource {
            Resource::ConnectedAccount { ownership, .. } => {
                if *ownership != expected {
                    return false;
                }
            }
            _ => return false,
        }
    }

    true
}

fn scope_matches(principal: &Principal, resource: &Resource, scope: ResourceScope) -> bool {
    match scope {
        ResourceScope::Any => true,
        ResourceScope::SameOrg => is_same_org(principal, resource),
        ResourceScope::SameOrgSelf => is_same_org(principal, resource) && is_self(principal, resource),
        ResourceScope::SameOrgAllowedTeam => {
            is_same_org(principal, resource) && teams_intersect(principal, resource)
        }
    }
}

fn is_same_org(principal: &Principal, resource: &Resource) -> bool {
    match resource {
        Resource::McpServer { organization_id } => *organization_id == Some(principal.organization_id),
        Resource::Configuration {
            organization_id, ..
        }
        | Resource::Bundle {
            organization_id, ..
        }
        | Resource::ConnectedAccount {
            organization_id, ..
        }
        | Resource::Team { organization_id } => *organization_id == principal.organization_id,
        Resource::Organization { id } => *id == principal.organization_id,
    }
}

fn is_self(principal: &Principal, resource: &Resource) -> bool {
    match resource {
        Resource::ConnectedAccount { user_id, .. } | Resource::Bundle { user_id, .. } => {
            *user_id == principal.user_id
        }
        _ => false,
    }
}

/// `same_org:allowed_team` reads the allowed-team set of the configuration
/// itself, or of the configuration behind a connected account.
fn teams_intersect(principal: &Principal, resource: &Resource) -> bool {
    let allowed = match resource {
        Resource::Configuration { allowed_teams, .. } => allowed_teams,
        Resource::ConnectedAccount {
            configuration_allowed_teams,
            ..
        } => configuration_allowed_teams,
        _ => return false,
    };
    principal.team_ids.iter().any(|team| allowed.contains(team))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::default_acl;
    use portico_api_types::ConnectedAccountOwnership;

    fn member(org: Uuid, teams: Vec<Uuid>) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            organization_id: org,
            role: OrganizationRole::Member,
            team_ids: teams,
        }
    }

    fn admin(org: Uuid) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            organization_id: org,
            role: OrganizationRole::Admin,
            team_ids: Vec::new(),
        }
    }

    fn shared_configuration(org: Uuid, allowed_teams: Vec<Uuid>) -> Resource {
        Resource::Configuration {
            id: Uuid::new_v4(),
            organization_id: org,
            connected_account_ownership: ConnectedAccountOwnership::Shared,
            allowed_teams,
        }
    }

    #[test]
    fn member_needs_team_intersection_for_bundle_create() {
        let acl = default_acl().unwrap();
        let org = Uuid::new_v4();
        let team = Uuid::new_v4();

        let in_team = member(org, vec![team]);
        let outside = member(org, vec![Uuid::new_v4()]);
        let config = shared_configuration(org, vec![team]);

        assert!(is_action_permitted(
            &acl,
            &in_team,
            Action::ConfigurationCreateBundleOn,
            Some(&config)
        ));
        assert!(!is_action_permitted(
            &acl,
            &outside,
            Action::ConfigurationCreateBundleOn,
            Some(&config)
        ));
    }

    #[test]
    fn admin_passes_same_org_but_not_foreign_org() {
        let acl = default_acl().unwrap();
        let org = Uuid::new_v4();
        let config = shared_configuration(org, vec![]);
        let foreign_config = shared_configuration(Uuid::new_v4(), vec![]);

        let principal = admin(org);
        assert!(is_action_permitted(
            &acl,
            &principal,
            Action::ConfigurationUpdate,
            Some(&config)
        ));
        assert!(!is_action_permitted(
            &acl,
            &principal,
            Action::ConfigurationUpdate,
            Some(&foreign_config)
        ));
    }

    #[test]
    fn member_cannot_mutate_configurations() {
        let acl = default_acl().unwrap();
        let org = Uuid::new_v4();
        let principal = member(org, vec![]);
        let config = shared_configuration(org, vec![]);
        assert!(!is_action_permitted(
            &acl,
            &principal,
            Action::ConfigurationUpdate,
            Some(&config)
        ));
    }

    #[test]
    fn criteria_with_no_resource_denies() {
        let acl = default_acl().unwrap();
        let org = Uuid::new_v4();
        let principal = admin(org);
        assert!(!is_action_permitted(
            &acl,
            &principal,
            Action::ConfigurationUpdate,
            None
        ));
    }

    #[test]
    fn resource_type_mismatch_denies() {
        let acl = default_acl().unwrap();
        let org = Uuid::new_v4();
        let principal = admin(org);
        // A team resource passed for a configuration action
        let team = Resource::Team {
            organization_id: org,
        };
        assert!(!is_action_permitted(
            &acl,
            &principal,
            Action::ConfigurationUpdate,
            Some(&team)
        ));
    }

    #[test]
    fn self_scope_matches_owner_only() {
        let acl = default_acl().unwrap();
        let org = Uuid::new_v4();
        let principal = member(org, vec![]);

        let own_bundle = Resource::Bundle {
            organization_id: org,
            user_id: principal.user_id,
        };
        let other_bundle = Resource::Bundle {
            organization_id: org,
            user_id: Uuid::new_v4(),
        };

        assert!(is_action_permitted(
            &acl,
            &principal,
            Action::BundleDelete,
            Some(&own_bundle)
        ));
        assert!(!is_action_permitted(
            &acl,
            &principal,
            Action::BundleDelete,
            Some(&other_bundle)
        ));
    }
}
