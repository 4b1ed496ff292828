//! ACL construction
//!
//! The ACL is declared in code through a builder that rejects duplicate
//! action declarations within one role at construction time.

use portico_api_types::{ConnectedAccountOwnership, OrganizationRole};
use std::collections::HashMap;

use crate::definitions::{
    Action, AllowedResourceCriterion, Permission, ResourceScope, ResourceType,
};
use crate::error::{RbacError, RbacResult};

/// Per-role permission lists.
#[derive(Debug, Clone)]
pub struct Acl {
    roles: HashMap<OrganizationRole, Vec<Permission>>,
}

impl Acl {
    pub fn find(&self, role: OrganizationRole, action: Action) -> Option<&Permission> {
        self.roles
            .get(&role)?
            .iter()
            .find(|permission| permission.action == action)
    }
}

#[derive(Debug, Default)]
pub struct AclBuilder {
    roles: HashMap<OrganizationRole, Vec<Permission>>,
}

impl AclBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, role: OrganizationRole, permission: Permission) -> Self {
        self.roles.entry(role).or_default().push(permission);
        self
    }

    /// Finish, rejecting duplicate actions within a role.
    pub fn build(self) -> RbacResult<Acl> {
        for permissions in self.roles.values() {
            let mut seen = std::collections::HashSet::new();
            for permission in permissions {
                if !seen.insert(permission.action) {
                    return Err(RbacError::DuplicateAction(format!("{:?}", permission.action)));
                }
            }
        }
        Ok(Acl { roles: self.roles })
    }
}

fn unconditional(action: Action) -> Permission {
    Permission {
        action,
        resource_type: None,
        allowed_resource_criteria: None,
    }
}

fn scoped(action: Action, resource_type: ResourceType, scope: ResourceScope) -> Permission {
    Permission {
        action,
        resource_type: Some(resource_type),
        allowed_resource_criteria: Some(vec![AllowedResourceCriterion {
            resource_scope: Some(scope),
            ..Default::default()
        }]),
    }
}

/// The shipped ACL.
///
/// Admins manage everything in their organization. Members read, operate
/// through allowed-team access, and own their individual accounts and
/// bundles.
pub fn default_acl() -> RbacResult<Acl> {
    use Action::*;
    use OrganizationRole::{Admin, Member};
    use ResourceScope::{Any, SameOrg, SameOrgAllowedTeam, SameOrgSelf};

    let same_org_or_public = |action: Action| Permission {
        action,
        resource_type: Some(ResourceType::McpServer),
        allowed_resource_criteria: Some(vec![
            AllowedResourceCriterion {
                resource_scope: Some(SameOrg),
                ..Default::default()
            },
            AllowedResourceCriterion {
                is_public: Some(true),
                ..Default::default()
            },
        ]),
    };

    AclBuilder::new()
        // --- Admin ---
        .grant(Admin, unconditional(McpServerList))
        .grant(Admin, same_org_or_public(McpServerRead))
        .grant(Admin, unconditional(McpServerCreate))
        .grant(Admin, scoped(McpServerUpdate, ResourceType::McpServer, SameOrg))
        .grant(Admin, scoped(McpServerDelete, ResourceType::McpServer, SameOrg))
        .grant(Admin, same_org_or_public(McpServerRefreshTools))
        .grant(Admin, unconditional(McpServerOauth2Discovery))
        .grant(Admin, same_org_or_public(McpServerCreateConfigurationOn))
        .grant(Admin, unconditional(ConfigurationList))
        .grant(Admin, scoped(ConfigurationRead, ResourceType::Configuration, SameOrg))
        .grant(Admin, unconditional(ConfigurationCreate))
        .grant(Admin, scoped(ConfigurationUpdate, ResourceType::Configuration, SameOrg))
        .grant(Admin, scoped(ConfigurationDelete, ResourceType::Configuration, SameOrg))
        .grant(
            Admin,
            scoped(ConfigurationCreateBundleOn, ResourceType::Configuration, SameOrgAllowedTeam),
        )
        .grant(
            Admin,
            scoped(
                ConfigurationCreateConnectedAccountOn,
                ResourceType::Configuration,
                SameOrg,
            ),
        )
        .grant(Admin, unconditional(BundleCreate))
        .grant(Admin, unconditional(BundleList))
        .grant(Admin, scoped(BundleRead, ResourceType::Bundle, SameOrg))
        .grant(Admin, scoped(BundleDelete, ResourceType::Bundle, SameOrg))
        .grant(Admin, unconditional(ConnectedAccountCreate))
        .grant(Admin, unconditional(ConnectedAccountList))
        .grant(
            Admin,
            scoped(ConnectedAccountDelete, ResourceType::ConnectedAccount, SameOrg),
        )
        .grant(Admin, unconditional(TeamCreate))
        .grant(Admin, unconditional(TeamList))
        .grant(Admin, scoped(TeamDelete, ResourceType::Team, SameOrg))
        .grant(Admin, scoped(TeamListMember, ResourceType::Team, SameOrg))
        .grant(Admin, scoped(TeamAddMember, ResourceType::Team, SameOrg))
        .grant(Admin, scoped(TeamRemoveMember, ResourceType::Team, SameOrg))
        .grant(
            Admin,
            scoped(OrganizationRemoveMember, ResourceType::Organization, SameOrg),
        )
        .grant(
            Admin,
            scoped(OrganizationUpdateMemberRole, ResourceType::Organization, SameOrg),
        )
        .grant(
            Admin,
            scoped(OrganizationListMember, ResourceType::Organization, SameOrg),
        )
        .grant(
            Admin,
            scoped(OrganizationCreateInvitation, ResourceType::Organization, SameOrg),
        )
        .grant(
            Admin,
            scoped(OrganizationCancelInvitation, ResourceType::Organization, SameOrg),
        )
        .grant(
            Admin,
            scoped(OrganizationListInvitation, ResourceType::Organization, SameOrg),
        )
        // --- Member ---
        .grant(Member, unconditional(McpServerList))
        .grant(Member, Permission {
            action: McpServerRead,
            resource_type: Some(ResourceType::McpServer),
            allowed_resource_criteria: Some(vec![
                AllowedResourceCriterion {
                    resource_scope: Some(SameOrg),
                    ..Default::default()
                },
                AllowedResourceCriterion {
                    resource_scope: Some(Any),
                    is_public: Some(true),
                    ..Default::default()
                },
            ]),
        })
        .grant(Member, unconditional(ConfigurationList))
        .grant(Member, scoped(ConfigurationRead, ResourceType::Configuration, SameOrg))
        .grant(
            Member,
            scoped(ConfigurationCreateBundleOn, ResourceType::Configuration, SameOrgAllowedTeam),
        )
        .grant(
            Member,
            Permission {
                action: ConfigurationCreateConnectedAccountOn,
                resource_type: Some(ResourceType::Configuration),
                allowed_resource_criteria: Some(vec![AllowedResourceCriterion {
                    resource_scope: Some(SameOrgAllowedTeam),
                    connected_account_ownership: Some(ConnectedAccountOwnership::Individual),
                    ..Default::default()
                }]),
            },
        )
        .grant(Member, unconditional(BundleCreate))
        .grant(Member, unconditional(BundleList))
        .grant(Member, scoped(BundleRead, ResourceType::Bundle, SameOrgSelf))
        .grant(Member, scoped(BundleDelete, ResourceType::Bundle, SameOrgSelf))
        .grant(Member, unconditional(ConnectedAccountCreate))
        .grant(Member, unconditional(ConnectedAccountList))
        .grant(
            Member,
            Permission {
                action: ConnectedAccountDelete,
                resource_type: Some(ResourceType::ConnectedAccount),
                allowed_resource_criteria: Some(vec![AllowedResourceCriterion {
                    resource_scope: Some(SameOrgSelf),
                    ownership: Some(ConnectedAccountOwnership::Individual),
                    ..Default::default()
                }]),
            },
        )
        .grant(Member, unconditional(TeamList))
        .grant(Member, scoped(TeamListMember, ResourceType::Team, SameOrg))
        .grant(
            Member,
            scoped(OrganizationListMember, ResourceType::Organization, SameOrg),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_acl_builds() {
        let acl = default_acl().unwrap();
        assert!(acl.find(OrganizationRole::Admin, Action::ConfigurationCreate).is_some());
        assert!(acl.find(OrganizationRole::Member, Action::ConfigurationCreate).is_none());
    }

    #[test]
    fn duplicate_action_rejected_at_build() {
        let result = AclBuilder::new()
            .grant(OrganizationRole::Admin, unconditional(Action::TeamList))
            .grant(OrganizationRole::Admin, unconditional(Action::TeamList))
            .build();
        assert!(matches!(result, Err(RbacError::DuplicateAction(_))));
    }
}
