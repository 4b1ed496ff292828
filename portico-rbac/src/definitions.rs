//! Action, criterion and resource definitions
//!
//! Action string convention: `<resource_type>:<action>`.

use portico_api_types::ConnectedAccountOwnership;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every control-plane action subject to RBAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    // MCP server
    McpServerList,
    McpServerRead,
    McpServerCreate,
    McpServerUpdate,
    McpServerDelete,
    McpServerRefreshTools,
    McpServerOauth2Discovery,
    McpServerCreateConfigurationOn,
    // MCP server configuration
    ConfigurationList,
    ConfigurationRead,
    ConfigurationCreate,
    ConfigurationUpdate,
    ConfigurationDelete,
    ConfigurationCreateBundleOn,
    ConfigurationCreateConnectedAccountOn,
    // Bundle
    BundleCreate,
    BundleList,
    BundleRead,
    BundleDelete,
    // Connected account
    ConnectedAccountCreate,
    ConnectedAccountList,
    ConnectedAccountDelete,
    // Team
    TeamCreate,
    TeamList,
    TeamDelete,
    TeamListMember,
    TeamAddMember,
    TeamRemoveMember,
    // Organization
    OrganizationRemoveMember,
    OrganizationUpdateMemberRole,
    OrganizationListMember,
    OrganizationCreateInvitation,
    OrganizationCancelInvitation,
    OrganizationListInvitation,
}

impl Action {
    /// The resource family an id passed with this action resolves against.
    pub fn resource_type(&self) -> ResourceType {
        use Action::*;
        match self {
            McpServerList | McpServerRead | McpServerCreate | McpServerUpdate | McpServerDelete
            | McpServerRefreshTools | McpServerOauth2Discovery | McpServerCreateConfigurationOn => {
                ResourceType::McpServer
            }
            ConfigurationList | ConfigurationRead | ConfigurationCreate | ConfigurationUpdate
            | ConfigurationDelete | ConfigurationCreateBundleOn
            | ConfigurationCreateConnectedAccountOn => ResourceType::Configuration,
            BundleCreate | BundleList | BundleRead | BundleDelete => ResourceType::Bundle,
            ConnectedAccountCreate | ConnectedAccountList | ConnectedAccountDelete => {
                ResourceType::ConnectedAccount
            }
            TeamCreate | TeamList | TeamDelete | TeamListMember | TeamAddMember
            | TeamRemoveMember => ResourceType::Team,
            OrganizationRemoveMember | OrganizationUpdateMemberRole | OrganizationListMember
            | OrganizationCreateInvitation | OrganizationCancelInvitation
            | OrganizationListInvitation => ResourceType::Organization,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    McpServer,
    Configuration,
    Bundle,
    ConnectedAccount,
    Team,
    Organization,
}

/// Attribute snapshot of a resource, carrying exactly the fields the
/// criteria predicates read. Built from entities by the `access` module.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    McpServer {
        organization_id: Option<Uuid>,
    },
    Configuration {
        id: Uuid,
        organization_id: Uuid,
        connected_account_ownership: ConnectedAccountOwnership,
        allowed_teams: Vec<Uuid>,
    },
    Bundle {
        organization_id: Uuid,
        user_id: Uuid,
    },
    ConnectedAccount {
        /// Organization of the owning configuration
        organization_id: Uuid,
        user_id: Uuid,
        ownership: ConnectedAccountOwnership,
        /// Allowed teams of the owning configuration
        configuration_allowed_teams: Vec<Uuid>,
    },
    Team {
        organization_id: Uuid,
    },
    Organization {
        id: Uuid,
    },
}

impl Resource {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Resource::McpServer { .. } => ResourceType::McpServer,
            Resource::Configuration { .. } => ResourceType::Configuration,
            Resource::Bundle { .. } => ResourceType::Bundle,
            Resource::ConnectedAccount { .. } => ResourceType::ConnectedAccount,
            Resource::Team { .. } => ResourceType::Team,
            Resource::Organization { .. } => ResourceType::Organization,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceScope {
    /// Resource lives in the act-as organization
    SameOrg,
    /// Same org, and the acting user owns the resource
    SameOrgSelf,
    /// Same org, and the user's teams intersect the resource's allowed teams
    SameOrgAllowedTeam,
    Any,
}

/// AND of optional predicates. A permission holds several criteria which
/// are evaluated OR.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllowedResourceCriterion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_scope: Option<ResourceScope>,
    /// MCP server only: matches public (platform) servers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    /// Configuration only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_account_ownership: Option<ConnectedAccountOwnership>,
    /// Connected account only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownership: Option<ConnectedAccountOwnership>,
}

/// One permission entry in a role's list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ResourceType>,
    /// `None` means the action is unconditionally granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_resource_criteria: Option<Vec<AllowedResourceCriterion>>,
}
