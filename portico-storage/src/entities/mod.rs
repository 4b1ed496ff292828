//! SeaORM entity definitions
//!
//! Variant payloads (auth configs, credentials, bundle membership) persist as
//! JSON columns next to an indexable enum discriminator. Embedding columns
//! are pgvector columns deliberately absent from the entity models; the
//! repositories read and write them through raw statements.

pub mod connected_accounts;
pub mod entitlement_overrides;
pub mod mcp_server_bundles;
pub mod mcp_server_configurations;
pub mod mcp_servers;
pub mod mcp_sessions;
pub mod mcp_tool_call_logs;
pub mod mcp_tools;
pub mod organization_invitations;
pub mod organization_memberships;
pub mod organization_subscriptions;
pub mod organizations;
pub mod stripe_events;
pub mod subscription_plans;
pub mod team_memberships;
pub mod teams;
pub mod user_refresh_tokens;
pub mod user_verifications;
pub mod users;

pub use connected_accounts::Entity as ConnectedAccounts;
pub use entitlement_overrides::Entity as EntitlementOverrides;
pub use mcp_server_bundles::Entity as McpServerBundles;
pub use mcp_server_configurations::Entity as McpServerConfigurations;
pub use mcp_servers::Entity as McpServers;
pub use mcp_sessions::Entity as McpSessions;
pub use mcp_tool_call_logs::Entity as McpToolCallLogs;
pub use mcp_tools::Entity as McpTools;
pub use organization_invitations::Entity as OrganizationInvitations;
pub use organization_memberships::Entity as OrganizationMemberships;
pub use organization_subscriptions::Entity as OrganizationSubscriptions;
pub use organizations::Entity as Organizations;
pub use stripe_events::Entity as StripeEvents;
pub use subscription_plans::Entity as SubscriptionPlans;
pub use team_memberships::Entity as TeamMemberships;
pub use teams::Entity as Teams;
pub use user_refresh_tokens::Entity as UserRefreshTokens;
pub use user_verifications::Entity as UserVerifications;
pub use users::Entity as Users;
