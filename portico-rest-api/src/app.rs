//! Router assembly

use axum::routing::{delete, get, post};
use axum::Router;

use crate::context::AppContext;
use crate::handlers;

/// Build the control-plane router. The gateway route is mounted separately
/// by the server crate.
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        // Auth
        .route("/auth/register/email", post(handlers::auth::register_email))
        .route("/auth/login/email", post(handlers::auth::login_email))
        .route("/auth/verify-email", get(handlers::auth::verify_email))
        .route("/auth/token", post(handlers::auth::token))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/google/authorize", get(handlers::auth::google_authorize))
        .route("/auth/google/callback", get(handlers::auth::google_callback))
        // Organizations, members, teams, invitations
        .route("/organizations", post(handlers::organizations::create_organization))
        .route(
            "/organizations/{organization_id}/members",
            get(handlers::organizations::list_members),
        )
        .route(
            "/organizations/{organization_id}/members/{user_id}",
            delete(handlers::organizations::remove_member)
                .patch(handlers::organizations::update_member_role),
        )
        .route(
            "/organizations/{organization_id}/teams",
            post(handlers::organizations::create_team).get(handlers::organizations::list_teams),
        )
        .route(
            "/organizations/{organization_id}/teams/{team_id}",
            delete(handlers::organizations::delete_team),
        )
        .route(
            "/organizations/{organization_id}/teams/{team_id}/members",
            post(handlers::organizations::add_team_member),
        )
        .route(
            "/organizations/{organization_id}/teams/{team_id}/members/{user_id}",
            delete(handlers::organizations::remove_team_member),
        )
        .route(
            "/organizations/{organization_id}/invitations",
            post(handlers::organizations::create_invitation)
                .get(handlers::organizations::list_invitations),
        )
        .route(
            "/organizations/{organization_id}/invitations/{invitation_id}",
            delete(handlers::organizations::cancel_invitation),
        )
        .route(
            "/organizations/invitations/accept",
            post(handlers::organizations::accept_invitation),
        )
        // MCP server registry
        .route(
            "/mcp-servers",
            get(handlers::mcp_servers::list_servers).post(handlers::mcp_servers::create_custom_server),
        )
        .route(
            "/mcp-servers/oauth2-discovery",
            post(handlers::mcp_servers::oauth2_discovery),
        )
        .route("/mcp-servers/oauth2-dcr", post(handlers::mcp_servers::oauth2_dcr))
        .route(
            "/mcp-servers/{server_id}",
            get(handlers::mcp_servers::get_server)
                .patch(handlers::mcp_servers::update_server)
                .delete(handlers::mcp_servers::delete_server),
        )
        .route(
            "/mcp-servers/{server_id}/refresh-tools",
            post(handlers::mcp_servers::refresh_tools),
        )
        // Configurations
        .route(
            "/mcp-server-configurations",
            post(handlers::configurations::create_configuration)
                .get(handlers::configurations::list_configurations),
        )
        .route(
            "/mcp-server-configurations/{configuration_id}",
            get(handlers::configurations::get_configuration)
                .patch(handlers::configurations::update_configuration)
                .delete(handlers::configurations::delete_configuration),
        )
        // Connected accounts
        .route(
            "/connected-accounts",
            post(handlers::connected_accounts::create_connected_account)
                .get(handlers::connected_accounts::list_connected_accounts),
        )
        .route(
            "/connected-accounts/oauth2/callback",
            get(handlers::connected_accounts::oauth2_callback),
        )
        .route(
            "/connected-accounts/{account_id}",
            delete(handlers::connected_accounts::delete_connected_account),
        )
        // Ops accounts
        .route(
            "/ops-accounts",
            post(handlers::ops_accounts::create_ops_account)
                .get(handlers::ops_accounts::list_ops_accounts),
        )
        .route(
            "/ops-accounts/oauth2/callback",
            get(handlers::ops_accounts::oauth2_callback),
        )
        .route(
            "/ops-accounts/{account_id}",
            delete(handlers::ops_accounts::delete_ops_account),
        )
        // Bundles
        .route(
            "/mcp-server-bundles",
            post(handlers::bundles::create_bundle).get(handlers::bundles::list_bundles),
        )
        .route(
            "/mcp-server-bundles/{bundle_id}",
            get(handlers::bundles::get_bundle).delete(handlers::bundles::delete_bundle),
        )
        // Logs
        .route("/logs/tool-calls", get(handlers::logs::list_tool_call_logs))
        // Subscriptions
        .route(
            "/organizations/{organization_id}/subscription-status",
            get(handlers::subscriptions::subscription_status),
        )
        .route(
            "/organizations/{organization_id}/change-subscription",
            post(handlers::subscriptions::change_subscription_handler),
        )
        .route(
            "/organizations/{organization_id}/cancel-subscription",
            post(handlers::subscriptions::cancel_subscription_handler),
        )
        .route(
            "/subscription/stripe/webhook",
            post(handlers::subscriptions::stripe_webhook),
        )
        .with_state(ctx)
}
