//! REST API error types and conversions
//!
//! Every failure funnels into [`RestError`] and leaves the process as an
//! `{error_code, title}` pair; internal messages stay in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portico_api_types::{ApiError, ErrorCode};
use portico_mcp::GatewayError;
use portico_rbac::RbacError;
use portico_storage::StorageError;
use thiserror::Error;
use tracing::error;

pub type RestResult<T> = Result<T, RestError>;

#[derive(Error, Debug)]
pub enum RestError {
    #[error("{0}")]
    Api(ApiError),

    #[error("Database error")]
    Storage(#[from] StorageError),

    #[error("Web error")]
    Web(#[from] portico_web::WebError),

    #[error("RBAC error")]
    Rbac(RbacError),

    #[error("OAuth2 error")]
    OAuth2(#[from] portico_oauth2::OAuth2Error),

    #[error("Gateway error")]
    Gateway(#[from] GatewayError),

    #[error("Outbound HTTP error")]
    Http(#[from] portico_http::HttpError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] sea_orm::DbErr),
}

impl RestError {
    pub fn api(error_code: ErrorCode, title: impl Into<String>) -> Self {
        RestError::Api(ApiError::new(error_code, title))
    }

    pub fn not_permitted() -> Self {
        RestError::Api(ApiError::not_permitted())
    }

    pub fn validation(title: impl Into<String>) -> Self {
        Self::api(ErrorCode::ValidationFailed, title)
    }

    /// Collapse to the wire-visible error.
    pub fn to_api_error(&self) -> ApiError {
        match self {
            RestError::Api(api) => api.clone(),
            RestError::Storage(StorageError::NotFound { entity, .. }) => match *entity {
                "MCPServer" => ApiError::new(ErrorCode::McpServerNotFound, "MCP server not found"),
                "MCPServerConfiguration" => {
                    ApiError::new(ErrorCode::ConfigurationNotFound, "Configuration not found")
                }
                "ConnectedAccount" => ApiError::new(
                    ErrorCode::ConnectedAccountNotFound,
                    "Connected account not found",
                ),
                "MCPServerBundle" => ApiError::new(ErrorCode::BundleNotFound, "Bundle not found"),
                "Organization" => {
                    ApiError::new(ErrorCode::OrganizationNotFound, "Organization not found")
                }
                "Team" => ApiError::new(ErrorCode::TeamNotFound, "Team not found"),
                _ => ApiError::new(ErrorCode::ValidationFailed, "Resource not found"),
            },
            RestError::Storage(StorageError::Constraint { message }) => {
                if message.contains("last admin") {
                    ApiError::new(ErrorCode::LastAdminCannotBeRemoved, "Cannot remove the last admin")
                } else {
                    ApiError::new(ErrorCode::ValidationFailed, message.clone())
                }
            }
            RestError::Storage(_) | RestError::Transaction(_) => ApiError::internal(),
            RestError::Web(web) => web.to_api_error(),
            RestError::Rbac(RbacError::NotPermitted(_)) => ApiError::not_permitted(),
            RestError::Rbac(_) => ApiError::internal(),
            RestError::OAuth2(err) => match err {
                portico_oauth2::OAuth2Error::DiscoveryFailed(_) => {
                    ApiError::new(ErrorCode::Oauth2DiscoveryFailed, "OAuth2 discovery failed")
                }
                portico_oauth2::OAuth2Error::RegistrationFailed(_) => ApiError::new(
                    ErrorCode::Oauth2RegistrationFailed,
                    "OAuth2 client registration failed",
                ),
                portico_oauth2::OAuth2Error::TokenExchangeFailed(_)
                | portico_oauth2::OAuth2Error::RefreshFailed(_) => ApiError::new(
                    ErrorCode::Oauth2TokenExchangeFailed,
                    "OAuth2 token exchange failed",
                ),
                portico_oauth2::OAuth2Error::StateInvalid => {
                    ApiError::new(ErrorCode::Oauth2StateInvalid, "OAuth2 state invalid")
                }
                portico_oauth2::OAuth2Error::Request(_) => ApiError::internal(),
            },
            RestError::Gateway(err) => match err {
                GatewayError::SyncTooFrequent => ApiError::new(
                    ErrorCode::ToolCatalogSyncTooFrequent,
                    "Tool catalog was synced recently",
                ),
                GatewayError::OperationalAccountMissing | GatewayError::CredentialsNotFound => {
                    ApiError::new(
                        ErrorCode::ConnectedAccountNotFound,
                        "Operational account not found",
                    )
                }
                GatewayError::UpstreamTimeout => {
                    ApiError::new(ErrorCode::UpstreamTimeout, "Upstream MCP server timed out")
                }
                GatewayError::UpstreamUnavailable(_) => ApiError::new(
                    ErrorCode::UpstreamUnavailable,
                    "Upstream MCP server unavailable",
                ),
                GatewayError::NotPermitted => ApiError::not_permitted(),
                _ => ApiError::internal(),
            },
            RestError::Http(err) => match err {
                portico_http::HttpError::InvalidSignature => {
                    ApiError::new(ErrorCode::ValidationFailed, "Invalid signature")
                }
                _ => ApiError::new(ErrorCode::StripeOperationError, "Provider operation failed"),
            },
        }
    }
}

impl From<RbacError> for RestError {
    fn from(err: RbacError) -> Self {
        match err {
            RbacError::Storage(storage) => RestError::Storage(storage),
            other => RestError::Rbac(other),
        }
    }
}

impl From<ApiError> for RestError {
    fn from(err: ApiError) -> Self {
        RestError::Api(err)
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let api_error = self.to_api_error();
        if api_error.error_code == ErrorCode::InternalError {
            error!(error = %self, "request failed with internal error");
        }
        let status = StatusCode::from_u16(api_error.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(api_error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_domain_codes() {
        let err = RestError::Storage(StorageError::not_found("MCPServer", "x"));
        assert_eq!(err.to_api_error().error_code, ErrorCode::McpServerNotFound);
        assert_eq!(err.to_api_error().http_status(), 404);
    }

    #[test]
    fn last_admin_constraint_maps_to_dedicated_code() {
        let err = RestError::Storage(StorageError::constraint(
            "cannot remove the last admin of an organization",
        ));
        assert_eq!(
            err.to_api_error().error_code,
            ErrorCode::LastAdminCannotBeRemoved
        );
    }

    #[test]
    fn sync_rate_limit_maps_to_429() {
        let err = RestError::Gateway(GatewayError::SyncTooFrequent);
        assert_eq!(err.to_api_error().http_status(), 429);
    }

    #[test]
    fn internal_errors_do_not_leak_messages() {
        let err = RestError::Storage(StorageError::corrupt("secret detail"));
        assert_eq!(err.to_api_error().title, "Internal server error");
    }
}
