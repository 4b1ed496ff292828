//! Unified API error surface
//!
//! Every error leaving the control plane carries only an `error_code` and a
//! `title`; internal messages stay in logs. The gateway maps the same codes
//! onto JSON-RPC error objects instead of HTTP statuses.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Auth
    TokenInvalid,
    TokenExpired,
    EmailNotVerified,
    EmailAlreadyExists,
    AccountDeletionInProgress,
    // RBAC
    NotPermitted,
    // Domain
    McpServerNotFound,
    ConfigurationNotFound,
    ConnectedAccountNotFound,
    BundleNotFound,
    OrganizationNotFound,
    TeamNotFound,
    InvalidAuthTypeForServer,
    ToolNotFoundOrForbidden,
    LastAdminCannotBeRemoved,
    ValidationFailed,
    // OAuth2
    Oauth2DiscoveryFailed,
    Oauth2RegistrationFailed,
    Oauth2TokenExchangeFailed,
    Oauth2StateInvalid,
    // Subscription
    RequestedSubscriptionInvalid,
    PlanNotAvailable,
    StripeOperationError,
    // Rate limiting
    ToolCatalogSyncTooFrequent,
    // Upstream
    UpstreamUnavailable,
    UpstreamTimeout,
    // Catch-all
    InternalError,
}

impl ErrorCode {
    /// HTTP status the control plane surfaces for this code.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::TokenInvalid | ErrorCode::TokenExpired => 401,
            ErrorCode::EmailNotVerified | ErrorCode::NotPermitted => 403,
            ErrorCode::EmailAlreadyExists
            | ErrorCode::InvalidAuthTypeForServer
            | ErrorCode::ValidationFailed
            | ErrorCode::LastAdminCannotBeRemoved
            | ErrorCode::Oauth2StateInvalid
            | ErrorCode::RequestedSubscriptionInvalid => 400,
            ErrorCode::AccountDeletionInProgress => 409,
            ErrorCode::McpServerNotFound
            | ErrorCode::ConfigurationNotFound
            | ErrorCode::ConnectedAccountNotFound
            | ErrorCode::BundleNotFound
            | ErrorCode::OrganizationNotFound
            | ErrorCode::TeamNotFound
            | ErrorCode::ToolNotFoundOrForbidden
            | ErrorCode::PlanNotAvailable => 404,
            ErrorCode::ToolCatalogSyncTooFrequent => 429,
            ErrorCode::Oauth2DiscoveryFailed
            | ErrorCode::Oauth2RegistrationFailed
            | ErrorCode::Oauth2TokenExchangeFailed => 400,
            ErrorCode::UpstreamUnavailable
            | ErrorCode::UpstreamTimeout
            | ErrorCode::StripeOperationError
            | ErrorCode::InternalError => 500,
        }
    }
}

/// The error shape serialized to API clients.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{title} ({error_code:?})")]
pub struct ApiError {
    pub error_code: ErrorCode,
    pub title: String,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, title: impl Into<String>) -> Self {
        Self {
            error_code,
            title: title.into(),
        }
    }

    pub fn not_permitted() -> Self {
        Self::new(ErrorCode::NotPermitted, "Not permitted")
    }

    pub fn internal() -> Self {
        Self::new(ErrorCode::InternalError, "Internal server error")
    }

    pub fn http_status(&self) -> u16 {
        self.error_code.http_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_spec_surface() {
        assert_eq!(ErrorCode::TokenExpired.http_status(), 401);
        assert_eq!(ErrorCode::EmailNotVerified.http_status(), 403);
        assert_eq!(ErrorCode::AccountDeletionInProgress.http_status(), 409);
        assert_eq!(ErrorCode::ToolCatalogSyncTooFrequent.http_status(), 429);
        assert_eq!(ErrorCode::PlanNotAvailable.http_status(), 404);
        assert_eq!(ErrorCode::RequestedSubscriptionInvalid.http_status(), 400);
    }

    #[test]
    fn error_code_serializes_snake_case() {
        let err = ApiError::new(ErrorCode::AccountDeletionInProgress, "Account deletion in progress");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error_code"], "account_deletion_in_progress");
    }
}
