//! Gateway and sync error taxonomy
//!
//! On the gateway surface these map to JSON-RPC error objects (HTTP stays
//! 200); on the control-plane surface (catalog sync) they map to HTTP
//! statuses through the REST error layer.

use thiserror::Error;

use crate::protocol::error_codes;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Bundle not found")]
    BundleNotFound,

    #[error("Session not found or expired")]
    SessionNotFound,

    #[error("Tool not found or forbidden")]
    ToolNotFoundOrForbidden,

    #[error("No connected account for this configuration")]
    CredentialsNotFound,

    #[error("Not permitted")]
    NotPermitted,

    #[error("Upstream MCP server unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream MCP server timed out")]
    UpstreamTimeout,

    #[error("Tool catalog sync ran too recently")]
    SyncTooFrequent,

    #[error("Operational account missing for server")]
    OperationalAccountMissing,

    #[error("Tool name rejected: {0}")]
    ToolSanitization(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Storage error: {0}")]
    Storage(#[from] portico_storage::StorageError),

    #[error("OAuth2 error: {0}")]
    OAuth2(#[from] portico_oauth2::OAuth2Error),

    #[error("Embedding provider error: {0}")]
    Embedding(portico_http::HttpError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// JSON-RPC error code for the gateway surface.
    pub fn jsonrpc_code(&self) -> i64 {
        match self {
            GatewayError::SessionNotFound => error_codes::SESSION_NOT_FOUND,
            GatewayError::ToolNotFoundOrForbidden => error_codes::TOOL_NOT_FOUND_OR_FORBIDDEN,
            GatewayError::UpstreamUnavailable(_) => error_codes::UPSTREAM_UNAVAILABLE,
            GatewayError::UpstreamTimeout => error_codes::UPSTREAM_TIMEOUT,
            GatewayError::NotPermitted => error_codes::NOT_PERMITTED,
            GatewayError::CredentialsNotFound | GatewayError::OperationalAccountMissing => {
                error_codes::CREDENTIALS_NOT_FOUND
            }
            GatewayError::InvalidParams(_) => error_codes::INVALID_PARAMS,
            _ => error_codes::INTERNAL_ERROR,
        }
    }

    /// Message safe to show to the calling agent.
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::Storage(_)
            | GatewayError::OAuth2(_)
            | GatewayError::Embedding(_)
            | GatewayError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}
