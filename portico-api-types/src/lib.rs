//! Unified API types for the Portico control plane and gateway
//!
//! This crate provides the type definitions shared across the REST API, the
//! gateway request path and the storage layer, so enum discriminators and
//! wire formats stay consistent in one place.

pub mod auth;
pub mod enums;
pub mod errors;
pub mod pagination;

// Re-export main types for convenience
pub use auth::{AuthConfig, AuthCredentials, OAuth2AuthConfig, OAuth2Credentials};
pub use enums::{
    AuthType, ConnectedAccountOwnership, HttpLocation, IdentityProvider, McpServerTransport,
    OrganizationRole, ToolCallStatus,
};
pub use errors::{ApiError, ErrorCode};
pub use pagination::{CursorPage, CursorPaginationParams, LogCursor};
