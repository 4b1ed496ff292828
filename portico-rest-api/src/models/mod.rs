//! Request and response types for the REST API

pub mod auth;
pub mod bundles;
pub mod configurations;
pub mod connected_accounts;
pub mod logs;
pub mod mcp_servers;
pub mod organizations;
pub mod subscriptions;
