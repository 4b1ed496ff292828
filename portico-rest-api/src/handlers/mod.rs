//! Route handlers

pub mod auth;
pub mod bundles;
pub mod configurations;
pub mod connected_accounts;
pub mod health;
pub mod logs;
pub mod mcp_servers;
pub mod ops_accounts;
pub mod organizations;
pub mod subscriptions;
