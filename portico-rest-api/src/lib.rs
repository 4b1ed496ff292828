//! Control-plane REST API
//!
//! Handlers for auth, organizations, the MCP registry, configurations,
//! connected accounts, bundles, logs and subscriptions, plus the services
//! they share: the orphan reaper, entitlement resolution and the Stripe
//! reconciliation state machine.

pub mod app;
pub mod context;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

pub use app::build_router;
pub use context::AppContext;
pub use errors::{RestError, RestResult};
