//! MCP protocol, gateway dispatcher and catalog sync
//!
//! The gateway front door (`POST /mcp/{bundle_key}`) lives here, together
//! with everything the request path needs: JSON-RPC/MCP protocol types, the
//! upstream MCP client, the credentials store and the two meta-tools. The
//! catalog-sync service shares the upstream client and the tool utilities.

pub mod client;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod protocol;
pub mod sync;
pub mod tool_utils;

pub use client::{UpstreamClient, UpstreamTarget};
pub use credentials::CredentialsStore;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{handle_mcp_request, GatewayState};
pub use sync::{sync_tool_catalog, SyncOutcome};
