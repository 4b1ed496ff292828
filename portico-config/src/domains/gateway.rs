//! Gateway request-path configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};

/// Gateway and catalog-sync tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Default timeout for upstream MCP calls in seconds
    #[serde(default = "default_upstream_timeout_seconds")]
    pub upstream_timeout_seconds: u64,

    /// Timeout for catalog-sync tools/list calls in seconds
    #[serde(default = "default_sync_timeout_seconds")]
    pub sync_timeout_seconds: u64,

    /// Minimum interval between catalog syncs per server, in seconds
    #[serde(default = "default_sync_min_interval_seconds")]
    pub sync_min_interval_seconds: i64,

    /// Idle TTL for gateway sessions in seconds
    #[serde(default = "default_session_idle_ttl_seconds")]
    pub session_idle_ttl_seconds: i64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            upstream_timeout_seconds: default_upstream_timeout_seconds(),
            sync_timeout_seconds: default_sync_timeout_seconds(),
            sync_min_interval_seconds: default_sync_min_interval_seconds(),
            session_idle_ttl_seconds: default_session_idle_ttl_seconds(),
        }
    }
}

impl Validatable for GatewayConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.upstream_timeout_seconds,
            "gateway.upstream_timeout_seconds",
        )?;
        validate_positive(self.sync_timeout_seconds, "gateway.sync_timeout_seconds")?;
        Ok(())
    }
}

fn default_upstream_timeout_seconds() -> u64 {
    30
}

fn default_sync_timeout_seconds() -> u64 {
    60
}

fn default_sync_min_interval_seconds() -> i64 {
    60
}

fn default_session_idle_ttl_seconds() -> i64 {
    3600
}
