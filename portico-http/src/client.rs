//! Shared outbound HTTP client

use std::time::Duration;

/// Build the shared `reqwest` client. One instance serves all outbound
/// traffic so per-host connection pools are reused across requests.
pub fn shared_client(timeout_seconds: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .expect("reqwest client construction only fails on TLS backend misconfiguration")
}
