//! OAuth metadata discovery
//!
//! Sequence: probe the server URL; if the 401 carries a
//! `WWW-Authenticate: ... resource_metadata="..."` pointer (RFC 9728) follow
//! it, else fall back to `/.well-known/oauth-protected-resource`. Then walk
//! the metadata candidates in order: path-aware authorization-server, root
//! authorization-server, path-aware openid-configuration, appended
//! openid-configuration. A 5xx aborts the walk; any other non-200 advances.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{OAuth2Error, OAuth2Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthMetadata {
    pub authorization_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub registration_endpoint: Option<String>,
    #[serde(default)]
    pub token_endpoint_auth_methods_supported: Vec<String>,
    #[serde(default)]
    pub scopes_supported: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProtectedResourceMetadata {
    #[serde(default)]
    authorization_servers: Vec<String>,
}

/// Extract the `resource_metadata` URL from a `WWW-Authenticate` header
/// value. Both quoted and unquoted forms appear in the wild.
fn resource_metadata_from_www_auth(header: &str) -> Option<String> {
    let idx = header.find("resource_metadata=")?;
    let rest = &header[idx + "resource_metadata=".len()..];
    if let Some(stripped) = rest.strip_prefix('"') {
        stripped.split('"').next().map(str::to_string)
    } else {
        rest.split([' ', ','])
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

fn origin_of(url: &Url) -> String {
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), url.host_str().unwrap_or(""), port),
        None => format!("{}://{}", url.scheme(), url.host_str().unwrap_or("")),
    }
}

/// Ordered candidate URLs for OAuth server metadata.
fn discovery_urls(auth_server_url: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let Ok(parsed) = Url::parse(auth_server_url) else {
        return urls;
    };
    let base = origin_of(&parsed);
    let path = parsed.path();

    if !path.is_empty() && path != "/" {
        urls.push(format!(
            "{}/.well-known/oauth-authorization-server{}",
            base,
            path.trim_end_matches('/')
        ));
    }
    urls.push(format!("{}/.well-known/oauth-authorization-server", base));
    if !path.is_empty() && path != "/" {
        urls.push(format!(
            "{}/.well-known/openid-configuration{}",
            base,
            path.trim_end_matches('/')
        ));
    }
    // OIDC appends to the full URL rather than the origin
    urls.push(format!(
        "{}/.well-known/openid-configuration",
        auth_server_url.trim_end_matches('/')
    ));
    urls
}

/// Run the full discovery sequence against an MCP server URL.
pub async fn discover_metadata(
    http: &reqwest::Client,
    server_url: &str,
) -> OAuth2Result<OAuthMetadata> {
    let probe = http
        .get(server_url)
        .send()
        .await
        .map_err(|e| OAuth2Error::DiscoveryFailed(format!("probe of {} failed: {}", server_url, e)))?;

    let auth_server_url = discover_protected_resource(http, server_url, &probe)
        .await
        .unwrap_or(None)
        .unwrap_or_else(|| server_url.to_string());

    for url in discovery_urls(&auth_server_url) {
        debug!(%url, "trying oauth metadata url");
        let response = match http.get(&url).send().await {
            Ok(response) => response,
            // Network error: try the next candidate
            Err(_) => continue,
        };

        let status = response.status();
        if status == StatusCode::OK {
            if let Ok(metadata) = response.json::<OAuthMetadata>().await {
                return Ok(metadata);
            }
        } else if status.is_server_error() {
            return Err(OAuth2Error::DiscoveryFailed(format!(
                "metadata endpoint {} returned {}",
                url, status
            )));
        }
        // 3xx/4xx: advance to the next candidate
    }

    Err(OAuth2Error::DiscoveryFailed(format!(
        "no OAuth metadata found for {}",
        server_url
    )))
}

/// RFC 9728: locate the protected-resource metadata and return the first
/// advertised authorization server, if any.
async fn discover_protected_resource(
    http: &reqwest::Client,
    server_url: &str,
    probe: &reqwest::Response,
) -> OAuth2Result<Option<String>> {
    let metadata_url = if probe.status() == StatusCode::UNAUTHORIZED {
        probe
            .headers()
            .get("WWW-Authenticate")
            .and_then(|v| v.to_str().ok())
            .and_then(resource_metadata_from_www_auth)
    } else {
        None
    };

    let metadata_url = match metadata_url {
        Some(url) => url,
        None => {
            let parsed = Url::parse(server_url)
                .map_err(|e| OAuth2Error::DiscoveryFailed(e.to_string()))?;
            format!("{}/.well-known/oauth-protected-resource", origin_of(&parsed))
        }
    };

    let Ok(response) = http.get(&metadata_url).send().await else {
        return Ok(None);
    };
    if response.status() != StatusCode::OK {
        return Ok(None);
    }
    let Ok(metadata) = response.json::<ProtectedResourceMetadata>().await else {
        return Ok(None);
    };
    Ok(metadata.authorization_servers.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn www_auth_parsing_handles_quoted_and_bare_values() {
        assert_eq!(
            resource_metadata_from_www_auth(
                r#"Bearer resource_metadata="https://rs.example/meta", error="invalid_token""#
            ),
            Some("https://rs.example/meta".to_string())
        );
        assert_eq!(
            resource_metadata_from_www_auth("Bearer resource_metadata=https://rs.example/meta"),
            Some("https://rs.example/meta".to_string())
        );
        assert_eq!(resource_metadata_from_www_auth("Bearer realm=\"x\""), None);
    }

    #[test]
    fn discovery_url_order_with_path() {
        let urls = discovery_urls("https://auth.example.com/tenant1");
        assert_eq!(
            urls,
            vec![
                "https://auth.example.com/.well-known/oauth-authorization-server/tenant1",
                "https://auth.example.com/.well-known/oauth-authorization-server",
                "https://auth.example.com/.well-known/openid-configuration/tenant1",
                "https://auth.example.com/tenant1/.well-known/openid-configuration",
            ]
        );
    }

    #[test]
    fn discovery_url_order_without_path() {
        let urls = discovery_urls("https://auth.example.com");
        assert_eq!(
            urls,
            vec![
                "https://auth.example.com/.well-known/oauth-authorization-server",
                "https://auth.example.com/.well-known/openid-configuration",
            ]
        );
    }
}
