//! Upstream MCP client
//!
//! One JSON-RPC exchange per call over HTTP POST. The response body is
//! either plain JSON or an SSE frame stream; both transports are handled by
//! content type, and the upstream `Mcp-Session-Id` header is tracked so the
//! gateway can pin later calls to the negotiated session. No standing GET
//! stream is opened: the gateway proxies exactly one call per request.

use portico_api_types::{AuthCredentials, HttpLocation};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::json;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};
use crate::protocol::messages::{InitializeParams, ToolsListResult, SUPPORTED_PROTOCOL_VERSION};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse};

pub const MCP_SESSION_HEADER: &str = "Mcp-Session-Id";
pub const MCP_PROTOCOL_VERSION_HEADER: &str = "MCP-Protocol-Version";

/// Where and how to reach one upstream MCP server.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    pub url: String,
    pub credentials: AuthCredentials,
    /// api_key variants need the injection point from the server's config
    pub api_key_location: Option<(HttpLocation, String)>,
    /// Session id negotiated with the upstream, if any
    pub session_id: Option<String>,
}

/// Outcome of one upstream exchange.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub response: JsonRpcResponse,
    /// Session id the upstream handed back on this exchange, if any
    pub session_id: Option<String>,
    pub http_status: u16,
}

#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Send one JSON-RPC request and parse the single response.
    pub async fn request(
        &self,
        target: &UpstreamTarget,
        request: &JsonRpcRequest,
    ) -> GatewayResult<UpstreamResponse> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/event-stream"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            MCP_PROTOCOL_VERSION_HEADER,
            HeaderValue::from_static(SUPPORTED_PROTOCOL_VERSION),
        );
        if let Some(session_id) = &target.session_id {
            if let Ok(value) = HeaderValue::from_str(session_id) {
                headers.insert(MCP_SESSION_HEADER, value);
            }
        }

        let mut url = target.url.clone();
        match &target.credentials {
            AuthCredentials::NoAuth => {}
            AuthCredentials::ApiKey { secret_key } => {
                match &target.api_key_location {
                    Some((HttpLocation::Header, name)) => {
                        if let (Ok(name), Ok(value)) = (
                            reqwest::header::HeaderName::from_bytes(name.as_bytes()),
                            HeaderValue::from_str(secret_key),
                        ) {
                            headers.insert(name, value);
                        }
                    }
                    Some((HttpLocation::Query, name)) => {
                        let sep = if url.contains('?') { '&' } else { '?' };
                        url = format!("{}{}{}={}", url, sep, name, urlencoding::encode(secret_key));
                    }
                    Some((HttpLocation::Cookie, name)) => {
                        if let Ok(value) =
                            HeaderValue::from_str(&format!("{}={}", name, secret_key))
                        {
                            headers.insert(reqwest::header::COOKIE, value);
                        }
                    }
                    // Default injection point is the Authorization header
                    None => {
                        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", secret_key)) {
                            headers.insert(reqwest::header::AUTHORIZATION, value);
                        }
                    }
                }
            }
            AuthCredentials::Oauth2(oauth2) => {
                if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", oauth2.access_token))
                {
                    headers.insert(reqwest::header::AUTHORIZATION, value);
                }
            }
        }

        let response = self
            .http
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    GatewayError::UpstreamTimeout
                } else {
                    GatewayError::UpstreamUnavailable(err.to_string())
                }
            })?;

        let http_status = response.status().as_u16();
        let session_id = response
            .headers()
            .get(MCP_SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|err| GatewayError::UpstreamUnavailable(err.to_string()))?;

        // Auth failures arrive as bare HTTP statuses, not JSON-RPC errors
        if http_status == 401 || http_status == 403 {
            return Ok(UpstreamResponse {
                response: JsonRpcResponse::error(
                    request.id.clone(),
                    crate::protocol::error_codes::UPSTREAM_UNAVAILABLE,
                    format!("upstream returned {}", http_status),
                ),
                session_id,
                http_status,
            });
        }

        let parsed = if content_type.starts_with("text/event-stream") {
            parse_sse_response(&body)?
        } else {
            serde_json::from_str::<JsonRpcResponse>(&body).map_err(|err| {
                GatewayError::UpstreamUnavailable(format!("unparseable upstream response: {}", err))
            })?
        };

        Ok(UpstreamResponse {
            response: parsed,
            session_id,
            http_status,
        })
    }

    /// Perform the MCP handshake: `initialize` followed by the
    /// `notifications/initialized` notification. Returns the upstream
    /// session id, when the server issues one.
    pub async fn initialize(&self, target: &UpstreamTarget) -> GatewayResult<Option<String>> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: "initialize".to_string(),
            params: Some(
                serde_json::to_value(InitializeParams {
                    protocol_version: Some(SUPPORTED_PROTOCOL_VERSION.to_string()),
                    capabilities: json!({}),
                    client_info: Some(json!({
                        "name": "portico-gateway",
                        "version": env!("CARGO_PKG_VERSION"),
                    })),
                })
                .expect("initialize params serialize"),
            ),
            id: Some(json!(0)),
        };

        let outcome = self.request(target, &request).await?;
        if let Some(error) = &outcome.response.error {
            return Err(GatewayError::UpstreamUnavailable(format!(
                "upstream initialize failed: {}",
                error.message
            )));
        }

        let session_id = outcome.session_id;
        debug!(?session_id, "upstream initialized");

        // Complete the handshake; the upstream expects the notification on
        // the negotiated session.
        let mut notified_target = target.clone();
        if session_id.is_some() {
            notified_target.session_id = session_id.clone();
        }
        let notification = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: "notifications/initialized".to_string(),
            params: None,
            id: None,
        };
        // Some servers answer 202 with an empty body; ignore parse failures
        let _ = self.request(&notified_target, &notification).await;

        Ok(session_id)
    }

    /// Fetch the complete tool listing, following pagination cursors.
    pub async fn list_all_tools(
        &self,
        target: &UpstreamTarget,
    ) -> GatewayResult<Vec<crate::protocol::ToolDefinition>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        let mut request_id = 1i64;

        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let request = JsonRpcRequest {
                jsonrpc: "2.0".to_string(),
                method: "tools/list".to_string(),
                params: Some(params),
                id: Some(json!(request_id)),
            };
            request_id += 1;

            let outcome = self.request(target, &request).await?;
            if let Some(error) = outcome.response.error {
                return Err(GatewayError::UpstreamUnavailable(format!(
                    "upstream tools/list failed: {}",
                    error.message
                )));
            }
            let result: ToolsListResult = outcome
                .response
                .result
                .ok_or_else(|| {
                    GatewayError::UpstreamUnavailable("tools/list returned no result".to_string())
                })
                .and_then(|value| {
                    serde_json::from_value(value).map_err(|err| {
                        GatewayError::UpstreamUnavailable(format!(
                            "malformed tools/list result: {}",
                            err
                        ))
                    })
                })?;

            tools.extend(result.tools);
            match result.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(tools)
    }
}

/// Extract the first JSON-RPC response from an SSE-framed body.
fn parse_sse_response(body: &str) -> GatewayResult<JsonRpcResponse> {
    for line in body.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() {
            continue;
        }
        if let Ok(response) = serde_json::from_str::<JsonRpcResponse>(data) {
            // Skip interleaved server-to-client requests/notifications
            if response.result.is_some() || response.error.is_some() {
                return Ok(response);
            }
        }
    }
    Err(GatewayError::UpstreamUnavailable(
        "no JSON-RPC response in event stream".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_parsing_takes_first_response_frame() {
        let body = concat!(
            "event: message\n",
            "data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\"}\n",
            "\n",
            "data: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"ok\":true}}\n",
            "\n",
        );
        let response = parse_sse_response(body).unwrap();
        assert_eq!(response.result.unwrap()["ok"], true);
    }

    #[test]
    fn sse_parsing_fails_without_response() {
        assert!(parse_sse_response("event: ping\n\n").is_err());
    }

    #[test]
    fn query_encoding_escapes_reserved_bytes() {
        assert_eq!(urlencoding::encode("a&b=c"), "a%26b%3Dc");
    }
}
