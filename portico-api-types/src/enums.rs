use serde::{Deserialize, Serialize};

/// Unified enums shared by the REST API, the gateway and storage.
///
/// Discriminator strings match the persisted column values, so a variant
/// rename is a schema migration.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityProvider {
    Email,
    Google,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationRole {
    Admin,
    Member,
}

impl OrganizationRole {
    pub fn can_admin(&self) -> bool {
        matches!(self, OrganizationRole::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationRole::Admin => "admin",
            OrganizationRole::Member => "member",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    NoAuth,
    ApiKey,
    Oauth2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectedAccountOwnership {
    Individual,
    Shared,
    Operational,
}

/// Where an API key is injected on the upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpLocation {
    Header,
    Query,
    Cookie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpServerTransport {
    StreamableHttp,
    Sse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Success,
    Error,
}

impl ToolCallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCallStatus::Success => "success",
            ToolCallStatus::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_wire_format_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&ConnectedAccountOwnership::Operational).unwrap(),
            "\"operational\""
        );
        assert_eq!(
            serde_json::to_string(&McpServerTransport::StreamableHttp).unwrap(),
            "\"streamable_http\""
        );
        assert_eq!(serde_json::to_string(&AuthType::NoAuth).unwrap(), "\"no_auth\"");
    }

    #[test]
    fn admin_can_admin_member_cannot() {
        assert!(OrganizationRole::Admin.can_admin());
        assert!(!OrganizationRole::Member.can_admin());
    }
}
