//! Bundle endpoint types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateBundleRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub mcp_server_configuration_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BundleResponse {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// The opaque capability an agent targets; displayed verbatim
    pub bundle_key: String,
    pub mcp_server_configuration_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}
