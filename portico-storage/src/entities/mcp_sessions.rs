//! Gateway session entity
//!
//! The row id doubles as the `Mcp-Session-Id` handed to clients.
//! `external_mcp_sessions` maps upstream server id → upstream session id.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mcp_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bundle_id: Uuid,
    pub external_mcp_sessions: Json,
    pub deleted: bool,
    pub last_accessed_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mcp_server_bundles::Entity",
        from = "Column::BundleId",
        to = "super::mcp_server_bundles::Column::Id",
        on_delete = "Cascade"
    )]
    Bundle,
}

impl Related<super::mcp_server_bundles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bundle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn external_sessions(&self) -> HashMap<Uuid, String> {
        serde_json::from_value(self.external_mcp_sessions.clone()).unwrap_or_default()
    }
}
