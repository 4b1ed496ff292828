//! MCP server bundle entity
//!
//! The bundle key is a display-visible capability: cleartext, uniquely
//! indexed, 36 chars of high entropy. Rotation is by creating a new bundle.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mcp_server_bundles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Creating user; bundle accessibility follows this user's team access
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[sea_orm(unique)]
    pub bundle_key: String,
    /// Ordered, de-duplicated configuration ids, JSON array of UUIDs
    pub mcp_server_configuration_ids: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id",
        on_delete = "Cascade"
    )]
    Organization,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::mcp_sessions::Entity")]
    Sessions,
}

impl Related<super::mcp_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn configuration_ids(&self) -> Vec<Uuid> {
        serde_json::from_value(self.mcp_server_configuration_ids.clone()).unwrap_or_default()
    }
}
