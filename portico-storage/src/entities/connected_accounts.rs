//! Connected account entity
//!
//! Partial unique indexes keep one `shared` and one `operational` account per
//! configuration; `(user, configuration)` is unique for `individual`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "connected_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub mcp_server_configuration_id: Uuid,
    pub ownership: super::mcp_server_configurations::ConnectedAccountOwnership,
    /// Tagged credential variant (api-key secret or OAuth2 token set)
    pub auth_credentials: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::mcp_server_configurations::Entity",
        from = "Column::McpServerConfigurationId",
        to = "super::mcp_server_configurations::Column::Id",
        on_delete = "Cascade"
    )]
    Configuration,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::mcp_server_configurations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Configuration.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn auth_credentials(
        &self,
    ) -> Result<portico_api_types::AuthCredentials, serde_json::Error> {
        serde_json::from_value(self.auth_credentials.clone())
    }
}
