//! Organization membership entity

use sea_orm::entity::prelude::*;
use sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// One `(organization, user)` pair with a role. Uniqueness on the pair is
/// enforced by index; the last-admin invariant is enforced in the repository.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "organization_memberships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: OrganizationRole,
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
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum OrganizationRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "member")]
    Member,
}

impl From<OrganizationRole> for portico_api_types::OrganizationRole {
    fn from(value: OrganizationRole) -> Self {
        match value {
            OrganizationRole::Admin => portico_api_types::OrganizationRole::Admin,
            OrganizationRole::Member => portico_api_types::OrganizationRole::Member,
        }
    }
}

impl From<portico_api_types::OrganizationRole> for OrganizationRole {
    fn from(value: portico_api_types::OrganizationRole) -> Self {
        match value {
            portico_api_types::OrganizationRole::Admin => OrganizationRole::Admin,
            portico_api_types::OrganizationRole::Member => OrganizationRole::Member,
        }
    }
}
