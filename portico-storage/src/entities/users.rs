//! User entity

use sea_orm::entity::prelude::*;
use sea_query::StringLen;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Email address (globally unique)
    #[sea_orm(unique)]
    pub email: String,
    /// Display name
    pub name: String,
    /// Which identity provider owns the login flow
    pub identity_provider: IdentityProvider,
    /// bcrypt hash; only present for email-provider users
    pub password_hash: Option<String>,
    pub email_verified: bool,
    /// Soft-delete marker; a set value means deletion is in progress
    pub deleted_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::organization_memberships::Entity")]
    OrganizationMemberships,
    #[sea_orm(has_many = "super::connected_accounts::Entity")]
    ConnectedAccounts,
    #[sea_orm(has_many = "super::user_refresh_tokens::Entity")]
    RefreshTokens,
}

impl Related<super::organization_memberships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrganizationMemberships.def()
    }
}

impl Related<super::connected_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConnectedAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Identity provider discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum IdentityProvider {
    #[sea_orm(string_value = "email")]
    Email,
    #[sea_orm(string_value = "google")]
    Google,
}

impl From<IdentityProvider> for portico_api_types::IdentityProvider {
    fn from(value: IdentityProvider) -> Self {
        match value {
            IdentityProvider::Email => portico_api_types::IdentityProvider::Email,
            IdentityProvider::Google => portico_api_types::IdentityProvider::Google,
        }
    }
}

impl From<portico_api_types::IdentityProvider> for IdentityProvider {
    fn from(value: portico_api_types::IdentityProvider) -> Self {
        match value {
            portico_api_types::IdentityProvider::Email => IdentityProvider::Email,
            portico_api_types::IdentityProvider::Google => IdentityProvider::Google,
        }
    }
}
