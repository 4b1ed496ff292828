//! Subscription plan entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription_plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub plan_code: String,
    pub display_name: String,
    pub is_free: bool,
    pub is_public: bool,
    /// Required for paid plans
    pub stripe_price_id: Option<String>,
    pub min_seats: i32,
    pub max_seats: i32,
    /// NULL means unlimited
    pub max_custom_mcp_servers: Option<i32>,
    /// NULL means unlimited retention
    pub log_retention_days: Option<i32>,
    pub archived_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::organization_subscriptions::Entity")]
    Subscriptions,
}

impl Related<super::organization_subscriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
