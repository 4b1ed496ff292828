//! Subscription and entitlement schema

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            r#"
            CREATE TABLE subscription_plans (
                id UUID PRIMARY KEY,
                plan_code VARCHAR(64) NOT NULL UNIQUE,
                display_name VARCHAR(255) NOT NULL,
                is_free BOOLEAN NOT NULL,
                is_public BOOLEAN NOT NULL,
                stripe_price_id VARCHAR(255),
                min_seats INTEGER NOT NULL,
                max_seats INTEGER NOT NULL,
                max_custom_mcp_servers INTEGER,
                log_retention_days INTEGER,
                archived_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE organization_subscriptions (
                id UUID PRIMARY KEY,
                organization_id UUID NOT NULL UNIQUE
                    REFERENCES organizations(id) ON DELETE CASCADE,
                subscription_plan_id UUID NOT NULL REFERENCES subscription_plans(id),
                seat_count INTEGER NOT NULL,
                stripe_subscription_id VARCHAR(255) NOT NULL UNIQUE,
                stripe_subscription_item_id VARCHAR(255) NOT NULL,
                stripe_subscription_status VARCHAR(32) NOT NULL,
                current_period_start TIMESTAMPTZ,
                current_period_end TIMESTAMPTZ,
                cancel_at_period_end BOOLEAN NOT NULL DEFAULT FALSE,
                subscription_start_date TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE organization_entitlement_overrides (
                id UUID PRIMARY KEY,
                organization_id UUID NOT NULL UNIQUE
                    REFERENCES organizations(id) ON DELETE CASCADE,
                seat_count INTEGER,
                max_custom_mcp_servers INTEGER,
                log_retention_days INTEGER,
                expires_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE stripe_events (
                id UUID PRIMARY KEY,
                stripe_event_id VARCHAR(255) NOT NULL UNIQUE,
                event_type VARCHAR(128) NOT NULL,
                processed_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for table in [
            "stripe_events",
            "organization_entitlement_overrides",
            "organization_subscriptions",
            "subscription_plans",
        ] {
            db.execute_unprepared(&format!("DROP TABLE IF EXISTS {} CASCADE", table))
                .await?;
        }
        Ok(())
    }
}
