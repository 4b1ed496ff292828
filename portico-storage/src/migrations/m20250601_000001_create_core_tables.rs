//! Core schema: identity, org graph, MCP registry, gateway state
//!
//! Raw SQL is used throughout: pgvector column types and partial unique
//! indexes are not expressible through the schema builder.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("CREATE EXTENSION IF NOT EXISTS vector").await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE users (
                id UUID PRIMARY KEY,
                email VARCHAR(320) NOT NULL UNIQUE,
                name VARCHAR(255) NOT NULL,
                identity_provider VARCHAR(20) NOT NULL,
                password_hash VARCHAR(255),
                email_verified BOOLEAN NOT NULL DEFAULT FALSE,
                deleted_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE organizations (
                id UUID PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                stripe_customer_id VARCHAR(255),
                deleted_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE organization_memberships (
                id UUID PRIMARY KEY,
                organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                role VARCHAR(20) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                UNIQUE (organization_id, user_id)
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE teams (
                id UUID PRIMARY KEY,
                organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                UNIQUE (organization_id, name)
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE team_memberships (
                id UUID PRIMARY KEY,
                team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TIMESTAMPTZ NOT NULL,
                UNIQUE (team_id, user_id)
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE mcp_servers (
                id UUID PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                url TEXT NOT NULL,
                transport VARCHAR(20) NOT NULL,
                description TEXT NOT NULL,
                logo TEXT NOT NULL,
                categories JSONB NOT NULL DEFAULT '[]',
                auth_configs JSONB NOT NULL DEFAULT '[]',
                organization_id UUID REFERENCES organizations(id) ON DELETE CASCADE,
                last_synced_at TIMESTAMPTZ,
                embedding vector(1536),
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE mcp_tools (
                id UUID PRIMARY KEY,
                mcp_server_id UUID NOT NULL REFERENCES mcp_servers(id) ON DELETE CASCADE,
                name VARCHAR(512) NOT NULL UNIQUE,
                description TEXT NOT NULL,
                input_schema JSONB NOT NULL,
                tool_metadata JSONB NOT NULL,
                embedding vector(1536),
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE mcp_server_configurations (
                id UUID PRIMARY KEY,
                organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
                mcp_server_id UUID NOT NULL REFERENCES mcp_servers(id) ON DELETE CASCADE,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                auth_type VARCHAR(20) NOT NULL,
                connected_account_ownership VARCHAR(20) NOT NULL,
                all_tools_enabled BOOLEAN NOT NULL DEFAULT TRUE,
                enabled_tools JSONB NOT NULL DEFAULT '[]',
                allowed_teams JSONB NOT NULL DEFAULT '[]',
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        // At most one operational configuration per server
        db.execute_unprepared(
            r#"
            CREATE UNIQUE INDEX uq_configurations_operational_per_server
            ON mcp_server_configurations (mcp_server_id)
            WHERE connected_account_ownership = 'operational'
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE connected_accounts (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                mcp_server_configuration_id UUID NOT NULL
                    REFERENCES mcp_server_configurations(id) ON DELETE CASCADE,
                ownership VARCHAR(20) NOT NULL,
                auth_credentials JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE UNIQUE INDEX uq_connected_accounts_individual
            ON connected_accounts (user_id, mcp_server_configuration_id)
            WHERE ownership = 'individual'
            "#,
        )
        .await?;

        // One shared and one operational account per configuration
        db.execute_unprepared(
            r#"
            CREATE UNIQUE INDEX uq_connected_accounts_singleton
            ON connected_accounts (mcp_server_configuration_id, ownership)
            WHERE ownership IN ('shared', 'operational')
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE mcp_server_bundles (
                id UUID PRIMARY KEY,
                organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                bundle_key VARCHAR(64) NOT NULL UNIQUE,
                mcp_server_configuration_ids JSONB NOT NULL DEFAULT '[]',
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE mcp_sessions (
                id UUID PRIMARY KEY,
                bundle_id UUID NOT NULL REFERENCES mcp_server_bundles(id) ON DELETE CASCADE,
                external_mcp_sessions JSONB NOT NULL DEFAULT '{}',
                deleted BOOLEAN NOT NULL DEFAULT FALSE,
                last_accessed_at TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        // No foreign keys: log rows outlive everything they reference
        db.execute_unprepared(
            r#"
            CREATE TABLE mcp_tool_call_logs (
                id UUID PRIMARY KEY,
                organization_id UUID NOT NULL,
                user_id UUID NOT NULL,
                request_id VARCHAR(64) NOT NULL,
                session_id UUID NOT NULL,
                bundle_id UUID NOT NULL,
                bundle_name VARCHAR(255) NOT NULL,
                mcp_server_id UUID,
                mcp_server_name VARCHAR(255),
                mcp_tool_id UUID,
                mcp_tool_name VARCHAR(512),
                mcp_server_configuration_id UUID,
                mcp_server_configuration_name VARCHAR(255),
                arguments TEXT,
                result JSONB NOT NULL,
                status VARCHAR(10) NOT NULL,
                via_execute_tool BOOLEAN NOT NULL,
                jsonrpc_payload JSONB NOT NULL,
                started_at TIMESTAMPTZ NOT NULL,
                ended_at TIMESTAMPTZ NOT NULL,
                duration_ms BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE user_verifications (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                token_hash VARCHAR(64) NOT NULL UNIQUE,
                email VARCHAR(320) NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL,
                used_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE user_refresh_tokens (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                token_hash VARCHAR(64) NOT NULL UNIQUE,
                expires_at TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE organization_invitations (
                id UUID PRIMARY KEY,
                organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
                email VARCHAR(320) NOT NULL,
                role VARCHAR(20) NOT NULL,
                token_hash VARCHAR(64) NOT NULL UNIQUE,
                status VARCHAR(20) NOT NULL,
                invited_by_user_id UUID NOT NULL,
                email_metadata JSONB,
                expires_at TIMESTAMPTZ NOT NULL,
                used_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for table in [
            "organization_invitations",
            "user_refresh_tokens",
            "user_verifications",
            "mcp_tool_call_logs",
            "mcp_sessions",
            "mcp_server_bundles",
            "connected_accounts",
            "mcp_server_configurations",
            "mcp_tools",
            "mcp_servers",
            "team_memberships",
            "teams",
            "organization_memberships",
            "organizations",
            "users",
        ] {
            db.execute_unprepared(&format!("DROP TABLE IF EXISTS {} CASCADE", table))
                .await?;
        }
        Ok(())
    }
}
