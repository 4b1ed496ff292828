//! Secondary indexes for the hot paths

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // Gateway bundle lookup is on the request path
        db.execute_unprepared(
            "CREATE INDEX idx_bundles_organization_id ON mcp_server_bundles (organization_id)",
        )
        .await?;
        db.execute_unprepared("CREATE INDEX idx_bundles_user_id ON mcp_server_bundles (user_id)")
            .await?;

        db.execute_unprepared(
            "CREATE INDEX idx_sessions_bundle_id ON mcp_sessions (bundle_id)",
        )
        .await?;

        // Cursor pagination order
        db.execute_unprepared(
            "CREATE INDEX idx_tool_call_logs_org_started ON mcp_tool_call_logs (organization_id, started_at DESC, id DESC)",
        )
        .await?;
        db.execute_unprepared(
            "CREATE INDEX idx_tool_call_logs_user_started ON mcp_tool_call_logs (user_id, started_at DESC, id DESC)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX idx_tools_mcp_server_id ON mcp_tools (mcp_server_id)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX idx_configurations_org ON mcp_server_configurations (organization_id)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX idx_connected_accounts_user ON connected_accounts (user_id)",
        )
        .await?;
        db.execute_unprepared(
            "CREATE INDEX idx_connected_accounts_configuration ON connected_accounts (mcp_server_configuration_id)",
        )
        .await?;

        // Vector search over tool embeddings
        db.execute_unprepared(
            "CREATE INDEX idx_mcp_tools_embedding ON mcp_tools USING hnsw (embedding vector_cosine_ops)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for index in [
            "idx_mcp_tools_embedding",
            "idx_connected_accounts_configuration",
            "idx_connected_accounts_user",
            "idx_configurations_org",
            "idx_tools_mcp_server_id",
            "idx_tool_call_logs_user_started",
            "idx_tool_call_logs_org_started",
            "idx_sessions_bundle_id",
            "idx_bundles_user_id",
            "idx_bundles_organization_id",
        ] {
            db.execute_unprepared(&format!("DROP INDEX IF EXISTS {}", index))
                .await?;
        }
        Ok(())
    }
}
