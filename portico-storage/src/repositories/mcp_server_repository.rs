//! MCP server repository
//!
//! The `embedding` pgvector column is written through raw statements; the
//! entity never maps it.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set, Statement,
};
use sea_orm::sea_query::Expr;
use sea_orm::Condition;
use uuid::Uuid;

use crate::entities::{mcp_servers, McpServers};
use crate::error::{StorageError, StorageResult};
use crate::repositories::vector_literal;

pub struct McpServerRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

pub struct NewMcpServer {
    pub name: String,
    pub url: String,
    pub transport: mcp_servers::McpServerTransport,
    pub description: String,
    pub logo: String,
    pub categories: Vec<String>,
    pub auth_configs: Vec<portico_api_types::AuthConfig>,
    pub organization_id: Option<Uuid>,
}

impl<'a, C: ConnectionTrait> McpServerRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<mcp_servers::Model>> {
        Ok(McpServers::find_by_id(id).one(self.db).await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> StorageResult<mcp_servers::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::not_found("MCPServer", id))
    }

    pub async fn find_by_name(&self, name: &str) -> StorageResult<Option<mcp_servers::Model>> {
        Ok(McpServers::find()
            .filter(mcp_servers::Column::Name.eq(name))
            .one(self.db)
            .await?)
    }

    /// Servers visible to an organization: all public servers plus the org's
    /// own custom servers.
    pub async fn list_visible(&self, organization_id: Uuid) -> StorageResult<Vec<mcp_servers::Model>> {
        Ok(McpServers::find()
            .filter(
                Condition::any()
                    .add(mcp_servers::Column::OrganizationId.is_null())
                    .add(mcp_servers::Column::OrganizationId.eq(organization_id)),
            )
            .all(self.db)
            .await?)
    }

    pub async fn count_custom(&self, organization_id: Uuid) -> StorageResult<u64> {
        Ok(McpServers::find()
            .filter(mcp_servers::Column::OrganizationId.eq(organization_id))
            .count(self.db)
            .await?)
    }

    pub async fn create(&self, server: NewMcpServer, embedding: &[f32]) -> StorageResult<mcp_servers::Model> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let model = mcp_servers::ActiveModel {
            id: Set(id),
            name: Set(server.name),
            url: Set(server.url),
            transport: Set(server.transport),
            description: Set(server.description),
            logo: Set(server.logo),
            categories: Set(serde_json::to_value(&server.categories).unwrap_or_default()),
            auth_configs: Set(serde_json::to_value(&server.auth_configs).unwrap_or_default()),
            organization_id: Set(server.organization_id),
            last_synced_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = model.insert(self.db).await?;
        self.write_embedding(id, embedding).await?;
        Ok(inserted)
    }

    pub async fn update_details(
        &self,
        server: mcp_servers::Model,
        description: Option<String>,
        logo: Option<String>,
        categories: Option<Vec<String>>,
    ) -> StorageResult<mcp_servers::Model> {
        let mut active: mcp_servers::ActiveModel = server.into();
        if let Some(description) = description {
            active.description = Set(description);
        }
        if let Some(logo) = logo {
            active.logo = Set(logo);
        }
        if let Some(categories) = categories {
            active.categories = Set(serde_json::to_value(&categories).unwrap_or_default());
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db).await?)
    }

    pub async fn delete(&self, server: mcp_servers::Model) -> StorageResult<()> {
        server.delete(self.db).await?;
        Ok(())
    }

    /// Bump `last_synced_at`. The value only moves forward.
    pub async fn touch_last_synced(
        &self,
        server_id: Uuid,
        synced_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        McpServers::update_many()
            .col_expr(mcp_servers::Column::LastSyncedAt, Expr::value(synced_at))
            .col_expr(mcp_servers::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(mcp_servers::Column::Id.eq(server_id))
            .filter(
                Condition::any()
                    .add(mcp_servers::Column::LastSyncedAt.is_null())
                    .add(mcp_servers::Column::LastSyncedAt.lt(synced_at)),
            )
            .exec(self.db)
            .await?;
        Ok(())
    }

    pub async fn write_embedding(&self, server_id: Uuid, embedding: &[f32]) -> StorageResult<()> {
        self.db
            .execute(Statement::from_sql_and_values(
                self.db.get_database_backend(),
                "UPDATE mcp_servers SET embedding = $1::vector WHERE id = $2",
                [vector_literal(embedding).into(), server_id.into()],
            ))
            .await?;
        Ok(())
    }

    /// Take a transaction-scoped advisory lock on the server row. Used by the
    /// catalog sync so a concurrent sync observes the lock instead of racing.
    pub async fn try_advisory_lock(&self, server_id: Uuid) -> StorageResult<bool> {
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                self.db.get_database_backend(),
                "SELECT pg_try_advisory_xact_lock(hashtextextended($1::text, 0)) AS locked",
                [server_id.to_string().into()],
            ))
            .await?
            .ok_or_else(|| StorageError::corrupt("advisory lock query returned no row"))?;
        Ok(row.try_get::<bool>("", "locked")?)
    }
}
