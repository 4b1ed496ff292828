//! MCP tool repository
//!
//! Besides plain CRUD this owns the two vector-search paths: cosine ranking
//! of an intent embedding over a candidate tool set, and embedding writes
//! during catalog sync.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, Statement,
};
use uuid::Uuid;

use crate::entities::{mcp_tools, McpTools};
use crate::error::{StorageError, StorageResult};
use crate::repositories::vector_literal;

pub struct McpToolRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

#[derive(Debug)]
pub struct ToolUpsert {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
    pub metadata: mcp_tools::ToolMetadata,
}

impl<'a, C: ConnectionTrait> McpToolRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<mcp_tools::Model>> {
        Ok(McpTools::find_by_id(id).one(self.db).await?)
    }

    pub async fn find_by_name(&self, name: &str) -> StorageResult<Option<mcp_tools::Model>> {
        Ok(McpTools::find()
            .filter(mcp_tools::Column::Name.eq(name))
            .one(self.db)
            .await?)
    }

    pub async fn list_by_server(&self, mcp_server_id: Uuid) -> StorageResult<Vec<mcp_tools::Model>> {
        Ok(McpTools::find()
            .filter(mcp_tools::Column::McpServerId.eq(mcp_server_id))
            .all(self.db)
            .await?)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> StorageResult<Vec<mcp_tools::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(McpTools::find()
            .filter(mcp_tools::Column::Id.is_in(ids.iter().copied()))
            .all(self.db)
            .await?)
    }

    pub async fn create(
        &self,
        mcp_server_id: Uuid,
        tool: &ToolUpsert,
        embedding: &[f32],
    ) -> StorageResult<mcp_tools::Model> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let model = mcp_tools::ActiveModel {
            id: Set(id),
            mcp_server_id: Set(mcp_server_id),
            name: Set(tool.name.clone()),
            description: Set(tool.description.clone()),
            input_schema: Set(tool.input_schema.clone()),
            tool_metadata: Set(serde_json::to_value(&tool.metadata)
                .map_err(|e| StorageError::corrupt(e.to_string()))?),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = model.insert(self.db).await?;
        self.write_embedding(id, embedding).await?;
        Ok(inserted)
    }

    /// Update all content fields and replace the embedding.
    pub async fn update_with_embedding(
        &self,
        existing: mcp_tools::Model,
        tool: &ToolUpsert,
        embedding: &[f32],
    ) -> StorageResult<mcp_tools::Model> {
        let id = existing.id;
        let mut active: mcp_tools::ActiveModel = existing.into();
        active.description = Set(tool.description.clone());
        active.input_schema = Set(tool.input_schema.clone());
        active.tool_metadata = Set(serde_json::to_value(&tool.metadata)
            .map_err(|e| StorageError::corrupt(e.to_string()))?);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.db).await?;
        self.write_embedding(id, embedding).await?;
        Ok(updated)
    }

    /// Update only non-embedding fields; the stored vector is untouched.
    pub async fn update_metadata(
        &self,
        existing: mcp_tools::Model,
        tool: &ToolUpsert,
    ) -> StorageResult<mcp_tools::Model> {
        let mut active: mcp_tools::ActiveModel = existing.into();
        active.description = Set(tool.description.clone());
        active.input_schema = Set(tool.input_schema.clone());
        active.tool_metadata = Set(serde_json::to_value(&tool.metadata)
            .map_err(|e| StorageError::corrupt(e.to_string()))?);
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db).await?)
    }

    pub async fn delete_by_names(&self, mcp_server_id: Uuid, names: &[String]) -> StorageResult<u64> {
        if names.is_empty() {
            return Ok(0);
        }
        let result = McpTools::delete_many()
            .filter(mcp_tools::Column::McpServerId.eq(mcp_server_id))
            .filter(mcp_tools::Column::Name.is_in(names.iter().cloned()))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn write_embedding(&self, tool_id: Uuid, embedding: &[f32]) -> StorageResult<()> {
        self.db
            .execute(Statement::from_sql_and_values(
                self.db.get_database_backend(),
                "UPDATE mcp_tools SET embedding = $1::vector WHERE id = $2",
                [vector_literal(embedding).into(), tool_id.into()],
            ))
            .await?;
        Ok(())
    }

    /// Page through a candidate set alphabetically by platform name.
    pub async fn page_by_name(
        &self,
        candidate_ids: &[Uuid],
        limit: u64,
        offset: u64,
    ) -> StorageResult<Vec<mcp_tools::Model>> {
        if candidate_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(McpTools::find()
            .filter(mcp_tools::Column::Id.is_in(candidate_ids.iter().copied()))
            .order_by_asc(mcp_tools::Column::Name)
            .limit(limit)
            .offset(offset)
            .all(self.db)
            .await?)
    }

    /// Rank a candidate set by cosine distance to the intent embedding,
    /// tie-breaking on name ascending. Returns ids in rank order.
    pub async fn rank_by_similarity(
        &self,
        candidate_ids: &[Uuid],
        intent_embedding: &[f32],
        limit: u64,
        offset: u64,
    ) -> StorageResult<Vec<Uuid>> {
        if candidate_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Candidate ids come from our own rows, so inlining the uuid list is
        // injection-safe and keeps the statement to two bind params.
        let id_list = candidate_ids
            .iter()
            .map(|id| format!("'{}'", id))
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "SELECT id FROM mcp_tools \
             WHERE id IN ({}) \
             ORDER BY embedding <=> $1::vector ASC, name ASC \
             LIMIT $2 OFFSET $3",
            id_list
        );

        let rows = self
            .db
            .query_all(Statement::from_sql_and_values(
                self.db.get_database_backend(),
                sql,
                [
                    vector_literal(intent_embedding).into(),
                    (limit as i64).into(),
                    (offset as i64).into(),
                ],
            ))
            .await?;

        rows.into_iter()
            .map(|row| row.try_get::<Uuid>("", "id").map_err(StorageError::from))
            .collect()
    }
}
