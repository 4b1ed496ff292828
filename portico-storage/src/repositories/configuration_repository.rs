//! MCP server configuration repository

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{mcp_server_configurations, McpServerConfigurations};
use crate::error::{StorageError, StorageResult};

pub struct ConfigurationRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

pub struct NewConfiguration {
    pub organization_id: Uuid,
    pub mcp_server_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub auth_type: crate::entities::mcp_servers::AuthType,
    pub connected_account_ownership: mcp_server_configurations::ConnectedAccountOwnership,
    pub all_tools_enabled: bool,
    pub enabled_tools: Vec<Uuid>,
    pub allowed_teams: Vec<Uuid>,
}

impl<'a, C: ConnectionTrait> ConfigurationRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> StorageResult<Option<mcp_server_configurations::Model>> {
        Ok(McpServerConfigurations::find_by_id(id).one(self.db).await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> StorageResult<mcp_server_configurations::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::not_found("MCPServerConfiguration", id))
    }

    pub async fn list_by_organization(
        &self,
        organization_id: Uuid,
        mcp_server_id: Option<Uuid>,
    ) -> StorageResult<Vec<mcp_server_configurations::Model>> {
        let mut query = McpServerConfigurations::find()
            .filter(mcp_server_configurations::Column::OrganizationId.eq(organization_id));
        if let Some(server_id) = mcp_server_id {
            query = query.filter(mcp_server_configurations::Column::McpServerId.eq(server_id));
        }
        Ok(query.all(self.db).await?)
    }

    pub async fn find_by_ids(
        &self,
        ids: &[Uuid],
    ) -> StorageResult<Vec<mcp_server_configurations::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(McpServerConfigurations::find()
            .filter(mcp_server_configurations::Column::Id.is_in(ids.iter().copied()))
            .all(self.db)
            .await?)
    }

    /// The single operational configuration for a server, if one exists.
    pub async fn find_operational_by_server(
        &self,
        mcp_server_id: Uuid,
    ) -> StorageResult<Option<mcp_server_configurations::Model>> {
        Ok(McpServerConfigurations::find()
            .filter(mcp_server_configurations::Column::McpServerId.eq(mcp_server_id))
            .filter(
                mcp_server_configurations::Column::ConnectedAccountOwnership
                    .eq(mcp_server_configurations::ConnectedAccountOwnership::Operational),
            )
            .one(self.db)
            .await?)
    }

    pub async fn create(
        &self,
        config: NewConfiguration,
    ) -> StorageResult<mcp_server_configurations::Model> {
        if config.all_tools_enabled && !config.enabled_tools.is_empty() {
            return Err(StorageError::constraint(
                "enabled_tools must be empty when all_tools_enabled is set",
            ));
        }
        let now = Utc::now();
        Ok(mcp_server_configurations::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(config.organization_id),
            mcp_server_id: Set(config.mcp_server_id),
            name: Set(config.name),
            description: Set(config.description),
            auth_type: Set(config.auth_type),
            connected_account_ownership: Set(config.connected_account_ownership),
            all_tools_enabled: Set(config.all_tools_enabled),
            enabled_tools: Set(serde_json::to_value(&config.enabled_tools).unwrap_or_default()),
            allowed_teams: Set(serde_json::to_value(&config.allowed_teams).unwrap_or_default()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await?)
    }

    pub async fn update_tools(
        &self,
        config: mcp_server_configurations::Model,
        all_tools_enabled: bool,
        enabled_tools: Vec<Uuid>,
    ) -> StorageResult<mcp_server_configurations::Model> {
        if all_tools_enabled && !enabled_tools.is_empty() {
            return Err(StorageError::constraint(
                "enabled_tools must be empty when all_tools_enabled is set",
            ));
        }
        let mut active: mcp_server_configurations::ActiveModel = config.into();
        active.all_tools_enabled = Set(all_tools_enabled);
        active.enabled_tools = Set(serde_json::to_value(&enabled_tools).unwrap_or_default());
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db).await?)
    }

    pub async fn update_allowed_teams(
        &self,
        config: mcp_server_configurations::Model,
        allowed_teams: Vec<Uuid>,
    ) -> StorageResult<mcp_server_configurations::Model> {
        let mut active: mcp_server_configurations::ActiveModel = config.into();
        active.allowed_teams = Set(serde_json::to_value(&allowed_teams).unwrap_or_default());
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db).await?)
    }

    pub async fn update_details(
        &self,
        config: mcp_server_configurations::Model,
        name: Option<String>,
        description: Option<String>,
    ) -> StorageResult<mcp_server_configurations::Model> {
        let mut active: mcp_server_configurations::ActiveModel = config.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if description.is_some() {
            active.description = Set(description);
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db).await?)
    }

    pub async fn delete(&self, config: mcp_server_configurations::Model) -> StorageResult<()> {
        config.delete(self.db).await?;
        Ok(())
    }
}
