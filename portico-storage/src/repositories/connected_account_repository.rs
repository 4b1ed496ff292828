//! Connected account repository
//!
//! Shared/operational singletons are guaranteed by partial unique indexes;
//! this layer adds the `FOR UPDATE` lookup the OAuth2 refresh path uses to
//! serialize refreshes per account.

use chrono::Utc;
use portico_api_types::AuthCredentials;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
    Statement,
};
use uuid::Uuid;

use crate::entities::{
    connected_accounts, mcp_server_configurations::ConnectedAccountOwnership, ConnectedAccounts,
};
use crate::error::{StorageError, StorageResult};

pub struct ConnectedAccountRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ConnectedAccountRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<connected_accounts::Model>> {
        Ok(ConnectedAccounts::find_by_id(id).one(self.db).await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> StorageResult<connected_accounts::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::not_found("ConnectedAccount", id))
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        configuration_id: Uuid,
        ownership: ConnectedAccountOwnership,
        credentials: &AuthCredentials,
    ) -> StorageResult<connected_accounts::Model> {
        let now = Utc::now();
        Ok(connected_accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            mcp_server_configuration_id: Set(configuration_id),
            ownership: Set(ownership),
            auth_credentials: Set(serde_json::to_value(credentials)
                .map_err(|e| StorageError::corrupt(e.to_string()))?),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await?)
    }

    pub async fn find_individual(
        &self,
        user_id: Uuid,
        configuration_id: Uuid,
    ) -> StorageResult<Option<connected_accounts::Model>> {
        Ok(ConnectedAccounts::find()
            .filter(connected_accounts::Column::UserId.eq(user_id))
            .filter(connected_accounts::Column::McpServerConfigurationId.eq(configuration_id))
            .filter(connected_accounts::Column::Ownership.eq(ConnectedAccountOwnership::Individual))
            .one(self.db)
            .await?)
    }

    /// The singleton shared or operational account for a configuration.
    pub async fn find_singleton(
        &self,
        configuration_id: Uuid,
        ownership: ConnectedAccountOwnership,
    ) -> StorageResult<Option<connected_accounts::Model>> {
        debug_assert!(ownership != ConnectedAccountOwnership::Individual);
        Ok(ConnectedAccounts::find()
            .filter(connected_accounts::Column::McpServerConfigurationId.eq(configuration_id))
            .filter(connected_accounts::Column::Ownership.eq(ownership))
            .one(self.db)
            .await?)
    }

    pub async fn list_by_configuration(
        &self,
        configuration_id: Uuid,
    ) -> StorageResult<Vec<connected_accounts::Model>> {
        Ok(ConnectedAccounts::find()
            .filter(connected_accounts::Column::McpServerConfigurationId.eq(configuration_id))
            .all(self.db)
            .await?)
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> StorageResult<Vec<connected_accounts::Model>> {
        Ok(ConnectedAccounts::find()
            .filter(connected_accounts::Column::UserId.eq(user_id))
            .all(self.db)
            .await?)
    }

    pub async fn update_credentials(
        &self,
        account: connected_accounts::Model,
        credentials: &AuthCredentials,
    ) -> StorageResult<connected_accounts::Model> {
        let mut active: connected_accounts::ActiveModel = account.into();
        active.auth_credentials = Set(serde_json::to_value(credentials)
            .map_err(|e| StorageError::corrupt(e.to_string()))?);
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db).await?)
    }

    pub async fn delete(&self, account: connected_accounts::Model) -> StorageResult<()> {
        account.delete(self.db).await?;
        Ok(())
    }

    pub async fn delete_by_id(&self, id: Uuid) -> StorageResult<()> {
        ConnectedAccounts::delete_by_id(id).exec(self.db).await?;
        Ok(())
    }

    /// Row-locked re-read for the refresh path. Must run inside a
    /// transaction; the lock is released at commit/rollback.
    pub async fn get_for_update(&self, id: Uuid) -> StorageResult<connected_accounts::Model> {
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                self.db.get_database_backend(),
                "SELECT id, user_id, mcp_server_configuration_id, ownership, auth_credentials, \
                 created_at, updated_at \
                 FROM connected_accounts WHERE id = $1 FOR UPDATE",
                [id.into()],
            ))
            .await?
            .ok_or_else(|| StorageError::not_found("ConnectedAccount", id))?;

        Ok(connected_accounts::Model {
            id: row.try_get("", "id")?,
            user_id: row.try_get("", "user_id")?,
            mcp_server_configuration_id: row.try_get("", "mcp_server_configuration_id")?,
            ownership: row.try_get("", "ownership")?,
            auth_credentials: row.try_get("", "auth_credentials")?,
            created_at: row.try_get("", "created_at")?,
            updated_at: row.try_get("", "updated_at")?,
        })
    }
}
